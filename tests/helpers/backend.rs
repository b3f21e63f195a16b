//! A real HTTP server on localhost that answers like the Brainly backend
//! and records every request it sees.

use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use brainly::api::ApiClient;
use serde_json::{json, Value};

/// The only token the backend accepts.
pub const VALID_TOKEN: &str = "jwt-123";

/// Username the backend refuses to sign in.
pub const REJECTED_USER: &str = "nobody";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct Recorder {
    requests: Mutex<Vec<Recorded>>,
}

pub struct MockBackend {
    pub base_url: String,
    recorder: Arc<Recorder>,
    server: tokio::task::JoinHandle<()>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let recorder = Arc::new(Recorder::default());
        let app = Router::new().fallback(handle).with_state(Arc::clone(&recorder));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock backend crashed");
        });

        Self {
            base_url: format!("http://{addr}"),
            recorder,
            server,
        }
    }

    /// Client pointed at this backend. Environment proxies are bypassed so
    /// localhost traffic always reaches the server.
    pub fn client(&self) -> ApiClient {
        let http = reqwest::Client::builder()
            .no_proxy()
            .build()
            .expect("build http client");
        ApiClient::with_client(&self.base_url, http)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.recorder.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Recorded {
        self.requests().pop().expect("no request reached the backend")
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn handle(
    State(recorder): State<Arc<Recorder>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let path = uri.path().to_string();

    recorder.requests.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        authorization: authorization.clone(),
        body: body.clone(),
    });

    let authed = authorization.as_deref() == Some(VALID_TOKEN);
    match (method, path.as_str()) {
        (Method::POST, "/api/v1/signup") => {
            (StatusCode::OK, Json(json!({ "message": "User signed up" }))).into_response()
        }
        (Method::POST, "/api/v1/signin") => {
            if body["username"] == REJECTED_USER {
                (
                    StatusCode::FORBIDDEN,
                    Json(json!({ "message": "Incorrect credentials" })),
                )
                    .into_response()
            } else {
                (StatusCode::OK, Json(json!({ "token": VALID_TOKEN }))).into_response()
            }
        }
        (_, "/api/v1/content" | "/api/v1/search" | "/api/v1/share") if !authed => {
            (StatusCode::FORBIDDEN, Json(json!({ "message": "You are not logged in" })))
                .into_response()
        }
        (Method::GET, "/api/v1/content") => Json(json!({
            "contents": [
                {
                    "title": "F1 Race",
                    "link": "https://www.youtube.com/watch?v=oPTZCpo5uOg",
                    "type": "youtube",
                    "tags": [{ "_id": "t1", "title": "racing" }]
                },
                {
                    "title": "Long read",
                    "link": "https://blog.example.com/post",
                    "type": "article",
                    "tags": ["64ab01", "64ab02"]
                }
            ]
        }))
        .into_response(),
        (Method::POST, "/api/v1/content") => {
            (StatusCode::OK, Json(json!({ "message": "Content added" }))).into_response()
        }
        (Method::POST, "/api/v1/search") => {
            let term = body["searchTerm"].as_str().unwrap_or_default();
            Json(json!({
                "contents": [{
                    "title": format!("{term} talk"),
                    "link": "https://x.com/status/1",
                    "type": "twitter",
                    "tags": []
                }]
            }))
            .into_response()
        }
        (Method::POST, "/api/v1/share") => {
            if body["share"] == true {
                Json(json!({ "hash": "abc123" })).into_response()
            } else {
                Json(json!({ "message": "Removed sharable link" })).into_response()
            }
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}
