//! `ApiClient` against a live HTTP backend on localhost.

mod helpers;

use axum::http::Method;
use brainly::commands;
use brainly::error::ClientError;
use brainly::session::{AuthToken, Session, TokenStore};
use brainly::types::{ContentType, Credentials};
use brainly::ContentSource;
use helpers::backend::{MockBackend, REJECTED_USER, VALID_TOKEN};
use serde_json::json;

fn credentials(username: &str) -> Credentials {
    Credentials {
        username: username.to_string(),
        password: "hunter22".to_string(),
    }
}

fn token() -> AuthToken {
    AuthToken::new(VALID_TOKEN)
}

#[tokio::test]
async fn signup_posts_credentials() {
    let backend = MockBackend::start().await;
    backend.client().signup(&credentials("ada")).await.unwrap();

    let req = backend.last_request();
    assert_eq!(req.method, Method::POST);
    assert_eq!(req.path, "/api/v1/signup");
    assert_eq!(req.authorization, None);
    assert_eq!(req.body, json!({ "username": "ada", "password": "hunter22" }));
}

#[tokio::test]
async fn signin_returns_token() {
    let backend = MockBackend::start().await;
    let token = backend.client().signin(&credentials("ada")).await.unwrap();

    assert_eq!(token.as_str(), VALID_TOKEN);
    let req = backend.last_request();
    assert_eq!(req.method, Method::POST);
    assert_eq!(req.path, "/api/v1/signin");
}

#[tokio::test]
async fn rejected_signin_is_status_error_with_body() {
    let backend = MockBackend::start().await;
    let err = backend
        .client()
        .signin(&credentials(REJECTED_USER))
        .await
        .unwrap_err();

    match err {
        ClientError::Status { status, body } => {
            assert_eq!(status, reqwest::StatusCode::FORBIDDEN);
            assert!(body.contains("Incorrect credentials"), "body was {body}");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn search_sends_raw_token_and_search_term() {
    let backend = MockBackend::start().await;
    let hits = backend.client().search(&token(), "rust").await.unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "rust talk");
    assert_eq!(hits[0].kind, ContentType::Twitter);

    let req = backend.last_request();
    assert_eq!(req.method, Method::POST);
    assert_eq!(req.path, "/api/v1/search");
    // The token goes out exactly as issued, with no scheme prefix.
    assert_eq!(req.authorization.as_deref(), Some(VALID_TOKEN));
    assert_eq!(req.body, json!({ "searchTerm": "rust" }));
}

#[tokio::test]
async fn contents_is_a_get_and_keeps_every_item() {
    let backend = MockBackend::start().await;
    let items = backend.client().contents(&token()).await.unwrap();

    let req = backend.last_request();
    assert_eq!(req.method, Method::GET);
    assert_eq!(req.path, "/api/v1/content");
    assert_eq!(req.authorization.as_deref(), Some(VALID_TOKEN));

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].tags[0].text, "racing");
    assert_eq!(items[1].kind, ContentType::Other);
    assert_eq!(items[1].tags.len(), 2);
    assert_eq!(items[1].tags[0].id, "64ab01");
}

#[tokio::test]
async fn wrong_token_is_status_error() {
    let backend = MockBackend::start().await;
    let err = backend
        .client()
        .contents(&AuthToken::new("expired"))
        .await
        .unwrap_err();

    assert!(
        matches!(&err, ClientError::Status { status, .. } if *status == reqwest::StatusCode::FORBIDDEN),
        "got {err:?}"
    );
    assert_eq!(backend.last_request().authorization.as_deref(), Some("expired"));
}

#[tokio::test]
async fn share_builds_public_url_from_hash() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    let url = client.share(&token(), true).await.unwrap();
    assert_eq!(url, Some(format!("{}/share/abc123", backend.base_url)));
    assert_eq!(backend.last_request().body, json!({ "share": true }));

    let url = client.share(&token(), false).await.unwrap();
    assert_eq!(url, None);
    let req = backend.last_request();
    assert_eq!(req.path, "/api/v1/share");
    assert_eq!(req.body, json!({ "share": false }));
}

#[tokio::test]
async fn add_content_posts_trimmed_body_with_tags() {
    let backend = MockBackend::start().await;
    let session = Session::with_token(token());
    let tags = vec!["rust".to_string(), " ".to_string(), "async".to_string()];

    commands::add_content(
        &backend.client(),
        &session,
        " Tokio tips ",
        "https://x.com/status/42",
        ContentType::Twitter,
        &tags,
    )
    .await
    .unwrap();

    let req = backend.last_request();
    assert_eq!(req.method, Method::POST);
    assert_eq!(req.path, "/api/v1/content");
    assert_eq!(req.authorization.as_deref(), Some(VALID_TOKEN));
    assert_eq!(
        req.body,
        json!({
            "title": "Tokio tips",
            "link": "https://x.com/status/42",
            "type": "twitter",
            "tags": ["rust", "async"]
        })
    );
}

#[tokio::test]
async fn signin_command_persists_token() {
    let backend = MockBackend::start().await;
    let store = TokenStore::in_memory().unwrap();

    let session = commands::signin(&backend.client(), &store, &credentials("ada"))
        .await
        .unwrap();

    assert!(session.is_signed_in());
    assert_eq!(store.load().unwrap(), Some(token()));
    assert_eq!(Session::load(&store).unwrap().token().unwrap().as_str(), VALID_TOKEN);
}

#[tokio::test]
async fn signed_out_share_never_reaches_backend() {
    let backend = MockBackend::start().await;
    let err = commands::share_brain(&backend.client(), &Session::anonymous())
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ClientError>(),
        Some(ClientError::NotSignedIn)
    ));
    assert!(backend.requests().is_empty());
}
