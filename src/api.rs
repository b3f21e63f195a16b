use std::future::Future;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::error::{ClientError, Result};
use crate::session::AuthToken;
use crate::types::{
    ContentItem, ContentsResponse, Credentials, NewContent, SearchRequest, ShareRequest,
    ShareResponse, SigninResponse,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// The two read paths the dashboard depends on. Implemented by
/// [`ApiClient`]; tests substitute their own.
pub trait ContentSource: Send + Sync + 'static {
    fn search(
        &self,
        token: &AuthToken,
        term: &str,
    ) -> impl Future<Output = Result<Vec<ContentItem>>> + Send;

    fn contents(&self, token: &AuthToken) -> impl Future<Output = Result<Vec<ContentItem>>> + Send;
}

/// Typed client for the Brainly REST backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(base_url, http))
    }

    /// Use a preconfigured `reqwest` client (proxy, TLS, timeouts).
    pub fn with_client(base_url: &str, http: Client) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder, token: &AuthToken) -> RequestBuilder {
        builder.header(reqwest::header::AUTHORIZATION, token.as_str())
    }

    pub async fn signup(&self, credentials: &Credentials) -> Result<()> {
        let resp = self.http.post(self.url("signup")).json(credentials).send().await?;
        check(resp).await?;
        Ok(())
    }

    pub async fn signin(&self, credentials: &Credentials) -> Result<AuthToken> {
        let resp = self.http.post(self.url("signin")).json(credentials).send().await?;
        let body: SigninResponse = json(resp).await?;
        Ok(AuthToken::new(body.token))
    }

    pub async fn add_content(&self, token: &AuthToken, content: &NewContent) -> Result<()> {
        let req = self.authed(self.http.post(self.url("content")), token);
        check(req.json(content).send().await?).await?;
        Ok(())
    }

    /// Enable or disable public sharing. Returns the public URL when the
    /// backend hands back a share hash.
    pub async fn share(&self, token: &AuthToken, share: bool) -> Result<Option<String>> {
        let req = self.authed(self.http.post(self.url("share")), token);
        let body: ShareResponse = json(req.json(&ShareRequest { share }).send().await?).await?;
        Ok(body
            .hash
            .map(|hash| format!("{}/share/{}", self.base_url, hash)))
    }
}

impl ContentSource for ApiClient {
    async fn search(&self, token: &AuthToken, term: &str) -> Result<Vec<ContentItem>> {
        let req = self.authed(self.http.post(self.url("search")), token);
        let body: ContentsResponse = json(
            req.json(&SearchRequest { search_term: term })
                .send()
                .await?,
        )
        .await?;
        Ok(body.contents)
    }

    async fn contents(&self, token: &AuthToken) -> Result<Vec<ContentItem>> {
        let req = self.authed(self.http.get(self.url("content")), token);
        let body: ContentsResponse = json(req.send().await?).await?;
        Ok(body.contents)
    }
}

/// Turn a non-2xx response into [`ClientError::Status`].
async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::Status { status, body })
}

async fn json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    Ok(check(resp).await?.json::<T>().await?)
}
