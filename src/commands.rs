use anyhow::{Context, Result};

use crate::api::{ApiClient, ContentSource};
use crate::error::ClientError;
use crate::session::{Session, TokenStore};
use crate::types::{ContentItem, ContentType, Credentials, NewContent, TagSet};

// ─── Account ───────────────────────────────────────────────────────────────────

pub async fn signup(api: &ApiClient, credentials: &Credentials) -> Result<()> {
    api.signup(credentials)
        .await
        .with_context(|| format!("signing up '{}'", credentials.username))?;
    tracing::info!(username = %credentials.username, "account created");
    Ok(())
}

/// Sign in and persist the returned token. Returns the new session.
pub async fn signin(
    api: &ApiClient,
    store: &TokenStore,
    credentials: &Credentials,
) -> Result<Session> {
    let token = api
        .signin(credentials)
        .await
        .with_context(|| format!("signing in '{}'", credentials.username))?;
    store.save(&token).context("saving auth token")?;
    tracing::info!(username = %credentials.username, "signed in");
    Ok(Session::with_token(token))
}

/// Forget the stored token. Returns false if nobody was signed in.
pub fn signout(store: &TokenStore) -> Result<bool> {
    store.clear().context("clearing auth token")
}

// ─── Content ───────────────────────────────────────────────────────────────────

pub async fn add_content(
    api: &ApiClient,
    session: &Session,
    title: &str,
    link: &str,
    kind: ContentType,
    tags: &[String],
) -> Result<NewContent> {
    let content = build_content(title, link, kind, tags)?;
    api.add_content(session.token()?, &content)
        .await
        .context("adding content")?;
    tracing::info!(title = %content.title, kind = kind.label(), "content added");
    Ok(content)
}

/// Validate user input into a request body. Blank tags are skipped; duplicate
/// tags are an error.
pub fn build_content(
    title: &str,
    link: &str,
    kind: ContentType,
    tags: &[String],
) -> Result<NewContent> {
    let title = title.trim();
    let link = link.trim();
    if title.is_empty() {
        anyhow::bail!("title must not be empty");
    }
    if link.is_empty() {
        anyhow::bail!("link must not be empty");
    }

    let mut set = TagSet::new();
    for tag in tags {
        match set.add(tag) {
            Ok(_) => {}
            Err(ClientError::InvalidTag(_)) if tag.trim().is_empty() => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(NewContent {
        title: title.to_string(),
        link: link.to_string(),
        kind,
        tags: set.into_texts(),
    })
}

pub async fn list<S: ContentSource>(source: &S, session: &Session) -> Result<Vec<ContentItem>> {
    source
        .contents(session.token()?)
        .await
        .context("fetching content")
}

/// One-shot search, no debounce.
pub async fn search_once<S: ContentSource>(
    source: &S,
    session: &Session,
    term: &str,
) -> Result<Vec<ContentItem>> {
    source
        .search(session.token()?, term)
        .await
        .with_context(|| format!("searching for '{term}'"))
}

/// Turn on public sharing and return the share URL.
pub async fn share_brain(api: &ApiClient, session: &Session) -> Result<String> {
    api.share(session.token()?, true)
        .await
        .context("sharing brain")?
        .context("backend did not return a share hash")
}

pub async fn unshare_brain(api: &ApiClient, session: &Session) -> Result<()> {
    api.share(session.token()?, false)
        .await
        .context("disabling sharing")?;
    Ok(())
}

/// Only http(s) links are handed to the system opener.
pub fn is_openable_link(link: &str) -> bool {
    let link = link.trim();
    (link.starts_with("https://") || link.starts_with("http://")) && !link.contains(char::is_whitespace)
}

/// Open a bookmark's link in the default browser.
pub fn open_link(link: &str) -> Result<()> {
    if !is_openable_link(link) {
        anyhow::bail!("refusing to open non-http link '{link}'");
    }
    open::that_detached(link.trim()).with_context(|| format!("opening {link}"))
}
