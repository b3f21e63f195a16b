use thiserror::Error;

/// Message shown to the user for any failed search. Transport, auth and
/// server errors all collapse into this one string.
pub const SEARCH_FAILED: &str = "Search failed. Please try again.";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("not signed in")]
    NotSignedIn,

    #[error("token store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid tag: {0}")]
    InvalidTag(String),
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
