use std::fmt;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use crate::error::{ClientError, Result};

const TOKEN_KEY: &str = "token";

/// Opaque credential handed out by `/signin`. Sent verbatim as the
/// `Authorization` header value.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Never print the token itself.
impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Small key/value store on SQLite holding the signed-in user's token
/// between runs.
pub struct TokenStore {
    conn: Connection,
}

impl TokenStore {
    /// Open (or create) the store at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA busy_timeout = 5000;
             CREATE TABLE IF NOT EXISTS kv (
                 key   TEXT PRIMARY KEY,
                 value TEXT NOT NULL
             );",
        )?;
        Ok(Self { conn })
    }

    /// In-memory store, nothing survives the process.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("CREATE TABLE kv (key TEXT PRIMARY KEY, value TEXT NOT NULL);")?;
        Ok(Self { conn })
    }

    pub fn load(&self) -> Result<Option<AuthToken>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [TOKEN_KEY], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value.filter(|v| !v.is_empty()).map(AuthToken))
    }

    pub fn save(&self, token: &AuthToken) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [TOKEN_KEY, token.as_str()],
        )?;
        Ok(())
    }

    /// Returns true if a token was removed.
    pub fn clear(&self) -> Result<bool> {
        let removed = self.conn.execute("DELETE FROM kv WHERE key = ?1", [TOKEN_KEY])?;
        Ok(removed > 0)
    }
}

/// The credential context passed explicitly to every authenticated call.
/// Loaded once from the [`TokenStore`]; nothing reads the store behind the
/// caller's back.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Option<AuthToken>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    pub fn with_token(token: AuthToken) -> Self {
        Self { token: Some(token) }
    }

    pub fn load(store: &TokenStore) -> Result<Self> {
        Ok(Self { token: store.load()? })
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    /// Scoped accessor for the credential.
    pub fn token(&self) -> Result<&AuthToken> {
        self.token.as_ref().ok_or(ClientError::NotSignedIn)
    }
}
