use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{ClientError, Result};
use crate::reconciler::{ReconcilerOptions, DEFAULT_DEBOUNCE, MIN_QUERY_LEN};
use crate::refresher::REFRESH_INTERVAL;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";

/// Runtime configuration. Loaded from `BRAINLY_*` environment variables with
/// defaults, then overridden by command-line flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend_url: String,
    pub data_dir: PathBuf,
    pub debounce: Duration,
    pub refresh_interval: Duration,
}

impl Config {
    pub fn load() -> Self {
        Self {
            backend_url: try_load("BRAINLY_BACKEND_URL", DEFAULT_BACKEND_URL.to_string()),
            data_dir: env::var("BRAINLY_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_data_dir()),
            debounce: Duration::from_millis(try_load(
                "BRAINLY_DEBOUNCE_MS",
                DEFAULT_DEBOUNCE.as_millis() as u64,
            )),
            refresh_interval: Duration::from_millis(try_load(
                "BRAINLY_REFRESH_MS",
                REFRESH_INTERVAL.as_millis() as u64,
            )),
        }
    }

    /// Check values that would make the client misbehave rather than fail.
    pub fn validate(&self) -> Result<()> {
        if !(self.backend_url.starts_with("http://") || self.backend_url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "backend url must start with http:// or https://, got '{}'",
                self.backend_url
            )));
        }
        if self.refresh_interval.is_zero() {
            return Err(ClientError::Config("refresh interval must be positive".to_string()));
        }
        Ok(())
    }

    pub fn token_store_path(&self) -> PathBuf {
        self.data_dir.join("session.sqlite")
    }

    pub fn reconciler_options(&self) -> ReconcilerOptions {
        ReconcilerOptions {
            debounce: self.debounce,
            min_query_len: MIN_QUERY_LEN,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("brainly")
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    parse_or_default(key, env::var(key).ok().as_deref(), default)
}

/// Parse a raw setting, falling back to `default` when unset or invalid.
fn parse_or_default<T>(key: &str, raw: Option<&str>, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match raw {
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value '{raw}': {e}, using default: {default}");
            default
        }),
        None => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}
