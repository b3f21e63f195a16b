use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Config;
use crate::types::ContentType;

#[derive(Parser, Debug)]
#[command(name = "brainly", version, about = "Save, tag, search and share your bookmarks")]
pub struct Cli {
    /// Backend base URL (overrides BRAINLY_BACKEND_URL)
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Directory holding the session store (overrides BRAINLY_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Search debounce in milliseconds
    #[arg(long, global = true)]
    pub debounce_ms: Option<u64>,

    /// Content refresh interval in milliseconds
    #[arg(long, global = true)]
    pub refresh_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account
    Signup(CredentialArgs),
    /// Sign in and remember the session
    Signin(CredentialArgs),
    /// Forget the stored session
    Signout,
    /// Save a new bookmark
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        link: String,
        /// youtube, twitter or linkedin
        #[arg(long = "type", default_value = "youtube")]
        kind: ContentType,
        /// Repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// List all saved content
    List,
    /// Search once and print the results
    Search { term: String },
    /// Share your brain and print the public link
    Share {
        /// Turn sharing off instead
        #[arg(long)]
        off: bool,
    },
    /// Open the N-th saved link in the browser
    Open { index: usize },
    /// Interactive dashboard with search-as-you-type
    Dashboard,
}

#[derive(Args, Debug)]
pub struct CredentialArgs {
    #[arg(long, short)]
    pub username: String,
    #[arg(long, short)]
    pub password: String,
}

impl Cli {
    /// Environment config with flags layered on top.
    pub fn config(&self) -> Config {
        let mut config = Config::load();
        if let Some(url) = &self.backend {
            config.backend_url = url.clone();
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(ms) = self.debounce_ms {
            config.debounce = std::time::Duration::from_millis(ms);
        }
        if let Some(ms) = self.refresh_ms {
            config.refresh_interval = std::time::Duration::from_millis(ms);
        }
        config
    }
}
