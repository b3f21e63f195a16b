pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod debounce;
pub mod error;
pub mod reconciler;
pub mod refresher;
pub mod session;
pub mod types;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::api::ApiClient;
use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::session::{Session, TokenStore};
use crate::types::Credentials;

pub use crate::api::ContentSource;
pub use crate::error::{ClientError, SEARCH_FAILED};
pub use crate::reconciler::{DisplaySelection, Reconciler, ReconcilerOptions, SearchState};

fn init_tracing() {
    // Only log WARN and above in release builds so saved links and search
    // terms stay out of the terminal. RUST_LOG still wins when set.
    #[cfg(debug_assertions)]
    let default_level = "debug";
    #[cfg(not(debug_assertions))]
    let default_level = "warn";

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = cli.config();
    config.validate()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting tokio runtime")?;
    runtime.block_on(dispatch(cli.command, config))
}

async fn dispatch(command: Command, config: Config) -> Result<()> {
    let api = ApiClient::new(&config.backend_url)?;
    let store_path = config.token_store_path();
    let store = TokenStore::open(&store_path)
        .with_context(|| format!("opening session store at {}", store_path.display()))?;
    let session = Session::load(&store)?;
    tracing::debug!(backend = %config.backend_url, signed_in = session.is_signed_in(), "starting");

    match command {
        Command::Signup(args) => {
            let credentials = Credentials {
                username: args.username,
                password: args.password,
            };
            commands::signup(&api, &credentials).await?;
            println!("Account created. Sign in with `brainly signin`.");
        }
        Command::Signin(args) => {
            let credentials = Credentials {
                username: args.username,
                password: args.password,
            };
            commands::signin(&api, &store, &credentials).await?;
            println!("Signed in.");
        }
        Command::Signout => {
            if commands::signout(&store)? {
                println!("Signed out.");
            } else {
                println!("Not signed in.");
            }
        }
        Command::Add {
            title,
            link,
            kind,
            tags,
        } => {
            commands::add_content(&api, &session, &title, &link, kind, &tags).await?;
            println!("Saved.");
        }
        Command::List => {
            let items = commands::list(&api, &session).await?;
            print!("{}", dashboard::render(&SearchState::default(), &DisplaySelection::Full(items)));
        }
        Command::Search { term } => {
            let items = commands::search_once(&api, &session, &term).await?;
            let search = SearchState {
                raw_term: term,
                ..Default::default()
            };
            print!("{}", dashboard::render(&search, &DisplaySelection::Search(items)));
        }
        Command::Share { off } => {
            if off {
                commands::unshare_brain(&api, &session).await?;
                println!("Sharing disabled.");
            } else {
                let url = commands::share_brain(&api, &session).await?;
                println!("{url}");
            }
        }
        Command::Open { index } => {
            let items = commands::list(&api, &session).await?;
            let item = index
                .checked_sub(1)
                .and_then(|i| items.get(i))
                .with_context(|| format!("no saved item #{index}"))?;
            commands::open_link(&item.link)?;
        }
        Command::Dashboard => {
            session.token()?;
            let dashboard = Dashboard::mount(
                api,
                session,
                config.reconciler_options(),
                config.refresh_interval,
            );
            dashboard::run_interactive(dashboard).await?;
        }
    }
    Ok(())
}
