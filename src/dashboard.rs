use std::fmt::Write as _;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::api::{ApiClient, ContentSource};
use crate::reconciler::{DisplaySelection, Reconciler, ReconcilerOptions, SearchState};
use crate::refresher::Refresher;
use crate::session::Session;

/// One mounted dashboard view: the reconciler plus the content refresh that
/// feeds it. Both timers live exactly as long as the dashboard.
pub struct Dashboard<S: ContentSource> {
    reconciler: Reconciler<S>,
    refresher: Refresher,
}

impl<S: ContentSource> Dashboard<S> {
    pub fn mount(
        source: S,
        session: Session,
        options: ReconcilerOptions,
        refresh_interval: Duration,
    ) -> Self {
        let reconciler = Reconciler::new(source, session, options);
        let refresher = Refresher::start(reconciler.clone(), refresh_interval);
        tracing::debug!(?options, ?refresh_interval, "dashboard mounted");
        Self {
            reconciler,
            refresher,
        }
    }

    pub fn reconciler(&self) -> &Reconciler<S> {
        &self.reconciler
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresher.is_running()
    }

    /// Tear down both timers and drop any in-flight search.
    pub async fn unmount(mut self) {
        self.refresher.stop();
        self.reconciler.shutdown().await;
        tracing::debug!("dashboard unmounted");
    }
}

impl<S: ContentSource> Drop for Dashboard<S> {
    fn drop(&mut self) {
        self.refresher.stop();
        self.reconciler.close();
    }
}

/// A line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Replaces the search box contents.
    Term(String),
    Enter,
    Clear,
    Open(usize),
    Share,
    Quit,
    Help,
}

pub fn parse_line(line: &str) -> Input {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    let Some(command) = trimmed.strip_prefix('/') else {
        return Input::Term(trimmed.to_string());
    };
    let mut parts = command.split_whitespace();
    match parts.next().unwrap_or_default() {
        "enter" | "e" => Input::Enter,
        "clear" | "c" => Input::Clear,
        "share" => Input::Share,
        "quit" | "q" | "exit" => Input::Quit,
        "open" | "o" => match parts.next().and_then(|n| n.parse::<usize>().ok()) {
            Some(n) if n > 0 => Input::Open(n),
            _ => Input::Help,
        },
        "help" | "h" | "?" => Input::Help,
        // Anything else starting with a slash is searched for literally.
        _ => Input::Term(trimmed.to_string()),
    }
}

pub const HELP: &str = "\
Type to search (each line replaces the search box).
  /enter        search now
  /clear        back to all content
  /open N       open the N-th card's link
  /share        share your brain
  /quit         leave";

/// Text rendering of the current view.
pub fn render(search: &SearchState, view: &DisplaySelection) -> String {
    let mut out = String::new();
    match view {
        DisplaySelection::Full(items) => {
            let _ = writeln!(out, "── All content ({}) ──", items.len());
        }
        DisplaySelection::Search(items) => {
            let _ = writeln!(out, "── Search \"{}\" ({}) ──", search.raw_term, items.len());
        }
    }
    if search.is_searching {
        let _ = writeln!(out, "searching…");
    }
    if let Some(error) = &search.error {
        let _ = writeln!(out, "! {error}");
    }
    if view.items().is_empty() && !search.is_searching {
        let _ = writeln!(
            out,
            "{}",
            if view.is_search() { "No results." } else { "Nothing saved yet." }
        );
    }
    for (i, item) in view.items().iter().enumerate() {
        let _ = write!(out, "{:>3}. [{}] {}  {}", i + 1, item.kind.label(), item.title, item.link);
        let tags: Vec<String> = item
            .tags
            .iter()
            .filter(|t| !t.text.is_empty())
            .take(4)
            .map(|t| format!("#{}", t.text))
            .collect();
        if !tags.is_empty() {
            let _ = write!(out, "  {}", tags.join(" "));
        }
        out.push('\n');
    }
    out
}

/// Run the interactive dashboard on stdin/stdout until `/quit` or EOF.
pub async fn run_interactive(dashboard: Dashboard<ApiClient>) -> Result<()> {
    let reconciler = dashboard.reconciler().clone();
    let mut changes = reconciler.subscribe();

    let painter = {
        let reconciler = reconciler.clone();
        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let search = reconciler.snapshot().await;
                let view = reconciler.view().await;
                println!("{}", render(&search, &view));
            }
        })
    };

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading input")? {
        match parse_line(&line) {
            Input::Term(term) => reconciler.set_term(term).await,
            Input::Enter => reconciler.submit().await,
            Input::Clear => reconciler.clear_search().await,
            Input::Open(n) => {
                let view = reconciler.view().await;
                match view.items().get(n - 1) {
                    Some(item) => {
                        if let Err(e) = crate::commands::open_link(&item.link) {
                            println!("! {e:#}");
                        }
                    }
                    None => println!("! no card #{n}"),
                }
            }
            Input::Share => {
                match crate::commands::share_brain(reconciler.source(), reconciler.session()).await {
                    Ok(url) => println!("Share link: {url}"),
                    Err(e) => println!("! {e:#}"),
                }
            }
            Input::Help => println!("{HELP}"),
            Input::Quit => break,
        }
    }

    painter.abort();
    dashboard.unmount().await;
    Ok(())
}
