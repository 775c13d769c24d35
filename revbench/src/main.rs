//! revbench: a terminal workbench for reviewing code with an assistant.
//!
//! Entry point for the `revbench` binary. Wires together the terminal
//! lifecycle (`tui`), the event bus (`event`), the panels (`ui`), the
//! highlight/diff thread (`render`), background network work (`tasks`), and
//! the project store from `revbench-core`.
//!
//! # Startup sequence
//!
//! 1. Parse the CLI, open the log file, load config. Nothing here touches the
//!    terminal, so errors still print normally.
//! 2. Open the SQLite store and load saved projects. A store that cannot be
//!    opened is replaced by an in-memory one for the session.
//! 3. `install_panic_hook()`, then `register_sigterm()`, then `init_tui()`.
//! 4. Spawn the event task and the render thread, then enter the loop.
//!
//! `restore_tui()` runs at the single exit point after the loop. The `?`
//! operator is only used before `init_tui()`; inside the loop, errors break.

mod app;
mod editor;
mod event;
mod render;
mod tasks;
mod theme;
mod tui;
mod ui;

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Mutex;
use std::time::Instant;

use clap::Parser;
use revbench_core::assistant::AssistantClient;
use revbench_core::ingest::GitHubClient;
use revbench_core::workbench::Workbench;
use revbench_core::{config, db};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::AppState;
use crate::event::AppEvent;
use crate::tasks::{Command, Services};
use crate::ui::keybindings::{handle_key, handle_mouse, KeyAction};

const STATE_DIR: &str = ".revbench";
const DEFAULT_LOG_FILTER: &str = "revbench=info,revbench_core=info";

/// Review code side by side with an assistant in the terminal.
#[derive(Debug, Parser)]
#[command(name = "revbench", version, about)]
struct Cli {
    /// Import a GitHub repository on startup (owner/repo or URL).
    #[arg(long, conflicts_with = "folder")]
    github: Option<String>,

    /// Import a local folder on startup.
    #[arg(long)]
    folder: Option<PathBuf>,

    /// Name for the imported project.
    #[arg(long)]
    name: Option<String>,

    /// Config file path.
    #[arg(long, env = "REVBENCH_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database path; overrides `db_path` from the config.
    #[arg(long)]
    db: Option<String>,
}

impl Cli {
    fn startup_import(&self) -> Option<Command> {
        let name = self.name.clone();
        if let Some(url) = &self.github {
            return Some(Command::ImportGithub { url: url.clone(), name });
        }
        self.folder.clone().map(|path| Command::ImportFolder { path, name })
    }
}

/// Sends `tracing` output to `.revbench/revbench.log`; the terminal belongs
/// to the TUI.
fn init_logging() -> std::io::Result<()> {
    std::fs::create_dir_all(STATE_DIR)?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(PathBuf::from(STATE_DIR).join("revbench.log"))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(std::io::Error::other)
}

async fn save(conn: Option<&tokio_rusqlite::Connection>, state: &AppState) {
    let Some(conn) = conn else {
        return;
    };
    if let Err(e) = db::save_projects(conn, state.bench.projects()).await {
        warn!(error = %e, "saving projects failed");
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let config_path = cli.config.clone().unwrap_or_else(config::config_path);
    let config = config::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "config unreadable; using defaults");
        config::Config::default()
    });
    let theme = theme::Theme::from_name(&config.theme);

    let db_path = cli.db.clone().unwrap_or_else(|| config.db_path.clone());
    let conn = db::open_db_or_memory(&db_path).await;
    let projects = match &conn {
        Some(conn) => db::load_projects_or_empty(conn).await,
        None => Vec::new(),
    };
    info!(db = %db_path, projects = projects.len(), "revbench starting");

    let mut state = AppState::new(Workbench::new(projects, config.limits()));
    let assistant = AssistantClient::from_config(&config.assistant).map_err(std::io::Error::other)?;
    let github = GitHubClient::from_config(&config.github).map_err(std::io::Error::other)?;
    if config.assistant.api_key().is_none() {
        warn!(env = %config.assistant.api_key_env, "no assistant API key set");
    }

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm()?;
    let mut terminal = tui::init_tui()?;

    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let mut rx = handler.rx;

    let (render_tx, render_rx) = crossbeam_channel::unbounded();
    let render_events = handler.tx.clone();
    std::thread::spawn(move || render::worker::render_worker_loop(render_rx, render_events));

    let services = Services { assistant, github, tx: handler.tx.clone() };
    if let Some(command) = cli.startup_import() {
        services.dispatch(command, &mut state);
    }

    let mut saved_revision = state.bench.revision();

    // Exits only via `break`, so `restore_tui()` below is always reached.
    'event_loop: loop {
        let Some(event) = rx.recv().await else {
            break 'event_loop;
        };
        match event {
            AppEvent::Render => {
                if let Err(e) = terminal.draw(|frame| ui::render(frame, &mut state, &theme)) {
                    warn!(error = %e, "draw failed");
                    break 'event_loop;
                }
            }
            AppEvent::Key(key) => match handle_key(key, &mut state) {
                KeyAction::Continue => {}
                KeyAction::Quit => break 'event_loop,
                KeyAction::Spawn(command) => services.dispatch(command, &mut state),
            },
            AppEvent::Mouse(mouse) => {
                handle_mouse(mouse, &mut state);
            }
            AppEvent::Resize(_, _) => {}
            AppEvent::Apply(action) => state.apply(*action),
            AppEvent::Imported(result) => tasks::finish_import(&mut state, result),
            AppEvent::Rendered(view) => state.accept_view(*view),
            AppEvent::Tick => {
                if !state.bench.notices().is_empty() {
                    state.apply(revbench_core::Action::ExpireNotices { now: Instant::now() });
                }
                let revision = state.bench.revision();
                if revision != saved_revision {
                    save(conn.as_ref(), &state).await;
                    saved_revision = revision;
                }
            }
        }

        if let Some(request) = state.view_request() {
            let _ = render_tx.send(request);
        }
        if term_flag.load(Ordering::Relaxed) {
            break 'event_loop;
        }
    }

    if state.bench.revision() != saved_revision {
        save(conn.as_ref(), &state).await;
    }
    info!("revbench exiting");
    tui::restore_tui()?;
    Ok(())
}
