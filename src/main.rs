use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod chat;
mod client;
mod config;
mod error;
mod handler;
mod markdown;
mod tui;
mod ui;

use app::App;
use client::ChatClient;
use config::Config;

#[derive(Parser)]
#[command(name = "agrichat")]
#[command(about = "Chat with AgriChat Buddy, your AI partner for sustainable farming")]
#[command(version)]
struct Cli {
    /// Base URL of the chatbot backend (the `/chat` route is appended)
    #[arg(short, long, env = "AGRICHAT_ENDPOINT")]
    endpoint: Option<String>,

    /// Give up on a reply after this many seconds (default: no limit)
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Where to write logs
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    debug: bool,
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_logging(config: &Config, debug: bool) -> Result<PathBuf> {
    let log_path = config.log_path()?;
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let log_file = OpenOptions::new().create(true).append(true).open(&log_path)?;

    let default_filter = if debug { "agrichat=debug" } else { "agrichat=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    Ok(log_path)
}

fn build_client(config: &Config) -> Result<ChatClient> {
    match config.timeout_secs {
        Some(secs) => ChatClient::with_timeout(config.endpoint(), Duration::from_secs(secs)),
        None => Ok(ChatClient::new(config.endpoint())),
    }
}

async fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = tui::EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
        app.poll_reply().await;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (file_config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::new(), Some(e)),
    };
    let config = file_config.merge(cli.endpoint, cli.timeout, cli.log_file);

    let log_path = init_logging(&config, cli.debug)?;
    if let Some(e) = config_error {
        warn!(error = %e, "could not read config file, using defaults");
    }
    info!(endpoint = config.endpoint(), log = %log_path.display(), "starting agrichat");

    let mut app = App::new(build_client(&config)?);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    info!(messages = app.conversation.messages().len(), "exiting");
    result
}
