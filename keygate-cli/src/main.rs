//! Key Gate CLI - Interactive frontend for the key gate
//!
//! Presents the gate widget in a terminal: a referrer check on entry, then an
//! event loop over user commands (generate, copy, revoke, quit) and countdown
//! ticks. All key state lives in the persistent storage slot; the loop only
//! renders the view the controller derives from it.
//!
//! # Features
//!
//! - Referrer gating with development bypass (direct access and localhost)
//! - 24-hour access keys with a live "Expires in Hh Mm" countdown
//! - Clipboard copy with a transient acknowledgement
//! - Revocation behind a blocking confirmation prompt

use anyhow::{Context, Result};
use clap::Parser;
use keygate_core::{
    clock::SystemClock,
    config::GateConfig,
    controller::{Clipboard, ConfirmPrompt, GateView, KeyGateController},
    store::FileStore,
};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc::unbounded_channel;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "keygate")]
#[command(about = "Key Gate - referrer-gated access-code generator", long_about = None)]
struct Args {
    /// Path to configuration file (ignored if --env-mode is set)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Load configuration from environment variables instead of file
    #[arg(long, default_value = "false")]
    env_mode: bool,

    /// Referring-page URL for this session (absent = direct access)
    #[arg(short, long)]
    referrer: Option<String>,
}

/// System clipboard; failures are logged and otherwise unobserved
struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn set_text(&self, text: &str) -> keygate_core::Result<()> {
        arboard::Clipboard::new()
            .and_then(|mut clipboard| clipboard.set_text(text.to_string()))
            .map_err(|e| keygate_core::Error::Clipboard(e.to_string()))
    }
}

/// Blocking y/N prompt on the terminal
struct TerminalConfirm;

impl ConfirmPrompt for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{} [y/N] ", prompt);
        let _ = std::io::stdout().flush();

        let mut answer = String::new();
        if std::io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim(), "y" | "Y" | "yes" | "Yes")
    }
}

/// Single rendering function driven by the controller's view
fn render(view: &GateView) {
    match view {
        GateView::Closed => {
            println!("Access denied.");
            println!("This page must be reached through the trusted referrer.");
        }
        GateView::Locked => {
            println!();
            println!("No active key.");
            println!("  [g] generate a key   [q] quit");
        }
        GateView::Unlocked { key, remaining } => {
            println!();
            println!("Access key: {}", key);
            println!("{}", remaining);
            println!("  [c] copy   [g] regenerate   [r] revoke   [q] quit");
        }
    }
}

/// Show the copy acknowledgement, clearing it after two seconds
fn acknowledge_copy() {
    print!("Copied to clipboard!");
    let _ = std::io::stdout().flush();

    tokio::spawn(async {
        tokio::time::sleep(Duration::from_secs(2)).await;
        print!("\r{:22}\r", "");
        let _ = std::io::stdout().flush();
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = args
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::WARN);

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    info!("Key Gate v{}", keygate_core::VERSION);

    // Load configuration
    let config = if args.env_mode {
        debug!("Loading configuration from environment variables");
        GateConfig::from_env().context("Failed to load configuration from environment")?
    } else if let Some(path) = &args.config {
        debug!("Loading configuration from file: {:?}", path);
        GateConfig::from_file(path).context("Failed to load configuration from file")?
    } else {
        GateConfig::default()
    };

    // Resolve the storage slot
    let slot_path = match &config.storage_path {
        Some(path) => path.clone(),
        None => FileStore::default_path().context("Failed to resolve storage path")?,
    };
    debug!("Storage slot: {}", slot_path.display());
    let store = FileStore::new(slot_path);

    let (tick_tx, mut ticks) = unbounded_channel();
    let mut controller = KeyGateController::new(
        config,
        Box::new(store),
        Box::new(SystemClock),
        Box::new(SystemClipboard),
        Box::new(TerminalConfirm),
        args.referrer.as_deref(),
        tick_tx,
    );

    // The closed gate is terminal for the session
    if !controller.gate_open() {
        render(&GateView::Closed);
        return Ok(());
    }

    render(&controller.refresh());

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                match line.trim() {
                    "g" => render(&controller.generate()),
                    "c" => {
                        if controller.copy_key() {
                            acknowledge_copy();
                        } else {
                            println!("No key to copy.");
                        }
                    }
                    "r" => render(&controller.revoke()),
                    "q" | "exit" => break,
                    "" => {}
                    other => println!("Unknown command: {}", other),
                }
            }
            Some(()) = ticks.recv() => {
                render(&controller.handle_tick());
            }
        }
    }

    Ok(())
}
