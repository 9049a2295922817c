//! sysinspect - interactive hardware telemetry inspector
//!
//! Captures one immutable snapshot of host hardware facts (CPU, memory,
//! GPU controllers, displays, battery) at startup, then lets the user
//! browse it through text menus and copy any category to the clipboard
//! as pretty-printed JSON.

mod clipboard;
mod format;
mod hardware;
mod menu;
mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::clipboard::SystemClipboard;
use crate::hardware::SystemSnapshot;
use crate::menu::Navigator;

/// Inspect host hardware telemetry from the terminal
#[derive(Parser)]
#[command(name = "sysinspect")]
#[command(version)]
#[command(about = "Browse host hardware telemetry and copy it as JSON")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the full telemetry snapshot as pretty JSON and exit
    Snapshot,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    // One blocking capture per process; a failure here is fatal.
    let snapshot = SystemSnapshot::capture().context("could not capture system telemetry")?;

    match cli.command {
        Some(Commands::Snapshot) => {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        None => {
            let mut navigator = Navigator::new(snapshot, SystemClipboard::new());
            navigator.run()?;
        }
    }
    Ok(())
}

fn init_tracing() {
    // Default to warn so log lines never interleave with the menus;
    // RUST_LOG overrides for debugging detection fallbacks.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
