// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use edge_preview::constants::APP_ID;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "edge-preview")]
#[command(about = "Real-time camera preview with switchable edge detection")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    #[command(flatten)]
    preview: cli::PreviewArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run in terminal mode (renders the preview to the terminal, default)
    Terminal,

    /// Run without a UI, logging FPS and status changes
    Run {
        /// Stop after this many seconds
        #[arg(short, long)]
        duration: Option<u64>,

        /// Flip processing on and off every N seconds
        #[arg(long)]
        toggle_every: Option<u64>,
    },

    /// Save one rendered preview frame as an image
    Snapshot {
        /// Number of captured frames to wait for before rendering
        #[arg(short, long, default_value = "5")]
        frames: u64,

        /// Output file or directory (default: ~/Pictures/edge-preview/IMG_TIMESTAMP.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show GPU, version and config details
    Info,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // The terminal viewer owns the screen, so its logs go to a file
    let terminal_mode = matches!(cli.command, None | Some(Commands::Terminal));
    init_logging(terminal_mode);

    let config = cli.preview.resolve()?;

    match cli.command {
        None | Some(Commands::Terminal) => edge_preview::terminal::run(config),
        Some(Commands::Run {
            duration,
            toggle_every,
        }) => cli::run_headless(config, duration, toggle_every),
        Some(Commands::Snapshot { frames, output }) => cli::take_snapshot(config, frames, output),
        Some(Commands::Info) => cli::print_info(&config),
    }
}

/// Initialize logging
///
/// Set RUST_LOG to control the level, e.g. `RUST_LOG=debug` or
/// `RUST_LOG=edge_preview=info`.
fn init_logging(to_file: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let log_file = to_file
        .then(|| dirs::cache_dir().map(|dir| dir.join(APP_ID)))
        .flatten()
        .and_then(|dir| {
            std::fs::create_dir_all(&dir).ok()?;
            std::fs::File::create(dir.join("terminal.log")).ok()
        });

    match log_file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init(),
        None if to_file => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::sink)
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .init(),
    }
}
