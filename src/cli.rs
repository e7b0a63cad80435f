// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for the preview
//!
//! This module provides command-line functionality for:
//! - Running the preview headless (FPS and status go to the log)
//! - Saving a snapshot of the rendered surface
//! - Printing GPU and configuration info

use clap::Args;
use edge_preview::config::{Config, SourceSettings};
use edge_preview::gpu;
use edge_preview::pipelines::preview::{LogDisplay, RawDisplay};
use edge_preview::processing::EngineKind;
use edge_preview::session::{self, PreviewSession};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Overrides applied on top of the loaded config
#[derive(Args, Debug, Default)]
pub struct PreviewArgs {
    /// Config file (default: ~/.config/edge-preview/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Processing engine: edges, invert, passthrough
    #[arg(short, long, global = true)]
    pub engine: Option<EngineKind>,

    /// What raw mode shows: luma, color, freeze
    #[arg(long, global = true)]
    pub raw_display: Option<RawDisplay>,

    /// Replay a still image instead of the synthetic pattern
    #[arg(long, global = true)]
    pub image: Option<PathBuf>,

    /// Capture rate in frames per second
    #[arg(long, global = true)]
    pub fps: Option<u32>,

    /// Capture size as WIDTHxHEIGHT
    #[arg(long, global = true, value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Edge gradient threshold
    #[arg(long, global = true)]
    pub threshold: Option<f32>,

    /// Start with processing off
    #[arg(long, global = true)]
    pub raw: bool,

    /// Do not mirror the preview
    #[arg(long, global = true)]
    pub no_mirror: bool,
}

impl PreviewArgs {
    /// Load the config file and apply command line overrides
    pub fn resolve(&self) -> Result<Config, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        };

        if let Some(engine) = self.engine {
            config.engine = engine;
        }
        if let Some(raw_display) = self.raw_display {
            config.raw_display = raw_display;
        }
        if let Some(path) = &self.image {
            config.source = SourceSettings::Image { path: path.clone() };
        }
        if let Some(fps) = self.fps {
            config.capture_fps = fps;
        }
        if let Some((width, height)) = self.size {
            config.capture_width = width;
            config.capture_height = height;
        }
        if let Some(threshold) = self.threshold {
            config.edge_threshold = threshold;
        }
        if self.raw {
            config.processing_enabled = false;
        }
        if self.no_mirror {
            config.mirror_preview = false;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Parse `WIDTHxHEIGHT`
fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("Expected WIDTHxHEIGHT, got '{}'", s))?;
    let width = w.trim().parse().map_err(|e| format!("Bad width: {}", e))?;
    let height = h.trim().parse().map_err(|e| format!("Bad height: {}", e))?;
    Ok((width, height))
}

/// Run the preview without a UI until the duration elapses or Ctrl+C
pub fn run_headless(
    config: Config,
    duration: Option<u64>,
    toggle_every: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))?;

    let mut session = PreviewSession::start(&config, Arc::new(LogDisplay))?;
    println!("Source: {}", session.source_name());
    println!("GPU: {}", session.gpu_info());
    println!("Press Ctrl+C to stop");

    let start = Instant::now();
    let limit = duration.map(Duration::from_secs);
    let toggle_interval = toggle_every.map(Duration::from_secs);
    let mut last_toggle = start;

    while running.load(Ordering::SeqCst) {
        if limit.is_some_and(|limit| start.elapsed() >= limit) {
            break;
        }
        if let Some(interval) = toggle_interval
            && last_toggle.elapsed() >= interval
        {
            session.toggle_processing();
            last_toggle = Instant::now();
        }

        session.render()?;
        std::thread::sleep(edge_preview::constants::surface::REDRAW_INTERVAL);
    }

    session.stop();
    let stats = session.capture_stats();
    println!(
        "Ran {:.1}s: {} frames, {} dropped, {} failed, last FPS {:.1}, last pass {:?}",
        start.elapsed().as_secs_f32(),
        stats.delivered(),
        stats.dropped(),
        stats.failed(),
        session.fps(),
        stats.last_pass()
    );
    Ok(())
}

/// Render after `frames` captured frames and save the surface
pub fn take_snapshot(
    config: Config,
    frames: u64,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = PreviewSession::start(&config, Arc::new(LogDisplay))?;
    println!("Source: {}", session.source_name());

    let wanted = frames.max(1);
    let timeout = Duration::from_secs(5);
    let start = Instant::now();
    while session.capture_stats().delivered() < wanted || !session.has_frame() {
        if start.elapsed() > timeout {
            return Err(format!(
                "Only {} of {} frames arrived within {:?}",
                session.capture_stats().delivered(),
                wanted,
                timeout
            )
            .into());
        }
        std::thread::sleep(Duration::from_millis(16));
    }

    let image = session.render_and_read()?;
    session.stop();

    let path = match output {
        Some(path) if path.is_dir() => path.join(session::snapshot_file_name()),
        Some(path) => path,
        None => session::snapshot_dir().join(session::snapshot_file_name()),
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    image.to_rgba_image()?.save(&path)?;
    println!(
        "Snapshot saved: {} ({}x{}, {})",
        path.display(),
        image.width,
        image.height,
        session.toggle_state().status_text()
    );
    Ok(())
}

/// Print version, GPU and config details
pub fn print_info(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("edge-preview {}", env!("GIT_VERSION"));
    println!();

    match gpu::create_device_blocking("edge-preview info") {
        Ok(ctx) => println!("GPU: {}", ctx.info),
        Err(e) => println!("GPU: unavailable ({})", e),
    }

    match Config::default_path() {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: none"),
    }
    println!("Snapshot directory: {}", session::snapshot_dir().display());
    println!();

    let engines: Vec<&str> = EngineKind::ALL.iter().map(|e| e.display_name()).collect();
    println!("Engines: {}", engines.join(", "));
    println!("Active config:");
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("640x480"), Ok((640, 480)));
        assert_eq!(parse_size("1280X720"), Ok((1280, 720)));
        assert!(parse_size("640").is_err());
        assert!(parse_size("ax480").is_err());
    }

    #[test]
    fn test_overrides_apply() {
        let args = PreviewArgs {
            config: Some(std::env::temp_dir().join("edge-preview-cli-missing.json")),
            engine: Some(EngineKind::Invert),
            size: Some((320, 240)),
            raw: true,
            no_mirror: true,
            ..Default::default()
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.engine, EngineKind::Invert);
        assert_eq!((config.capture_width, config.capture_height), (320, 240));
        assert!(!config.processing_enabled);
        assert!(!config.mirror_preview);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = PreviewArgs {
            config: Some(std::env::temp_dir().join("edge-preview-cli-missing.json")),
            fps: Some(0),
            ..Default::default()
        };
        assert!(args.resolve().is_err());
    }
}
