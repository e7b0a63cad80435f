// SPDX-License-Identifier: GPL-3.0-only

//! Terminal-based preview viewer
//!
//! Renders the offscreen preview surface to the terminal using Unicode
//! half-block characters for improved vertical resolution. The surface is
//! sized to the terminal grid so each cell shows exactly two surface pixels.

use crate::config::Config;
use crate::constants::{labels, terminal as timing};
use crate::media::unpack_rgb;
use crate::pipelines::preview::{ChannelDisplay, DisplayUpdate, ToggleState};
use crate::session::{self, PreviewSession, SurfaceImage};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::channel::mpsc::UnboundedReceiver;
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    widgets::Widget,
};
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Run the terminal preview viewer
pub fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Surface size matching a terminal area: one column per pixel, two pixels per row
fn surface_size_for(area: Rect) -> (u32, u32) {
    let width = area.width.max(1) as u32;
    let height = (area.height.saturating_sub(1).max(1) as u32) * 2;
    (width, height)
}

/// Status bar contents, fed by the pipeline's display updates
struct StatusLine {
    fps: String,
    status: &'static str,
    button: &'static str,
    message: Option<String>,
}

impl StatusLine {
    fn new(state: ToggleState) -> Self {
        Self {
            fps: labels::FPS_PLACEHOLDER.to_string(),
            status: state.status_text(),
            button: state.button_label(),
            message: None,
        }
    }

    fn apply(&mut self, update: DisplayUpdate) {
        match update {
            DisplayUpdate::Fps(text) => self.fps = text,
            DisplayUpdate::Status { status, button } => {
                self.status = status;
                self.button = button;
                self.message = None;
            }
        }
    }

    fn render_text(&self, show_help: bool, session: &PreviewSession) -> String {
        if show_help {
            return format!(
                "t: {} | p: Save snapshot | h: Toggle help | q/Ctrl+C: Quit",
                self.button
            );
        }
        if let Some(message) = &self.message {
            return message.clone();
        }
        let stats = session.capture_stats();
        format!(
            "{} | {} | {} | dropped {} | 't' {} | 'h' help | 'q' quit",
            self.fps,
            self.status,
            session.engine(),
            stats.dropped(),
            self.button
        )
    }
}

fn terminal_area(terminal: &Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<Rect> {
    let size = terminal.size()?;
    Ok(Rect::new(0, 0, size.width, size.height))
}

fn drain_updates(receiver: &mut UnboundedReceiver<DisplayUpdate>, status: &mut StatusLine) {
    while let Ok(update) = receiver.try_recv() {
        status.apply(update);
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let (surface_width, surface_height) = surface_size_for(terminal_area(terminal)?);
    config.surface_width = surface_width;
    config.surface_height = surface_height;

    let (display, mut updates) = ChannelDisplay::new();
    let mut session = PreviewSession::start(&config, Arc::new(display))?;
    info!(source = session.source_name(), "Terminal preview running");

    let mut status = StatusLine::new(session.toggle_state());
    let mut frame_widget = FrameWidget::new();
    let mut show_help = false;

    loop {
        drain_updates(&mut updates, &mut status);

        let (width, height) = surface_size_for(terminal_area(terminal)?);
        session.resize_surface(width, height);

        if session.has_frame() {
            match session.render_and_read() {
                Ok(image) => frame_widget.update(image),
                Err(e) => {
                    error!(error = %e, "Preview render failed");
                    return Err(e.into());
                }
            }
        }

        let status_text = status.render_text(show_help, &session);

        // Draw
        terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let preview_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(1),
            };

            f.render_widget(&frame_widget, preview_area);

            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };

            f.render_widget(
                StatusBar {
                    message: &status_text,
                },
                status_area,
            );
        })?;

        // Handle input with timeout for frame updates
        if event::poll(timing::INPUT_POLL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Char('t') | KeyCode::Char(' ') => {
                    show_help = false;
                    session.toggle_processing();
                }
                KeyCode::Char('p') => {
                    show_help = false;
                    if let Some(image) = &frame_widget.image {
                        status.message = Some(match save_snapshot(image) {
                            Ok(path) => format!("Saved: {}", path.display()),
                            Err(e) => {
                                error!("Failed to save snapshot: {}", e);
                                format!("Error: {}", e)
                            }
                        });
                    }
                }
                KeyCode::Char('h') => show_help = !show_help,
                _ => {}
            }
        }
    }

    session.stop();
    Ok(())
}

/// Save the current surface as a PNG in the pictures directory
fn save_snapshot(image: &SurfaceImage) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let dir = session::snapshot_dir();
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(session::snapshot_file_name());
    image.to_rgba_image()?.save(&path)?;
    info!(path = %path.display(), "Snapshot saved");
    Ok(path)
}

/// Widget that renders the read-back surface using half-block characters
struct FrameWidget {
    image: Option<SurfaceImage>,
}

impl FrameWidget {
    fn new() -> Self {
        Self { image: None }
    }

    fn update(&mut self, image: SurfaceImage) {
        self.image = Some(image);
    }
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(image) = &self.image else {
            // No frame yet - show placeholder
            let msg = "Waiting for frames...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, ratatui::style::Style::default());
            }
            return;
        };

        // The renderer already letterboxed the frame; map surface pixels to cells
        let x_scale = image.width as f64 / area.width.max(1) as f64;
        let y_scale = image.height as f64 / (area.height.max(1) as f64 * 2.0);

        // Upper half (▀) colored with fg, lower half with bg
        for ty in 0..area.height {
            for tx in 0..area.width {
                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                if let Some(cell) = buf.cell_mut((area.x + tx, area.y + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(to_color(image.pixel(src_x, src_y_top)));
                    cell.set_bg(to_color(image.pixel(src_x, src_y_bottom)));
                }
            }
        }
    }
}

fn to_color(pixel: u32) -> Color {
    let (r, g, b) = unpack_rgb(pixel);
    Color::Rgb(r, g, b)
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();

        buf.set_string(
            area.x,
            area.y,
            text,
            ratatui::style::Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray),
        );
    }
}
