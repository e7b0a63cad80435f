// SPDX-License-Identifier: GPL-3.0-only

//! Text outputs of the pipeline (FPS label, status line)

use super::toggle::ToggleState;
use futures::channel::mpsc;
use tracing::{debug, info};

/// Update sent from the pipeline to whatever renders the labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayUpdate {
    /// New FPS label text
    Fps(String),
    /// Toggle state changed
    Status {
        status: &'static str,
        button: &'static str,
    },
}

/// Receiver of label updates.
///
/// Called from the capture thread (FPS) or the UI thread (status);
/// implementations must not block.
pub trait DisplaySink: Send + Sync {
    fn set_fps_text(&self, text: String);

    fn set_status(&self, state: ToggleState);
}

/// Forwards updates to the UI thread over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelDisplay {
    sender: mpsc::UnboundedSender<DisplayUpdate>,
}

impl ChannelDisplay {
    /// Create the sink and the receiver the UI thread drains
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DisplayUpdate>) {
        let (sender, receiver) = mpsc::unbounded();
        (Self { sender }, receiver)
    }

    fn send(&self, update: DisplayUpdate) {
        // Receiver gone means the UI is shutting down
        if self.sender.unbounded_send(update).is_err() {
            debug!("Display receiver dropped, discarding update");
        }
    }
}

impl DisplaySink for ChannelDisplay {
    fn set_fps_text(&self, text: String) {
        self.send(DisplayUpdate::Fps(text));
    }

    fn set_status(&self, state: ToggleState) {
        self.send(DisplayUpdate::Status {
            status: state.status_text(),
            button: state.button_label(),
        });
    }
}

/// Logs updates, for headless runs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDisplay;

impl DisplaySink for LogDisplay {
    fn set_fps_text(&self, text: String) {
        info!(fps = %text, "Preview throughput");
    }

    fn set_status(&self, state: ToggleState) {
        info!(status = state.status_text(), "Display mode changed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_display_delivers_in_order() {
        let (display, mut receiver) = ChannelDisplay::new();
        display.set_fps_text("FPS: 12.0".into());
        display.set_status(ToggleState::Raw);

        assert_eq!(
            receiver.try_recv().unwrap(),
            DisplayUpdate::Fps("FPS: 12.0".into())
        );
        assert_eq!(
            receiver.try_recv().unwrap(),
            DisplayUpdate::Status {
                status: "Edge Detection OFF",
                button: "Show Processed",
            }
        );
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (display, receiver) = ChannelDisplay::new();
        drop(receiver);
        display.set_fps_text("FPS: 1.0".into());
    }
}
