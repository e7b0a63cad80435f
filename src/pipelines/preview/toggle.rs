// SPDX-License-Identifier: GPL-3.0-only

//! Processed / raw display switch shared between UI and capture threads

use crate::constants::labels;
use std::sync::atomic::{AtomicBool, Ordering};

/// What the preview currently shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    /// Frames go through the processing engine
    Processed,
    /// Frames bypass the engine
    Raw,
}

impl ToggleState {
    /// Status line text
    pub fn status_text(self) -> &'static str {
        match self {
            ToggleState::Processed => labels::PROCESSING_ON,
            ToggleState::Raw => labels::PROCESSING_OFF,
        }
    }

    /// Label of the control that switches away from this state
    pub fn button_label(self) -> &'static str {
        match self {
            ToggleState::Processed => labels::SHOW_RAW,
            ToggleState::Raw => labels::SHOW_PROCESSED,
        }
    }
}

/// Lock-free two-state switch.
///
/// Concurrent toggles are last-write-wins; the capture thread samples the
/// state once per frame, so a change shows up at most one frame late.
#[derive(Debug)]
pub struct ProcessingToggle {
    processing: AtomicBool,
}

impl ProcessingToggle {
    pub fn new(state: ToggleState) -> Self {
        Self {
            processing: AtomicBool::new(state == ToggleState::Processed),
        }
    }

    pub fn state(&self) -> ToggleState {
        if self.processing.load(Ordering::Acquire) {
            ToggleState::Processed
        } else {
            ToggleState::Raw
        }
    }

    /// Flip the state and return the new one
    pub fn toggle(&self) -> ToggleState {
        let was_processing = self.processing.fetch_xor(true, Ordering::AcqRel);
        if was_processing {
            ToggleState::Raw
        } else {
            ToggleState::Processed
        }
    }

    pub fn set(&self, state: ToggleState) {
        self.processing
            .store(state == ToggleState::Processed, Ordering::Release);
    }
}

impl Default for ProcessingToggle {
    fn default() -> Self {
        Self::new(ToggleState::Processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_double_toggle_restores() {
        let toggle = ProcessingToggle::default();
        assert_eq!(toggle.toggle(), ToggleState::Raw);
        assert_eq!(toggle.state(), ToggleState::Raw);
        assert_eq!(toggle.toggle(), ToggleState::Processed);
        assert_eq!(toggle.state(), ToggleState::Processed);
    }

    #[test]
    fn test_labels() {
        assert_eq!(ToggleState::Processed.status_text(), "Edge Detection ON");
        assert_eq!(ToggleState::Processed.button_label(), "Show Raw");
        assert_eq!(ToggleState::Raw.status_text(), "Edge Detection OFF");
        assert_eq!(ToggleState::Raw.button_label(), "Show Processed");
    }

    #[test]
    fn test_even_toggles_across_threads() {
        let toggle = Arc::new(ProcessingToggle::new(ToggleState::Raw));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let toggle = Arc::clone(&toggle);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        toggle.toggle();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(toggle.state(), ToggleState::Raw);
    }
}
