// SPDX-License-Identifier: GPL-3.0-only

//! Live preview pipeline
//!
//! Runs on the capture thread, one frame at a time:
//!
//! ```text
//! ┌──────────┐   ┌─────────────────┐   ┌────────────┐   ┌─────────────────┐
//! │ RawFrame │ ─▶│ ProcessingToggle│ ─▶│ Processing │ ─▶│  PixelCodec     │
//! │  (NV21)  │   │  PROCESSED/RAW  │   │   Bridge   │   │  u32 → RGBA8    │
//! └──────────┘   └────────┬────────┘   └────────────┘   └────────┬────────┘
//!                         │ RAW                                  │
//!                         └──▶ raw fallback ─────────────────────┤
//!                                                                ▼
//!                                                       ┌─────────────────┐
//!                                                       │ TextureRenderer │
//!                                                       └─────────────────┘
//! ```
//!
//! The render thread draws whatever texture was uploaded last; it never sees
//! a half-written buffer because the upload replaces the texture under a lock.
//! Frame rate and toggle state are atomics shared with the UI thread.

mod display;
mod fps;
mod toggle;

pub use display::{ChannelDisplay, DisplaySink, DisplayUpdate, LogDisplay};
pub use fps::{FrameRateMonitor, SharedFps, format_fps_text};
pub use toggle::{ProcessingToggle, ToggleState};

use crate::backends::camera::RawFrame;
use crate::errors::FrameError;
use crate::media::nv21;
use crate::media::pixel_codec::{self, pack_rgb};
use crate::processing::ProcessingBridge;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// What the preview shows while processing is switched off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawDisplay {
    /// Camera luma as grey
    #[default]
    Luma,
    /// Full colour NV21 → RGB conversion
    Color,
    /// Drop the frame; the last uploaded image stays on screen
    Freeze,
}

impl std::str::FromStr for RawDisplay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "luma" | "grey" | "gray" => Ok(RawDisplay::Luma),
            "color" | "colour" => Ok(RawDisplay::Color),
            "freeze" => Ok(RawDisplay::Freeze),
            other => Err(format!("Unknown raw display mode: {}", other)),
        }
    }
}

/// Where encoded RGBA frames go
pub trait TextureSink: Send + Sync {
    /// Replace the displayed image with `rgba` (`width * height * 4` bytes)
    fn upload_rgba(&self, rgba: &[u8], width: u32, height: u32);
}

/// Result of one pipeline pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Engine output was uploaded
    Processed,
    /// Raw fallback was uploaded
    Raw,
    /// Frame dropped while frozen on the last image
    Frozen,
    /// Frame input was unusable; the texture is unchanged
    Rejected(FrameError),
}

impl FrameOutcome {
    /// Whether a new image reached the texture
    pub fn uploaded(&self) -> bool {
        matches!(self, FrameOutcome::Processed | FrameOutcome::Raw)
    }
}

/// Per-pipeline counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub processed: u64,
    pub raw: u64,
    pub frozen: u64,
    pub rejected: u64,
    /// Duration of the most recent engine call
    pub last_processing_time: Duration,
}

/// Flip the toggle and refresh the status labels
pub fn toggle_processing(toggle: &ProcessingToggle, display: &dyn DisplaySink) -> ToggleState {
    let state = toggle.toggle();
    info!(status = state.status_text(), "Processing toggled");
    display.set_status(state);
    state
}

/// Capture-thread orchestrator: engine, codec, upload, FPS
pub struct FramePipeline {
    engine: Box<dyn ProcessingBridge>,
    toggle: Arc<ProcessingToggle>,
    monitor: FrameRateMonitor,
    target: Arc<dyn TextureSink>,
    display: Arc<dyn DisplaySink>,
    raw_display: RawDisplay,
    upload: Vec<u8>,
    stats: PipelineStats,
}

impl FramePipeline {
    pub fn new(
        engine: Box<dyn ProcessingBridge>,
        toggle: Arc<ProcessingToggle>,
        target: Arc<dyn TextureSink>,
        display: Arc<dyn DisplaySink>,
    ) -> Self {
        info!(engine = engine.name(), "Creating preview pipeline");
        Self {
            engine,
            toggle,
            monitor: FrameRateMonitor::new(),
            target,
            display,
            raw_display: RawDisplay::default(),
            upload: Vec::new(),
            stats: PipelineStats::default(),
        }
    }

    /// Choose what raw mode displays
    pub fn with_raw_display(mut self, raw_display: RawDisplay) -> Self {
        self.raw_display = raw_display;
        self
    }

    pub fn toggle(&self) -> &Arc<ProcessingToggle> {
        &self.toggle
    }

    /// Handle to the last published FPS value
    pub fn shared_fps(&self) -> Arc<SharedFps> {
        self.monitor.shared()
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Run one frame through the pipeline.
    ///
    /// The frame is fully consumed before this returns. FPS is measured on
    /// capture timestamps of frames that reached the texture.
    pub fn on_frame(&mut self, frame: &RawFrame) -> FrameOutcome {
        let outcome = match self.toggle.state() {
            ToggleState::Processed => self.process(frame),
            ToggleState::Raw => self.show_raw(frame),
        };

        match &outcome {
            FrameOutcome::Processed => self.stats.processed += 1,
            FrameOutcome::Raw => self.stats.raw += 1,
            FrameOutcome::Frozen => self.stats.frozen += 1,
            FrameOutcome::Rejected(e) => {
                self.stats.rejected += 1;
                debug!(
                    error = %e,
                    width = frame.width,
                    height = frame.height,
                    "Frame rejected, keeping previous texture"
                );
            }
        }

        if outcome.uploaded()
            && let Some(fps) = self.monitor.on_frame(frame.captured_at)
        {
            self.display.set_fps_text(format_fps_text(fps));
        }

        outcome
    }

    fn process(&mut self, frame: &RawFrame) -> FrameOutcome {
        let count = match pixel_codec::pixel_count(frame.width, frame.height) {
            Ok(count) => count,
            Err(e) => return FrameOutcome::Rejected(e),
        };
        // Engines blank short buffers; reject them so the texture is kept
        if nv21::luma_plane(&frame.data, frame.width, frame.height).is_none() {
            return FrameOutcome::Rejected(FrameError::SizeMismatch {
                expected: count,
                actual: frame.data.len(),
            });
        }

        let mut output = vec![0u32; count];
        let started = Instant::now();
        self.engine
            .process_frame(&frame.data, frame.width, frame.height, &mut output);
        self.stats.last_processing_time = started.elapsed();

        self.upload(&output, frame.width, frame.height, FrameOutcome::Processed)
    }

    fn show_raw(&mut self, frame: &RawFrame) -> FrameOutcome {
        if self.raw_display == RawDisplay::Freeze {
            return FrameOutcome::Frozen;
        }

        let count = match pixel_codec::pixel_count(frame.width, frame.height) {
            Ok(count) => count,
            Err(e) => return FrameOutcome::Rejected(e),
        };

        let mut output = vec![0u32; count];
        match self.raw_display {
            RawDisplay::Color => {
                if !nv21::nv21_to_packed(&frame.data, frame.width, frame.height, &mut output) {
                    return FrameOutcome::Rejected(FrameError::SizeMismatch {
                        expected: nv21::frame_len(frame.width, frame.height),
                        actual: frame.data.len(),
                    });
                }
            }
            _ => {
                let Some(luma) = nv21::luma_plane(&frame.data, frame.width, frame.height) else {
                    return FrameOutcome::Rejected(FrameError::SizeMismatch {
                        expected: count,
                        actual: frame.data.len(),
                    });
                };
                for (dst, &y) in output.iter_mut().zip(luma) {
                    *dst = pack_rgb(y, y, y);
                }
            }
        }

        self.upload(&output, frame.width, frame.height, FrameOutcome::Raw)
    }

    fn upload(
        &mut self,
        pixels: &[u32],
        width: u32,
        height: u32,
        ok: FrameOutcome,
    ) -> FrameOutcome {
        match pixel_codec::encode_into(Some(pixels), width, height, &mut self.upload) {
            Ok(()) => {
                self.target.upload_rgba(&self.upload, width, height);
                ok
            }
            Err(e) => FrameOutcome::Rejected(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<(Vec<u8>, u32, u32)>>);

    impl TextureSink for RecordingSink {
        fn upload_rgba(&self, rgba: &[u8], width: u32, height: u32) {
            self.0.lock().unwrap().push((rgba.to_vec(), width, height));
        }
    }

    struct StubEngine(Vec<u32>);

    impl ProcessingBridge for StubEngine {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn process_frame(&mut self, _raw: &[u8], _w: u32, _h: u32, output: &mut [u32]) {
            output.copy_from_slice(&self.0);
        }
    }

    fn pipeline(engine: Vec<u32>) -> (FramePipeline, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let pipeline = FramePipeline::new(
            Box::new(StubEngine(engine)),
            Arc::new(ProcessingToggle::default()),
            sink.clone(),
            Arc::new(LogDisplay),
        );
        (pipeline, sink)
    }

    fn frame(data: Vec<u8>, width: u32, height: u32) -> RawFrame {
        RawFrame::new(data, width, height, Instant::now())
    }

    #[test]
    fn test_processed_frame_reaches_texture() {
        let (mut pipeline, sink) = pipeline(vec![0xFF0000, 0x00FF00]);
        let outcome = pipeline.on_frame(&frame(vec![0; 4], 2, 1));

        assert_eq!(outcome, FrameOutcome::Processed);
        let uploads = sink.0.lock().unwrap();
        assert_eq!(
            uploads[0],
            (vec![0xFF, 0x00, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF], 2, 1)
        );
    }

    #[test]
    fn test_zero_sized_frame_is_rejected() {
        let (mut pipeline, sink) = pipeline(vec![]);
        let outcome = pipeline.on_frame(&frame(vec![], 0, 4));
        assert_eq!(
            outcome,
            FrameOutcome::Rejected(FrameError::InvalidDimensions {
                width: 0,
                height: 4
            })
        );
        assert!(sink.0.lock().unwrap().is_empty());
        assert_eq!(pipeline.stats().rejected, 1);
    }

    #[test]
    fn test_raw_mode_bypasses_engine() {
        // Stub output has the wrong length; calling it would panic
        let (mut pipeline, sink) = pipeline(vec![]);
        pipeline.toggle().toggle();

        let outcome = pipeline.on_frame(&frame(vec![10, 200, 128, 128], 2, 1));
        assert_eq!(outcome, FrameOutcome::Raw);
        let uploads = sink.0.lock().unwrap();
        assert_eq!(uploads[0].0, vec![10, 10, 10, 0xFF, 200, 200, 200, 0xFF]);
    }

    #[test]
    fn test_freeze_drops_frames() {
        let (pipeline, sink) = pipeline(vec![]);
        let mut pipeline = pipeline.with_raw_display(RawDisplay::Freeze);
        pipeline.toggle().set(ToggleState::Raw);

        assert_eq!(
            pipeline.on_frame(&frame(vec![0; 4], 2, 1)),
            FrameOutcome::Frozen
        );
        assert!(sink.0.lock().unwrap().is_empty());
        assert_eq!(pipeline.stats().frozen, 1);
    }

    #[test]
    fn test_short_raw_frame_is_rejected() {
        let (mut pipeline, sink) = pipeline(vec![]);
        pipeline.toggle().set(ToggleState::Raw);
        let outcome = pipeline.on_frame(&frame(vec![1], 2, 2));
        assert!(matches!(outcome, FrameOutcome::Rejected(_)));
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_short_frame_rejected_in_both_modes() {
        let (mut pipeline, sink) = pipeline(vec![0x808080; 4]);
        let full = frame(vec![0; 6], 2, 2);
        assert_eq!(pipeline.on_frame(&full), FrameOutcome::Processed);

        let short = frame(vec![1], 2, 2);
        let expected = FrameOutcome::Rejected(FrameError::SizeMismatch {
            expected: 4,
            actual: 1,
        });
        assert_eq!(pipeline.on_frame(&short), expected);
        pipeline.toggle().set(ToggleState::Raw);
        assert_eq!(pipeline.on_frame(&short), expected);

        assert_eq!(sink.0.lock().unwrap().len(), 1);
        assert_eq!(pipeline.stats().rejected, 2);
    }

    #[test]
    fn test_raw_display_parse() {
        assert_eq!("colour".parse::<RawDisplay>(), Ok(RawDisplay::Color));
        assert_eq!("freeze".parse::<RawDisplay>(), Ok(RawDisplay::Freeze));
        assert!("sepia".parse::<RawDisplay>().is_err());
    }
}
