// SPDX-License-Identifier: GPL-3.0-only

//! Camera capture collaborators
//!
//! ```text
//! ┌─────────────┐  next_frame   ┌────────────────┐  on_frame  ┌───────────────┐
//! │ FrameSource │ ◀──────────── │ capture thread │ ─────────▶ │ FramePipeline │
//! └─────────────┘               │  (FramePacer)  │            └───────────────┘
//!                               └────────────────┘
//! ```
//!
//! Frames are pulled one at a time; the pipeline pass finishes before the
//! next frame is requested, so at most one frame is ever in flight.

pub mod frame_loop;
pub mod sources;
pub mod types;

pub use frame_loop::{CaptureLoopController, FramePacer, LoopAction};
pub use sources::{ImageSource, SyntheticSource, open_source};
pub use types::*;

use crate::pipelines::preview::FramePipeline;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::{debug, warn};

/// Thread name of the capture loop
pub const CAPTURE_THREAD_NAME: &str = "edge-preview-capture";

/// Drive `pipeline` from `source` at `fps` on a dedicated thread.
///
/// Frames that come due while a pass is still running are skipped and
/// counted in the returned [`CaptureStats`].
pub fn spawn_capture(
    mut source: Box<dyn FrameSource>,
    mut pipeline: FramePipeline,
    fps: u32,
) -> std::io::Result<(CaptureLoopController, Arc<CaptureStats>)> {
    let stats = Arc::new(CaptureStats::default());
    let loop_stats = Arc::clone(&stats);
    let mut pacer = FramePacer::new(fps);

    debug!(source = %source.name(), fps, "Spawning capture thread");

    let controller = CaptureLoopController::start(CAPTURE_THREAD_NAME, move |stop| {
        frame_loop::sleep_unless_stopped(pacer.time_until_due(Instant::now()), stop);
        if stop.load(Ordering::SeqCst) {
            return LoopAction::Stop;
        }

        let started = Instant::now();
        match source.next_frame(started) {
            Ok(frame) => {
                pipeline.on_frame(&frame);
                loop_stats.record_pass(started.elapsed());
            }
            Err(e) => {
                warn!(error = %e, "Frame source failed");
                loop_stats.record_failure();
            }
        }

        let skipped = pacer.complete(Instant::now());
        if skipped > 0 {
            debug!(skipped, "Pipeline overran frame interval");
            loop_stats.record_dropped(skipped);
        }
        LoopAction::Continue
    })?;

    Ok((controller, stats))
}
