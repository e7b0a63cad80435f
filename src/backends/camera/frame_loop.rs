// SPDX-License-Identifier: GPL-3.0-only
//! Capture thread lifecycle and frame pacing

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Action returned by the capture loop callback to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Continue running the loop
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Handle to a loop body running on its own named thread
///
/// The body runs until it returns [`LoopAction::Stop`] or [`stop`](Self::stop)
/// is called. It gets the stop flag so waits inside one pass can end early.
/// Dropping the handle stops and joins the thread.
pub struct CaptureLoopController {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
    name: String,
}

impl CaptureLoopController {
    /// Spawn `body` on a thread called `name`
    pub fn start<F>(name: &str, mut body: F) -> io::Result<Self>
    where
        F: FnMut(&AtomicBool) -> LoopAction + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let thread_name = name.to_string();

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                debug!(name = %thread_name, "Loop thread up");
                let mut passes: u64 = 0;
                while !thread_stop.load(Ordering::SeqCst) {
                    passes += 1;
                    if body(&thread_stop) == LoopAction::Stop {
                        break;
                    }
                }
                info!(name = %thread_name, passes, "Loop thread exiting");
            })?;

        info!(name, "Loop thread started");
        Ok(Self {
            handle: Some(handle),
            stop,
            name: name.to_string(),
        })
    }

    /// Whether the thread is still alive
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Shared stop flag
    pub fn stop_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Raise the stop flag without waiting
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Raise the stop flag and join
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Join without raising the stop flag
    pub fn join(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.join().is_err() {
            warn!(name = %self.name, "Loop thread panicked");
        } else {
            debug!(name = %self.name, "Loop thread joined");
        }
    }
}

impl Drop for CaptureLoopController {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
        }
    }
}

/// Fixed-rate frame schedule with keep-latest semantics.
///
/// A frame is due every `interval`. When a pipeline pass overruns one or
/// more due times those frames are skipped rather than queued, and the
/// schedule resumes at the next due time after the pass ended.
#[derive(Debug, Clone)]
pub struct FramePacer {
    interval: Duration,
    next_due: Option<Instant>,
}

impl FramePacer {
    pub fn new(fps: u32) -> Self {
        let interval = Duration::from_secs(1) / fps.max(1);
        Self {
            interval: interval.max(Duration::from_nanos(1)),
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// How long to wait from `now` until the next frame is due
    pub fn time_until_due(&self, now: Instant) -> Duration {
        self.next_due
            .map(|due| due.saturating_duration_since(now))
            .unwrap_or_default()
    }

    /// Advance the schedule after a pass that finished at `now`.
    ///
    /// Returns the number of due times that were skipped.
    pub fn complete(&mut self, now: Instant) -> u64 {
        let due = self.next_due.unwrap_or(now) + self.interval;
        if now <= due {
            self.next_due = Some(due);
            return 0;
        }

        let behind = now.duration_since(due).as_nanos();
        let interval = self.interval.as_nanos();
        // Remainder is below the interval, which is at most one second
        let into_slot = Duration::from_nanos((behind % interval) as u64);
        self.next_due = Some(now + (self.interval - into_slot));
        u64::try_from(behind / interval + 1).unwrap_or(u64::MAX)
    }
}

/// Sleep up to `duration`, waking early when `stop` is set
pub fn sleep_unless_stopped(duration: Duration, stop: &AtomicBool) {
    const SLICE: Duration = Duration::from_millis(10);
    let deadline = Instant::now() + duration;
    while !stop.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep((deadline - now).min(SLICE));
    }
}
