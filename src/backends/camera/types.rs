// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for frame sources

use crate::errors::SourceError;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// One camera frame in its native encoding (NV21)
///
/// Consumed synchronously by a single pipeline pass. The data is reference
/// counted so still sources can hand out the same bytes every frame.
#[derive(Clone)]
pub struct RawFrame {
    pub data: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
    pub captured_at: Instant,
}

impl RawFrame {
    pub fn new(data: impl Into<Arc<[u8]>>, width: u32, height: u32, captured_at: Instant) -> Self {
        Self {
            data: data.into(),
            width,
            height,
            captured_at,
        }
    }
}

impl std::fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawFrame")
            .field("bytes", &self.data.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Produces frames on demand for the capture loop
pub trait FrameSource: Send {
    /// Human readable description for logs and the status bar
    fn name(&self) -> String;

    /// Frame dimensions
    fn dimensions(&self) -> (u32, u32);

    /// Capture the next frame, stamped with `now`
    fn next_frame(&mut self, now: Instant) -> Result<RawFrame, SourceError>;
}

/// Counters updated by the capture thread
#[derive(Debug, Default)]
pub struct CaptureStats {
    delivered: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
    processing_us: AtomicU64,
}

impl CaptureStats {
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Frames that came due while the pipeline was busy
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Frames the source failed to produce
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Duration of the latest pipeline pass
    pub fn last_pass(&self) -> Duration {
        Duration::from_micros(self.processing_us.load(Ordering::Relaxed))
    }

    pub(crate) fn record_pass(&self, elapsed: Duration) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
        self.processing_us
            .store(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self, count: u64) {
        self.dropped.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_keep_latest_pass() {
        let stats = CaptureStats::default();
        assert_eq!(stats.last_pass(), Duration::ZERO);

        stats.record_pass(Duration::from_millis(8));
        stats.record_pass(Duration::from_micros(2500));
        stats.record_dropped(3);
        assert_eq!(stats.delivered(), 2);
        assert_eq!(stats.dropped(), 3);
        assert_eq!(stats.last_pass(), Duration::from_micros(2500));
    }
}
