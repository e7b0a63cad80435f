// SPDX-License-Identifier: GPL-3.0-only

//! Frame rate measurement over variable one-second windows

use crate::constants::fps::WINDOW;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

/// Last emitted FPS value, readable from any thread
///
/// Stored as `f32` bits; `0.0` until the first window closes.
#[derive(Debug, Default)]
pub struct SharedFps(AtomicU32);

impl SharedFps {
    /// Most recent measurement
    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn set(&self, fps: f32) {
        self.0.store(fps.to_bits(), Ordering::Relaxed);
    }
}

/// Counts frames and emits an FPS value once per window.
///
/// A window opens on the first frame after a reset and closes on the first
/// frame arriving at least [`WINDOW`] later. The emitted value is
/// `frames * 1000 / elapsed_ms` with no smoothing across windows.
#[derive(Debug)]
pub struct FrameRateMonitor {
    frame_count: u32,
    window_start: Option<Instant>,
    shared: Arc<SharedFps>,
}

impl Default for FrameRateMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameRateMonitor {
    pub fn new() -> Self {
        Self {
            frame_count: 0,
            window_start: None,
            shared: Arc::new(SharedFps::default()),
        }
    }

    /// Handle to the published value for other threads
    pub fn shared(&self) -> Arc<SharedFps> {
        Arc::clone(&self.shared)
    }

    /// Frames counted in the current window
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Record a frame seen at `now`, returning the FPS if a window closed
    pub fn on_frame(&mut self, now: Instant) -> Option<f32> {
        self.frame_count += 1;

        let start = *self.window_start.get_or_insert(now);
        let elapsed = now.saturating_duration_since(start);
        if elapsed < WINDOW {
            return None;
        }

        let elapsed_ms = elapsed.as_millis() as f32;
        let fps = self.frame_count as f32 * 1000.0 / elapsed_ms;

        self.frame_count = 0;
        self.window_start = Some(now);
        self.shared.set(fps);
        Some(fps)
    }

    /// Drop the current window; the published value is kept
    pub fn reset(&mut self) {
        self.frame_count = 0;
        self.window_start = None;
    }
}

/// Text shown in the FPS label, e.g. `FPS: 30.3`
pub fn format_fps_text(fps: f32) -> String {
    format!("FPS: {:.1}", fps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_emits_after_one_second() {
        let mut monitor = FrameRateMonitor::new();
        let start = Instant::now();

        // 30 frames, 33 ms apart: last one at 957 ms
        for i in 0..30 {
            let now = start + Duration::from_millis(33 * i);
            assert_eq!(monitor.on_frame(now), None, "frame {}", i);
        }

        let fps = monitor
            .on_frame(start + Duration::from_millis(1023))
            .expect("window should close");
        assert!((fps - 30.3).abs() < 0.05, "fps = {}", fps);
        assert_eq!(monitor.frame_count(), 0);
        assert_eq!(monitor.shared().get(), fps);
    }

    #[test]
    fn test_window_restarts_at_emission() {
        let mut monitor = FrameRateMonitor::new();
        let start = Instant::now();
        monitor.on_frame(start);
        assert!(
            monitor
                .on_frame(start + Duration::from_millis(1000))
                .is_some()
        );

        // Next window is measured from the emitting frame: 2 frames in 1000 ms
        assert!(
            monitor
                .on_frame(start + Duration::from_millis(1500))
                .is_none()
        );
        let fps = monitor
            .on_frame(start + Duration::from_millis(2000))
            .unwrap();
        assert!((fps - 2.0).abs() < f32::EPSILON, "fps = {}", fps);
    }

    #[test]
    fn test_late_frame_lengthens_next_window() {
        let mut monitor = FrameRateMonitor::new();
        let start = Instant::now();
        monitor.on_frame(start);
        monitor.on_frame(start + Duration::from_millis(1000));

        monitor.on_frame(start + Duration::from_millis(1500));
        let fps = monitor
            .on_frame(start + Duration::from_millis(2500))
            .unwrap();
        assert!((fps - 2000.0 / 1500.0).abs() < 1e-4, "fps = {}", fps);
    }

    #[test]
    fn test_slow_frames_stretch_the_window() {
        let mut monitor = FrameRateMonitor::new();
        let start = Instant::now();
        monitor.on_frame(start);
        let fps = monitor
            .on_frame(start + Duration::from_millis(4000))
            .unwrap();
        assert!((fps - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_format() {
        assert_eq!(format_fps_text(30.303), "FPS: 30.3");
        assert_eq!(format_fps_text(0.0), "FPS: 0.0");
    }
}
