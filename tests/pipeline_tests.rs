// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the preview pipeline without a GPU

use edge_preview::backends::camera::{FrameSource, RawFrame, SyntheticSource, spawn_capture};
use edge_preview::constants::labels;
use edge_preview::media::nv21;
use edge_preview::pipelines::preview::{
    ChannelDisplay, DisplayUpdate, FrameOutcome, FramePipeline, ProcessingToggle, TextureSink,
    ToggleState, toggle_processing,
};
use edge_preview::processing::EngineKind;
use futures::channel::mpsc::UnboundedReceiver;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Keeps every upload for inspection
#[derive(Default)]
struct RecordingSink {
    uploads: Mutex<Vec<(Vec<u8>, u32, u32)>>,
}

impl RecordingSink {
    fn count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    fn last(&self) -> Option<(Vec<u8>, u32, u32)> {
        self.uploads.lock().unwrap().last().cloned()
    }
}

impl TextureSink for RecordingSink {
    fn upload_rgba(&self, rgba: &[u8], width: u32, height: u32) {
        self.uploads
            .lock()
            .unwrap()
            .push((rgba.to_vec(), width, height));
    }
}

fn grey_frame(width: u32, height: u32, value: u8, at: Instant) -> RawFrame {
    let rgb = vec![value; (width * height * 3) as usize];
    RawFrame::new(nv21::rgb_to_nv21(&rgb, width, height), width, height, at)
}

fn drain(receiver: &mut UnboundedReceiver<DisplayUpdate>) -> Vec<DisplayUpdate> {
    let mut updates = Vec::new();
    while let Ok(update) = receiver.try_recv() {
        updates.push(update);
    }
    updates
}

#[test]
fn test_processed_frames_reach_texture_and_report_fps() {
    let sink = Arc::new(RecordingSink::default());
    let (display, mut updates) = ChannelDisplay::new();
    let toggle = Arc::new(ProcessingToggle::new(ToggleState::Processed));
    let mut pipeline = FramePipeline::new(
        EngineKind::Invert.create(30.0),
        Arc::clone(&toggle),
        sink.clone(),
        Arc::new(display),
    );

    let start = Instant::now();
    for i in 0..31u64 {
        let at = start + Duration::from_millis(i * 34);
        assert_eq!(
            pipeline.on_frame(&grey_frame(4, 2, 200, at)),
            FrameOutcome::Processed
        );
    }

    assert_eq!(sink.count(), 31);
    let (rgba, width, height) = sink.last().unwrap();
    assert_eq!((width, height), (4, 2));
    assert_eq!(rgba.len(), 4 * 2 * 4);
    // Inverted mid-grey luma, opaque
    let opaque_grey = |px: &[u8]| px[3] == 0xFF && px[0] == px[1] && px[1] == px[2];
    assert!(rgba.chunks_exact(4).all(opaque_grey));
    assert!(rgba[0] < 100, "expected dark pixel, got {}", rgba[0]);

    let fps_updates: Vec<String> = drain(&mut updates)
        .into_iter()
        .filter_map(|u| match u {
            DisplayUpdate::Fps(text) => Some(text),
            _ => None,
        })
        .collect();
    // 31 frames over 1020 ms
    assert_eq!(fps_updates, vec!["FPS: 30.4".to_string()]);
    assert!((pipeline.shared_fps().get() - 30.39).abs() < 0.05);
}

#[test]
fn test_toggle_switches_to_raw_luma_mid_stream() {
    let sink = Arc::new(RecordingSink::default());
    let (display, mut updates) = ChannelDisplay::new();
    let display = Arc::new(display);
    let toggle = Arc::new(ProcessingToggle::default());
    let mut pipeline = FramePipeline::new(
        EngineKind::Invert.create(30.0),
        Arc::clone(&toggle),
        sink.clone(),
        display.clone(),
    );

    let now = Instant::now();
    pipeline.on_frame(&grey_frame(2, 2, 40, now));
    let (processed, _, _) = sink.last().unwrap();

    assert_eq!(
        toggle_processing(&toggle, display.as_ref()),
        ToggleState::Raw
    );
    assert_eq!(
        pipeline.on_frame(&grey_frame(2, 2, 40, now)),
        FrameOutcome::Raw
    );
    let (raw, _, _) = sink.last().unwrap();

    assert_ne!(processed[0], raw[0]);
    assert_eq!(raw[0] as u16 + processed[0] as u16, 255);

    let updates = drain(&mut updates);
    assert!(updates.contains(&DisplayUpdate::Status {
        status: labels::PROCESSING_OFF,
        button: labels::SHOW_PROCESSED,
    }));

    let stats = pipeline.stats();
    assert_eq!((stats.processed, stats.raw), (1, 1));
}

#[test]
fn test_mismatched_frame_keeps_previous_texture() {
    let sink = Arc::new(RecordingSink::default());
    let (display, _updates) = ChannelDisplay::new();
    let mut pipeline = FramePipeline::new(
        EngineKind::Edges.create(30.0),
        Arc::new(ProcessingToggle::default()),
        sink.clone(),
        Arc::new(display),
    );

    let now = Instant::now();
    pipeline.on_frame(&grey_frame(4, 4, 128, now));
    let outcome = pipeline.on_frame(&RawFrame::new(Vec::new(), 0, 4, now));

    assert!(matches!(outcome, FrameOutcome::Rejected(_)));
    assert_eq!(sink.count(), 1);
    assert_eq!(pipeline.stats().rejected, 1);
}

#[test]
fn test_capture_thread_feeds_pipeline() {
    let sink = Arc::new(RecordingSink::default());
    let (display, _updates) = ChannelDisplay::new();
    let pipeline = FramePipeline::new(
        EngineKind::Edges.create(30.0),
        Arc::new(ProcessingToggle::default()),
        sink.clone(),
        Arc::new(display),
    );
    let source = SyntheticSource::new(64, 48).unwrap();
    assert_eq!(source.dimensions(), (64, 48));

    let (mut controller, stats) = spawn_capture(Box::new(source), pipeline, 100).unwrap();
    std::thread::sleep(Duration::from_millis(300));
    controller.stop();

    assert!(!controller.is_running());
    assert!(stats.delivered() > 0);
    assert_eq!(stats.failed(), 0);
    assert!(sink.count() as u64 >= stats.delivered());

    let (rgba, width, height) = sink.last().unwrap();
    assert_eq!((width, height), (64, 48));
    assert_eq!(rgba.len(), 64 * 48 * 4);
}
