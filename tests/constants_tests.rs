// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use edge_preview::constants::{capture, file_formats, fps, labels, surface};
use edge_preview::pipelines::preview::ToggleState;

#[test]
fn test_labels_match_toggle_states() {
    assert_eq!(ToggleState::Processed.status_text(), labels::PROCESSING_ON);
    assert_eq!(ToggleState::Processed.button_label(), labels::SHOW_RAW);
    assert_eq!(ToggleState::Raw.status_text(), labels::PROCESSING_OFF);
    assert_eq!(ToggleState::Raw.button_label(), labels::SHOW_PROCESSED);
}

#[test]
fn test_fps_window_is_one_second() {
    assert_eq!(fps::WINDOW.as_millis(), 1000);
}

#[test]
fn test_default_dimensions_valid() {
    assert!(capture::DEFAULT_WIDTH > 0 && capture::DEFAULT_WIDTH <= capture::MAX_DIMENSION);
    assert!(capture::DEFAULT_HEIGHT > 0 && capture::DEFAULT_HEIGHT <= capture::MAX_DIMENSION);
    assert!(surface::DEFAULT_WIDTH > 0 && surface::DEFAULT_HEIGHT > 0);
    assert!(capture::DEFAULT_FPS > 0 && capture::DEFAULT_FPS <= capture::MAX_FPS);
}

#[test]
fn test_image_extensions() {
    assert!(file_formats::is_image_extension("png"));
    assert!(file_formats::is_image_extension("JPG"));
    assert!(!file_formats::is_image_extension("mp4"));
}
