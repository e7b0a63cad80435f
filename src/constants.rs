// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Application identifier used for config and cache directories
pub const APP_ID: &str = "edge-preview";

/// Frame rate measurement
pub mod fps {
    use super::Duration;

    /// Minimum wall-clock span of one measurement window.
    ///
    /// Windows close on the first frame at or past this span, so every
    /// emitted value covers at least one second.
    pub const WINDOW: Duration = Duration::from_millis(1000);
}

/// Strings shown next to the preview
pub mod labels {
    /// Status line while processed frames are displayed
    pub const PROCESSING_ON: &str = "Edge Detection ON";
    /// Status line while raw frames are displayed
    pub const PROCESSING_OFF: &str = "Edge Detection OFF";
    /// Button label that switches to raw display
    pub const SHOW_RAW: &str = "Show Raw";
    /// Button label that switches to processed display
    pub const SHOW_PROCESSED: &str = "Show Processed";
    /// FPS text before the first window has closed
    pub const FPS_PLACEHOLDER: &str = "FPS: --";
}

/// Capture defaults
pub mod capture {
    /// Default capture width
    pub const DEFAULT_WIDTH: u32 = 640;
    /// Default capture height
    pub const DEFAULT_HEIGHT: u32 = 480;
    /// Default capture rate of the built-in sources
    pub const DEFAULT_FPS: u32 = 30;
    /// Upper bound accepted for source dimensions
    pub const MAX_DIMENSION: u32 = 8192;
    /// Upper bound accepted for the capture rate
    pub const MAX_FPS: u32 = 1000;
}

/// Render surface defaults
pub mod surface {
    /// Offscreen surface width used by headless and snapshot modes
    pub const DEFAULT_WIDTH: u32 = 640;
    /// Offscreen surface height used by headless and snapshot modes
    pub const DEFAULT_HEIGHT: u32 = 480;
    /// Pause between draws of the continuous render loop (~60 Hz)
    pub const REDRAW_INTERVAL: std::time::Duration = std::time::Duration::from_millis(16);
}

/// Processing engine defaults
pub mod processing {
    /// Gradient magnitude above which a pixel is marked as an edge
    pub const DEFAULT_EDGE_THRESHOLD: f32 = 30.0;
}

/// Timing for the terminal viewer
pub mod terminal {
    use super::Duration;

    /// Input poll timeout, also paces terminal redraws
    pub const INPUT_POLL: Duration = Duration::from_millis(16);
}

/// Supported file formats for the still-image source
pub mod file_formats {
    /// Image file extensions accepted by the image source
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp"];

    /// Check if an extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}
