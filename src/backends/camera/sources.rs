// SPDX-License-Identifier: GPL-3.0-only

//! Built-in frame sources
//!
//! Both produce NV21 so the pipeline sees the same layout a phone camera
//! delivers.

use super::types::{FrameSource, RawFrame};
use crate::config::SourceSettings;
use crate::constants::{capture, file_formats};
use crate::errors::SourceError;
use crate::media::nv21;
use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

fn check_dimensions(width: u32, height: u32) -> Result<(), SourceError> {
    let in_range = |side: u32| side > 0 && side <= capture::MAX_DIMENSION;
    if !in_range(width) || !in_range(height) {
        let msg = format!("Unsupported frame size {}x{}", width, height);
        return Err(SourceError::InvalidFormat(msg));
    }
    Ok(())
}

/// Build the configured source at the given capture size
pub fn open_source(
    settings: &SourceSettings,
    width: u32,
    height: u32,
) -> Result<Box<dyn FrameSource>, SourceError> {
    match settings {
        SourceSettings::Synthetic => Ok(Box::new(SyntheticSource::new(width, height)?)),
        SourceSettings::Image { path } => Ok(Box::new(ImageSource::open(path, width, height)?)),
    }
}

/// Moving test pattern: diagonal luma ramp, a sweeping bar and a bouncing
/// checkerboard square, with chroma varying across the frame.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    frame_index: u32,
    buffer: Vec<u8>,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Result<Self, SourceError> {
        check_dimensions(width, height)?;
        debug!(width, height, "Creating synthetic source");
        Ok(Self {
            width,
            height,
            frame_index: 0,
            buffer: vec![0; nv21::frame_len(width, height)],
        })
    }

    fn render(&mut self) {
        let w = self.width as usize;
        let h = self.height as usize;
        let t = self.frame_index as usize;

        let bar_width = (w / 16).max(1);
        let bar_x = (t * 4) % w;
        let square = (w.min(h) / 4).max(2);
        let travel_x = w.saturating_sub(square).max(1);
        let travel_y = h.saturating_sub(square).max(1);
        let square_x = bounce(t * 3, travel_x);
        let square_y = bounce(t * 2, travel_y);

        let (y_plane, vu_plane) = self.buffer.split_at_mut(w * h);

        for y in 0..h {
            for x in 0..w {
                let ramp = ((x + y) * 160 / (w + h)) as u8 + 40;
                let mut luma = ramp;
                if x >= bar_x && x < bar_x + bar_width {
                    luma = 235;
                }
                if (square_x..square_x + square).contains(&x)
                    && (square_y..square_y + square).contains(&y)
                {
                    let cell = (square / 4).max(1);
                    luma = if ((x - square_x) / cell + (y - square_y) / cell) % 2 == 0 {
                        16
                    } else {
                        235
                    };
                }
                y_plane[y * w + x] = luma;
            }
        }

        let stride = nv21::chroma_stride(self.width);
        for (row, chunk) in vu_plane.chunks_exact_mut(stride).enumerate() {
            for (col, vu) in chunk.chunks_exact_mut(2).enumerate() {
                vu[0] = (64 + (col * 2 * 128 / w.max(1)) as u32).min(240) as u8;
                vu[1] = (64 + (row * 2 * 128 / h.max(1)) as u32).min(240) as u8;
            }
        }
    }
}

/// Triangle wave over `0..=range`
fn bounce(position: usize, range: usize) -> usize {
    let period = range * 2;
    let p = position % period;
    if p <= range { p } else { period - p }
}

impl FrameSource for SyntheticSource {
    fn name(&self) -> String {
        format!("Test pattern {}x{}", self.width, self.height)
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn next_frame(&mut self, now: Instant) -> Result<RawFrame, SourceError> {
        self.render();
        self.frame_index = self.frame_index.wrapping_add(1);
        Ok(RawFrame::new(
            self.buffer.as_slice(),
            self.width,
            self.height,
            now,
        ))
    }
}

/// A still image replayed as a camera feed
pub struct ImageSource {
    path: PathBuf,
    data: Arc<[u8]>,
    width: u32,
    height: u32,
}

impl ImageSource {
    /// Load `path` and scale it to `width`x`height`
    pub fn open(path: &Path, width: u32, height: u32) -> Result<Self, SourceError> {
        check_dimensions(width, height)?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        if !file_formats::is_image_extension(extension) {
            return Err(SourceError::InvalidFormat(format!(
                "Unsupported file format: {}",
                path.display()
            )));
        }

        info!(path = %path.display(), "Loading image file");
        let img = match image::open(path) {
            Ok(img) => img,
            Err(e) => {
                let msg = format!("'{}': {}", path.display(), e);
                return Err(SourceError::ImageLoad(msg));
            }
        };

        let rgb = img.resize_exact(width, height, FilterType::Triangle).to_rgb8();
        let data = nv21::rgb_to_nv21(rgb.as_raw(), width, height);

        info!(
            source_width = img.width(),
            source_height = img.height(),
            width,
            height,
            "Image loaded successfully"
        );

        Ok(Self {
            path: path.to_path_buf(),
            data: Arc::from(data),
            width,
            height,
        })
    }
}

impl FrameSource for ImageSource {
    fn name(&self) -> String {
        let file = self
            .path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{} {}x{}", file, self.width, self.height)
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn next_frame(&mut self, now: Instant) -> Result<RawFrame, SourceError> {
        Ok(RawFrame::new(
            Arc::clone(&self.data),
            self.width,
            self.height,
            now,
        ))
    }
}
