// SPDX-License-Identifier: GPL-3.0-only

//! Edge detection engine
//!
//! Stages: luma as greyscale, 5x5 binomial blur to suppress sensor noise,
//! forward-difference gradient magnitude, threshold to black/white, grey
//! back to packed RGB.

use super::ProcessingBridge;
use super::invert::map_luma;
use crate::media::nv21;
use crate::media::pixel_codec::pack_rgb;

/// Separable 5-tap binomial kernel (sums to 16)
const BLUR_KERNEL: [u32; 5] = [1, 4, 6, 4, 1];

/// Edge detector with reusable scratch planes
#[derive(Debug, Clone)]
pub struct EdgeEngine {
    threshold: f32,
    horizontal: Vec<u16>,
    blurred: Vec<u8>,
}

impl EdgeEngine {
    /// Create an engine marking pixels whose gradient magnitude exceeds `threshold`
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            horizontal: Vec::new(),
            blurred: Vec::new(),
        }
    }

    fn blur(&mut self, luma: &[u8], width: usize, height: usize) {
        self.horizontal.resize(width * height, 0);
        self.blurred.resize(width * height, 0);

        // Horizontal pass (clamped borders)
        for y in 0..height {
            let row = &luma[y * width..(y + 1) * width];
            for x in 0..width {
                let mut acc = 0u32;
                for (k, weight) in BLUR_KERNEL.iter().enumerate() {
                    let sx = (x + k).saturating_sub(2).min(width - 1);
                    acc += weight * row[sx] as u32;
                }
                self.horizontal[y * width + x] = acc as u16;
            }
        }

        // Vertical pass
        for y in 0..height {
            for x in 0..width {
                let mut acc = 0u32;
                for (k, weight) in BLUR_KERNEL.iter().enumerate() {
                    let sy = (y + k).saturating_sub(2).min(height - 1);
                    acc += weight * self.horizontal[sy * width + x] as u32;
                }
                self.blurred[y * width + x] = ((acc + 128) / 256) as u8;
            }
        }
    }
}

impl ProcessingBridge for EdgeEngine {
    fn name(&self) -> &'static str {
        "edges"
    }

    fn process_frame(&mut self, raw: &[u8], width: u32, height: u32, output: &mut [u32]) {
        let Some(luma) = nv21::luma_plane(raw, width, height) else {
            // Let the shared path log and blank the frame
            map_luma(raw, width, height, output, |y| y);
            return;
        };

        let w = width as usize;
        let h = height as usize;
        self.blur(luma, w, h);

        let threshold_sq = self.threshold * self.threshold;
        let edge = pack_rgb(255, 255, 255);
        let background = pack_rgb(0, 0, 0);

        for y in 0..h {
            for x in 0..w {
                let idx = y * w + x;
                // Last row and column have no forward neighbour
                if x + 1 >= w || y + 1 >= h {
                    output[idx] = background;
                    continue;
                }
                let current = self.blurred[idx] as f32;
                let gx = current - self.blurred[idx + 1] as f32;
                let gy = current - self.blurred[idx + w] as f32;
                output[idx] = if gx * gx + gy * gy > threshold_sq {
                    edge
                } else {
                    background
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn luma_frame(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> Vec<u8> {
        let mut raw = vec![128u8; nv21::frame_len(width, height)];
        for y in 0..height {
            for x in 0..width {
                raw[(y * width + x) as usize] = f(x, y);
            }
        }
        raw
    }

    #[test]
    fn test_flat_frame_has_no_edges() {
        let raw = luma_frame(16, 16, |_, _| 90);
        let mut out = vec![0u32; 256];
        EdgeEngine::new(30.0).process_frame(&raw, 16, 16, &mut out);
        assert!(out.iter().all(|&px| px == 0xFF00_0000));
    }

    #[test]
    fn test_vertical_step_is_detected() {
        let raw = luma_frame(16, 16, |x, _| if x < 8 { 0 } else { 255 });
        let mut out = vec![0u32; 256];
        EdgeEngine::new(30.0).process_frame(&raw, 16, 16, &mut out);

        // Middle row: white around the step, black far from it
        let row = &out[8 * 16..9 * 16];
        assert!(row[6..9].iter().any(|&px| px == 0xFFFF_FFFF));
        assert_eq!(row[1], 0xFF00_0000);
        assert_eq!(row[14], 0xFF00_0000);
    }

    #[test]
    fn test_tiny_frame() {
        let raw = luma_frame(1, 1, |_, _| 200);
        let mut out = vec![0u32; 1];
        EdgeEngine::new(30.0).process_frame(&raw, 1, 1, &mut out);
        assert_eq!(out, vec![0xFF00_0000]);
    }
}
