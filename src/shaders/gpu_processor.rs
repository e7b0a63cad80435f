// SPDX-License-Identifier: GPL-3.0-only

//! Shared GPU helpers
//!
//! - Dimension caching so targets are only reallocated on size changes
//! - Async buffer readback (map, poll, read, unmap)
//! - Row padding for texture-to-buffer copies

use crate::errors::RenderError;
use crate::gpu::wgpu;

/// Cached resource dimensions - avoids reallocation when dimensions match
#[derive(Default, Clone, Copy, PartialEq, Debug)]
pub struct CachedDimensions {
    pub width: u32,
    pub height: u32,
}

impl CachedDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Check if dimensions have changed and need update
    pub fn needs_update(&self, width: u32, height: u32) -> bool {
        self.width != width || self.height != height
    }

    pub fn update(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

/// Read a `MAP_READ` buffer back to CPU memory
pub async fn read_buffer_async(
    device: &wgpu::Device,
    buffer: &wgpu::Buffer,
) -> Result<Vec<u8>, RenderError> {
    let slice = buffer.slice(..);
    let (sender, receiver) = futures::channel::oneshot::channel();

    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });

    device
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(|e| RenderError::Readback(format!("Device poll failed: {}", e)))?;

    receiver
        .await
        .map_err(|_| RenderError::Readback("Failed to receive buffer mapping".into()))?
        .map_err(|e| RenderError::Readback(format!("Failed to map buffer: {:?}", e)))?;

    let data = slice.get_mapped_range().to_vec();
    buffer.unmap();

    Ok(data)
}

/// Bytes per row of a texture copy, padded to wgpu's copy alignment
#[inline]
pub fn padded_bytes_per_row(width: u32, bytes_per_pixel: u32) -> u32 {
    (width * bytes_per_pixel).next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
}

/// Drop the per-row padding of a texture readback
pub fn strip_row_padding(padded: &[u8], width: u32, height: u32, bytes_per_pixel: u32) -> Vec<u8> {
    let row = (width * bytes_per_pixel) as usize;
    let stride = padded_bytes_per_row(width, bytes_per_pixel) as usize;
    let mut out = Vec::with_capacity(row * height as usize);
    for chunk in padded.chunks(stride).take(height as usize) {
        out.extend_from_slice(&chunk[..row.min(chunk.len())]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_dimensions() {
        let mut dims = CachedDimensions::default();
        assert!(dims.needs_update(640, 480));

        dims.update(640, 480);
        assert!(!dims.needs_update(640, 480));
        assert!(dims.needs_update(1280, 720));
    }

    #[test]
    fn test_padded_bytes_per_row() {
        assert_eq!(padded_bytes_per_row(64, 4), 256);
        assert_eq!(padded_bytes_per_row(65, 4), 512);
        assert_eq!(padded_bytes_per_row(1, 4), 256);
        assert_eq!(padded_bytes_per_row(640, 4), 2560);
    }

    #[test]
    fn test_strip_row_padding() {
        let mut padded = vec![0u8; 256 * 2];
        padded[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        padded[256..264].copy_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16]);
        assert_eq!(
            strip_row_padding(&padded, 2, 2, 4),
            (1..=16).collect::<Vec<u8>>()
        );
    }
}
