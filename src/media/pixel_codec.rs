// SPDX-License-Identifier: GPL-3.0-only

//! Packed pixel ⇄ RGBA byte conversion
//!
//! Processing engines produce one `u32` per pixel laid out as `0xAARRGGBB`.
//! The GPU texture is `Rgba8Unorm`, so every pixel is expanded to four bytes
//! `[R, G, B, 0xFF]` before upload. Source alpha is discarded; the preview is
//! always fully opaque.

use crate::errors::FrameError;

/// Bytes per pixel in the upload format
pub const UPLOAD_BYTES_PER_PIXEL: usize = 4;

/// Pack 8-bit channels into an opaque `0xFFRRGGBB` pixel
#[inline]
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    0xFF00_0000 | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Extract `(r, g, b)` from a packed pixel, ignoring alpha
#[inline]
pub fn unpack_rgb(pixel: u32) -> (u8, u8, u8) {
    (
        ((pixel >> 16) & 0xFF) as u8,
        ((pixel >> 8) & 0xFF) as u8,
        (pixel & 0xFF) as u8,
    )
}

/// Number of pixels for the given dimensions, rejecting empty frames
pub fn pixel_count(width: u32, height: u32) -> Result<usize, FrameError> {
    if width == 0 || height == 0 {
        return Err(FrameError::InvalidDimensions { width, height });
    }
    Ok(width as usize * height as usize)
}

fn validate(pixels: Option<&[u32]>, width: u32, height: u32) -> Result<&[u32], FrameError> {
    let pixels = pixels.ok_or(FrameError::MissingData)?;
    let expected = pixel_count(width, height)?;
    if pixels.len() != expected {
        return Err(FrameError::SizeMismatch {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(pixels)
}

/// Convert packed pixels into RGBA bytes for texture upload.
///
/// Returns exactly `width * height * 4` bytes. Nothing is produced for a
/// missing buffer, zero dimensions, or a pixel count that does not match
/// the dimensions.
pub fn encode_to_upload_format(
    pixels: Option<&[u32]>,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, FrameError> {
    let mut out = Vec::new();
    encode_into(pixels, width, height, &mut out)?;
    Ok(out)
}

/// Same as [`encode_to_upload_format`] but reuses `out`'s allocation.
///
/// `out` is only touched when the input is valid.
pub fn encode_into(
    pixels: Option<&[u32]>,
    width: u32,
    height: u32,
    out: &mut Vec<u8>,
) -> Result<(), FrameError> {
    let pixels = validate(pixels, width, height)?;

    out.clear();
    out.reserve(pixels.len() * UPLOAD_BYTES_PER_PIXEL);
    for &pixel in pixels {
        let (r, g, b) = unpack_rgb(pixel);
        out.extend_from_slice(&[r, g, b, 0xFF]);
    }
    Ok(())
}

/// Convert RGBA bytes (e.g. a render target readback) back to packed pixels
pub fn decode_upload_format(rgba: &[u8]) -> Vec<u32> {
    rgba.chunks_exact(UPLOAD_BYTES_PER_PIXEL)
        .map(|px| {
            ((px[3] as u32) << 24) | ((px[0] as u32) << 16) | ((px[1] as u32) << 8) | px[2] as u32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_order() {
        let colors = [
            (0u8, 0u8, 0u8),
            (255, 0, 0),
            (0, 255, 0),
            (0, 0, 255),
            (12, 200, 77),
        ];
        for (r, g, b) in colors {
            let packed = ((r as u32) << 16) | ((g as u32) << 8) | b as u32;
            let bytes = encode_to_upload_format(Some(&[packed]), 1, 1).unwrap();
            assert_eq!(bytes, vec![r, g, b, 0xFF]);
        }
    }

    #[test]
    fn test_source_alpha_is_discarded() {
        let bytes = encode_to_upload_format(Some(&[0x1234_5678]), 1, 1).unwrap();
        assert_eq!(bytes, vec![0x34, 0x56, 0x78, 0xFF]);
    }

    #[test]
    fn test_output_length() {
        let pixels = vec![0u32; 640 * 480];
        let bytes = encode_to_upload_format(Some(&pixels), 640, 480).unwrap();
        assert_eq!(bytes.len(), 640 * 480 * 4);
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert_eq!(
            encode_to_upload_format(None, 2, 2),
            Err(FrameError::MissingData)
        );
        assert_eq!(
            encode_to_upload_format(Some(&[0; 4]), 0, 4),
            Err(FrameError::InvalidDimensions {
                width: 0,
                height: 4
            })
        );
        assert_eq!(
            encode_to_upload_format(Some(&[0; 3]), 2, 2),
            Err(FrameError::SizeMismatch {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_encode_into_leaves_buffer_on_error() {
        let mut out = vec![1, 2, 3, 4];
        assert!(encode_into(Some(&[0; 2]), 0, 0, &mut out).is_err());
        assert_eq!(out, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_pack_unpack() {
        let px = pack_rgb(10, 20, 30);
        assert_eq!(px >> 24, 0xFF);
        assert_eq!(unpack_rgb(px), (10, 20, 30));
        assert_eq!(decode_upload_format(&[10, 20, 30, 255]), vec![px]);
    }
}
