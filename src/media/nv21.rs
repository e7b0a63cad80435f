// SPDX-License-Identifier: GPL-3.0-only

//! NV21 frame layout helpers
//!
//! NV21 is a full-resolution Y plane followed by one interleaved V/U plane
//! at half resolution in both directions (V first). Rows are tightly packed.
//! Odd widths and heights round the chroma plane up.

use crate::media::pixel_codec::pack_rgb;

/// Bytes per row of the interleaved chroma plane
#[inline]
pub fn chroma_stride(width: u32) -> usize {
    width.div_ceil(2) as usize * 2
}

/// Total buffer length of an NV21 frame
pub fn frame_len(width: u32, height: u32) -> usize {
    width as usize * height as usize + chroma_stride(width) * height.div_ceil(2) as usize
}

/// Borrow the luma plane, or `None` if the buffer is too short
pub fn luma_plane(data: &[u8], width: u32, height: u32) -> Option<&[u8]> {
    data.get(..width as usize * height as usize)
}

/// Convert an NV21 frame into packed `0xFFRRGGBB` pixels (BT.601, limited range).
///
/// `out` must hold exactly `width * height` pixels. Returns `false` and leaves
/// `out` untouched if either buffer has the wrong size.
pub fn nv21_to_packed(data: &[u8], width: u32, height: u32, out: &mut [u32]) -> bool {
    let w = width as usize;
    let h = height as usize;
    if data.len() < frame_len(width, height) || out.len() != w * h {
        return false;
    }

    let (y_plane, vu_plane) = data.split_at(w * h);
    let vu_stride = chroma_stride(width);

    for y_idx in 0..h {
        let vu_row = (y_idx / 2) * vu_stride;
        let y_row = y_idx * w;

        for x_idx in 0..w {
            let vu_offset = vu_row + (x_idx / 2) * 2;
            let v = vu_plane[vu_offset] as i32 - 128;
            let u = vu_plane[vu_offset + 1] as i32 - 128;

            let luma = ((y_plane[y_row + x_idx] as i32 - 16) * 149) >> 7;
            let r = (luma + ((179 * v) >> 7)).clamp(0, 255) as u8;
            let g = (luma - ((44 * u) >> 7) - ((91 * v) >> 7)).clamp(0, 255) as u8;
            let b = (luma + ((227 * u) >> 7)).clamp(0, 255) as u8;

            out[y_row + x_idx] = pack_rgb(r, g, b);
        }
    }
    true
}

/// Encode tightly packed RGB bytes as an NV21 frame (BT.601, limited range).
///
/// Chroma is taken from the top-left pixel of each 2x2 block.
pub fn rgb_to_nv21(rgb: &[u8], width: u32, height: u32) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    let mut data = vec![0u8; frame_len(width, height)];
    if rgb.len() < w * h * 3 {
        return data;
    }

    let (y_plane, vu_plane) = data.split_at_mut(w * h);
    let vu_stride = chroma_stride(width);

    for y_idx in 0..h {
        for x_idx in 0..w {
            let px = (y_idx * w + x_idx) * 3;
            let (r, g, b) = (rgb[px] as i32, rgb[px + 1] as i32, rgb[px + 2] as i32);

            y_plane[y_idx * w + x_idx] = (((66 * r + 129 * g + 25 * b + 128) >> 8) + 16) as u8;

            if y_idx % 2 == 0 && x_idx % 2 == 0 {
                let vu = (y_idx / 2) * vu_stride + x_idx;
                vu_plane[vu] = (((112 * r - 94 * g - 18 * b + 128) >> 8) + 128) as u8;
                vu_plane[vu + 1] = (((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128) as u8;
            }
        }
    }
    data
}
