// SPDX-License-Identifier: GPL-3.0-only

//! Luma-only engines

use super::ProcessingBridge;
use crate::media::nv21;
use crate::media::pixel_codec::pack_rgb;
use tracing::warn;

/// Map every luma sample through `f` into an opaque grey pixel.
///
/// A frame shorter than its luma plane yields black output.
pub(super) fn map_luma(
    raw: &[u8],
    width: u32,
    height: u32,
    output: &mut [u32],
    f: impl Fn(u8) -> u8,
) {
    match nv21::luma_plane(raw, width, height) {
        Some(luma) => {
            for (dst, &y) in output.iter_mut().zip(luma) {
                let v = f(y);
                *dst = pack_rgb(v, v, v);
            }
        }
        None => {
            warn!(
                len = raw.len(),
                width, height, "Raw frame shorter than its luma plane"
            );
            output.fill(pack_rgb(0, 0, 0));
        }
    }
}

/// Inverts the luma plane: `255 - Y` as grey
#[derive(Debug, Default, Clone, Copy)]
pub struct InvertEngine;

impl ProcessingBridge for InvertEngine {
    fn name(&self) -> &'static str {
        "invert"
    }

    fn process_frame(&mut self, raw: &[u8], width: u32, height: u32, output: &mut [u32]) {
        map_luma(raw, width, height, output, |y| 255 - y);
    }
}

/// Luma shown as grey, unmodified
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughEngine;

impl ProcessingBridge for PassthroughEngine {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn process_frame(&mut self, raw: &[u8], width: u32, height: u32, output: &mut [u32]) {
        map_luma(raw, width, height, output, |y| y);
    }
}
