// SPDX-License-Identifier: GPL-3.0-only
//! GPU render path for the preview
//!
//! One WGSL program draws the latest camera frame as a textured quad. The
//! target is either a window surface view or the [`OffscreenTarget`] used by
//! the terminal viewer, headless runs and snapshots.

mod gpu_processor;
pub mod offscreen;
pub mod projection;
pub mod texture_renderer;

pub use gpu_processor::{CachedDimensions, padded_bytes_per_row, read_buffer_async};
pub use offscreen::{OffscreenTarget, SURFACE_FORMAT};
pub use texture_renderer::{SHADER_SOURCE, TextureRenderer};
