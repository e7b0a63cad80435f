// SPDX-License-Identifier: GPL-3.0-only

//! Pixel format conversions at the pipeline boundaries
//!
//! # Modules
//!
//! - [`nv21`]: camera frame layout (NV21) and its conversion to packed pixels
//! - [`pixel_codec`]: packed `0xAARRGGBB` pixels to RGBA texture bytes

pub mod nv21;
pub mod pixel_codec;

pub use pixel_codec::{encode_to_upload_format, pack_rgb, unpack_rgb};
