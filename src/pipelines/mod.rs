// SPDX-License-Identifier: GPL-3.0-only

//! Frame pipelines
//!
//! # Modules
//!
//! - [`preview`]: per-frame processing, raw fallback, upload and FPS reporting

pub mod preview;
