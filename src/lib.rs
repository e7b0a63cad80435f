// SPDX-License-Identifier: GPL-3.0-only

//! Edge Preview - real-time camera preview with switchable edge detection
//!
//! Frames flow from a capture thread through a processing engine, get
//! encoded as RGBA and uploaded to a GPU texture, and are drawn as a
//! textured quad. A toggle switches between processed and raw display.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Frame sources and the capture thread
//! - [`processing`]: Processing engines behind the `ProcessingBridge` trait
//! - [`media`]: Pixel packing, RGBA upload encoding and NV21 helpers
//! - [`pipelines`]: The per-frame preview pipeline, FPS and toggle state
//! - [`shaders`]: Texture renderer, projection math and offscreen target
//! - [`gpu`]: wgpu device setup
//! - [`session`]: Wiring used by the terminal and CLI front ends
//! - [`config`]: User configuration handling

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod gpu;
pub mod media;
pub mod pipelines;
pub mod processing;
pub mod session;
pub mod shaders;
pub mod terminal;

// Re-export commonly used types
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use pipelines::preview::{FramePipeline, ProcessingToggle, ToggleState};
pub use processing::{EngineKind, ProcessingBridge};
pub use session::PreviewSession;
pub use shaders::TextureRenderer;
