// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for frame capture
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            Session / Front ends              │
//! └────────────────────┬─────────────────────────┘
//!                      │
//! ┌────────────────────┴─────────────────────────┐
//! │               Backend Layer                  │
//! │  ┌──────────────────┐  ┌──────────────────┐  │
//! │  │  Frame sources   │  │  Capture thread  │  │
//! │  │ (synthetic/image)│  │  (paced loop)    │  │
//! │  └──────────────────┘  └──────────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```

pub mod camera;
