// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing engines
//!
//! The pipeline treats processing as a black box behind [`ProcessingBridge`]:
//! raw camera bytes and dimensions go in, one packed `0xAARRGGBB` pixel per
//! frame pixel comes out. The caller owns the output buffer and sizes it to
//! exactly `width * height` before every call.
//!
//! Engines shipped here:
//!
//! - [`EdgeEngine`]: greyscale, 5x5 blur, gradient threshold
//! - [`InvertEngine`]: inverted luma
//! - [`PassthroughEngine`]: luma as grey, useful as an identity stage

mod edges;
mod invert;

pub use edges::EdgeEngine;
pub use invert::{InvertEngine, PassthroughEngine};

use serde::{Deserialize, Serialize};

/// Synchronous processing contract.
///
/// Called once per frame on the capture thread; the call blocks that thread
/// until it returns. Implementations must write every element of `output`.
pub trait ProcessingBridge: Send {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Fill `output` (`width * height` pixels) from the raw frame bytes
    fn process_frame(&mut self, raw: &[u8], width: u32, height: u32, output: &mut [u32]);
}

/// Engine selection from config and CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Edge detection
    #[default]
    Edges,
    /// Luma inversion
    Invert,
    /// Luma passed through as grey
    Passthrough,
}

impl EngineKind {
    /// All engines for help text and cycling
    pub const ALL: [EngineKind; 3] = [
        EngineKind::Edges,
        EngineKind::Invert,
        EngineKind::Passthrough,
    ];

    /// Build the engine
    pub fn create(self, edge_threshold: f32) -> Box<dyn ProcessingBridge> {
        match self {
            EngineKind::Edges => Box::new(EdgeEngine::new(edge_threshold)),
            EngineKind::Invert => Box::new(InvertEngine),
            EngineKind::Passthrough => Box::new(PassthroughEngine),
        }
    }

    /// Display name
    pub fn display_name(&self) -> &'static str {
        match self {
            EngineKind::Edges => "Edges",
            EngineKind::Invert => "Invert",
            EngineKind::Passthrough => "Passthrough",
        }
    }
}

impl std::str::FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "edges" | "edge" => Ok(EngineKind::Edges),
            "invert" => Ok(EngineKind::Invert),
            "passthrough" | "none" => Ok(EngineKind::Passthrough),
            other => Err(format!("Unknown engine: {}", other)),
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_kind_parse() {
        assert_eq!("Edges".parse::<EngineKind>(), Ok(EngineKind::Edges));
        assert_eq!("invert".parse::<EngineKind>(), Ok(EngineKind::Invert));
        assert!("canny".parse::<EngineKind>().is_err());
    }

    #[test]
    fn test_every_engine_fills_output() {
        let raw = crate::media::nv21::rgb_to_nv21(&[90u8; 8 * 6 * 3], 8, 6);
        for kind in EngineKind::ALL {
            let mut engine = kind.create(30.0);
            let mut out = vec![0u32; 48];
            engine.process_frame(&raw, 8, 6, &mut out);
            assert!(
                out.iter().all(|px| px >> 24 == 0xFF),
                "{} left unwritten pixels",
                engine.name()
            );
        }
    }
}
