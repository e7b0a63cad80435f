// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use edge_preview::Config;
use edge_preview::config::{CONFIG_VERSION, SourceSettings};
use edge_preview::pipelines::preview::RawDisplay;
use edge_preview::processing::EngineKind;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert!(
        config.mirror_preview,
        "Mirror preview should be enabled by default"
    );
    assert!(config.processing_enabled, "Preview should start processed");
    assert_eq!(config.engine, EngineKind::Edges);
    assert_eq!(config.raw_display, RawDisplay::Luma);
    assert_eq!(config.source, SourceSettings::Synthetic);
    assert_eq!(config.version, CONFIG_VERSION);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_serializes_snake_case() {
    let json = serde_json::to_string(&Config::default()).unwrap();
    assert!(json.contains(r#""engine":"edges""#), "{}", json);
    assert!(json.contains(r#""raw_display":"luma""#), "{}", json);
    assert!(json.contains(r#""kind":"synthetic""#), "{}", json);
}

#[test]
fn test_unknown_engine_rejected() {
    assert!(Config::from_json(r#"{ "engine": "sobel" }"#).is_err());
}

#[test]
fn test_negative_threshold_rejected() {
    assert!(Config::from_json(r#"{ "edge_threshold": -1.0 }"#).is_err());
}

#[test]
fn test_malformed_file_falls_back_to_defaults() {
    let dir = std::env::temp_dir().join(format!("edge-preview-bad-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert_eq!(Config::load_from(&path), Config::default());
    let _ = std::fs::remove_dir_all(&dir);
}
