//! Tests for pipeline configuration loading and deduplicated warnings.

use vellum_common::warning::{clear_warnings, warn_once};
use vellum_common::{ConfigError, DEFAULT_MAX_LAYOUT_RETRIES, PipelineConfig};

// ========== Configuration ==========

#[test]
fn test_empty_object_is_default() {
    let config = PipelineConfig::from_json_str("{}").unwrap();
    assert_eq!(config, PipelineConfig::default());
    assert_eq!(config.max_layout_retries, DEFAULT_MAX_LAYOUT_RETRIES);
    assert!(config.strict_assertions);
    assert!(!config.keep_elements);
}

#[test]
fn test_fields_are_kebab_case() {
    let config = PipelineConfig::from_json_str(
        r#"{ "max-layout-retries": 8, "keep-elements": true, "journal-mutations": true }"#,
    )
    .unwrap();
    assert_eq!(config.max_layout_retries, 8);
    assert!(config.keep_elements);
    assert!(config.journal_mutations);
    assert_eq!(config.stop_pool_capacity, 64);
}

#[test]
fn test_serialized_config_reloads() {
    let config = PipelineConfig {
        interval_pool_capacity: 4,
        strict_assertions: false,
        ..PipelineConfig::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("\"interval-pool-capacity\":4"));
    assert_eq!(PipelineConfig::from_json_str(&json).unwrap(), config);
}

#[test]
fn test_zero_retries_rejected() {
    let err = PipelineConfig::from_json_str(r#"{ "max-layout-retries": 0 }"#).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid {
            field: "max-layout-retries",
            ..
        }
    ));
    assert!(err.to_string().contains("at least one layout pass"));
}

#[test]
fn test_malformed_json_rejected() {
    let err = PipelineConfig::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_missing_file_reports_path() {
    let path = std::path::Path::new("/nonexistent/vellum/pipeline.json");
    let err = PipelineConfig::load(path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("/nonexistent/vellum/pipeline.json"));
}

// ========== Warnings ==========

// Warnings share one global set, so both behaviors are checked in a single
// test to keep parallel tests from clearing each other's entries.
#[test]
fn test_warn_once_deduplicates_until_cleared() {
    let message = "config-tests: duplicate warning";
    assert!(warn_once("Test", message));
    assert!(!warn_once("Test", message));
    assert!(warn_once("Other", message));

    clear_warnings();
    assert!(warn_once("Test", message));
}
