// Tests for loading and saving the run configuration

use gleaner_core::config::{ConfigOverrides, GleanerConfig, expand_path};
use gleaner_scanner::ScoringTables;
use std::io::Write;
use std::time::Duration;
use tempfile::{NamedTempFile, tempdir};

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let config = GleanerConfig::load(&dir.path().join("absent.json")).unwrap();
    assert_eq!(config, GleanerConfig::default());
}

#[test]
fn test_partial_file_keeps_remaining_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, r#"{{ "max_pages": 20, "request_delay_ms": 50 }}"#)?;

    let config = GleanerConfig::load(temp_file.path())?;
    assert_eq!(config.max_pages, 20);
    assert_eq!(config.request_delay_ms, 50);
    assert_eq!(config.concurrent_fetches, 3);

    let options = config.crawl_options();
    assert_eq!(options.max_pages, 20);
    assert_eq!(options.request_delay, Duration::from_millis(50));
    Ok(())
}

#[test]
fn test_invalid_json_is_an_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "{{ not json").unwrap();

    let err = GleanerConfig::load(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn test_zero_max_pages_in_file_is_rejected() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, r#"{{ "max_pages": 0 }}"#).unwrap();

    assert!(GleanerConfig::load(temp_file.path()).is_err());
}

#[test]
fn test_save_then_load_creates_directories() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("nested").join("config.json");

    let config = GleanerConfig {
        max_depth: Some(2),
        scoring: Some(ScoringTables::default()),
        ..Default::default()
    };
    config.save(&path)?;

    assert!(path.exists());
    assert_eq!(GleanerConfig::load(&path)?, config);
    Ok(())
}

#[test]
fn test_cli_overrides_win_over_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, r#"{{ "max_pages": 20, "concurrent_fetches": 5 }}"#)?;

    let mut config = GleanerConfig::load(temp_file.path())?;
    config.apply(&ConfigOverrides {
        max_pages: Some(8),
        max_depth: Some(1),
        ..Default::default()
    });

    assert_eq!(config.max_pages, 8);
    assert_eq!(config.max_depth, Some(1));
    assert_eq!(config.concurrent_fetches, 5);
    Ok(())
}

#[test]
fn test_expand_path_resolves_home() {
    let expanded = expand_path("~/.config/gleaner/config.json");
    assert!(!expanded.to_string_lossy().starts_with('~'));
    assert!(expanded.ends_with(".config/gleaner/config.json"));

    assert_eq!(expand_path("/tmp/config.json").to_string_lossy(), "/tmp/config.json");
}
