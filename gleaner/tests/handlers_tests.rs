use gleaner::commands::command_argument_builder;
use gleaner::handlers::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn crawl_matches(args: &[&str]) -> clap::ArgMatches {
    let mut argv = vec!["gleaner", "crawl"];
    argv.extend_from_slice(args);
    let matches = command_argument_builder().get_matches_from(argv);
    matches
        .subcommand_matches("crawl")
        .cloned()
        .expect("crawl subcommand")
}

#[test]
fn test_parse_start_url_with_scheme() {
    assert_eq!(
        parse_start_url("https://clinic.example.com/"),
        Some("https://clinic.example.com/".to_string())
    );
    assert_eq!(
        parse_start_url("http://localhost:8080"),
        Some("http://localhost:8080/".to_string())
    );
}

#[test]
fn test_parse_start_url_without_scheme() {
    assert_eq!(
        parse_start_url("  clinic.example.com "),
        Some("https://clinic.example.com/".to_string())
    );
}

#[test]
fn test_parse_start_url_invalid() {
    assert_eq!(parse_start_url(""), None);
    assert_eq!(parse_start_url("not a valid url!!!"), None);
    assert_eq!(parse_start_url("ftp://clinic.example.com"), None);
}

#[test]
fn test_config_overrides_from_flags() {
    let matches = crawl_matches(&[
        "-u",
        "clinic.example.com",
        "--max-pages",
        "12",
        "-c",
        "2",
        "--delay",
        "0",
    ]);
    let overrides = config_overrides(&matches);

    assert_eq!(overrides.max_pages, Some(12));
    assert_eq!(overrides.concurrent_fetches, Some(2));
    assert_eq!(overrides.request_delay_ms, Some(0));
    assert_eq!(overrides.max_depth, None);
    assert_eq!(overrides.timeout_secs, None);
}

#[test]
fn test_resolve_config_layers_flags_over_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, r#"{{ "max_pages": 30, "concurrent_fetches": 6 }}"#)?;
    let config_path = temp_file.path().to_string_lossy().to_string();

    let matches = crawl_matches(&["-u", "clinic.example.com", "--config", &config_path, "-p", "9"]);
    let config = resolve_config(&matches)?;

    assert_eq!(config.max_pages, 9);
    assert_eq!(config.concurrent_fetches, 6);
    Ok(())
}

#[test]
fn test_resolve_config_rejects_zero_concurrency() {
    let temp_file = NamedTempFile::new().unwrap();
    std::fs::remove_file(temp_file.path()).unwrap();
    let config_path = temp_file.path().to_string_lossy().to_string();

    let matches = crawl_matches(&["-u", "clinic.example.com", "--config", &config_path, "-c", "0"]);
    assert!(resolve_config(&matches).is_err());
}

#[test]
fn test_crawl_requires_url() {
    let result = command_argument_builder().try_get_matches_from(["gleaner", "crawl"]);
    assert!(result.is_err());
}

#[test]
fn test_format_is_restricted() {
    let result = command_argument_builder().try_get_matches_from([
        "gleaner",
        "crawl",
        "-u",
        "clinic.example.com",
        "-f",
        "csv",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_handle_init_force_writes_default_config() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("gleaner").join("config.json");
    let path_arg = path.to_string_lossy().to_string();

    let matches = command_argument_builder().get_matches_from(["gleaner", "init", &path_arg, "--force"]);
    let init = matches.subcommand_matches("init").expect("init subcommand");
    handle_init(init)?;

    let written = gleaner_core::config::GleanerConfig::load(&path)?;
    assert_eq!(written, gleaner_core::config::GleanerConfig::default());
    Ok(())
}
