//! Unit tests for configuration loading and merging.

use std::str::FromStr;

use rstest::rstest;

use super::{Config, ConfigError, LogFormat};

#[test]
fn defaults_are_sensible() {
    let config = Config::default();
    assert_eq!(config.log_filter(), "info");
    assert_eq!(config.log_format(), LogFormat::Json);
    assert!(config.always_prompt_output());
    assert_eq!(config.invoke_timeout_secs(), 30);
    assert!(config.plugins_dir().ends_with("alcove/plugins"));
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = Config::load_from(&dir.path().join("config.toml")).expect("defaults load");
    assert_eq!(config, Config::default());
}

#[test]
fn file_values_override_defaults() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
plugins_dir = "/srv/alcove/plugins"
log_filter = "alcove_plugins=debug"
log_format = "compact"
always_prompt_output = false
invoke_timeout_secs = 5
"#,
    )
    .expect("write config");

    let config = Config::load_from(&path).expect("config loads");
    assert_eq!(config.plugins_dir(), std::path::Path::new("/srv/alcove/plugins"));
    assert_eq!(config.log_filter(), "alcove_plugins=debug");
    assert_eq!(config.log_format(), LogFormat::Compact);
    assert!(!config.always_prompt_output());
    assert_eq!(config.invoke_timeout_secs(), 5);
}

#[test]
fn partial_file_keeps_remaining_defaults() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "log_filter = \"warn\"\n").expect("write config");

    let config = Config::load_from(&path).expect("config loads");
    assert_eq!(config.log_filter(), "warn");
    assert_eq!(config.log_format(), LogFormat::Json);
    assert!(config.always_prompt_output());
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "log_filter = [not toml").expect("write config");

    let err = Config::load_from(&path).expect_err("malformed file rejected");
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn wrong_field_type_is_a_parse_error() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "invoke_timeout_secs = \"soon\"\n").expect("write config");

    let err = Config::load_from(&path).expect_err("wrong type rejected");
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[rstest]
#[case::lower("json", LogFormat::Json)]
#[case::upper("JSON", LogFormat::Json)]
#[case::compact("compact", LogFormat::Compact)]
#[case::mixed("Compact", LogFormat::Compact)]
fn log_format_parses_case_insensitively(#[case] text: &str, #[case] expected: LogFormat) {
    assert_eq!(LogFormat::from_str(text).expect("parses"), expected);
}

#[test]
fn log_format_rejects_unknown_names() {
    assert!(LogFormat::from_str("xml").is_err());
}

#[test]
fn builder_overrides_apply() {
    let config = Config::default()
        .with_plugins_dir("/tmp/p")
        .with_log_filter("trace")
        .with_log_format(LogFormat::Compact)
        .with_always_prompt_output(false)
        .with_invoke_timeout_secs(2);
    assert_eq!(config.plugins_dir(), std::path::Path::new("/tmp/p"));
    assert_eq!(config.log_filter(), "trace");
    assert_eq!(config.log_format(), LogFormat::Compact);
    assert!(!config.always_prompt_output());
    assert_eq!(config.invoke_timeout_secs(), 2);
}
