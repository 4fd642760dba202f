//! Tests for config file discovery and graceful degradation
//!
//! Tests that touch CURIO_CONFIG are marked #[serial] so they don't race.

use curio_common::config::{load_config_or_default, load_toml_config, locate_config_file, CONFIG_ENV_VAR};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;

#[test]
fn test_load_full_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
port = 9090
apollo_url = "http://apollo.test/api"
iiif_url = "http://iiif.test"
archival_bucket = "archivematica-test"
concurrent_probes = true
read_timeout_secs = 30
log_level = "debug"
"#
    )
    .unwrap();

    let config = load_toml_config(file.path()).unwrap();
    assert_eq!(config.port, Some(9090));
    assert_eq!(config.apollo_url.as_deref(), Some("http://apollo.test/api"));
    assert_eq!(config.iiif_url.as_deref(), Some("http://iiif.test"));
    assert_eq!(config.archival_bucket.as_deref(), Some("archivematica-test"));
    assert_eq!(config.concurrent_probes, Some(true));
    assert_eq!(config.read_timeout_secs, Some(30));
    assert_eq!(config.log_level.as_deref(), Some("debug"));
    assert!(config.tracksys_url.is_none());
}

#[test]
fn test_malformed_config_is_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "port = \"not a number\"").unwrap();

    let err = load_toml_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("Configuration error"));
}

#[test]
fn test_missing_explicit_file_falls_back_to_defaults() {
    let path = PathBuf::from("/nonexistent/curio/config.toml");
    let config = load_config_or_default(Some(&path)).unwrap();
    assert_eq!(config, Default::default());
}

#[test]
#[serial]
fn test_env_var_locates_config() {
    let file = tempfile::NamedTempFile::new().unwrap();
    env::set_var(CONFIG_ENV_VAR, file.path());

    let located = locate_config_file(None);
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(located, Some(file.path().to_path_buf()));
}

#[test]
#[serial]
fn test_explicit_path_beats_env_var() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/curio-from-env.toml");
    let explicit = PathBuf::from("/tmp/curio-explicit.toml");

    let located = locate_config_file(Some(&explicit));
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(located, Some(explicit));
}
