//! Integration tests for configuration resolution and graceful degradation
//!
//! Covers:
//! - Missing configuration files never cause a failure
//! - Priority order: CLI path > GMP_CONFIG > platform default > compiled defaults
//! - Environment overrides for individual settings
//!
//! Note: Uses serial_test to prevent environment variable races.
//! Tests that manipulate GMP_* variables are marked with #[serial].

use gmp_common::config::{ConfigResolver, TomlConfig, CONFIG_ENV_VAR};
use gmp_common::Error;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;

const OVERRIDE_VARS: &[&str] = &[
    CONFIG_ENV_VAR,
    "GMP_INSTANCE_NAME",
    "GMP_DEFAULT_VOLUME",
    "GMP_VOLUME_STEP",
    "GMP_IDLE_DISCONNECT_SECONDS",
    "GMP_EMPTY_CHANNEL_DISCONNECT_SECONDS",
];

fn clear_env() {
    for var in OVERRIDE_VARS {
        env::remove_var(var);
    }
}

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_missing_cli_file_falls_back_to_defaults() {
    clear_env();

    let resolver = ConfigResolver::new(Some(PathBuf::from("/nonexistent/gmp/config.toml")));
    let config = resolver.load().expect("missing file must not be fatal");

    assert_eq!(config, TomlConfig::default());
}

#[test]
#[serial]
fn test_cli_path_takes_precedence_over_env() {
    clear_env();

    let cli_file = write_config("instance_name = \"from-cli\"\n");
    let env_file = write_config("instance_name = \"from-env\"\n");
    env::set_var(CONFIG_ENV_VAR, env_file.path());

    let resolver = ConfigResolver::new(Some(cli_file.path().to_path_buf()));
    assert_eq!(resolver.config_path().unwrap(), cli_file.path());
    assert_eq!(resolver.load().unwrap().instance_name, "from-cli");

    clear_env();
}

#[test]
#[serial]
fn test_env_config_path_used_without_cli() {
    clear_env();

    let env_file = write_config(
        r#"
        [player]
        empty_channel_disconnect_secs = 45
        history_capacity = 5
        "#,
    );
    env::set_var(CONFIG_ENV_VAR, env_file.path());

    let config = ConfigResolver::new(None).load().unwrap();
    assert_eq!(config.player.empty_channel_disconnect_secs, 45);
    assert_eq!(config.player.history_capacity, 5);

    clear_env();
}

#[test]
#[serial]
fn test_env_overrides_apply_after_file() {
    clear_env();

    let file = write_config(
        r#"
        instance_name = "file-name"

        [player]
        idle_disconnect_secs = 600
        "#,
    );
    env::set_var("GMP_INSTANCE_NAME", "env-name");
    env::set_var("GMP_IDLE_DISCONNECT_SECONDS", "90");
    env::set_var("GMP_DEFAULT_VOLUME", "0.4");

    let config = ConfigResolver::new(Some(file.path().to_path_buf()))
        .load()
        .unwrap();

    assert_eq!(config.instance_name, "env-name");
    assert_eq!(config.player.idle_disconnect_secs, 90);
    assert_eq!(config.player.default_volume, 0.4);

    clear_env();
}

#[test]
#[serial]
fn test_unparseable_override_is_ignored() {
    clear_env();
    env::set_var("GMP_EMPTY_CHANNEL_DISCONNECT_SECONDS", "soon");

    let config = ConfigResolver::new(Some(PathBuf::from("/nonexistent.toml")))
        .load()
        .unwrap();
    assert_eq!(config.player.empty_channel_disconnect_secs, 30);

    clear_env();
}

#[test]
#[serial]
fn test_malformed_file_is_an_error() {
    clear_env();

    let file = write_config("[player\nidle_disconnect_secs = ");
    let result = ConfigResolver::new(Some(file.path().to_path_buf())).load();

    assert!(matches!(result, Err(Error::Toml(_))));
}

#[test]
#[serial]
fn test_out_of_range_volume_override_is_clamped() {
    clear_env();
    env::set_var("GMP_DEFAULT_VOLUME", "7.5");

    let config = ConfigResolver::new(Some(PathBuf::from("/nonexistent.toml")))
        .load()
        .unwrap();
    assert_eq!(config.player.default_volume, 2.0);

    clear_env();
}

#[test]
#[serial]
fn test_nan_volume_override_is_rejected() {
    clear_env();
    env::set_var("GMP_DEFAULT_VOLUME", "NaN");

    let result = ConfigResolver::new(Some(PathBuf::from("/nonexistent.toml"))).load();
    assert!(matches!(result, Err(Error::Config(_))));

    clear_env();
}
