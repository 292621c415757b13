//! Tests for validated configuration.

use super::ConfigError;
use super::cli::Cli;
use super::env::EnvConfig;
use super::toml::TomlConfig;
use super::validated::ValidatedConfig;

/// Helper to create CLI args from a slice
fn cli(args: &[&str]) -> Cli {
    let mut full_args = vec!["wa-cloud"];
    full_args.extend(args);
    Cli::parse_from_iter(full_args)
}

/// Helper to parse TOML config
fn toml(content: &str) -> TomlConfig {
    TomlConfig::parse(content).unwrap()
}

/// Environment holding all four credentials.
fn credentials() -> EnvConfig {
    EnvConfig {
        phone_number_id: Some("env-phone".to_string()),
        access_token: Some("env-token".to_string()),
        app_secret: Some("env-secret".to_string()),
        webhook_verify_token: Some("env-verify".to_string()),
        ..EnvConfig::default()
    }
}

/// Builds from credentials plus the given CLI args and TOML.
fn build(args: &[&str], toml: Option<&TomlConfig>) -> Result<ValidatedConfig, ConfigError> {
    ValidatedConfig::from_raw(&cli(args), &credentials(), toml)
}

mod loading_tests;
