//! Configuration layer for wa-cloud.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - Environment variables ([`EnvConfig`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments**
//! 2. **`WHATSAPP_*` environment variables**
//! 3. **TOML config file**
//! 4. **Built-in defaults**
//!
//! The four credentials (`phone_number_id`, `access_token`, `app_secret`,
//! `webhook_verify_token`) have no defaults. The app secret and verify token
//! are never read from the command line, so they stay out of shell history.
//!
//! # TOML-Only Options
//!
//! Retry timing (`retry.initial_delay_ms`, `retry.max_delay_ms`,
//! `retry.multiplier`, `retry.jitter`) is only configurable from the file.

mod cli;
pub mod defaults;
pub mod env;
mod error;
mod toml;
mod validated;

#[cfg(test)]
mod validated_tests;

pub use cli::{Cli, Command};
pub use env::EnvConfig;
pub use error::{ConfigError, field};
pub use toml::{TomlConfig, default_config_template};
pub use validated::{ValidatedConfig, write_default_config};
