//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with environment and CLI values.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Account credentials
    #[serde(default)]
    pub account: AccountSection,

    /// Graph API connection settings
    #[serde(default)]
    pub api: ApiSection,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetrySection,

    /// Client-side rate limiting
    #[serde(default)]
    pub rate_limit: RateLimitSection,
}

/// Account credentials section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountSection {
    /// Business phone number id
    pub phone_number_id: Option<String>,

    /// Graph API access token
    pub access_token: Option<String>,

    /// App secret used to sign webhook deliveries
    pub app_secret: Option<String>,

    /// Token echoed during the webhook handshake
    pub webhook_verify_token: Option<String>,
}

/// Graph API connection section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSection {
    /// Base URL of the Graph API
    pub base_url: Option<String>,

    /// API version, e.g. "v23.0"
    pub version: Option<String>,

    /// Per-attempt timeout in seconds
    pub timeout: Option<f64>,

    /// Verify TLS certificates
    pub verify_ssl: Option<bool>,

    /// Idle connections kept per host
    pub pool_size: Option<usize>,
}

/// Retry policy configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    /// Retries after the first attempt
    pub max_retries: Option<u32>,

    /// Initial retry delay in milliseconds
    pub initial_delay_ms: Option<u64>,

    /// Maximum retry delay in milliseconds
    pub max_delay_ms: Option<u64>,

    /// Backoff multiplier
    pub multiplier: Option<f64>,

    /// Random spread applied to each delay, in [0, 1)
    pub jitter: Option<f64>,
}

/// Rate limiting section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitSection {
    /// Requests-per-second ceiling
    pub requests_per_second: Option<u32>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# wa-cloud configuration file
#
# Every value can also be set through a WHATSAPP_* environment variable.
# Priority: command line > environment > this file > built-in defaults.

[account]
# Business phone number id (required, env: WHATSAPP_PHONE_NUMBER_ID)
# phone_number_id = "123456789012345"

# Graph API access token (required, env: WHATSAPP_ACCESS_TOKEN)
# access_token = "EAAG..."

# App secret used to check webhook signatures (required, env: WHATSAPP_APP_SECRET)
# app_secret = "..."

# Token echoed during the webhook handshake (required, env: WHATSAPP_WEBHOOK_VERIFY_TOKEN)
# webhook_verify_token = "..."

[api]
# base_url = "https://graph.facebook.com"
# version = "v23.0"

# Per-attempt timeout in seconds, at most 300
# timeout = 30

# verify_ssl = true
# pool_size = 100

[retry]
# Retries after the first attempt, at most 10
# max_retries = 2

# initial_delay_ms = 1000
# max_delay_ms = 30000
# multiplier = 2.0

# Random spread applied to each delay, 0.0 disables it
# jitter = 0.0

[rate_limit]
# Requests per second, 1 to 1000
# requests_per_second = 80
"#
    .to_string()
}
