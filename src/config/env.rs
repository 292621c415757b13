//! Environment variable layer.
//!
//! Reads `WHATSAPP_*` variables through a lookup function so tests never
//! touch the process environment.

use std::str::FromStr;

use super::ConfigError;

/// Business phone number id.
pub const PHONE_NUMBER_ID: &str = "WHATSAPP_PHONE_NUMBER_ID";
/// Graph API access token.
pub const ACCESS_TOKEN: &str = "WHATSAPP_ACCESS_TOKEN";
/// App secret for webhook signatures.
pub const APP_SECRET: &str = "WHATSAPP_APP_SECRET";
/// Webhook handshake verify token.
pub const WEBHOOK_VERIFY_TOKEN: &str = "WHATSAPP_WEBHOOK_VERIFY_TOKEN";
/// Graph API base URL.
pub const BASE_URL: &str = "WHATSAPP_BASE_URL";
/// Graph API version.
pub const API_VERSION: &str = "WHATSAPP_API_VERSION";
/// Per-attempt timeout in seconds.
pub const TIMEOUT: &str = "WHATSAPP_TIMEOUT";
/// Retries after the first attempt.
pub const MAX_RETRIES: &str = "WHATSAPP_MAX_RETRIES";
/// TLS certificate verification.
pub const VERIFY_SSL: &str = "WHATSAPP_VERIFY_SSL";
/// Idle connections kept per host.
pub const POOL_SIZE: &str = "WHATSAPP_POOL_SIZE";
/// Requests-per-second ceiling.
pub const RATE_LIMIT: &str = "WHATSAPP_RATE_LIMIT";
/// Debug logging.
pub const DEBUG: &str = "WHATSAPP_DEBUG";

/// Values read from the environment. Unset or blank variables are `None`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EnvConfig {
    pub phone_number_id: Option<String>,
    pub access_token: Option<String>,
    pub app_secret: Option<String>,
    pub webhook_verify_token: Option<String>,
    pub base_url: Option<String>,
    pub api_version: Option<String>,
    pub timeout: Option<f64>,
    pub max_retries: Option<u32>,
    pub verify_tls: Option<bool>,
    pub pool_size: Option<usize>,
    pub rate_limit: Option<u32>,
    pub debug: Option<bool>,
}

impl EnvConfig {
    /// Reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if a numeric or boolean variable
    /// cannot be parsed.
    pub fn from_process_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if a numeric or boolean variable
    /// cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            phone_number_id: get(PHONE_NUMBER_ID),
            access_token: get(ACCESS_TOKEN),
            app_secret: get(APP_SECRET),
            webhook_verify_token: get(WEBHOOK_VERIFY_TOKEN),
            base_url: get(BASE_URL),
            api_version: get(API_VERSION),
            timeout: parse_number(TIMEOUT, get(TIMEOUT))?,
            max_retries: parse_number(MAX_RETRIES, get(MAX_RETRIES))?,
            verify_tls: parse_bool(VERIFY_SSL, get(VERIFY_SSL))?,
            pool_size: parse_number(POOL_SIZE, get(POOL_SIZE))?,
            rate_limit: parse_number(RATE_LIMIT, get(RATE_LIMIT))?,
            debug: parse_bool(DEBUG, get(DEBUG))?,
        })
    }
}

fn parse_number<T>(var: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|raw| {
            raw.parse::<T>().map_err(|e| ConfigError::InvalidEnv {
                var,
                value: raw.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn parse_bool(var: &'static str, value: Option<String>) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = value else {
        return Ok(None);
    };

    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidEnv {
            var,
            value: raw,
            reason: "expected one of 1/0, true/false, yes/no, on/off".to_string(),
        }),
    }
}
