//! Validated configuration after merging CLI, environment and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use regex::Regex;
use url::Url;

use crate::transport::{ClientOptions, RateLimiter, RetryPolicy};
use crate::webhook::WebhookVerifier;

use super::cli::Cli;
use super::defaults;
use super::env::EnvConfig;
use super::error::{ConfigError, field};
use super::toml::TomlConfig;

const API_VERSION_PATTERN: &str = r"^v\d+\.\d+$";

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to merge CLI args, environment values and
/// an optional TOML config. Missing credentials and out-of-range values are
/// rejected there.
///
/// `Debug` and `Display` never print the access token or the app secret.
pub struct ValidatedConfig {
    /// Business phone number id
    pub phone_number_id: String,

    /// Graph API access token
    pub access_token: String,

    /// App secret used to check webhook signatures
    pub app_secret: String,

    /// Token echoed during the webhook handshake
    pub webhook_verify_token: String,

    /// Graph API base URL
    pub base_url: Url,

    /// Graph API version, e.g. "v23.0"
    pub api_version: String,

    /// Per-attempt timeout
    pub timeout: Duration,

    /// Retries after the first attempt
    pub max_retries: u32,

    /// Verify TLS certificates
    pub verify_tls: bool,

    /// Idle connections kept per host
    pub pool_size: usize,

    /// Requests-per-second ceiling
    pub rate_limit: u32,

    /// Delay before the first retry
    pub retry_initial_delay: Duration,

    /// Upper bound on any retry delay
    pub retry_max_delay: Duration,

    /// Backoff multiplier
    pub retry_multiplier: f64,

    /// Random spread applied to each delay
    pub retry_jitter: f64,

    /// Debug logging enabled
    pub debug: bool,
}

impl fmt::Debug for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedConfig")
            .field("phone_number_id", &self.phone_number_id)
            .field("access_token", &"<redacted>")
            .field("app_secret", &"<redacted>")
            .field("webhook_verify_token", &"<redacted>")
            .field("base_url", &self.base_url.as_str())
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("verify_tls", &self.verify_tls)
            .field("pool_size", &self.pool_size)
            .field("rate_limit", &self.rate_limit)
            .field("retry_initial_delay", &self.retry_initial_delay)
            .field("retry_max_delay", &self.retry_max_delay)
            .field("retry_multiplier", &self.retry_multiplier)
            .field("retry_jitter", &self.retry_jitter)
            .field("debug", &self.debug)
            .finish()
    }
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Config {{ phone_number_id: {}, api: {}{}, timeout: {}s, retries: {} ({}ms..{}ms x{}), \
             rate_limit: {}/s, verify_tls: {}, pool_size: {} }}",
            self.phone_number_id,
            self.base_url,
            self.api_version,
            self.timeout.as_secs_f64(),
            self.max_retries,
            self.retry_initial_delay.as_millis(),
            self.retry_max_delay.as_millis(),
            self.retry_multiplier,
            self.rate_limit,
            self.verify_tls,
            self.pool_size,
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments, environment
    /// values and an optional TOML config.
    ///
    /// Priority is CLI, then environment, then TOML, then built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A required credential is missing
    /// - The base URL is not an http(s) URL
    /// - The API version is not of the form `v<major>.<minor>`
    /// - A numeric value is out of range
    pub fn from_raw(
        cli: &Cli,
        env: &EnvConfig,
        toml: Option<&TomlConfig>,
    ) -> Result<Self, ConfigError> {
        let account = toml.map(|t| &t.account);

        let phone_number_id = resolve_required(
            cli.phone_number_id.as_deref(),
            env.phone_number_id.as_deref(),
            account.and_then(|a| a.phone_number_id.as_deref()),
            field::PHONE_NUMBER_ID,
            "Use --phone-number-id, WHATSAPP_PHONE_NUMBER_ID or account.phone_number_id",
        )?;
        let access_token = resolve_required(
            cli.access_token.as_deref(),
            env.access_token.as_deref(),
            account.and_then(|a| a.access_token.as_deref()),
            field::ACCESS_TOKEN,
            "Use --access-token, WHATSAPP_ACCESS_TOKEN or account.access_token",
        )?;
        let app_secret = resolve_required(
            None,
            env.app_secret.as_deref(),
            account.and_then(|a| a.app_secret.as_deref()),
            field::APP_SECRET,
            "Use WHATSAPP_APP_SECRET or account.app_secret",
        )?;
        let webhook_verify_token = resolve_required(
            None,
            env.webhook_verify_token.as_deref(),
            account.and_then(|a| a.webhook_verify_token.as_deref()),
            field::WEBHOOK_VERIFY_TOKEN,
            "Use WHATSAPP_WEBHOOK_VERIFY_TOKEN or account.webhook_verify_token",
        )?;

        let base_url = Self::resolve_base_url(cli, env, toml)?;
        let api_version = Self::resolve_api_version(cli, env, toml)?;
        let timeout = Self::resolve_timeout(cli, env, toml)?;
        let max_retries = Self::resolve_max_retries(cli, env, toml)?;
        let pool_size = Self::resolve_pool_size(env, toml)?;
        let rate_limit = Self::resolve_rate_limit(cli, env, toml)?;
        let verify_tls = env
            .verify_tls
            .or_else(|| toml.and_then(|t| t.api.verify_ssl))
            .unwrap_or(defaults::VERIFY_TLS);
        let (retry_initial_delay, retry_max_delay, retry_multiplier, retry_jitter) =
            Self::resolve_retry_timing(toml)?;

        Ok(Self {
            phone_number_id,
            access_token,
            app_secret,
            webhook_verify_token,
            base_url,
            api_version,
            timeout,
            max_retries,
            verify_tls,
            pool_size,
            rate_limit,
            retry_initial_delay,
            retry_max_delay,
            retry_multiplier,
            retry_jitter,
            debug: cli.verbose || env.debug.unwrap_or(false),
        })
    }

    /// Loads and merges configuration from CLI, the process environment and
    /// an optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An environment variable cannot be parsed
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let env = EnvConfig::from_process_env()?;
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, &env, toml.as_ref())
    }

    /// Builds configuration from the process environment alone.
    ///
    /// # Errors
    ///
    /// As [`Self::from_raw`], plus unparsable environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_raw(&Cli::default(), &EnvConfig::from_process_env()?, None)
    }

    /// Retry policy derived from the retry settings.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new()
            .with_max_attempts(self.max_retries.saturating_add(1))
            .with_initial_delay(self.retry_initial_delay)
            .with_max_delay(self.retry_max_delay)
            .with_multiplier(self.retry_multiplier)
            .with_jitter(self.retry_jitter)
    }

    /// Connection settings for the HTTP client.
    #[must_use]
    pub const fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: self.timeout,
            pool_size: self.pool_size,
            verify_tls: self.verify_tls,
        }
    }

    /// A fresh rate limiter at the configured ceiling.
    #[must_use]
    pub fn rate_limiter(&self) -> RateLimiter {
        RateLimiter::per_second(self.rate_limit)
    }

    /// A webhook verifier holding the app secret and verify token.
    #[must_use]
    pub fn webhook_verifier(&self) -> WebhookVerifier {
        WebhookVerifier::new(self.app_secret.clone(), self.webhook_verify_token.clone())
    }

    fn resolve_base_url(
        cli: &Cli,
        env: &EnvConfig,
        toml: Option<&TomlConfig>,
    ) -> Result<Url, ConfigError> {
        let url_str = cli
            .base_url
            .as_deref()
            .or(env.base_url.as_deref())
            .or_else(|| toml.and_then(|t| t.api.base_url.as_deref()))
            .unwrap_or(defaults::BASE_URL);

        let url = Url::parse(url_str).map_err(|e| ConfigError::InvalidUrl {
            url: url_str.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl {
                url: url_str.to_string(),
                reason: "must be an http or https URL".to_string(),
            });
        }

        Ok(url)
    }

    fn resolve_api_version(
        cli: &Cli,
        env: &EnvConfig,
        toml: Option<&TomlConfig>,
    ) -> Result<String, ConfigError> {
        let version = cli
            .api_version
            .as_deref()
            .or(env.api_version.as_deref())
            .or_else(|| toml.and_then(|t| t.api.version.as_deref()))
            .unwrap_or(defaults::API_VERSION)
            .trim();

        if Regex::new(API_VERSION_PATTERN).is_ok_and(|re| re.is_match(version)) {
            Ok(version.to_string())
        } else {
            Err(ConfigError::InvalidApiVersion {
                value: version.to_string(),
            })
        }
    }

    fn resolve_timeout(
        cli: &Cli,
        env: &EnvConfig,
        toml: Option<&TomlConfig>,
    ) -> Result<Duration, ConfigError> {
        let seconds = cli
            .timeout
            .or(env.timeout)
            .or_else(|| toml.and_then(|t| t.api.timeout))
            .unwrap_or(defaults::TIMEOUT_SECS);

        if !(seconds > 0.0 && seconds <= defaults::MAX_TIMEOUT_SECS) {
            return Err(ConfigError::invalid(
                "timeout",
                format!(
                    "must be greater than 0 and at most {} seconds, got {seconds}",
                    defaults::MAX_TIMEOUT_SECS
                ),
            ));
        }

        Ok(Duration::from_secs_f64(seconds))
    }

    fn resolve_max_retries(
        cli: &Cli,
        env: &EnvConfig,
        toml: Option<&TomlConfig>,
    ) -> Result<u32, ConfigError> {
        let retries = cli
            .max_retries
            .or(env.max_retries)
            .or_else(|| toml.and_then(|t| t.retry.max_retries))
            .unwrap_or(defaults::MAX_RETRIES);

        if retries > defaults::MAX_RETRIES_LIMIT {
            return Err(ConfigError::invalid(
                "max_retries",
                format!(
                    "must be at most {}, got {retries}",
                    defaults::MAX_RETRIES_LIMIT
                ),
            ));
        }

        Ok(retries)
    }

    fn resolve_pool_size(env: &EnvConfig, toml: Option<&TomlConfig>) -> Result<usize, ConfigError> {
        let size = env
            .pool_size
            .or_else(|| toml.and_then(|t| t.api.pool_size))
            .unwrap_or(defaults::POOL_SIZE);

        if size == 0 {
            return Err(ConfigError::invalid("pool_size", "must be greater than 0"));
        }

        Ok(size)
    }

    fn resolve_rate_limit(
        cli: &Cli,
        env: &EnvConfig,
        toml: Option<&TomlConfig>,
    ) -> Result<u32, ConfigError> {
        let rate = cli
            .rate_limit
            .or(env.rate_limit)
            .or_else(|| toml.and_then(|t| t.rate_limit.requests_per_second))
            .unwrap_or(defaults::RATE_LIMIT);

        if !(1..=defaults::MAX_RATE_LIMIT).contains(&rate) {
            return Err(ConfigError::invalid(
                "rate_limit",
                format!(
                    "must be between 1 and {} requests per second, got {rate}",
                    defaults::MAX_RATE_LIMIT
                ),
            ));
        }

        Ok(rate)
    }

    fn resolve_retry_timing(
        toml: Option<&TomlConfig>,
    ) -> Result<(Duration, Duration, f64, f64), ConfigError> {
        let retry = toml.map(|t| &t.retry);

        let initial_ms = retry
            .and_then(|r| r.initial_delay_ms)
            .unwrap_or(defaults::RETRY_INITIAL_DELAY_MS);
        let max_ms = retry
            .and_then(|r| r.max_delay_ms)
            .unwrap_or(defaults::RETRY_MAX_DELAY_MS);
        let multiplier = retry
            .and_then(|r| r.multiplier)
            .unwrap_or(defaults::RETRY_MULTIPLIER);
        let jitter = retry
            .and_then(|r| r.jitter)
            .unwrap_or(defaults::RETRY_JITTER);

        if max_ms < initial_ms {
            return Err(ConfigError::invalid(
                "retry.max_delay_ms",
                format!("({max_ms}ms) must be >= initial_delay_ms ({initial_ms}ms)"),
            ));
        }

        if multiplier <= 0.0 || !multiplier.is_finite() {
            return Err(ConfigError::invalid(
                "retry.multiplier",
                "must be a positive finite number",
            ));
        }

        if !(0.0..1.0).contains(&jitter) {
            return Err(ConfigError::invalid(
                "retry.jitter",
                format!("must be in [0.0, 1.0), got {jitter}"),
            ));
        }

        Ok((
            Duration::from_millis(initial_ms),
            Duration::from_millis(max_ms),
            multiplier,
            jitter,
        ))
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

fn resolve_required(
    cli: Option<&str>,
    env: Option<&str>,
    toml: Option<&str>,
    field: &'static str,
    hint: &'static str,
) -> Result<String, ConfigError> {
    [cli, env, toml]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| ConfigError::missing(field, hint))
}
