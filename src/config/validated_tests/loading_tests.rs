//! Tests for configuration loading and required fields.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::{NamedTempFile, tempdir};

use super::*;

const ACCOUNT: &str = r#"
    [account]
    phone_number_id = "toml-phone"
    access_token = "toml-token"
    app_secret = "toml-secret"
    webhook_verify_token = "toml-verify"
"#;

mod required_fields {
    use super::*;

    fn missing_field(env: &EnvConfig) -> &'static str {
        match ValidatedConfig::from_raw(&cli(&[]), env, None) {
            Err(ConfigError::MissingRequired { field, .. }) => field,
            other => panic!("expected missing field, got {other:?}"),
        }
    }

    #[test]
    fn each_credential_is_required() {
        let full = credentials();

        let mut env = full.clone();
        env.phone_number_id = None;
        assert_eq!(missing_field(&env), "phone_number_id");

        let mut env = full.clone();
        env.access_token = None;
        assert_eq!(missing_field(&env), "access_token");

        let mut env = full.clone();
        env.app_secret = None;
        assert_eq!(missing_field(&env), "app_secret");

        let mut env = full;
        env.webhook_verify_token = None;
        assert_eq!(missing_field(&env), "webhook_verify_token");
    }

    #[test]
    fn nothing_configured_reports_phone_number_id_first() {
        assert_eq!(missing_field(&EnvConfig::default()), "phone_number_id");
    }

    #[test]
    fn blank_cli_value_falls_through() {
        let config = build(&["--phone-number-id", "  "], None).unwrap();
        assert_eq!(config.phone_number_id, "env-phone");
    }

    #[test]
    fn required_fields_from_toml() {
        let toml = toml(ACCOUNT);
        let config = ValidatedConfig::from_raw(&cli(&[]), &EnvConfig::default(), Some(&toml))
            .unwrap();

        assert_eq!(config.phone_number_id, "toml-phone");
        assert_eq!(config.access_token, "toml-token");
        assert_eq!(config.app_secret, "toml-secret");
        assert_eq!(config.webhook_verify_token, "toml-verify");
    }

    #[test]
    fn defaults_apply() {
        let config = build(&[], None).unwrap();

        assert_eq!(config.base_url.as_str(), "https://graph.facebook.com/");
        assert_eq!(config.api_version, "v23.0");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 2);
        assert!(config.verify_tls);
        assert_eq!(config.pool_size, 100);
        assert_eq!(config.rate_limit, 80);
        assert_eq!(config.retry_initial_delay, Duration::from_secs(1));
        assert_eq!(config.retry_max_delay, Duration::from_secs(30));
        assert!((config.retry_multiplier - 2.0).abs() < f64::EPSILON);
        assert!(config.retry_jitter.abs() < f64::EPSILON);
        assert!(!config.debug);
    }
}

mod derived {
    use super::*;

    #[test]
    fn retry_policy_counts_first_attempt() {
        let config = build(&["--max-retries", "0"], None).unwrap();
        assert_eq!(config.retry_policy().max_attempts, 1);

        let config = build(&["--max-retries", "4"], None).unwrap();
        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_delay, Duration::from_secs(1));
    }

    #[test]
    fn client_options_and_rate_limiter() {
        let toml = toml("[api]\npool_size = 3\nverify_ssl = false");
        let config = build(&["--timeout", "5", "--rate-limit", "40"], Some(&toml)).unwrap();

        let options = config.client_options();
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.pool_size, 3);
        assert!(!options.verify_tls);
        assert_eq!(config.rate_limiter().requests_per_second(), 40);
    }

    #[test]
    fn webhook_verifier_uses_configured_secrets() {
        let config = build(&[], None).unwrap();
        let verifier = config.webhook_verifier();
        let body = br#"{"object":"whatsapp_business_account","entry":[]}"#;
        let signature = crate::webhook::compute_signature(body, "env-secret");

        assert!(verifier.verify_delivery(body, Some(signature.as_str())).is_ok());
    }

    #[test]
    fn secrets_are_redacted() {
        let config = build(&[], None).unwrap();
        let debug = format!("{config:?}");
        let display = config.to_string();

        for text in [&debug, &display] {
            assert!(!text.contains("env-token"));
            assert!(!text.contains("env-secret"));
        }
        assert!(debug.contains("<redacted>"));
        assert!(display.contains("env-phone"));
    }
}

mod config_load {
    use super::*;

    #[test]
    fn load_from_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{ACCOUNT}\n[api]\nversion = \"v19.0\"").unwrap();

        let cli = cli(&["--config", file.path().to_str().unwrap()]);
        let config = ValidatedConfig::load(&cli).unwrap();

        assert_eq!(config.api_version, "v19.0");
    }

    #[test]
    fn load_nonexistent_config_file_returns_error() {
        let cli = cli(&["--config", "nonexistent_file_12345.toml"]);
        let result = ValidatedConfig::load(&cli);

        assert!(matches!(result, Err(ConfigError::FileRead { .. })));
    }
}

mod write_config {
    use super::super::super::validated::write_default_config;
    use super::*;

    #[test]
    fn write_default_config_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test-config.toml");

        write_default_config(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("[account]"));
        assert!(content.contains("[api]"));
        assert!(content.contains("[retry]"));
        assert!(content.contains("[rate_limit]"));
    }

    #[test]
    fn write_default_config_to_invalid_path_returns_error() {
        let path = Path::new("/nonexistent_dir_12345/config.toml");
        let result = write_default_config(path);

        assert!(matches!(result, Err(ConfigError::FileWrite { .. })));
    }
}
