//! Application configuration loaded from environment variables.
//!
//! Fail-fast: required variables must be present and valid or the runner
//! exits with a clear error before touching any external system. The
//! config is constructed once and passed by reference into every
//! component — there is no ambient/global lookup.

use std::env;
use std::path::PathBuf;
use thiserror::Error;

use embark_directory::ActiveDirectoryConfig;
use embark_hr::{HrSourceConfig, SslMode};
use embark_reports::{ReportRecipients, SmtpSettings};

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {var}")]
    MissingVar { var: String },

    /// An environment variable holds an unusable value.
    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

/// Fully resolved runner configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Log filter directive.
    pub rust_log: String,

    /// HR source connection settings (password filled in from the
    /// credential store after load).
    pub hr: HrSourceConfig,

    /// Active Directory connection settings (bind password filled in from
    /// the credential store after load).
    pub directory: ActiveDirectoryConfig,

    /// Organizational mail domain for derived addresses.
    pub mail_domain: String,

    /// Baseline group DNs every new account joins.
    pub baseline_groups: Vec<String>,

    /// Dedup cache store path.
    pub cache_path: PathBuf,

    /// Dedup cache whole-store expiry in days.
    pub cache_max_age_days: u32,

    /// Default lookback window in days.
    pub default_lookback_days: u32,

    /// SMTP gateway settings.
    pub smtp: SmtpSettings,

    /// Report recipient lists.
    pub recipients: ReportRecipients,

    /// Path to the encrypted service-credential file.
    pub credential_file: PathBuf,

    /// Hex-encoded master key for the credential store.
    pub credential_key: String,
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let hr = HrSourceConfig {
            host: required("EMBARK_HR_DB_HOST")?,
            port: optional_parsed("EMBARK_HR_DB_PORT", 5432)?,
            database: required("EMBARK_HR_DB_NAME")?,
            username: required("EMBARK_HR_DB_USER")?,
            password: None,
            ssl_mode: parse_ssl_mode(&optional("EMBARK_HR_DB_SSLMODE", "prefer"))?,
            schema: env::var("EMBARK_HR_DB_SCHEMA").ok().filter(|s| !s.is_empty()),
            pool_size: optional_parsed("EMBARK_HR_DB_POOL_SIZE", 5)?,
            connection_timeout_secs: optional_parsed("EMBARK_HR_DB_TIMEOUT_SECS", 30)?,
        };

        let directory = ActiveDirectoryConfig {
            host: required("EMBARK_AD_HOST")?,
            port: optional_parsed("EMBARK_AD_PORT", 636)?,
            use_ssl: optional_parsed("EMBARK_AD_USE_SSL", true)?,
            use_starttls: optional_parsed("EMBARK_AD_USE_STARTTLS", false)?,
            domain: required("EMBARK_AD_DOMAIN")?,
            base_dn: required("EMBARK_AD_BASE_DN")?,
            bind_dn: required("EMBARK_AD_BIND_DN")?,
            bind_password: None,
            accounts_ou: required("EMBARK_AD_ACCOUNTS_OU")?,
            connection_timeout_secs: optional_parsed("EMBARK_AD_TIMEOUT_SECS", 30)?,
        };

        let smtp = SmtpSettings {
            host: required("EMBARK_SMTP_HOST")?,
            port: optional_parsed("EMBARK_SMTP_PORT", 587)?,
            from_address: required("EMBARK_MAIL_FROM")?,
            from_name: optional("EMBARK_MAIL_FROM_NAME", "embark"),
        };

        let recipients = ReportRecipients {
            it: parse_list(&required("EMBARK_REPORT_TO_IT")?),
            hr: parse_list(&required("EMBARK_REPORT_TO_HR")?),
            clinical: parse_list(&required("EMBARK_REPORT_TO_CLINICAL")?),
        };

        Ok(Self {
            rust_log: optional("EMBARK_LOG", "info"),
            hr,
            directory,
            mail_domain: required("EMBARK_MAIL_DOMAIN")?,
            baseline_groups: parse_list(&required("EMBARK_BASELINE_GROUPS")?),
            cache_path: PathBuf::from(optional("EMBARK_CACHE_PATH", "processed_employees.txt")),
            cache_max_age_days: optional_parsed("EMBARK_CACHE_MAX_AGE_DAYS", 2)?,
            default_lookback_days: optional_parsed("EMBARK_LOOKBACK_DAYS", 14)?,
            smtp,
            recipients,
            credential_file: PathBuf::from(required("EMBARK_CREDENTIAL_FILE")?),
            credential_key: required("EMBARK_CREDENTIAL_KEY")?,
        })
    }

    /// Inject the decrypted service-account secret into the connection
    /// configs that need it.
    pub fn with_service_secret(mut self, secret: &str) -> Self {
        self.hr.password = Some(secret.to_string());
        self.directory.bind_password = Some(secret.to_string());
        self
    }
}

/// Read a required variable.
fn required(var: &str) -> Result<String, ConfigError> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar {
            var: var.to_string(),
        }),
    }
}

/// Read an optional variable with a default.
fn optional(var: &str, default: &str) -> String {
    env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Read an optional variable parsed to `T`.
fn optional_parsed<T: std::str::FromStr>(var: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => {
            value.trim().parse().map_err(|e| ConfigError::InvalidValue {
                var: var.to_string(),
                message: format!("{e}"),
            })
        }
        _ => Ok(default),
    }
}

/// Parse a comma-separated list, trimming and dropping empties.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parse the HR SSL mode value.
fn parse_ssl_mode(value: &str) -> Result<SslMode, ConfigError> {
    match value.to_lowercase().as_str() {
        "disable" => Ok(SslMode::Disable),
        "prefer" => Ok(SslMode::Prefer),
        "require" => Ok(SslMode::Require),
        other => Err(ConfigError::InvalidValue {
            var: "EMBARK_HR_DB_SSLMODE".to_string(),
            message: format!("expected disable|prefer|require, got '{other}'"),
        }),
    }
}
