//! HR source configuration.
//!
//! Connection settings for the read-only HR database.

use serde::{Deserialize, Serialize};

use crate::error::{HrError, HrResult};

/// SSL mode for the HR database connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SslMode {
    /// No SSL.
    Disable,
    /// Use SSL if the server supports it.
    Prefer,
    /// Require SSL, fail otherwise.
    Require,
}

impl SslMode {
    /// The libpq-compatible string value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
        }
    }
}

impl Default for SslMode {
    fn default() -> Self {
        SslMode::Prefer
    }
}

/// Configuration for the HR source database.
#[derive(Clone, Serialize, Deserialize)]
pub struct HrSourceConfig {
    /// Database server hostname or IP address.
    pub host: String,

    /// Database server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username for authentication.
    pub username: String,

    /// Password for authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// SSL mode.
    #[serde(default)]
    pub ssl_mode: SslMode,

    /// Optional schema to put on the search path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Connection pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Connection acquire timeout in seconds.
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,
}

fn default_port() -> u16 {
    5432
}

fn default_pool_size() -> u32 {
    5
}

fn default_connection_timeout_secs() -> u64 {
    30
}

impl HrSourceConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> HrResult<()> {
        if self.host.is_empty() {
            return Err(HrError::invalid_configuration("host is required"));
        }
        if self.database.is_empty() {
            return Err(HrError::invalid_configuration("database is required"));
        }
        if self.username.is_empty() {
            return Err(HrError::invalid_configuration("username is required"));
        }
        if self.pool_size == 0 {
            return Err(HrError::invalid_configuration(
                "pool_size must be at least 1",
            ));
        }
        Ok(())
    }

    /// A copy of this config with the password removed, for logging.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            password: self.password.as_ref().map(|_| "***".to_string()),
            ..self.clone()
        }
    }
}

impl std::fmt::Debug for HrSourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HrSourceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("ssl_mode", &self.ssl_mode)
            .field("schema", &self.schema)
            .field("pool_size", &self.pool_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HrSourceConfig {
        HrSourceConfig {
            host: "hrdb.example.org".to_string(),
            port: 5432,
            database: "hr".to_string(),
            username: "svc_embark".to_string(),
            password: Some("secret".to_string()),
            ssl_mode: SslMode::Require,
            schema: None,
            pool_size: 5,
            connection_timeout_secs: 30,
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_missing_host() {
        let mut config = sample();
        config.host = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_pool() {
        let mut config = sample();
        config.pool_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_ssl_mode_strings() {
        assert_eq!(SslMode::Disable.as_str(), "disable");
        assert_eq!(SslMode::Require.as_str(), "require");
    }
}
