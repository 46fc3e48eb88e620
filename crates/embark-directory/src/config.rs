//! Active Directory connection configuration.

use serde::{Deserialize, Serialize};

use crate::ad::escape_dn_value;
use crate::error::{DirectoryError, DirectoryResult};

/// Configuration for the Active Directory connector.
#[derive(Clone, Serialize, Deserialize)]
pub struct ActiveDirectoryConfig {
    /// Domain controller hostname or IP address.
    pub host: String,

    /// LDAP port (389 for LDAP, 636 for LDAPS).
    #[serde(default = "default_ldaps_port")]
    pub port: u16,

    /// Use SSL/TLS (LDAPS). Required for password operations.
    #[serde(default = "default_true")]
    pub use_ssl: bool,

    /// Use STARTTLS upgrade on a plain LDAP connection.
    #[serde(default)]
    pub use_starttls: bool,

    /// AD DNS domain (e.g., "corp.example.org"), used for userPrincipalName.
    pub domain: String,

    /// Base DN for all operations (e.g., "DC=corp,DC=example,DC=org").
    pub base_dn: String,

    /// Bind DN for the service account.
    pub bind_dn: String,

    /// Bind password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_password: Option<String>,

    /// Parent DN under which per-department OUs are created
    /// (e.g., "OU=Staff,DC=corp,DC=example,DC=org").
    pub accounts_ou: String,

    /// Connection timeout in seconds.
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,
}

fn default_ldaps_port() -> u16 {
    636
}

fn default_true() -> bool {
    true
}

fn default_connection_timeout_secs() -> u64 {
    30
}

impl ActiveDirectoryConfig {
    /// Validate AD-specific configuration requirements.
    pub fn validate(&self) -> DirectoryResult<()> {
        if self.host.is_empty() {
            return Err(DirectoryError::invalid_configuration("host is required"));
        }
        if self.domain.is_empty() {
            return Err(DirectoryError::invalid_configuration(
                "domain is required for Active Directory",
            ));
        }
        if self.base_dn.is_empty() {
            return Err(DirectoryError::invalid_configuration("base_dn is required"));
        }
        if self.bind_dn.is_empty() {
            return Err(DirectoryError::invalid_configuration("bind_dn is required"));
        }
        if self.accounts_ou.is_empty() {
            return Err(DirectoryError::invalid_configuration(
                "accounts_ou is required",
            ));
        }
        Ok(())
    }

    /// The DN of the per-department OU under the accounts base.
    #[must_use]
    pub fn department_ou_dn(&self, department: &str) -> String {
        format!("OU={},{}", escape_dn_value(department), self.accounts_ou)
    }

    /// The userPrincipalName for a username in this domain.
    #[must_use]
    pub fn principal_name(&self, username: &str) -> String {
        format!("{}@{}", username, self.domain)
    }
}

impl std::fmt::Debug for ActiveDirectoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveDirectoryConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("use_starttls", &self.use_starttls)
            .field("domain", &self.domain)
            .field("base_dn", &self.base_dn)
            .field("bind_dn", &self.bind_dn)
            .field("bind_password", &self.bind_password.as_ref().map(|_| "***"))
            .field("accounts_ou", &self.accounts_ou)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ActiveDirectoryConfig {
        ActiveDirectoryConfig {
            host: "dc01.corp.example.org".to_string(),
            port: 636,
            use_ssl: true,
            use_starttls: false,
            domain: "corp.example.org".to_string(),
            base_dn: "DC=corp,DC=example,DC=org".to_string(),
            bind_dn: "CN=svc-embark,OU=Service,DC=corp,DC=example,DC=org".to_string(),
            bind_password: Some("hunter2".to_string()),
            accounts_ou: "OU=Staff,DC=corp,DC=example,DC=org".to_string(),
            connection_timeout_secs: 30,
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_requires_domain() {
        let mut config = sample();
        config.domain = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_department_ou_dn() {
        let config = sample();
        assert_eq!(
            config.department_ou_dn("ICU"),
            "OU=ICU,OU=Staff,DC=corp,DC=example,DC=org"
        );
    }

    #[test]
    fn test_department_ou_dn_escapes() {
        let config = sample();
        assert_eq!(
            config.department_ou_dn("Radiology, Imaging"),
            "OU=Radiology\\, Imaging,OU=Staff,DC=corp,DC=example,DC=org"
        );
    }

    #[test]
    fn test_principal_name() {
        assert_eq!(
            sample().principal_name("MOBrie45"),
            "MOBrie45@corp.example.org"
        );
    }

    #[test]
    fn test_debug_redacts_bind_password() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("***"));
    }
}
