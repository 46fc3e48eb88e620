//! Active Directory connector over LDAP.
//!
//! Implements the capability traits against a domain controller using
//! `ldap3`. The connection is bound once and cached; AD result codes are
//! mapped onto the error taxonomy (49 → authentication failure, 68 →
//! already exists, 32 → not found).
//!
//! Account creation is the standard AD three-step: add the entry disabled,
//! set `unicodePwd` over LDAPS, then flip `userAccountControl` to enabled.
//! The objectGUID is read back afterwards so downstream reports can key on
//! the directory identifier.

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Mod, Scope, SearchEntry};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::ad::{
    build_user_dn, encode_ad_password, escape_filter_value, new_account_uac,
    validate_password_connection, UAC_NORMAL_ACCOUNT,
};
use crate::config::ActiveDirectoryConfig;
use crate::error::{DirectoryError, DirectoryResult};
use crate::traits::{AccountOp, AccountRequest, Connector, ContainerOp, CreatedAccount, GroupOp};

/// LDAP result code: noSuchObject.
const RC_NO_SUCH_OBJECT: u32 = 32;

/// LDAP result code: invalidCredentials.
const RC_INVALID_CREDENTIALS: u32 = 49;

/// LDAP result code: entryAlreadyExists.
const RC_ENTRY_ALREADY_EXISTS: u32 = 68;

/// LDAP result code: attributeOrValueExists.
const RC_ATTRIBUTE_OR_VALUE_EXISTS: u32 = 20;

/// Active Directory connector.
pub struct AdConnector {
    /// Configuration.
    config: ActiveDirectoryConfig,

    /// Display name for this connector instance.
    display_name: String,

    /// Cached LDAP connection (lazily established).
    connection: Arc<RwLock<Option<Ldap>>>,
}

impl std::fmt::Debug for AdConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdConnector")
            .field("config", &self.config)
            .field("display_name", &self.display_name)
            .finish()
    }
}

impl AdConnector {
    /// Create a new AD connector from configuration.
    pub fn new(config: ActiveDirectoryConfig) -> DirectoryResult<Self> {
        config.validate()?;

        let display_name = format!("ad: {}@{}", config.domain, config.host);

        Ok(Self {
            config,
            display_name,
            connection: Arc::new(RwLock::new(None)),
        })
    }

    /// Get the AD configuration.
    pub fn config(&self) -> &ActiveDirectoryConfig {
        &self.config
    }

    /// Get an LDAP connection, creating one if necessary.
    async fn get_connection(&self) -> DirectoryResult<Ldap> {
        {
            let conn_guard = self.connection.read().await;
            if let Some(ref conn) = *conn_guard {
                return Ok(conn.clone());
            }
        }

        let conn = self.create_connection().await?;

        {
            let mut conn_guard = self.connection.write().await;
            *conn_guard = Some(conn.clone());
        }

        Ok(conn)
    }

    /// Create and bind a new LDAP connection.
    async fn create_connection(&self) -> DirectoryResult<Ldap> {
        let url = if self.config.use_ssl {
            format!("ldaps://{}:{}", self.config.host, self.config.port)
        } else {
            format!("ldap://{}:{}", self.config.host, self.config.port)
        };

        debug!(url = %url, "Connecting to domain controller");

        let settings = LdapConnSettings::new()
            .set_conn_timeout(std::time::Duration::from_secs(
                self.config.connection_timeout_secs,
            ))
            .set_starttls(self.config.use_starttls);

        let (conn, mut ldap) =
            LdapConnAsync::with_settings(settings, &url)
                .await
                .map_err(|e| {
                    DirectoryError::connection_failed_with_source(
                        format!("Failed to connect to directory at {url}"),
                        e,
                    )
                })?;

        // Spawn the connection driver
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        let bind_dn = &self.config.bind_dn;
        let bind_password = self.config.bind_password.as_deref().unwrap_or("");

        debug!(bind_dn = %bind_dn, "Performing LDAP bind");

        let result = ldap.simple_bind(bind_dn, bind_password).await.map_err(|e| {
            DirectoryError::connection_failed_with_source(
                format!("LDAP bind failed for {bind_dn}"),
                e,
            )
        })?;

        if result.rc != 0 {
            if result.rc == RC_INVALID_CREDENTIALS {
                return Err(DirectoryError::AuthenticationFailed);
            }
            return Err(DirectoryError::connection_failed(format!(
                "LDAP bind failed with code {}: {}",
                result.rc, result.text
            )));
        }

        info!(host = %self.config.host, "Directory connection established");

        Ok(ldap)
    }

    /// Read back the objectGUID of an entry after creation.
    async fn read_object_guid(&self, dn: &str) -> DirectoryResult<Uuid> {
        let mut ldap = self.get_connection().await?;

        let search = ldap
            .search(dn, Scope::Base, "(objectClass=*)", vec!["objectGUID"])
            .await
            .map_err(|e| {
                DirectoryError::operation_failed_with_source(
                    format!("Failed to read objectGUID for {dn}"),
                    e,
                )
            })?;

        if search.1.rc != 0 {
            return Err(DirectoryError::operation_failed(format!(
                "objectGUID read failed with code {}: {}",
                search.1.rc, search.1.text
            )));
        }

        let entry = search
            .0
            .into_iter()
            .next()
            .ok_or_else(|| DirectoryError::ObjectNotFound {
                identifier: dn.to_string(),
            })?;
        let entry = SearchEntry::construct(entry);

        let raw = entry
            .bin_attrs
            .get("objectGUID")
            .and_then(|values| values.first())
            .ok_or_else(|| {
                DirectoryError::operation_failed(format!("entry {dn} has no objectGUID"))
            })?;

        let bytes: [u8; 16] = raw.as_slice().try_into().map_err(|_| {
            DirectoryError::operation_failed(format!(
                "objectGUID for {dn} has unexpected length {}",
                raw.len()
            ))
        })?;

        // AD stores the GUID in mixed little-endian layout
        Ok(Uuid::from_bytes_le(bytes))
    }
}

#[async_trait]
impl Connector for AdConnector {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    #[instrument(skip(self), fields(domain = %self.config.domain))]
    async fn test_connection(&self) -> DirectoryResult<()> {
        let mut ldap = self.get_connection().await?;

        // Verify search rights on the base DN, not just the bind
        let search = ldap
            .search(
                &self.config.base_dn,
                Scope::Base,
                "(objectClass=*)",
                vec!["distinguishedName"],
            )
            .await
            .map_err(|e| {
                DirectoryError::connection_failed_with_source("base DN search failed", e)
            })?;

        if search.1.rc != 0 {
            return Err(DirectoryError::connection_failed(format!(
                "base DN search failed with code {}: {}",
                search.1.rc, search.1.text
            )));
        }

        info!(domain = %self.config.domain, "Directory connection test successful");

        Ok(())
    }
}

#[async_trait]
impl ContainerOp for AdConnector {
    fn container_dn(&self, department: &str) -> String {
        self.config.department_ou_dn(department)
    }

    #[instrument(skip(self))]
    async fn container_exists(&self, department: &str) -> DirectoryResult<bool> {
        let mut ldap = self.get_connection().await?;
        let dn = self.container_dn(department);

        let search = ldap
            .search(&dn, Scope::Base, "(objectClass=organizationalUnit)", vec!["ou"])
            .await
            .map_err(|e| {
                DirectoryError::operation_failed_with_source(
                    format!("Container lookup failed for {dn}"),
                    e,
                )
            })?;

        match search.1.rc {
            0 => Ok(!search.0.is_empty()),
            RC_NO_SUCH_OBJECT => Ok(false),
            rc => Err(DirectoryError::operation_failed(format!(
                "container lookup failed with code {rc}: {}",
                search.1.text
            ))),
        }
    }

    #[instrument(skip(self))]
    async fn create_container(&self, department: &str) -> DirectoryResult<String> {
        let mut ldap = self.get_connection().await?;
        let dn = self.container_dn(department);

        debug!(dn = %dn, "Creating organizational unit");

        let attrs: Vec<(&str, HashSet<&str>)> = vec![
            ("objectClass", ["top", "organizationalUnit"].into()),
            ("ou", [department].into()),
        ];

        let result = ldap.add(&dn, attrs).await.map_err(|e| {
            DirectoryError::operation_failed_with_source(format!("Failed to create OU {dn}"), e)
        })?;

        if result.rc == RC_ENTRY_ALREADY_EXISTS {
            return Err(DirectoryError::ObjectAlreadyExists { identifier: dn });
        }

        if result.rc != 0 {
            return Err(DirectoryError::operation_failed(format!(
                "OU add failed with code {}: {}",
                result.rc, result.text
            )));
        }

        info!(dn = %dn, "Organizational unit created");

        Ok(dn)
    }
}

#[async_trait]
impl AccountOp for AdConnector {
    #[instrument(skip(self, request), fields(username = %request.username))]
    async fn create_account(&self, request: &AccountRequest) -> DirectoryResult<CreatedAccount> {
        // unicodePwd needs LDAPS; refuse before touching the directory
        validate_password_connection(self.config.use_ssl)?;
        let encoded_password = encode_ad_password(&request.password)?;

        let mut ldap = self.get_connection().await?;
        let dn = build_user_dn(&request.display_name, &request.container_dn)?;

        debug!(dn = %dn, "Creating directory account");

        // Entry is added disabled; enabled below once the password is set
        let uac = new_account_uac(true).to_string();
        let upn = self.config.principal_name(&request.username);

        let mut attrs: Vec<(&str, HashSet<&str>)> = vec![
            (
                "objectClass",
                ["top", "person", "organizationalPerson", "user"].into(),
            ),
            ("cn", [request.display_name.as_str()].into()),
            ("sAMAccountName", [request.username.as_str()].into()),
            ("userPrincipalName", [upn.as_str()].into()),
            ("givenName", [request.given_name.as_str()].into()),
            ("sn", [request.surname.as_str()].into()),
            ("displayName", [request.display_name.as_str()].into()),
            ("mail", [request.email.as_str()].into()),
            ("employeeID", [request.employee_id.as_str()].into()),
            ("title", [request.job_title.as_str()].into()),
            ("description", [request.job_title.as_str()].into()),
            ("department", [request.department.as_str()].into()),
            ("division", [request.division.as_str()].into()),
            (
                "physicalDeliveryOfficeName",
                [request.office.as_str()].into(),
            ),
            ("userAccountControl", [uac.as_str()].into()),
        ];

        if !request.initials.is_empty() {
            attrs.push(("initials", [request.initials.as_str()].into()));
        }

        let result = ldap.add(&dn, attrs).await.map_err(|e| {
            DirectoryError::operation_failed_with_source(format!("Failed to create entry {dn}"), e)
        })?;

        if result.rc == RC_ENTRY_ALREADY_EXISTS {
            return Err(DirectoryError::ObjectAlreadyExists { identifier: dn });
        }

        if result.rc != 0 {
            return Err(DirectoryError::operation_failed(format!(
                "account add failed with code {}: {}",
                result.rc, result.text
            )));
        }

        // Set the initial password (binary modify on unicodePwd)
        let password_mod: Vec<Mod<Vec<u8>>> = vec![Mod::Replace(
            b"unicodePwd".to_vec(),
            HashSet::from([encoded_password]),
        )];

        let result = ldap.modify(&dn, password_mod).await.map_err(|e| {
            DirectoryError::operation_failed_with_source(
                format!("Failed to set password on {dn}"),
                e,
            )
        })?;

        if result.rc != 0 {
            return Err(DirectoryError::operation_failed(format!(
                "password set failed with code {}: {}",
                result.rc, result.text
            )));
        }

        // Enable the account now that it has a credential
        let enable_uac = UAC_NORMAL_ACCOUNT.to_string();
        let enable_mod: Vec<Mod<&str>> = vec![Mod::Replace(
            "userAccountControl",
            HashSet::from([enable_uac.as_str()]),
        )];

        let result = ldap.modify(&dn, enable_mod).await.map_err(|e| {
            DirectoryError::operation_failed_with_source(format!("Failed to enable {dn}"), e)
        })?;

        if result.rc != 0 {
            return Err(DirectoryError::operation_failed(format!(
                "account enable failed with code {}: {}",
                result.rc, result.text
            )));
        }

        let guid = self.read_object_guid(&dn).await?;

        info!(dn = %dn, guid = %guid, "Directory account created");

        Ok(CreatedAccount { dn, guid })
    }

    #[instrument(skip(self))]
    async fn set_manager(&self, account_dn: &str, manager_dn: &str) -> DirectoryResult<()> {
        let mut ldap = self.get_connection().await?;

        let mods: Vec<Mod<&str>> = vec![Mod::Replace("manager", HashSet::from([manager_dn]))];

        let result = ldap.modify(account_dn, mods).await.map_err(|e| {
            DirectoryError::operation_failed_with_source(
                format!("Failed to set manager on {account_dn}"),
                e,
            )
        })?;

        if result.rc != 0 {
            return Err(DirectoryError::operation_failed(format!(
                "manager set failed with code {}: {}",
                result.rc, result.text
            )));
        }

        debug!(account_dn = %account_dn, manager_dn = %manager_dn, "Manager reference set");

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_account_by_employee_id(
        &self,
        employee_id: &str,
    ) -> DirectoryResult<Option<String>> {
        let mut ldap = self.get_connection().await?;

        let filter = format!(
            "(&(objectClass=user)(employeeID={}))",
            escape_filter_value(employee_id)
        );

        let search = ldap
            .search(
                &self.config.base_dn,
                Scope::Subtree,
                &filter,
                vec!["distinguishedName"],
            )
            .await
            .map_err(|e| {
                DirectoryError::operation_failed_with_source(
                    format!("Employee ID search failed for {employee_id}"),
                    e,
                )
            })?;

        if search.1.rc != 0 {
            return Err(DirectoryError::operation_failed(format!(
                "employee ID search failed with code {}: {}",
                search.1.rc, search.1.text
            )));
        }

        Ok(search
            .0
            .into_iter()
            .next()
            .map(|e| SearchEntry::construct(e).dn))
    }
}

#[async_trait]
impl GroupOp for AdConnector {
    #[instrument(skip(self))]
    async fn add_member(&self, group_dn: &str, member_dn: &str) -> DirectoryResult<()> {
        let mut ldap = self.get_connection().await?;

        let mods: Vec<Mod<&str>> = vec![Mod::Add("member", HashSet::from([member_dn]))];

        let result = ldap.modify(group_dn, mods).await.map_err(|e| {
            DirectoryError::operation_failed_with_source(
                format!("Failed to add member to {group_dn}"),
                e,
            )
        })?;

        match result.rc {
            0 => {
                debug!(group_dn = %group_dn, member_dn = %member_dn, "Group member added");
                Ok(())
            }
            // Already a member — the desired state holds
            RC_ATTRIBUTE_OR_VALUE_EXISTS => {
                debug!(group_dn = %group_dn, member_dn = %member_dn, "Already a group member");
                Ok(())
            }
            RC_NO_SUCH_OBJECT => Err(DirectoryError::ObjectNotFound {
                identifier: group_dn.to_string(),
            }),
            rc => Err(DirectoryError::operation_failed(format!(
                "group add failed with code {rc}: {}",
                result.text
            ))),
        }
    }
}
