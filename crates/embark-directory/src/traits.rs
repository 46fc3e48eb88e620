//! Directory capability traits.
//!
//! Capability-based trait definitions for the provisioning pipeline's view
//! of a directory service. The pipeline is generic over these traits so
//! tests can substitute counting mocks for a live directory.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DirectoryResult;

/// Attributes for a new directory account.
///
/// A fixed, typed attribute set — every field here maps to one directory
/// attribute on the created object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRequest {
    /// Account name (sAMAccountName).
    pub username: String,

    /// One-time initial password.
    pub password: String,

    /// DN of the organizational container the account is created in.
    pub container_dn: String,

    /// Display name, used as the CN.
    pub display_name: String,

    /// Given (first) name.
    pub given_name: String,

    /// Surname (last name).
    pub surname: String,

    /// Initials (1–3 characters, may be empty for mononyms).
    pub initials: String,

    /// Mail address.
    pub email: String,

    /// HR employee identifier.
    pub employee_id: String,

    /// Job title.
    pub job_title: String,

    /// Department name.
    pub department: String,

    /// Division name.
    pub division: String,

    /// Office/mailstop identifier.
    pub office: String,
}

/// The directory-side result of account creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedAccount {
    /// Distinguished name of the created account.
    pub dn: String,

    /// Directory-assigned unique identifier, read back after creation.
    pub guid: Uuid,
}

/// Base trait for directory connectors.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Get the display name for this connector instance.
    fn display_name(&self) -> &str;

    /// Test the connection to the directory.
    ///
    /// Returns `Ok(())` if a bind succeeds, or an error describing what
    /// went wrong. Run before the batch so an unreachable directory fails
    /// fast instead of mid-run.
    async fn test_connection(&self) -> DirectoryResult<()>;
}

/// Capability for organizational container operations.
#[async_trait]
pub trait ContainerOp: Connector {
    /// The DN a department's container would have, whether or not it exists.
    fn container_dn(&self, department: &str) -> String;

    /// Check whether the container for a department exists.
    async fn container_exists(&self, department: &str) -> DirectoryResult<bool>;

    /// Create the container for a department.
    ///
    /// # Returns
    /// The DN of the created container.
    async fn create_container(&self, department: &str) -> DirectoryResult<String>;
}

/// Capability for account operations.
#[async_trait]
pub trait AccountOp: Connector {
    /// Create a new, enabled account with the given attributes.
    ///
    /// # Returns
    /// The DN and directory GUID of the created account.
    async fn create_account(&self, request: &AccountRequest) -> DirectoryResult<CreatedAccount>;

    /// Set the manager reference on an account.
    async fn set_manager(&self, account_dn: &str, manager_dn: &str) -> DirectoryResult<()>;

    /// Find an existing account's DN by HR employee ID.
    ///
    /// Used to resolve the supervisor's directory object for the manager
    /// link. Returns `None` when no account carries the ID.
    async fn find_account_by_employee_id(
        &self,
        employee_id: &str,
    ) -> DirectoryResult<Option<String>>;
}

/// Capability for group membership operations.
#[async_trait]
pub trait GroupOp: Connector {
    /// Add an account to a named group.
    ///
    /// Adding a member that is already present is not an error.
    async fn add_member(&self, group_dn: &str, member_dn: &str) -> DirectoryResult<()>;
}
