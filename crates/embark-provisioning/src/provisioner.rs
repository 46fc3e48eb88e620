//! Account provisioning.
//!
//! Two-phase: resolve-or-create the department's organizational container,
//! then create the directory account, link the manager, and add the
//! baseline groups. Account creation failure is fatal; every other
//! sub-step produces an explicit [`StepResult`] on the outcome so a human
//! can remediate a partial provision from the record, and the batch moves
//! on to the next person.

use tracing::{info, instrument, warn};

use embark_directory::{
    AccountOp, AccountRequest, ContainerOp, CreatedAccount, DirectoryError, DirectoryResult,
    GroupOp,
};

/// Result of one best-effort provisioning sub-step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    /// The sub-step completed.
    Ok,
    /// The sub-step failed; the reason is recorded and the run continued.
    Failed { reason: String },
}

impl StepResult {
    /// Whether the sub-step failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, StepResult::Failed { .. })
    }

    fn from_directory<T>(result: DirectoryResult<T>) -> Self {
        match result {
            Ok(_) => StepResult::Ok,
            Err(e) => StepResult::Failed {
                reason: e.to_string(),
            },
        }
    }
}

/// Aggregated per-person provisioning outcome.
#[derive(Debug, Clone)]
pub struct ProvisionOutcome {
    /// The created account (creation itself is mandatory).
    pub account: CreatedAccount,

    /// Container resolve-or-create result.
    pub container: StepResult,

    /// Manager resolution and assignment result.
    pub manager: StepResult,

    /// Per-group membership results, keyed by group DN.
    pub groups: Vec<(String, StepResult)>,
}

impl ProvisionOutcome {
    /// Whether any recorded sub-step failed.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.container.is_failed()
            || self.manager.is_failed()
            || self.groups.iter().any(|(_, r)| r.is_failed())
    }
}

/// Provisions directory accounts against the capability traits.
pub struct AccountProvisioner<'a, D>
where
    D: ContainerOp + AccountOp + GroupOp,
{
    directory: &'a D,

    /// Baseline groups every new account joins.
    baseline_groups: &'a [String],
}

impl<'a, D> AccountProvisioner<'a, D>
where
    D: ContainerOp + AccountOp + GroupOp,
{
    /// Create a provisioner over the given directory.
    pub fn new(directory: &'a D, baseline_groups: &'a [String]) -> Self {
        Self {
            directory,
            baseline_groups,
        }
    }

    /// Provision one account.
    ///
    /// `supervisor_employee_id` is resolved to a directory DN for the
    /// manager link; an unresolvable supervisor is a recorded failure, not
    /// an abort.
    ///
    /// # Errors
    /// Account creation failure (including a username conflict) is fatal
    /// and propagates.
    #[instrument(skip(self, request), fields(username = %request.username, department = %request.department))]
    pub async fn provision(
        &self,
        request: &AccountRequest,
        supervisor_employee_id: Option<&str>,
    ) -> DirectoryResult<ProvisionOutcome> {
        let container = self.ensure_container(&request.department).await;

        let account = self.directory.create_account(request).await?;

        let manager = self
            .link_manager(&account.dn, supervisor_employee_id)
            .await;

        let mut groups = Vec::with_capacity(self.baseline_groups.len());
        for group_dn in self.baseline_groups {
            let result =
                StepResult::from_directory(self.directory.add_member(group_dn, &account.dn).await);
            if let StepResult::Failed { reason } = &result {
                warn!(group_dn = %group_dn, account_dn = %account.dn, reason = %reason, "Group assignment failed");
            }
            groups.push((group_dn.clone(), result));
        }

        let outcome = ProvisionOutcome {
            account,
            container,
            manager,
            groups,
        };

        info!(
            dn = %outcome.account.dn,
            guid = %outcome.account.guid,
            partial = outcome.is_partial(),
            "Account provisioned"
        );

        Ok(outcome)
    }

    /// Resolve-or-create the department container.
    ///
    /// A create failure is recorded rather than propagated: if another run
    /// created the OU in between (or the create failed for a reason that
    /// leaves an existing OU usable), account creation can still proceed,
    /// and other people in the same department keep working.
    async fn ensure_container(&self, department: &str) -> StepResult {
        match self.directory.container_exists(department).await {
            Ok(true) => StepResult::Ok,
            Ok(false) => match self.directory.create_container(department).await {
                Ok(dn) => {
                    info!(dn = %dn, "Department container created");
                    StepResult::Ok
                }
                // Lost a create race; the container exists, which is what we wanted
                Err(DirectoryError::ObjectAlreadyExists { .. }) => StepResult::Ok,
                Err(e) => {
                    warn!(department = %department, error = %e, "Container creation failed");
                    StepResult::Failed {
                        reason: e.to_string(),
                    }
                }
            },
            Err(e) => {
                warn!(department = %department, error = %e, "Container lookup failed");
                StepResult::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Resolve the supervisor's account and set the manager reference.
    async fn link_manager(
        &self,
        account_dn: &str,
        supervisor_employee_id: Option<&str>,
    ) -> StepResult {
        let Some(supervisor_id) = supervisor_employee_id else {
            return StepResult::Failed {
                reason: "no supervisor on the HR record".to_string(),
            };
        };

        let manager_dn = match self
            .directory
            .find_account_by_employee_id(supervisor_id)
            .await
        {
            Ok(Some(dn)) => dn,
            Ok(None) => {
                warn!(supervisor_id = %supervisor_id, "Supervisor has no directory account");
                return StepResult::Failed {
                    reason: format!("supervisor {supervisor_id} has no directory account"),
                };
            }
            Err(e) => {
                warn!(supervisor_id = %supervisor_id, error = %e, "Supervisor lookup failed");
                return StepResult::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let result =
            StepResult::from_directory(self.directory.set_manager(account_dn, &manager_dn).await);
        if let StepResult::Failed { reason } = &result {
            warn!(account_dn = %account_dn, manager_dn = %manager_dn, reason = %reason, "Manager assignment failed");
        }
        result
    }
}
