//! The per-person orchestration loop.
//!
//! Strictly sequential: each person is carried through cache check,
//! identity derivation, access resolution, provisioning, and report
//! classification before the next begins. The loop has two exit paths —
//! batch completion or abort on a fatal error. Recorded sub-step failures
//! ride on the provisioning outcome and never abort the batch.

use tracing::{info, instrument, warn};

use embark_core::{EmbarkError, EmployeeId};
use embark_directory::{AccountOp, AccountRequest, ContainerOp, GroupOp};
use embark_hr::{JobAccessSource, PersonRecord, PersonSource};
use embark_reports::ReportBatch;

use crate::access::JobAccessResolver;
use crate::cache::DedupCache;
use crate::classify::classify;
use crate::identity::{DerivedIdentity, IdentityDeriver};
use crate::provisioner::AccountProvisioner;

/// Which person records are in scope for a run.
#[derive(Debug, Clone)]
pub enum RunSelection {
    /// Records created within the lookback window.
    Window { days: u32 },

    /// One employee, for manual runs.
    Single { employee_id: EmployeeId },
}

/// Batch counters reported after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    /// Records returned by the change-set selector.
    pub selected: usize,

    /// People carried through the full sequence this run.
    pub processed: usize,

    /// People skipped because they were already cached.
    pub skipped: usize,

    /// Processed people whose provisioning had recorded sub-step failures.
    pub partial: usize,
}

/// The identity resolution and provisioning pipeline.
pub struct OnboardingPipeline<'a, P, J, D>
where
    P: PersonSource,
    J: JobAccessSource,
    D: ContainerOp + AccountOp + GroupOp,
{
    persons: &'a P,
    access: &'a J,
    directory: &'a D,
    deriver: IdentityDeriver,
    baseline_groups: Vec<String>,
    cache: DedupCache,
}

impl<'a, P, J, D> OnboardingPipeline<'a, P, J, D>
where
    P: PersonSource,
    J: JobAccessSource,
    D: ContainerOp + AccountOp + GroupOp,
{
    /// Assemble the pipeline from its collaborators.
    pub fn new(
        persons: &'a P,
        access: &'a J,
        directory: &'a D,
        deriver: IdentityDeriver,
        baseline_groups: Vec<String>,
        cache: DedupCache,
    ) -> Self {
        Self {
            persons,
            access,
            directory,
            deriver,
            baseline_groups,
            cache,
        }
    }

    /// Run the batch for the given selection.
    ///
    /// # Errors
    /// Any failure on a mandatory stage (HR reads, identity derivation,
    /// template/sub-template/blueprint lookups, account creation, cache
    /// writes) aborts the whole run.
    #[instrument(skip(self))]
    pub async fn run(
        &mut self,
        selection: &RunSelection,
    ) -> embark_core::Result<(ReportBatch, PipelineSummary)> {
        let people = match selection {
            RunSelection::Window { days } => self.persons.changed_within(*days).await?,
            RunSelection::Single { employee_id } => {
                self.persons.by_employee_id(employee_id).await?
            }
        };

        let mut batch = ReportBatch::new();
        let mut summary = PipelineSummary {
            selected: people.len(),
            ..Default::default()
        };

        info!(selected = people.len(), "Change set selected");

        let resolver = JobAccessResolver::new(self.access);
        let provisioner = AccountProvisioner::new(self.directory, &self.baseline_groups);

        for person in &people {
            if self.cache.contains(&person.employee_id) {
                info!(employee_id = %person.employee_id, "Already processed; skipping");
                summary.skipped += 1;
                continue;
            }

            let identity = self.deriver.derive(person).map_err(|e| {
                EmbarkError::derivation(person.employee_id.as_str(), e.to_string())
            })?;

            let access_map = resolver.resolve(person).await?;

            let request = build_account_request(
                person,
                &identity,
                self.directory.container_dn(&person.department),
            );

            let outcome = provisioner
                .provision(
                    &request,
                    person.supervisor_id.as_ref().map(EmployeeId::as_str),
                )
                .await?;

            if outcome.is_partial() {
                summary.partial += 1;
            }

            let supervisor_email = self.resolve_supervisor_email(person).await;

            classify(
                person,
                &identity,
                &access_map,
                &outcome,
                supervisor_email.as_deref(),
                &mut batch,
            );

            self.cache.record(&person.employee_id)?;
            summary.processed += 1;

            info!(
                employee_id = %person.employee_id,
                username = %identity.username,
                guid = %outcome.account.guid,
                partial = outcome.is_partial(),
                matches = access_map.matches.len(),
                "Person processed"
            );
        }

        info!(
            selected = summary.selected,
            processed = summary.processed,
            skipped = summary.skipped,
            partial = summary.partial,
            "Batch complete"
        );

        Ok((batch, summary))
    }

    /// Best-effort lookup of the supervisor's contact address for the
    /// manager report. Failures are recorded in the log; the person's own
    /// processing is unaffected.
    async fn resolve_supervisor_email(&self, person: &PersonRecord) -> Option<String> {
        let supervisor_id = person.supervisor_id.as_ref()?;

        match self.persons.by_employee_id(supervisor_id).await {
            Ok(rows) => {
                let email = rows.into_iter().next().and_then(|s| s.contact_email);
                if email.is_none() {
                    warn!(
                        supervisor_id = %supervisor_id,
                        "Supervisor has no contact address; manager notification will be held"
                    );
                }
                email
            }
            Err(e) => {
                warn!(supervisor_id = %supervisor_id, error = %e, "Supervisor lookup failed");
                None
            }
        }
    }
}

/// Project a person plus derived identity into the directory attribute set.
fn build_account_request(
    person: &PersonRecord,
    identity: &DerivedIdentity,
    container_dn: String,
) -> AccountRequest {
    AccountRequest {
        username: identity.username.clone(),
        password: identity.initial_password.clone(),
        container_dn,
        display_name: person.display_name(),
        given_name: person.first_name.clone(),
        surname: person.last_name.clone(),
        initials: identity.initials.clone(),
        email: identity.email.clone(),
        employee_id: person.employee_id.to_string(),
        job_title: person.job_title.clone(),
        department: person.department.clone(),
        division: person.division.clone(),
        office: person.mailstop.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use embark_hr::EmploymentStatus;

    #[test]
    fn test_build_account_request_projection() {
        let person = PersonRecord {
            employee_id: EmployeeId::new("12345"),
            first_name: "Mary-Ann".to_string(),
            middle_name: None,
            last_name: "O'Brien".to_string(),
            job_title: "Nurse".to_string(),
            department: "ICU".to_string(),
            division: "Inpatient".to_string(),
            mailstop: "MS-204".to_string(),
            supervisor_id: None,
            status: EmploymentStatus::Active,
            contact_email: None,
            created_at: Utc::now(),
        };
        let identity = DerivedIdentity {
            username: "MOBrie45".to_string(),
            email: "MOBrie45@corp.example.org".to_string(),
            initials: "MO".to_string(),
            initial_password: "x1y2z3a4b5c6".to_string(),
        };

        let request =
            build_account_request(&person, &identity, "OU=ICU,OU=Staff,DC=x".to_string());

        assert_eq!(request.username, "MOBrie45");
        assert_eq!(request.display_name, "Mary-Ann O'Brien");
        assert_eq!(request.container_dn, "OU=ICU,OU=Staff,DC=x");
        assert_eq!(request.office, "MS-204");
        assert_eq!(request.employee_id, "12345");
    }
}
