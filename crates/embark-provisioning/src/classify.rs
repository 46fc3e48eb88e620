//! Report classification.
//!
//! Pure projection from one fully processed person into the per-audience
//! report collections. User/HR/manager rows are filtered to employment
//! status `Active`; non-active persons produce an informational log entry
//! and no row in those three. Access and training rows are emitted per
//! resolved artifact regardless of status.

use tracing::{info, warn};

use embark_hr::PersonRecord;
use embark_reports::{
    EpicAccessRow, HrReportRow, ManagerReportRow, ReportBatch, TrainingRow, UserReportRow,
    TRAINING_TRACK_SLOTS,
};

use crate::access::JobAccessMap;
use crate::identity::DerivedIdentity;
use crate::provisioner::ProvisionOutcome;

/// Append one person's rows to the batch collections.
pub fn classify(
    person: &PersonRecord,
    identity: &DerivedIdentity,
    access: &JobAccessMap,
    outcome: &ProvisionOutcome,
    supervisor_email: Option<&str>,
    batch: &mut ReportBatch,
) {
    let display_name = person.display_name();

    if person.status.is_active() {
        batch.user.push(UserReportRow {
            employee_id: person.employee_id.to_string(),
            display_name: display_name.clone(),
            username: identity.username.clone(),
            email: identity.email.clone(),
            job_title: person.job_title.clone(),
            department: person.department.clone(),
            division: person.division.clone(),
        });

        batch.hr.push(HrReportRow {
            employee_id: person.employee_id.to_string(),
            display_name: display_name.clone(),
            job_title: person.job_title.clone(),
            department: person.department.clone(),
            division: person.division.clone(),
            username: identity.username.clone(),
            status: person.status.to_string(),
        });

        batch.manager.push(ManagerReportRow {
            employee_id: person.employee_id.to_string(),
            display_name: display_name.clone(),
            username: identity.username.clone(),
            initial_password: identity.initial_password.clone(),
            supervisor_email: supervisor_email.map(String::from),
        });
    } else {
        info!(
            employee_id = %person.employee_id,
            status = %person.status,
            "Not active; excluded from user/HR/manager reports"
        );
    }

    // One flat row per artifact; the two non-applicable columns stay blank
    for matched in &access.matches {
        for t in &matched.templates {
            let mut row = access_row(person, &display_name, outcome);
            row.template_id.clone_from(&t.id);
            row.template_name.clone_from(&t.name);
            batch.access.push(row);
        }
        for s in &matched.subtemplates {
            let mut row = access_row(person, &display_name, outcome);
            row.subtemplate_id.clone_from(&s.id);
            row.subtemplate_name.clone_from(&s.name);
            batch.access.push(row);
        }
        for b in &matched.blueprints {
            let mut row = access_row(person, &display_name, outcome);
            row.blueprint_id.clone_from(&b.id);
            row.blueprint_name.clone_from(&b.name);
            batch.access.push(row);
        }
    }

    let track_names = access.training_names();
    if !track_names.is_empty() {
        if track_names.len() > TRAINING_TRACK_SLOTS {
            warn!(
                employee_id = %person.employee_id,
                resolved = track_names.len(),
                slots = TRAINING_TRACK_SLOTS,
                "More training tracks than report slots; overflow dropped"
            );
        }

        batch.training.push(TrainingRow {
            employee_id: person.employee_id.to_string(),
            display_name,
            job_title: person.job_title.clone(),
            department: person.department.clone(),
            tracks: TrainingRow::pad_tracks(&track_names),
        });
    }
}

/// GUID-keyed access row skeleton with all artifact columns blank.
fn access_row(
    person: &PersonRecord,
    display_name: &str,
    outcome: &ProvisionOutcome,
) -> EpicAccessRow {
    EpicAccessRow {
        guid: outcome.account.guid,
        employee_id: person.employee_id.to_string(),
        display_name: display_name.to_string(),
        job_title: person.job_title.clone(),
        department: person.department.clone(),
        template_id: String::new(),
        template_name: String::new(),
        subtemplate_id: String::new(),
        subtemplate_name: String::new(),
        blueprint_id: String::new(),
        blueprint_name: String::new(),
    }
}
