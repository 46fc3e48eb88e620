//! Typed report rows.
//!
//! One struct per report audience, each with a fixed field set. Rows are
//! pure projections: built once per person per run and appended to the
//! batch collections, with no independent lifecycle.

use serde::Serialize;
use uuid::Uuid;

/// Number of training-track slots on a training row. The consumer reads a
/// fixed-width layout, so short lists are padded with empty strings.
pub const TRAINING_TRACK_SLOTS: usize = 6;

/// A row type that can be rendered into an HTML table.
pub trait HtmlRow {
    /// Column headers, in render order.
    fn headers() -> &'static [&'static str];

    /// Cell values for this row, aligned with `headers()`.
    fn cells(&self) -> Vec<String>;
}

/// Row for the IT/user report: the provisioned account identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserReportRow {
    pub employee_id: String,
    pub display_name: String,
    pub username: String,
    pub email: String,
    pub job_title: String,
    pub department: String,
    pub division: String,
}

impl HtmlRow for UserReportRow {
    fn headers() -> &'static [&'static str] {
        &[
            "Employee ID",
            "Name",
            "Username",
            "Email",
            "Title",
            "Department",
            "Division",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.employee_id.clone(),
            self.display_name.clone(),
            self.username.clone(),
            self.email.clone(),
            self.job_title.clone(),
            self.department.clone(),
            self.division.clone(),
        ]
    }
}

/// Row for the HR report: confirmation of what was processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HrReportRow {
    pub employee_id: String,
    pub display_name: String,
    pub job_title: String,
    pub department: String,
    pub division: String,
    pub username: String,
    pub status: String,
}

impl HtmlRow for HrReportRow {
    fn headers() -> &'static [&'static str] {
        &[
            "Employee ID",
            "Name",
            "Title",
            "Department",
            "Division",
            "Username",
            "Status",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.employee_id.clone(),
            self.display_name.clone(),
            self.job_title.clone(),
            self.department.clone(),
            self.division.clone(),
            self.username.clone(),
            self.status.clone(),
        ]
    }
}

/// Row for the direct supervisor: includes the one-time initial password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagerReportRow {
    pub employee_id: String,
    pub display_name: String,
    pub username: String,
    /// One-time initial password, communicated to the supervisor only.
    pub initial_password: String,
    /// Supervisor's mail address; rows without one are logged and held
    /// back from dispatch.
    pub supervisor_email: Option<String>,
}

impl HtmlRow for ManagerReportRow {
    fn headers() -> &'static [&'static str] {
        &["Employee ID", "Name", "Username", "Initial Password"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.employee_id.clone(),
            self.display_name.clone(),
            self.username.clone(),
            self.initial_password.clone(),
        ]
    }
}

/// Row for the clinical-systems access report.
///
/// One row per matched template, sub-template, or blueprint; the two
/// columns that do not apply to the row's artifact stay blank, and the
/// consumer reconstructs the full picture by grouping on GUID/employee ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpicAccessRow {
    /// Directory GUID of the provisioned account.
    pub guid: Uuid,
    pub employee_id: String,
    pub display_name: String,
    pub job_title: String,
    pub department: String,
    pub template_id: String,
    pub template_name: String,
    pub subtemplate_id: String,
    pub subtemplate_name: String,
    pub blueprint_id: String,
    pub blueprint_name: String,
}

impl HtmlRow for EpicAccessRow {
    fn headers() -> &'static [&'static str] {
        &[
            "GUID",
            "Employee ID",
            "Name",
            "Title",
            "Department",
            "Template ID",
            "Template",
            "Subtemplate ID",
            "Subtemplate",
            "Blueprint ID",
            "Blueprint",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.guid.to_string(),
            self.employee_id.clone(),
            self.display_name.clone(),
            self.job_title.clone(),
            self.department.clone(),
            self.template_id.clone(),
            self.template_name.clone(),
            self.subtemplate_id.clone(),
            self.subtemplate_name.clone(),
            self.blueprint_id.clone(),
            self.blueprint_name.clone(),
        ]
    }
}

/// Row for the training report: one per person, fixed six track slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainingRow {
    pub employee_id: String,
    pub display_name: String,
    pub job_title: String,
    pub department: String,
    /// Up to six required track names, padded with empty strings.
    pub tracks: [String; TRAINING_TRACK_SLOTS],
}

impl TrainingRow {
    /// Build the fixed-width slot array from a resolved track list.
    ///
    /// Tracks beyond the sixth are dropped; the consumer's layout has no
    /// room for them and overflow is logged by the classifier.
    #[must_use]
    pub fn pad_tracks(names: &[String]) -> [String; TRAINING_TRACK_SLOTS] {
        let mut slots: [String; TRAINING_TRACK_SLOTS] = Default::default();
        for (slot, name) in slots.iter_mut().zip(names.iter()) {
            slot.clone_from(name);
        }
        slots
    }
}

impl HtmlRow for TrainingRow {
    fn headers() -> &'static [&'static str] {
        &[
            "Employee ID",
            "Name",
            "Title",
            "Department",
            "Track 1",
            "Track 2",
            "Track 3",
            "Track 4",
            "Track 5",
            "Track 6",
        ]
    }

    fn cells(&self) -> Vec<String> {
        let mut cells = vec![
            self.employee_id.clone(),
            self.display_name.clone(),
            self.job_title.clone(),
            self.department.clone(),
        ];
        cells.extend(self.tracks.iter().cloned());
        cells
    }
}

/// All report collections for one batch run.
#[derive(Debug, Clone, Default)]
pub struct ReportBatch {
    pub user: Vec<UserReportRow>,
    pub hr: Vec<HrReportRow>,
    pub manager: Vec<ManagerReportRow>,
    pub access: Vec<EpicAccessRow>,
    pub training: Vec<TrainingRow>,
}

impl ReportBatch {
    /// Create an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether every collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.user.is_empty()
            && self.hr.is_empty()
            && self.manager.is_empty()
            && self.access.is_empty()
            && self.training.is_empty()
    }

    /// Total rows across all collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.user.len()
            + self.hr.len()
            + self.manager.len()
            + self.access.len()
            + self.training.len()
    }
}
