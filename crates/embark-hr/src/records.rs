//! Record models for the HR source of truth.
//!
//! `PersonRecord` is the one HR row driving the pipeline; the remaining
//! types model the job-access mapping tables. All are read-once snapshots —
//! the source is never mutated.

use chrono::{DateTime, Utc};
use embark_core::EmployeeId;
use serde::{Deserialize, Serialize};

/// Employment status carried on a person record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    Active,
    Terminated,
    /// Any other status value the source produces (leave, contractor, …).
    Other(String),
}

impl EmploymentStatus {
    /// Parse the source system's free-text status value.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "active" => EmploymentStatus::Active,
            "terminated" => EmploymentStatus::Terminated,
            _ => EmploymentStatus::Other(s.trim().to_string()),
        }
    }

    /// Whether the person is currently active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, EmploymentStatus::Active)
    }

    /// Whether the person is terminated.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        matches!(self, EmploymentStatus::Terminated)
    }
}

impl std::fmt::Display for EmploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmploymentStatus::Active => write!(f, "Active"),
            EmploymentStatus::Terminated => write!(f, "Terminated"),
            EmploymentStatus::Other(s) => write!(f, "{s}"),
        }
    }
}

/// One HR source-of-truth record.
///
/// The employee ID is the primary key across the whole pipeline. Name
/// fields are free text and may contain non-alphabetic characters; the
/// middle name is frequently empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonRecord {
    /// Stable, unique employee identifier.
    pub employee_id: EmployeeId,

    /// First name (free text).
    pub first_name: String,

    /// Middle name, if the source has one.
    pub middle_name: Option<String>,

    /// Last name (free text).
    pub last_name: String,

    /// Job title as recorded in HR.
    pub job_title: String,

    /// Department name.
    pub department: String,

    /// Division name.
    pub division: String,

    /// Interoffice mailstop identifier.
    pub mailstop: String,

    /// Employee ID of the direct supervisor, if recorded.
    pub supervisor_id: Option<EmployeeId>,

    /// Employment status.
    pub status: EmploymentStatus,

    /// Contact email recorded in HR, if any.
    pub contact_email: Option<String>,

    /// When the record was created in the source system.
    pub created_at: DateTime<Utc>,
}

impl PersonRecord {
    /// Display name used for the directory CN: "First Last".
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// One matched row from the job-mapping table.
///
/// A person's (title, department) pair may match zero, one, or several
/// rows; exact duplicates are collapsed before the downstream lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobMapping {
    /// Job title the row matches.
    pub job_title: String,

    /// Department the row matches.
    pub department: String,

    /// Job category, keys the training-track lookup.
    pub job_category: String,

    /// Resolved job role, keys the template/sub-template/blueprint lookups.
    pub job_role: String,
}

/// One access artifact: template, sub-template, or blueprint.
///
/// The three categories are structurally parallel ID + name pairs; which
/// category a value belongs to is carried by the collection it sits in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessArtifact {
    /// Artifact identifier in the clinical system.
    pub id: String,

    /// Human-readable artifact name.
    pub name: String,
}

/// One required training track resolved from a job category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingTrack {
    /// Track identifier.
    pub id: String,

    /// Track name.
    pub name: String,
}
