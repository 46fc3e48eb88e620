//! # Embark HR Source
//!
//! Read-only access to the HR system of record that drives provisioning.
//!
//! This crate provides:
//! - Row models for person records and the job-access mapping tables
//! - The change-set selector (records created within a lookback window,
//!   or a single employee ID for manual runs)
//! - The four access-artifact lookups (templates, sub-templates,
//!   blueprints, training tracks)
//!
//! All queries are read-only; the pipeline never writes back to HR.
//! Query failures on mandatory paths are fatal to the run — the selector
//! does not attempt partial batches over an unreachable source.

pub mod config;
pub mod error;
pub mod records;
pub mod source;

pub use config::{HrSourceConfig, SslMode};
pub use error::{HrError, HrResult};
pub use records::{
    AccessArtifact, EmploymentStatus, JobMapping, PersonRecord, TrainingTrack,
};
pub use source::{HrSource, JobAccessSource, PersonSource};
