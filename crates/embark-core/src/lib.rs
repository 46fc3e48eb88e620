//! # Embark Core
//!
//! Shared foundation types for the embark provisioning pipeline:
//! standardized errors and strongly-typed identifiers.

pub mod error;
pub mod ids;

pub use error::{EmbarkError, Result};
pub use ids::EmployeeId;
