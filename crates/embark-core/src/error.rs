//! Error Types
//!
//! Standardized top-level error type for embark. Crate-specific errors
//! (HR source, directory, reports) convert into this at the pipeline
//! boundary so the runner sees one taxonomy.

use serde::Serialize;
use thiserror::Error;

/// Standardized error type for embark.
///
/// Variants map to the failure taxonomy of the pipeline: anything that
/// reaches the runner as an `EmbarkError` is fatal to the batch. Sub-step
/// failures that allow the run to continue are modeled as recorded step
/// outcomes instead, not as errors.
#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmbarkError {
    /// A mandatory data source could not be read.
    #[error("source error in {source_name}: {message}")]
    Source {
        /// Which source failed (e.g., "hr", "job_mappings").
        source_name: String,
        /// Description of the failure.
        message: String,
    },

    /// The directory service rejected a mandatory operation.
    #[error("directory error: {message}")]
    Directory {
        /// Description of the failure.
        message: String,
    },

    /// A derived attribute could not be computed from the source record.
    #[error("derivation failed for employee {employee_id}: {message}")]
    Derivation {
        /// The employee whose record could not be processed.
        employee_id: String,
        /// Description of the failure.
        message: String,
    },

    /// The dedup cache store could not be read or written.
    #[error("cache error: {message}")]
    Cache {
        /// Description of the failure.
        message: String,
    },

    /// Configuration or credential material is missing or invalid.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the failure.
        message: String,
    },
}

impl EmbarkError {
    /// Create a source error.
    pub fn source(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        EmbarkError::Source {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create a directory error.
    pub fn directory(message: impl Into<String>) -> Self {
        EmbarkError::Directory {
            message: message.into(),
        }
    }

    /// Create a derivation error.
    pub fn derivation(employee_id: impl Into<String>, message: impl Into<String>) -> Self {
        EmbarkError::Derivation {
            employee_id: employee_id.into(),
            message: message.into(),
        }
    }

    /// Create a cache error.
    pub fn cache(message: impl Into<String>) -> Self {
        EmbarkError::Cache {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        EmbarkError::Configuration {
            message: message.into(),
        }
    }
}

/// Type alias for Results using `EmbarkError`.
pub type Result<T> = std::result::Result<T, EmbarkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_display() {
        let err = EmbarkError::source("hr", "connection refused");
        assert_eq!(err.to_string(), "source error in hr: connection refused");
    }

    #[test]
    fn test_derivation_display() {
        let err = EmbarkError::derivation("12345", "empty first name");
        assert_eq!(
            err.to_string(),
            "derivation failed for employee 12345: empty first name"
        );
    }

    #[test]
    fn test_is_std_error() {
        let err = EmbarkError::cache("disk full");
        let _: &dyn std::error::Error = &err;
    }

    #[test]
    fn test_serialization_tags() {
        let err = EmbarkError::directory("bind failed");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"type\":\"directory\""));
        assert!(json.contains("\"message\":\"bind failed\""));
    }

    #[test]
    fn test_question_mark_propagation() {
        fn fails() -> Result<()> {
            Err(EmbarkError::configuration("missing HR_DB_HOST"))
        }
        fn propagates() -> Result<()> {
            fails()?;
            Ok(())
        }
        assert!(propagates().is_err());
    }
}
