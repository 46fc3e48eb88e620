//! HR source error types.

use thiserror::Error;

/// Error that can occur while reading the HR source of truth.
#[derive(Debug, Error)]
pub enum HrError {
    /// Failed to establish a connection to the HR database.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A query against the HR database failed.
    #[error("query failed on {relation}: {message}")]
    QueryFailed {
        /// The relation being queried (e.g., "personnel", "job_mappings").
        relation: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The HR source configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// A row held a value the pipeline cannot interpret.
    #[error("invalid row data in {relation}: {message}")]
    InvalidRow { relation: String, message: String },
}

impl HrError {
    /// Create a connection failed error with source.
    pub fn connection_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        HrError::ConnectionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a query failed error with source.
    pub fn query_failed_with_source(
        relation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        let source = Box::new(source);
        HrError::QueryFailed {
            relation: relation.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        HrError::InvalidConfiguration {
            message: message.into(),
        }
    }
}

impl From<HrError> for embark_core::EmbarkError {
    fn from(err: HrError) -> Self {
        embark_core::EmbarkError::source("hr", err.to_string())
    }
}

/// Result type for HR source operations.
pub type HrResult<T> = Result<T, HrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_failed_display_names_relation() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "socket closed");
        let err = HrError::query_failed_with_source("personnel", io);
        assert!(err.to_string().contains("personnel"));
        assert!(err.to_string().contains("socket closed"));
    }

    #[test]
    fn test_conversion_to_embark_error() {
        let err = HrError::invalid_configuration("host is required");
        let core: embark_core::EmbarkError = err.into();
        assert!(core.to_string().contains("hr"));
        assert!(core.to_string().contains("host is required"));
    }
}
