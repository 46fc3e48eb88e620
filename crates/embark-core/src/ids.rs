//! Strongly Typed Identifiers
//!
//! Newtype wrappers for identifiers that flow through the pipeline.
//! HR employee IDs are opaque text assigned by the source system (often
//! zero-padded numerics), so the wrapper holds a `String` rather than a UUID.
//!
//! # Example
//!
//! ```
//! use embark_core::EmployeeId;
//!
//! let id = EmployeeId::new("12345");
//! assert_eq!(id.as_str(), "12345");
//! assert_eq!(id.suffix(2), "45");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Strongly typed identifier for an employee record.
///
/// This is the primary key across the whole pipeline: HR queries, the dedup
/// cache, directory provisioning, and every report row are keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(String);

impl EmployeeId {
    /// Create an employee ID from the source system's value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last `n` characters of the identifier (the whole identifier if
    /// it is shorter than `n`). Used by username derivation.
    #[must_use]
    pub fn suffix(&self, n: usize) -> &str {
        let chars = self.0.chars().count();
        if chars <= n {
            return &self.0;
        }
        let (idx, _) = self
            .0
            .char_indices()
            .nth(chars - n)
            .unwrap_or((0, ' '));
        &self.0[idx..]
    }

    /// Whether the identifier is empty (rejected by validation upstream).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for EmployeeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EmployeeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EmployeeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for EmployeeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_shorter_than_requested() {
        let id = EmployeeId::new("7");
        assert_eq!(id.suffix(2), "7");
    }

    #[test]
    fn test_suffix_exact_length() {
        let id = EmployeeId::new("45");
        assert_eq!(id.suffix(2), "45");
    }

    #[test]
    fn test_suffix_longer() {
        let id = EmployeeId::new("12345");
        assert_eq!(id.suffix(2), "45");
    }

    #[test]
    fn test_suffix_multibyte() {
        // IDs are normally numeric but the slice must stay on char boundaries
        let id = EmployeeId::new("ab£45");
        assert_eq!(id.suffix(2), "45");
    }

    #[test]
    fn test_display_and_as_str() {
        let id = EmployeeId::new("00042");
        assert_eq!(id.to_string(), "00042");
        assert_eq!(id.as_str(), "00042");
    }

    #[test]
    fn test_serde_transparent() {
        let id = EmployeeId::new("12345");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"12345\"");
        let back: EmployeeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_hash_set_membership_is_exact() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(EmployeeId::new("1234"));
        // "123" must not match "1234" — exact membership, not substring
        assert!(!set.contains(&EmployeeId::new("123")));
        assert!(set.contains(&EmployeeId::new("1234")));
    }
}
