//! Dedup cache.
//!
//! Makes repeated runs over overlapping change windows idempotent: an
//! employee ID recorded here is skipped on later runs. The persistent form
//! is a flat text store, one employee ID per line, with a single
//! `#created=<rfc3339>` header carrying the store's creation instant
//! (filesystem birth times are not portable, so the instant travels inside
//! the store).
//!
//! Expiry is wholesale: when the store's age exceeds the configured number
//! of days, the whole file is discarded and recreated empty — idempotency
//! resets for everyone at once, never per entry.
//!
//! Membership is an exact `HashSet` match on the employee ID. Single
//! writer, single reader within one run; concurrent runs are not a
//! supported configuration.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use embark_core::EmployeeId;

/// Header key carrying the store creation instant.
const CREATED_HEADER: &str = "#created=";

/// Errors that can occur operating the dedup cache store.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The store could not be read or written.
    #[error("cache store I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<CacheError> for embark_core::EmbarkError {
    fn from(err: CacheError) -> Self {
        embark_core::EmbarkError::cache(err.to_string())
    }
}

/// File-backed set of already-processed employee IDs.
#[derive(Debug)]
pub struct DedupCache {
    path: PathBuf,
    created_at: DateTime<Utc>,
    entries: HashSet<EmployeeId>,
}

impl DedupCache {
    /// Open the store at `path`, expiring it wholesale if it is older than
    /// `max_age_days`. A missing or unreadable-header store is recreated
    /// empty.
    #[instrument]
    pub fn open(path: &Path, max_age_days: u32) -> Result<Self, CacheError> {
        let now = Utc::now();

        if path.exists() {
            match Self::load(path) {
                Some((created_at, entries)) => {
                    let age = now - created_at;
                    if age > Duration::days(i64::from(max_age_days)) {
                        info!(
                            path = %path.display(),
                            age_days = age.num_days(),
                            max_age_days,
                            "Dedup cache expired; resetting idempotency state"
                        );
                        return Self::recreate(path, now);
                    }

                    debug!(
                        path = %path.display(),
                        entries = entries.len(),
                        "Dedup cache loaded"
                    );

                    return Ok(Self {
                        path: path.to_path_buf(),
                        created_at,
                        entries,
                    });
                }
                None => {
                    warn!(
                        path = %path.display(),
                        "Dedup cache header missing or unreadable; recreating empty store"
                    );
                    return Self::recreate(path, now);
                }
            }
        }

        Self::recreate(path, now)
    }

    /// Parse the store: header line then one ID per line. Returns `None`
    /// when the header is absent or malformed.
    fn load(path: &Path) -> Option<(DateTime<Utc>, HashSet<EmployeeId>)> {
        let content = fs::read_to_string(path).ok()?;
        let mut lines = content.lines();

        let created_at = lines
            .next()?
            .strip_prefix(CREATED_HEADER)
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))?;

        let entries = lines
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(EmployeeId::new)
            .collect();

        Some((created_at, entries))
    }

    /// Replace the store with a fresh empty one created now.
    fn recreate(path: &Path, now: DateTime<Utc>) -> Result<Self, CacheError> {
        let mut file = File::create(path).map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        writeln!(file, "{CREATED_HEADER}{}", now.to_rfc3339()).map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            created_at: now,
            entries: HashSet::new(),
        })
    }

    /// Whether an employee ID has already been processed.
    #[must_use]
    pub fn contains(&self, id: &EmployeeId) -> bool {
        self.entries.contains(id)
    }

    /// Record an employee ID as processed: append to the store and the
    /// in-memory set.
    pub fn record(&mut self, id: &EmployeeId) -> Result<(), CacheError> {
        if self.entries.contains(id) {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| CacheError::Io {
                path: self.path.clone(),
                source: e,
            })?;

        writeln!(file, "{id}").map_err(|e| CacheError::Io {
            path: self.path.clone(),
            source: e,
        })?;

        self.entries.insert(id.clone());
        Ok(())
    }

    /// Number of recorded IDs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store has no recorded IDs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// When the store was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_store_with_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processed.txt");

        let cache = DedupCache::open(&path, 2).unwrap();
        assert!(cache.is_empty());

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(CREATED_HEADER));
    }

    #[test]
    fn test_record_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processed.txt");

        {
            let mut cache = DedupCache::open(&path, 2).unwrap();
            cache.record(&EmployeeId::new("12345")).unwrap();
            cache.record(&EmployeeId::new("67890")).unwrap();
            assert_eq!(cache.len(), 2);
        }

        let cache = DedupCache::open(&path, 2).unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&EmployeeId::new("12345")));
        assert!(cache.contains(&EmployeeId::new("67890")));
    }

    #[test]
    fn test_membership_is_exact_not_substring() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processed.txt");

        let mut cache = DedupCache::open(&path, 2).unwrap();
        cache.record(&EmployeeId::new("1234")).unwrap();

        // "123" must not match "1234"
        assert!(!cache.contains(&EmployeeId::new("123")));
        assert!(cache.contains(&EmployeeId::new("1234")));
    }

    #[test]
    fn test_record_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processed.txt");

        let mut cache = DedupCache::open(&path, 2).unwrap();
        cache.record(&EmployeeId::new("12345")).unwrap();
        cache.record(&EmployeeId::new("12345")).unwrap();
        assert_eq!(cache.len(), 1);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("12345").count(), 1);
    }

    #[test]
    fn test_expired_store_resets_wholesale() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processed.txt");

        // Write a store created three days ago with two entries
        let stale = Utc::now() - Duration::days(3);
        fs::write(
            &path,
            format!("{CREATED_HEADER}{}\n12345\n67890\n", stale.to_rfc3339()),
        )
        .unwrap();

        let cache = DedupCache::open(&path, 2).unwrap();

        // Everyone is unseen again, not just stale entries
        assert!(cache.is_empty());
        assert!(!cache.contains(&EmployeeId::new("12345")));
        assert!(cache.created_at() > stale);
    }

    #[test]
    fn test_unexpired_store_keeps_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processed.txt");

        let recent = Utc::now() - Duration::hours(12);
        fs::write(
            &path,
            format!("{CREATED_HEADER}{}\n12345\n", recent.to_rfc3339()),
        )
        .unwrap();

        let cache = DedupCache::open(&path, 2).unwrap();
        assert!(cache.contains(&EmployeeId::new("12345")));
    }

    #[test]
    fn test_headerless_store_recreated_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processed.txt");

        fs::write(&path, "12345\n67890\n").unwrap();

        let cache = DedupCache::open(&path, 2).unwrap();
        assert!(cache.is_empty());
    }
}
