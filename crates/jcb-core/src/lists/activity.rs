//! Per-pattern activity records for block entries.
//!
//! Stored separately from the list files, keyed by pattern text, so purge
//! decisions never need the call history:
//!
//! ```json
//! {
//!   "schema_version": "1.0.0",
//!   "records": {
//!     "978.....00": {
//!       "created_at": "2026-01-04T17:01:00Z",
//!       "last_fired_at": "2026-10-06T17:01:00Z",
//!       "match_count": 2
//!     }
//!   }
//! }
//! ```

use chrono::{DateTime, Duration, Utc};
use jcb_common::schema::{is_compatible, SCHEMA_VERSION};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::persist::write_atomic;

/// Errors from the activity store.
#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse activity store {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("activity store {path} has incompatible schema version {version}")]
    IncompatibleSchema { path: PathBuf, version: String },
}

/// Creation and last-match times of one block pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fired_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub match_count: u64,
}

impl ActivityRecord {
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            created_at,
            last_fired_at: None,
            match_count: 0,
        }
    }

    /// Record a match at `now`.
    pub fn fire(&mut self, now: DateTime<Utc>) {
        self.last_fired_at = Some(now);
        self.match_count += 1;
    }

    /// Last time the pattern fired, or its creation time if it never did.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_fired_at.unwrap_or(self.created_at)
    }

    /// How long the pattern has been idle as of `now`.
    pub fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.last_activity())
    }
}

/// All activity records, keyed by pattern text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityStore {
    pub schema_version: String,
    #[serde(default)]
    pub records: BTreeMap<String, ActivityRecord>,
}

impl Default for ActivityStore {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            records: BTreeMap::new(),
        }
    }
}

impl ActivityStore {
    /// Load the store. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self, ActivityError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ActivityError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        let store: Self = serde_json::from_str(&text).map_err(|e| ActivityError::Json {
            path: path.to_path_buf(),
            source: e,
        })?;
        if !is_compatible(&store.schema_version) {
            return Err(ActivityError::IncompatibleSchema {
                path: path.to_path_buf(),
                version: store.schema_version,
            });
        }
        Ok(store)
    }

    /// Atomically rewrite the store.
    pub fn save(&self, path: &Path) -> Result<(), ActivityError> {
        let json = serde_json::to_vec_pretty(self).map_err(|e| ActivityError::Json {
            path: path.to_path_buf(),
            source: e,
        })?;
        write_atomic(path, &json).map_err(|e| ActivityError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn get(&self, pattern: &str) -> Option<&ActivityRecord> {
        self.records.get(pattern)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
