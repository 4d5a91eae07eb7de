//! Append-only call log.
//!
//! One JSON object per screened call, one call per line:
//!
//! ```json
//! {"call_id":"call-20261016-143022-3fa9c1","received_at":"...","decided_at":"...",
//!  "name":"TOLL FREE","number":"8005550000","disposition":"blocked",
//!  "matched_pattern":"toll free","matched_list":"block","matched_field":"name"}
//! ```

use chrono::{DateTime, Utc};
use jcb_common::{CallEvent, CallId, CallerField, DispositionKind, ListKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::decision::PatternMatch;
use crate::persist;

/// Errors from call log operations.
#[derive(Debug, Error)]
pub enum CallLogError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse call log line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize call record: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl From<CallLogError> for jcb_common::Error {
    fn from(err: CallLogError) -> Self {
        jcb_common::Error::CallLog(err.to_string())
    }
}

/// Final record of one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispositionRecord {
    pub call_id: CallId,
    pub received_at: DateTime<Utc>,
    pub decided_at: DateTime<Utc>,
    pub name: String,
    pub number: String,
    pub disposition: DispositionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_list: Option<ListKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_field: Option<CallerField>,
    /// Pattern added to the block list by a keypress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl DispositionRecord {
    pub fn new(call_id: CallId, call: &CallEvent, disposition: DispositionKind) -> Self {
        Self {
            call_id,
            received_at: call.received_at,
            decided_at: Utc::now(),
            name: call.name.clone(),
            number: call.number.clone(),
            disposition,
            matched_pattern: None,
            matched_list: None,
            matched_field: None,
            added_pattern: None,
            note: None,
        }
    }

    pub fn with_match(mut self, m: &PatternMatch) -> Self {
        self.matched_pattern = Some(m.pattern.clone());
        self.matched_list = Some(m.list);
        self.matched_field = Some(m.field);
        self
    }

    pub fn with_added_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.added_pattern = Some(pattern.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// JSONL sink for disposition records.
#[derive(Debug, Clone)]
pub struct CallLog {
    path: PathBuf,
}

impl CallLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record.
    pub fn append(&self, record: &DispositionRecord) -> Result<(), CallLogError> {
        let mut line = serde_json::to_string(record).map_err(CallLogError::Serialize)?;
        line.push('\n');
        persist::append(&self.path, line.as_bytes()).map_err(|e| CallLogError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        debug!(call_id = %record.call_id, disposition = %record.disposition, "call logged");
        Ok(())
    }

    /// All records, oldest first. A missing log is empty.
    pub fn list(&self) -> Result<Vec<DispositionRecord>, CallLogError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(CallLogError::Io {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        let mut records = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(line).map_err(|e| CallLogError::Json {
                line: idx + 1,
                source: e,
            })?;
            records.push(record);
        }
        Ok(records)
    }
}
