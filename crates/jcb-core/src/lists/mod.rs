//! Allow and block pattern lists with their activity records.
//!
//! - [`file`]: the `pattern;flags;comment` grammar and list files
//! - [`entry`]: compiled pattern entries and flags
//! - [`activity`]: per-pattern creation and match times for block entries
//! - [`store`]: the shared, mutex-guarded store the daemon mutates

pub mod activity;
pub mod entry;
pub mod file;
pub mod store;

use std::path::PathBuf;
use thiserror::Error;

pub use activity::{ActivityError, ActivityRecord, ActivityStore};
pub use entry::{EntryFlag, EntryFlags, PatternEntry};
pub use file::{escape_pattern, is_representable, PatternList};
pub use store::{ListStore, PatternLists, RemovedEntry, StorePaths};

/// Errors from list parsing, mutation and persistence.
#[derive(Debug, Error)]
pub enum ListError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("empty pattern")]
    EmptyPattern,

    #[error("invalid regex {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("pattern {0:?} cannot be written to a list file")]
    Unrepresentable(String),

    #[error("pattern {0:?} is already listed")]
    Duplicate(String),

    #[error("pattern {0:?} not found")]
    NotFound(String),

    #[error(transparent)]
    Activity(#[from] ActivityError),
}

impl From<ListError> for jcb_common::Error {
    fn from(err: ListError) -> Self {
        match err {
            ListError::EmptyPattern => jcb_common::Error::InvalidPattern {
                pattern: String::new(),
                reason: "empty pattern".to_string(),
            },
            ListError::InvalidRegex { pattern, source } => jcb_common::Error::InvalidPattern {
                pattern,
                reason: source.to_string(),
            },
            ListError::Unrepresentable(pattern) => jcb_common::Error::InvalidPattern {
                pattern,
                reason: "cannot be written to a list file".to_string(),
            },
            ListError::Duplicate(pattern) => jcb_common::Error::DuplicatePattern(pattern),
            ListError::NotFound(pattern) => jcb_common::Error::PatternNotFound(pattern),
            other => jcb_common::Error::ListFile(other.to_string()),
        }
    }
}
