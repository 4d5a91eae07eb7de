//! Call identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for one screened call.
///
/// Format: `call-<date>-<time>-<random>`
/// Example: `call-20261016-143022-3fa9c1`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(pub String);

impl CallId {
    /// Generate a new call ID.
    pub fn new() -> Self {
        let now = chrono::Utc::now();
        let random: String = uuid::Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(6)
            .collect();
        CallId(format!("call-{}-{}", now.format("%Y%m%d-%H%M%S"), random))
    }

    /// Parse an existing call ID string.
    pub fn parse(s: &str) -> Option<Self> {
        if s.starts_with("call-") && s.len() > 21 {
            Some(CallId(s.to_string()))
        } else {
            None
        }
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
