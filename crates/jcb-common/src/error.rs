//! Error types for jcblock.

use thiserror::Error;

/// Result type alias for jcblock operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for jcblock.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    // List store errors (20-29)
    #[error("list file error: {0}")]
    ListFile(String),

    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("pattern already present: {0}")]
    DuplicatePattern(String),

    #[error("pattern not found: {0}")]
    PatternNotFound(String),

    // Modem errors (30-39)
    #[error("modem link error: {0}")]
    Modem(String),

    #[error("modem link closed")]
    ModemClosed,

    // Call log errors (40-49)
    #[error("call log error: {0}")]
    CallLog(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    /// Used for detailed error reporting in JSON output.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::ListFile(_) => 20,
            Error::InvalidPattern { .. } => 21,
            Error::DuplicatePattern(_) => 22,
            Error::PatternNotFound(_) => 23,
            Error::Modem(_) => 30,
            Error::ModemClosed => 31,
            Error::CallLog(_) => 40,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_group_by_area() {
        assert_eq!(Error::Config("x".into()).code(), 10);
        assert_eq!(
            Error::InvalidPattern {
                pattern: "(".into(),
                reason: "unclosed group".into()
            }
            .code(),
            21
        );
        assert_eq!(Error::ModemClosed.code(), 31);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(Error::from(io).code(), 60);
    }
}
