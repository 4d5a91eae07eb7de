//! Exit codes for the `jcblock` CLI.
//!
//! These are stable so service managers and scripts can act on them.

/// Exit codes for jcblock operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Clean = 0,

    /// `check`: the caller would be blocked
    WouldBlock = 1,

    /// `check`: the caller is unknown to both lists
    WouldPrompt = 2,

    /// Configuration error
    ConfigError = 10,

    /// List file or pattern error
    ListError = 11,

    /// Modem device error
    ModemError = 12,

    /// I/O error
    IoError = 13,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates an error requiring attention.
    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Exit code for a crate-wide error.
    pub fn for_error(err: &jcb_common::Error) -> Self {
        match err.code() {
            10..=19 => ExitCode::ConfigError,
            20..=29 | 40..=49 => ExitCode::ListError,
            30..=39 => ExitCode::ModemError,
            60..=69 => ExitCode::IoError,
            _ => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}
