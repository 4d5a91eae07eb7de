//! Semantic validation of a loaded configuration.

use crate::screener::ScreenerConfig;
use std::fmt;

/// One problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// All problems found in a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field,
            message: message.into(),
        });
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl ScreenerConfig {
    /// Check timing windows and paths for values the screener cannot run with.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();
        let t = &self.timing;

        if t.caller_id_timeout_secs == 0 {
            result.push("timing.caller_id_timeout_secs", "must be greater than zero");
        }
        if t.dtmf_window_secs == 0 {
            result.push("timing.dtmf_window_secs", "must be greater than zero");
        }
        let longest_call = t.caller_id_timeout_secs.saturating_add(t.dtmf_window_secs);
        if t.watchdog_secs <= longest_call {
            result.push(
                "timing.watchdog_secs",
                format!(
                    "must exceed caller_id_timeout_secs + dtmf_window_secs ({longest_call})"
                ),
            );
        }
        if self.purge.enabled && self.purge.max_age_days == 0 {
            result.push("purge.max_age_days", "must be greater than zero when purge is enabled");
        }
        if self.purge.enabled && self.purge.interval_hours == 0 {
            result.push("purge.interval_hours", "must be greater than zero when purge is enabled");
        }
        if self.modem.port.as_os_str().is_empty() {
            result.push("modem.port", "must not be empty");
        }
        for (field, path) in [
            ("lists.allow", &self.lists.allow),
            ("lists.block", &self.lists.block),
            ("lists.activity", &self.lists.activity),
            ("call_log.path", &self.call_log.path),
        ] {
            if path.as_os_str().is_empty() {
                result.push(field, "must not be empty");
            }
        }
        if self.lists.allow == self.lists.block {
            result.push("lists.block", "must differ from lists.allow");
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        let result = ScreenerConfig::default().validate();
        assert!(result.is_ok(), "{result}");
    }

    #[test]
    fn test_watchdog_must_cover_windows() {
        let mut cfg = ScreenerConfig::default();
        cfg.timing.watchdog_secs = 10;
        let result = cfg.validate();
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].field, "timing.watchdog_secs");
    }

    #[test]
    fn test_reports_every_problem() {
        let mut cfg = ScreenerConfig::default();
        cfg.timing.dtmf_window_secs = 0;
        cfg.purge.max_age_days = 0;
        cfg.lists.block = PathBuf::from("allowlist.dat");
        cfg.call_log.path = PathBuf::new();
        let fields: Vec<_> = cfg.validate().errors.iter().map(|e| e.field).collect();
        assert!(fields.contains(&"timing.dtmf_window_secs"));
        assert!(fields.contains(&"purge.max_age_days"));
        assert!(fields.contains(&"lists.block"));
        assert!(fields.contains(&"call_log.path"));
    }

    #[test]
    fn test_disabled_purge_skips_purge_checks() {
        let mut cfg = ScreenerConfig::default();
        cfg.purge.enabled = false;
        cfg.purge.max_age_days = 0;
        assert!(cfg.validate().is_ok());
    }
}
