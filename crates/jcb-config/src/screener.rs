//! Screener configuration types.
//!
//! Every field has a default so an empty `jcblock.toml` (or no file at all)
//! yields a working configuration pointing at the files in the data
//! directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete screener configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenerConfig {
    /// Directory that relative list, activity and log paths resolve against.
    pub data_dir: PathBuf,
    pub modem: ModemConfig,
    pub lists: ListsConfig,
    pub call_log: CallLogConfig,
    pub timing: TimingConfig,
    pub purge: PurgeConfig,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            modem: ModemConfig::default(),
            lists: ListsConfig::default(),
            call_log: CallLogConfig::default(),
            timing: TimingConfig::default(),
            purge: PurgeConfig::default(),
        }
    }
}

/// Serial modem settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModemConfig {
    /// Serial device of the voice modem.
    pub port: PathBuf,
    /// Commands sent once after the device is opened.
    pub init_commands: Vec<String>,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            port: PathBuf::from("/dev/ttyACM0"),
            init_commands: vec!["ATZ".to_string(), "AT+VCID=1".to_string()],
        }
    }
}

/// Pattern list and activity store locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListsConfig {
    pub allow: PathBuf,
    pub block: PathBuf,
    pub activity: PathBuf,
    /// Where purged block entries are archived; `None` disables archiving.
    pub purge_archive: Option<PathBuf>,
}

impl Default for ListsConfig {
    fn default() -> Self {
        Self {
            allow: PathBuf::from("allowlist.dat"),
            block: PathBuf::from("blocklist.dat"),
            activity: PathBuf::from("blocklist.dat-activity.json"),
            purge_archive: Some(PathBuf::from("blocklist.dat-purged")),
        }
    }
}

/// Call log sink location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallLogConfig {
    pub path: PathBuf,
}

impl Default for CallLogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("calllog.jsonl"),
        }
    }
}

/// Call handler timing windows, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// How long to wait after the first ring for Caller ID.
    pub caller_id_timeout_secs: u64,
    /// How long an unknown caller's line stays open for a `*` keypress.
    pub dtmf_window_secs: u64,
    /// Rings closer together than this belong to the same call.
    pub ring_gap_secs: u64,
    /// Upper bound on time spent outside `Idle` before a forced reset.
    pub watchdog_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            caller_id_timeout_secs: 5,
            dtmf_window_secs: 10,
            ring_gap_secs: 7,
            watchdog_secs: 60,
        }
    }
}

impl TimingConfig {
    pub fn caller_id_timeout(&self) -> Duration {
        Duration::from_secs(self.caller_id_timeout_secs)
    }

    pub fn dtmf_window(&self) -> Duration {
        Duration::from_secs(self.dtmf_window_secs)
    }

    pub fn ring_gap(&self) -> Duration {
        Duration::from_secs(self.ring_gap_secs)
    }

    pub fn watchdog(&self) -> Duration {
        Duration::from_secs(self.watchdog_secs)
    }
}

/// Block list aging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurgeConfig {
    pub enabled: bool,
    /// Non-permanent block entries idle for longer than this are removed.
    pub max_age_days: u32,
    /// Time between purge passes.
    pub interval_hours: u32,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_age_days: 9 * 30,
            interval_hours: 24,
        }
    }
}

impl PurgeConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_hours) * 60 * 60)
    }
}

impl ScreenerConfig {
    /// Parse a configuration from TOML text.
    pub fn parse_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Resolve a configured path against the data directory.
    pub fn data_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    pub fn allow_list_path(&self) -> PathBuf {
        self.data_path(&self.lists.allow)
    }

    pub fn block_list_path(&self) -> PathBuf {
        self.data_path(&self.lists.block)
    }

    pub fn activity_path(&self) -> PathBuf {
        self.data_path(&self.lists.activity)
    }

    pub fn purge_archive_path(&self) -> Option<PathBuf> {
        self.lists.purge_archive.as_deref().map(|p| self.data_path(p))
    }

    pub fn call_log_path(&self) -> PathBuf {
        self.data_path(&self.call_log.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let cfg = ScreenerConfig::parse_toml("").expect("parse");
        assert_eq!(cfg, ScreenerConfig::default());
        assert_eq!(cfg.purge.max_age_days, 270);
        assert_eq!(cfg.timing.dtmf_window(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let cfg = ScreenerConfig::parse_toml(
            r#"
            data_dir = "/var/lib/jcblock"

            [timing]
            dtmf_window_secs = 15
            "#,
        )
        .expect("parse");
        assert_eq!(cfg.timing.dtmf_window_secs, 15);
        assert_eq!(cfg.timing.caller_id_timeout_secs, 5);
        assert_eq!(
            cfg.block_list_path(),
            PathBuf::from("/var/lib/jcblock/blocklist.dat")
        );
    }

    #[test]
    fn test_absolute_paths_are_not_rebased() {
        let mut cfg = ScreenerConfig::default();
        cfg.data_dir = PathBuf::from("/srv/jcb");
        cfg.call_log.path = PathBuf::from("/var/log/calls.jsonl");
        assert_eq!(cfg.call_log_path(), PathBuf::from("/var/log/calls.jsonl"));
        assert_eq!(cfg.allow_list_path(), PathBuf::from("/srv/jcb/allowlist.dat"));
    }

    #[test]
    fn test_toml_roundtrip() {
        let cfg = ScreenerConfig::default();
        let text = cfg.to_toml().expect("serialize");
        let back = ScreenerConfig::parse_toml(&text).expect("parse");
        assert_eq!(back, cfg);
    }

    #[test]
    fn test_unknown_field_type_is_error() {
        assert!(ScreenerConfig::parse_toml("[purge]\nmax_age_days = \"soon\"").is_err());
    }
}
