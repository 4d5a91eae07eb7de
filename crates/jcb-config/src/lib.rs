//! jcblock configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for `jcblock.toml`
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation of timing windows and paths

pub mod resolve;
pub mod screener;
pub mod validate;

pub use resolve::{default_data_dir, resolve_config, ConfigError, ConfigPaths, ConfigSource};
pub use screener::{
    CallLogConfig, ListsConfig, ModemConfig, PurgeConfig, ScreenerConfig, TimingConfig,
};
pub use validate::{ValidationError, ValidationResult};

/// Configuration file name looked up in the XDG config directory.
pub const CONFIG_FILE_NAME: &str = "jcblock.toml";

/// Directory name used under XDG config/data homes.
pub const APP_DIR_NAME: &str = "jcblock";
