//! Configuration resolution.
//!
//! Order of precedence for the configuration file:
//! 1. Explicit `--config` path
//! 2. `JCBLOCK_CONFIG` environment variable
//! 3. `$XDG_CONFIG_HOME/jcblock/jcblock.toml` (platform config dir)
//! 4. Built-in defaults
//!
//! When the file does not set `data_dir`, it falls back to `JCBLOCK_DATA`,
//! then the platform data directory, then the working directory.

use crate::screener::ScreenerConfig;
use crate::{APP_DIR_NAME, CONFIG_FILE_NAME};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const ENV_CONFIG: &str = "JCBLOCK_CONFIG";

/// Environment variable naming the data directory.
pub const ENV_DATA_DIR: &str = "JCBLOCK_DATA";

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Where the active configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    Env,
    Xdg,
    Defaults,
}

/// Resolved configuration file location.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_file: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Resolve and load the configuration.
pub fn resolve_config(
    explicit: Option<&Path>,
) -> Result<(ScreenerConfig, ConfigPaths), ConfigError> {
    let env_path = std::env::var_os(ENV_CONFIG).map(PathBuf::from);
    let xdg_path = dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME));
    let data_default = default_data_dir();
    resolve_from(explicit, env_path, xdg_path, data_default)
}

fn resolve_from(
    explicit: Option<&Path>,
    env_path: Option<PathBuf>,
    xdg_path: Option<PathBuf>,
    data_default: PathBuf,
) -> Result<(ScreenerConfig, ConfigPaths), ConfigError> {
    let (file, source) = if let Some(path) = explicit {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        (Some(path.to_path_buf()), ConfigSource::Cli)
    } else if let Some(path) = env_path {
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        (Some(path), ConfigSource::Env)
    } else {
        match xdg_path.filter(|p| p.exists()) {
            Some(path) => (Some(path), ConfigSource::Xdg),
            None => (None, ConfigSource::Defaults),
        }
    };

    let config = match &file {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;
            let mut config = ScreenerConfig::parse_toml(&text).map_err(|e| ConfigError::Parse {
                path: path.clone(),
                source: e,
            })?;
            if !declares_data_dir(&text) {
                config.data_dir = data_default;
            }
            config
        }
        None => ScreenerConfig {
            data_dir: data_default,
            ..ScreenerConfig::default()
        },
    };

    Ok((
        config,
        ConfigPaths {
            config_file: file,
            source,
        },
    ))
}

fn declares_data_dir(text: &str) -> bool {
    text.parse::<toml::Table>()
        .map(|t| t.contains_key("data_dir"))
        .unwrap_or(false)
}

/// Resolve the default data directory.
pub fn default_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(ENV_DATA_DIR) {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_when_nothing_exists() {
        let dir = tempdir().expect("tempdir");
        let (cfg, paths) = resolve_from(
            None,
            None,
            Some(dir.path().join("missing.toml")),
            dir.path().to_path_buf(),
        )
        .expect("resolve");
        assert_eq!(paths.source, ConfigSource::Defaults);
        assert!(paths.config_file.is_none());
        assert_eq!(cfg.data_dir, dir.path());
    }

    #[test]
    fn test_explicit_path_wins_over_env() {
        let dir = tempdir().expect("tempdir");
        let cli = dir.path().join("cli.toml");
        let env = dir.path().join("env.toml");
        fs::write(&cli, "[timing]\ndtmf_window_secs = 12\n").unwrap();
        fs::write(&env, "[timing]\ndtmf_window_secs = 30\n").unwrap();

        let (cfg, paths) =
            resolve_from(Some(&cli), Some(env), None, PathBuf::from("/data")).expect("resolve");
        assert_eq!(paths.source, ConfigSource::Cli);
        assert_eq!(cfg.timing.dtmf_window_secs, 12);
        assert_eq!(cfg.data_dir, PathBuf::from("/data"));
    }

    #[test]
    fn test_file_data_dir_is_kept() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("jcblock.toml");
        fs::write(&path, "data_dir = \"/srv/phone\"\n").unwrap();
        let (cfg, paths) =
            resolve_from(None, None, Some(path), PathBuf::from("/data")).expect("resolve");
        assert_eq!(paths.source, ConfigSource::Xdg);
        assert_eq!(cfg.data_dir, PathBuf::from("/srv/phone"));
    }

    #[test]
    fn test_missing_explicit_is_error() {
        let err = resolve_from(
            Some(Path::new("/nonexistent/jcblock.toml")),
            None,
            None,
            PathBuf::from("."),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_bad_toml_reports_path() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[timing\n").unwrap();
        let err = resolve_from(Some(&path), None, None, PathBuf::from(".")).unwrap_err();
        match err {
            ConfigError::Parse { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }
}
