//! Tracing subscriber setup for the `jcblock` binary.

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Filter from `RUST_LOG`, falling back to `level`.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(format: LogFormat, level: &str) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(LogFormat::Json, "debug");
        init_logging(LogFormat::Text, "info");
        tracing::info!("logging initialised");
    }

    #[test]
    fn test_format_names() {
        assert_eq!(
            LogFormat::from_str("json", true).unwrap(),
            LogFormat::Json
        );
        assert_eq!(LogFormat::default(), LogFormat::Text);
    }
}
