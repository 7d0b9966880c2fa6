//! Optional convenience `tracing-subscriber` initialization (SPEC_FULL §4.8).
//!
//! This crate only emits `tracing` events; it never installs a global
//! subscriber on its own. These functions are a convenience for embedders
//! who have not already set one up, gated behind the `logging` feature.

use std::str::FromStr;
use std::sync::Once;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Silent,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Silent => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "silent" | "off" => Ok(LogLevel::Silent),
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "trace" => Ok(LogLevel::Debug),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter())
    }
}

static INIT: Once = Once::new();

/// Installs a compact, timestamp-free `fmt` subscriber at `level`. A no-op
/// on the second and later call within one process.
pub fn init_logging(level: LogLevel) {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_new(level.as_filter())
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .with_target(false)
            .without_time()
            .init();
    });
}

/// Like `init_logging`, but reads `RUST_LOG` (falling back to `info`) so an
/// embedder's own environment configuration is respected.
pub fn init_logging_from_env() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .with_target(false)
            .without_time()
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_level_names_case_insensitively() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("Warn".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("nonsense".parse::<LogLevel>().is_err());
    }

    #[test]
    fn default_level_is_info() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn displays_as_its_filter_string() {
        assert_eq!(LogLevel::Warn.to_string(), "warn");
    }
}
