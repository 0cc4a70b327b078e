//! Structured logging setup.
//!
//! Every lifecycle edge of a dispatch emits a `tracing` event with
//! structured fields (`method`, `path`, `handler_name`, `condition`,
//! `status`, `request_id`, `duration_us`). This module installs the
//! subscriber that formats them.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `ZEST_LOG_LEVEL` | `info` | trace/debug/info/warn/error |
//! | `ZEST_LOG_FORMAT` | `json` | `json` or `pretty` |
//! | `ZEST_LOG_TARGETS` | none | extra comma-separated `EnvFilter` directives |
//! | `ZEST_LOG_LOCATION` | `false` | include file and line |
//!
//! `RUST_LOG`, when set, replaces the level.

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub format: LogFormat,
    /// Extra filter directives, comma-separated.
    pub target_filter: Option<String>,
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            format: LogFormat::Json,
            target_filter: None,
            include_location: false,
        }
    }
}

impl LogConfig {
    /// Read `ZEST_LOG_*` from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read `ZEST_LOG_*` through `lookup`.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            log_level: lookup("ZEST_LOG_LEVEL").unwrap_or(defaults.log_level),
            format: lookup("ZEST_LOG_FORMAT")
                .map_or(defaults.format, |f| LogFormat::parse(&f)),
            target_filter: lookup("ZEST_LOG_TARGETS").filter(|t| !t.trim().is_empty()),
            include_location: lookup("ZEST_LOG_LOCATION")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.include_location),
        }
    }

    #[must_use]
    pub fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// The filter this configuration installs.
    ///
    /// # Errors
    ///
    /// A directive in `target_filter` does not parse.
    pub fn env_filter(&self) -> Result<EnvFilter> {
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level().as_str()));
        filter = filter.add_directive(
            "may_minihttp=warn"
                .parse()
                .context("built-in filter directive")?,
        );
        if let Some(targets) = &self.target_filter {
            for directive in targets.split(',').map(str::trim).filter(|d| !d.is_empty()) {
                filter = filter.add_directive(
                    directive
                        .parse()
                        .with_context(|| format!("invalid log filter directive '{directive}'"))?,
                );
            }
        }
        Ok(filter)
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// A filter directive is invalid, or a global subscriber is already set
/// (a second call fails instead of panicking).
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(config.env_filter()?)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("PRETTY"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("whatever"), LogFormat::Json);
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = LogConfig::from_lookup(|_| None);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.target_filter.is_none());
        assert!(!config.include_location);
    }

    #[test]
    fn test_from_lookup_values() {
        let vars: HashMap<&str, &str> = [
            ("ZEST_LOG_LEVEL", "debug"),
            ("ZEST_LOG_FORMAT", "pretty"),
            ("ZEST_LOG_TARGETS", "zest::router=trace"),
            ("ZEST_LOG_LOCATION", "true"),
        ]
        .into_iter()
        .collect();
        let config = LogConfig::from_lookup(|k| vars.get(k).map(|v| (*v).to_owned()));
        assert_eq!(config.level(), Level::DEBUG);
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.target_filter.as_deref(), Some("zest::router=trace"));
        assert!(config.include_location);
        assert!(config.env_filter().is_ok());
    }

    #[test]
    fn test_invalid_directive_is_an_error() {
        let config = LogConfig {
            target_filter: Some("zest=notalevel".to_owned()),
            ..LogConfig::default()
        };
        assert!(config.env_filter().is_err());
    }

    #[test]
    fn test_second_init_fails() {
        let config = LogConfig::default();
        let _first = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
