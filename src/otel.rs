//! Structured logging initialisation
//!
//! Every component logs through `tracing` with structured fields (`request_id`,
//! `channel`, `candidates`, `path`). This module installs the subscriber that turns
//! those events into JSON lines for production or pretty output for development,
//! configured from `BRRTCH_LOG_*` environment variables.

use std::env;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
    /// Write through a `tracing-appender` background worker
    pub async_logging: bool,
    /// Extra `EnvFilter` directives, comma-separated
    pub target_filter: Option<String>,
    /// Include file:line location (dev only)
    pub include_location: bool,
}

impl LogConfig {
    /// Read `BRRTCH_LOG_LEVEL`, `BRRTCH_LOG_FORMAT`, `BRRTCH_LOG_ASYNC`,
    /// `BRRTCH_LOG_TARGET_FILTER` and `BRRTCH_LOG_INCLUDE_LOCATION`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |key: &str, default: bool| {
            lookup(key)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(default)
        };
        Self {
            log_level: lookup("BRRTCH_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            format: LogFormat::parse(
                &lookup("BRRTCH_LOG_FORMAT").unwrap_or_else(|| "json".to_string()),
            ),
            async_logging: flag("BRRTCH_LOG_ASYNC", true),
            target_filter: lookup("BRRTCH_LOG_TARGET_FILTER").filter(|s| !s.trim().is_empty()),
            include_location: flag("BRRTCH_LOG_INCLUDE_LOCATION", false),
        }
    }

    /// Configuration for tests and local runs
    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            async_logging: false,
            target_filter: None,
            include_location: true,
        }
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let mut env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level().as_str()));

        if let Ok(directive) = "may_minihttp=warn".parse() {
            env_filter = env_filter.add_directive(directive);
        }

        if let Some(target_filter) = &self.target_filter {
            for filter in target_filter.split(',').map(str::trim) {
                if filter.is_empty() {
                    continue;
                }
                match filter.parse() {
                    Ok(directive) => env_filter = env_filter.add_directive(directive),
                    Err(_) => eprintln!("Warning: Invalid log filter directive: {filter}"),
                }
            }
        }
        env_filter
    }
}

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
///
/// # Example
///
/// ```no_run
/// use brrtchannels::otel::{init_logging_with_config, LogConfig};
///
/// init_logging_with_config(&LogConfig::from_env()).expect("logging");
/// ```
pub fn init_logging_with_config(config: &LogConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(config.env_filter());

    if config.async_logging {
        let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());
        let fmt_layer = match config.format {
            LogFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_writer(non_blocking)
                .boxed(),
            LogFormat::Pretty => tracing_subscriber::fmt::layer()
                .pretty()
                .with_target(true)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_writer(non_blocking)
                .boxed(),
        };
        registry
            .with(fmt_layer)
            .try_init()
            .context("Failed to initialize async logging")?;

        // The worker flushes on drop; keep it for the life of the process.
        std::mem::forget(guard);
    } else {
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
        registry
            .with(fmt_layer)
            .try_init()
            .context("Failed to initialize sync logging")?;
    }

    Ok(())
}
