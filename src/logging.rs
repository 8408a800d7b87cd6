//! Tracing setup
//!
//! The library only emits `tracing` events; binaries and tests call
//! [`init_logging`] once to install a subscriber configured from the
//! environment.

use std::env;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::Error;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Logging level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: LogLevel,
    /// Output format (JSON, Compact, Pretty)
    pub format: LogFormat,
    /// Whether to enable colored output
    pub enable_colors: bool,
    /// Whether to include file/line information
    pub include_file_line: bool,
    /// Custom environment filter, overrides `level`
    pub custom_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            enable_colors: true,
            include_file_line: false,
            custom_filter: None,
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from `DEX_LOG_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(level) = env::var("DEX_LOG_LEVEL") {
            config.level = level.parse().unwrap_or(LogLevel::Info);
        }

        if let Ok(format) = env::var("DEX_LOG_FORMAT") {
            config.format = format.parse().unwrap_or(LogFormat::Compact);
        }

        if let Ok(colors) = env::var("DEX_LOG_COLORS") {
            config.enable_colors = colors.parse().unwrap_or(true);
        }

        if let Ok(file_line) = env::var("DEX_LOG_FILE_LINE") {
            config.include_file_line = file_line.parse().unwrap_or(false);
        }

        if let Ok(filter) = env::var("DEX_LOG_FILTER") {
            config.custom_filter = Some(filter);
        }

        config
    }

    /// Filter directive used when no custom filter is set
    pub fn filter_directive(&self) -> String {
        if let Some(ref custom) = self.custom_filter {
            return custom.clone();
        }
        format!("dex_intent={},tokio=warn", self.level.as_str())
    }
}

/// Supported logging levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

/// Supported log output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    /// Structured JSON format
    Json,
    /// Compact human-readable format
    Compact,
    /// Pretty human-readable format with indentation
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

/// Install a global stderr subscriber.
///
/// Calling it again after a subscriber is installed is a no-op, so tests
/// can call it freely.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Error> {
    let env_filter = EnvFilter::try_new(config.filter_directive())
        .map_err(|e| Error::Config(format!("Failed to create environment filter: {}", e)))?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_file(config.include_file_line)
                    .with_line_number(config.include_file_line),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr)
                    .with_file(config.include_file_line)
                    .with_line_number(config.include_file_line)
                    .with_ansi(config.enable_colors),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr)
                    .with_file(config.include_file_line)
                    .with_line_number(config.include_file_line)
                    .with_ansi(config.enable_colors),
            )
            .try_init(),
    };

    if let Err(e) = result {
        tracing::debug!("Subscriber already installed: {}", e);
    }
    Ok(())
}
