// Structured Logging Configuration
// "Every debt the bank collects must be recorded"

use serde::{Deserialize, Serialize};
use std::io;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

use crate::error::{IronBankError, IronBankResult};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty, compact)
    pub format: String,
    pub include_targets: bool,
    pub include_thread_ids: bool,
    pub include_file_line: bool,
    pub enable_colors: bool,
    /// Append to this file instead of stdout
    pub file_path: Option<String>,
    /// Full `EnvFilter` directive, overrides `level`
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            include_targets: false,
            include_thread_ids: false,
            include_file_line: false,
            enable_colors: true,
            file_path: None,
            env_filter: None,
        }
    }
}

/// Logging format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = IronBankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(crate::iron_bank_error!(
                configuration,
                format!("Invalid log format: {s}. Valid options: json, pretty, compact")
            )),
        }
    }
}

impl LoggingConfig {
    fn filter(&self) -> IronBankResult<EnvFilter> {
        if let Some(ref filter) = self.env_filter {
            return EnvFilter::try_new(filter).map_err(|e| {
                crate::iron_bank_error!(configuration, format!("Invalid env filter: {e}"))
            });
        }

        let level = self.level.parse::<Level>().map_err(|_| {
            crate::iron_bank_error!(configuration, format!("Invalid log level: {}", self.level))
        })?;

        let directive = format!("iron_bank={level}").parse().map_err(|e| {
            crate::iron_bank_error!(configuration, format!("Invalid log directive: {e}"))
        })?;

        Ok(EnvFilter::from_default_env().add_directive(directive))
    }

    fn writer(&self) -> IronBankResult<BoxMakeWriter> {
        match self.file_path {
            Some(ref file_path) => {
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(file_path)
                    .map_err(|e| {
                        crate::iron_bank_error!(
                            configuration,
                            format!("Failed to open log file {file_path}: {e}")
                        )
                    })?;
                Ok(BoxMakeWriter::new(Mutex::new(file)))
            }
            None => Ok(BoxMakeWriter::new(io::stdout)),
        }
    }
}

/// Install the global tracing subscriber
pub fn init_logging(config: &LoggingConfig) -> IronBankResult<()> {
    let format = config.format.parse::<LogFormat>()?;
    let env_filter = config.filter()?;
    let writer = config.writer()?;
    let ansi = config.enable_colors && config.file_path.is_none();

    let subscriber = Registry::default().with(env_filter);

    let result = match format {
        LogFormat::Json => subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_target(config.include_targets)
                    .with_thread_ids(config.include_thread_ids)
                    .with_file(config.include_file_line)
                    .with_line_number(config.include_file_line)
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Pretty => subscriber
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(config.include_targets)
                    .with_thread_ids(config.include_thread_ids)
                    .with_file(config.include_file_line)
                    .with_line_number(config.include_file_line)
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Compact => subscriber
            .with(
                fmt::layer()
                    .compact()
                    .with_target(config.include_targets)
                    .with_thread_ids(config.include_thread_ids)
                    .with_file(config.include_file_line)
                    .with_line_number(config.include_file_line)
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .try_init(),
    };

    result.map_err(|e| {
        crate::iron_bank_error!(configuration, format!("Failed to install subscriber: {e}"))
    })?;

    tracing::info!(
        "⚬ Logging initialized with level: {}, format: {}",
        config.level,
        config.format
    );

    Ok(())
}

/// Log an error at its own severity with the operation it interrupted
pub fn log_error_with_context(error: &IronBankError, context: &str) {
    let level = error.severity();
    if level == Level::ERROR {
        tracing::error!(error = %error, context, category = error.category(), retryable = error.is_retryable(), "Operation failed with error");
    } else if level == Level::WARN {
        tracing::warn!(error = %error, context, category = error.category(), retryable = error.is_retryable(), "Operation failed with error");
    } else if level == Level::INFO {
        tracing::info!(error = %error, context, category = error.category(), retryable = error.is_retryable(), "Operation failed with error");
    } else {
        tracing::debug!(error = %error, context, category = error.category(), retryable = error.is_retryable(), "Operation failed with error");
    }
}
