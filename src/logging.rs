//! Structured logging for diagnostic runs
//!
//! Console logging with levels, per-component context and run correlation
//! IDs, so every probe event can be tied back to the report it belongs to.

use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Debug level - detailed information for debugging
    Debug = 0,
    /// Info level - general application information
    Info = 1,
    /// Warning level - potentially harmful situations
    Warn = 2,
    /// Error level - error events but application can continue
    Error = 3,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Get ANSI color code for console output
    fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Debug => "\x1b[36m", // Cyan
            LogLevel::Info => "\x1b[32m",  // Green
            LogLevel::Warn => "\x1b[33m",  // Yellow
            LogLevel::Error => "\x1b[31m", // Red
        }
    }

    fn reset_code() -> &'static str {
        "\x1b[0m"
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(AppError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// A single structured log event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Timestamp when log entry was created
    pub timestamp: DateTime<Utc>,
    /// Log level
    pub level: LogLevel,
    /// Component that emitted the entry
    pub component: String,
    /// Correlation ID tying the entry to a diagnostic run
    pub correlation_id: Option<String>,
    /// Log message
    pub message: String,
}

impl LogEntry {
    fn new(level: LogLevel, component: &str, correlation_id: Option<&str>, message: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            component: component.to_string(),
            correlation_id: correlation_id.map(str::to_string),
            message: message.to_string(),
        }
    }

    /// Format the entry for console output
    fn format(&self, use_color: bool) -> String {
        let timestamp = self.timestamp.format("%H:%M:%S%.3f");
        let correlation = self
            .correlation_id
            .as_deref()
            .map(|id| format!(" [{}]", &id[..id.len().min(8)]))
            .unwrap_or_default();

        if use_color {
            format!(
                "{} {}{:5}{} {}{} {}",
                timestamp,
                self.level.color_code(),
                self.level.as_str(),
                LogLevel::reset_code(),
                self.component,
                correlation,
                self.message
            )
        } else {
            format!(
                "{} {:5} {}{} {}",
                timestamp,
                self.level.as_str(),
                self.component,
                correlation,
                self.message
            )
        }
    }
}

/// Console logger with a minimum level filter
#[derive(Debug, Clone)]
pub struct Logger {
    min_level: Option<LogLevel>,
    use_color: bool,
}

impl Logger {
    /// Create a logger emitting entries at or above `min_level`
    pub fn new(min_level: LogLevel, use_color: bool) -> Self {
        Self {
            min_level: Some(min_level),
            use_color,
        }
    }

    /// Create a logger that emits nothing
    pub fn disabled() -> Self {
        Self {
            min_level: None,
            use_color: false,
        }
    }

    /// Whether an entry at `level` would be emitted
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        match self.min_level {
            Some(min) => level >= min,
            None => false,
        }
    }

    fn log(&self, level: LogLevel, component: &str, correlation_id: Option<&str>, message: &str) {
        if !self.is_enabled(level) {
            return;
        }
        let entry = LogEntry::new(level, component, correlation_id, message);
        eprintln!("{}", entry.format(self.use_color));
    }

    pub fn debug(&self, component: &str, correlation_id: Option<&str>, message: &str) {
        self.log(LogLevel::Debug, component, correlation_id, message);
    }

    pub fn info(&self, component: &str, correlation_id: Option<&str>, message: &str) {
        self.log(LogLevel::Info, component, correlation_id, message);
    }

    pub fn warn(&self, component: &str, correlation_id: Option<&str>, message: &str) {
        self.log(LogLevel::Warn, component, correlation_id, message);
    }

    pub fn error(&self, component: &str, correlation_id: Option<&str>, message: &str) {
        self.log(LogLevel::Error, component, correlation_id, message);
    }
}
