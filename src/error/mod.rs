//! Error handling for the diagnostic orchestrator

use thiserror::Error;

/// Custom error types for the diagnostic orchestrator
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid diagnostic request, caught before any I/O
    #[error("Validation error: {0}")]
    Validation(String),

    /// Geolocation lookup failures (network, provider error, bad payload)
    #[error("Geolocation lookup failed: {0}")]
    Lookup(String),

    /// Bandwidth measurement failures
    #[error("Bandwidth probe failed: {0}")]
    Probe(String),

    /// Network connectivity errors
    #[error("Network error: {0}")]
    Network(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Parsing errors (URLs, JSON, addresses)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new geolocation lookup error
    pub fn lookup<S: Into<String>>(message: S) -> Self {
        Self::Lookup(message.into())
    }

    /// Create a new bandwidth probe error
    pub fn probe<S: Into<String>>(message: S) -> Self {
        Self::Probe(message.into())
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Validation(_) => "VALIDATION",
            Self::Lookup(_) => "LOOKUP",
            Self::Probe(_) => "PROBE",
            Self::Network(_) => "NETWORK",
            Self::Timeout(_) => "TIMEOUT",
            Self::Parse(_) => "PARSE",
            Self::Io(_) => "IO",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Check if error is recoverable (can retry)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::Lookup(_) | Self::Probe(_) => true,
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => false,
            Self::Io(_) | Self::Internal(_) => false,
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => 1, // Invalid configuration/usage
            Self::Network(_) | Self::Lookup(_) | Self::Probe(_) => 2,    // Network issues
            Self::Timeout(_) => 3,                                       // Timeout issues
            Self::Io(_) => 5,                                            // I/O issues
            Self::Internal(_) => 99,                                     // Internal/unexpected errors
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Network(_) | Self::Lookup(_) | Self::Probe(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Timeout(_) => {
                    format!("[{}] {}", category.blue().bold(), message.blue())
                }
                Self::Io(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(error.to_string())
        } else if error.is_connect() || error.is_request() {
            Self::network(error.to_string())
        } else {
            Self::network(format!("HTTP error: {}", error))
        }
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::net::AddrParseError> for AppError {
    fn from(error: std::net::AddrParseError) -> Self {
        Self::parse(format!("IP address parse error: {}", error))
    }
}

// Anyhow integration
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(error.to_string())
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;
