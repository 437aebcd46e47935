//! Error types for HealthMetrix
//!
//! Two layers:
//! - [`MetricError`]: why a single metric query produced no value. These
//!   never escape the reporter; they are rendered into the report.
//! - [`Error`]: start-up failures (configuration, log file, output) that
//!   end the process with a numeric exit code.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for application operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for a single metric query
pub type MetricResult<T> = std::result::Result<T, MetricError>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,

    // Metric errors (3xx)
    MetricUnsupported = 300,
    MetricProvider = 301,
    MetricNotFound = 302,

    // Logging errors (4xx)
    LogFile = 401,

    // Serialization errors (9xx)
    Serialization = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10,
            200..=299 => 20,
            300..=399 => 30,
            400..=499 => 40,
            900..=999 => 90,
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────
// Metric Errors
// ─────────────────────────────────────────────────────────────────

/// Why a metric query produced no value
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum MetricError {
    /// The platform has no way to provide this metric
    #[error("{0}")]
    Unsupported(String),

    /// The underlying library or system call failed
    #[error("{0}")]
    Provider(String),

    /// The query worked but there is nothing to report (e.g. no GPU)
    #[error("{0}")]
    NotFound(String),
}

impl MetricError {
    pub fn unsupported(message: impl Into<String>) -> Self {
        MetricError::Unsupported(message.into())
    }

    pub fn provider(message: impl Into<String>) -> Self {
        MetricError::Provider(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        MetricError::NotFound(message.into())
    }

    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            MetricError::Unsupported(_) => ErrorCode::MetricUnsupported,
            MetricError::Provider(_) => ErrorCode::MetricProvider,
            MetricError::NotFound(_) => ErrorCode::MetricNotFound,
        }
    }
}

impl From<std::io::Error> for MetricError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => MetricError::Unsupported(e.to_string()),
            _ => MetricError::Provider(e.to_string()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Application Errors
// ─────────────────────────────────────────────────────────────────

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse error
    #[error("Failed to parse configuration {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Log file could not be opened
    #[error("Failed to open log file {path}: {message}")]
    LogFile { path: PathBuf, message: String },

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },

            Error::LogFile { .. } => ErrorCode::LogFile,

            Error::Toml(_) | Error::Json(_) => ErrorCode::Serialization,
        }
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Run 'healthmetrix config init' to create a default configuration file."
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'healthmetrix config validate' to see details."
            ),
            Error::ConfigValidation { .. } => Some(
                "Review the configuration file and fix the invalid values."
            ),
            Error::LogFile { .. } => Some(
                "Check that the log directory is writable, or pass --log-file with another path."
            ),
            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let mut output = format!("\x1b[31mError [{}]\x1b[0m: {}\n", self.code().as_str(), self);

        if let Some(hint) = self.suggestion() {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        format!("[{}] {}", self.code().as_str(), self)
    }
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Error::ConfigNotFound { path: path.into() }
    }

    /// Create a config validation error with field name
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}
