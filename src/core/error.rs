//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Filter pattern that cannot be compiled
    #[error("Invalid filter '{pattern}': {message}")]
    InvalidFilter { pattern: String, message: String },

    /// Numeric level outside the five defined levels
    #[error("Unknown log level: {0}")]
    InvalidLevel(u8),

    /// Output type with no registered factory
    #[error("Unknown log output type: '{0}'")]
    UnknownOutput(String),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// File writer error with path
    #[error("File writer error for '{path}': {message}")]
    FileWriterError { path: String, message: String },

    /// Message bus connection failure
    #[error("Connection to '{address}' failed: {message}")]
    Connection { address: String, message: String },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// An error-level record that aborted the current operation
    #[error(transparent)]
    Logged(#[from] LoggedError),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid filter error
    pub fn invalid_filter(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidFilter {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a file writer error
    pub fn file_writer(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileWriterError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a connection error
    pub fn connection(address: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Connection {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }
}

/// Returned by [`Logger::error`](crate::Logger::error) after the record has been queued.
///
/// Logging at error level aborts the caller's current operation: the value is
/// `#[must_use]` and the [`error!`](crate::error) macro returns it from the
/// enclosing function. Process termination is reserved for fatal records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
#[must_use = "an error-level log aborts the current operation; return or handle it"]
pub struct LoggedError {
    pub namespace: String,
    pub message: String,
}

impl LoggedError {
    pub fn new(namespace: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            message: message.into(),
        }
    }
}
