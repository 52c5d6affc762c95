//! Logging macros for ergonomic log message formatting.
//!
//! Every macro takes the logger, the namespace, then `format!` arguments.
//!
//! # Examples
//!
//! ```
//! use fanlog::prelude::*;
//!
//! let logger = Logger::builder().without_console().build();
//!
//! info!(logger, "http", "Server started");
//!
//! let port = 8080;
//! info!(logger, "http", "Server listening on port {}", port);
//! ```

/// Log a message at a given level.
///
/// Evaluates to whether the record was queued.
///
/// # Examples
///
/// ```
/// # use fanlog::prelude::*;
/// # let logger = Logger::builder().without_console().build();
/// use fanlog::log;
/// log!(logger, LogLevel::Info, "app", "Simple message");
/// log!(logger, LogLevel::Warn, "app", "Status code: {}", 503);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $namespace:expr, $($arg:tt)+) => {
        $logger.log($level, $namespace, format!($($arg)+))
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use fanlog::prelude::*;
/// # let logger = Logger::builder().without_console().build();
/// use fanlog::debug;
/// debug!(logger, "cache", "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $namespace:expr, $($arg:tt)+) => {
        $logger.debug($namespace, format!($($arg)+))
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $namespace:expr, $($arg:tt)+) => {
        $logger.info($namespace, format!($($arg)+))
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $namespace:expr, $($arg:tt)+) => {
        $logger.warn($namespace, format!($($arg)+))
    };
}

/// Log an error-level message and return it as an error from the enclosing function.
///
/// The function's error type must implement `From<LoggedError>`.
///
/// # Examples
///
/// ```
/// use fanlog::prelude::*;
///
/// fn open(logger: &Logger, path: &str) -> Result<()> {
///     if path.is_empty() {
///         error!(logger, "storage", "cannot open '{}'", path);
///     }
///     Ok(())
/// }
///
/// let logger = Logger::builder().without_console().build();
/// let err = open(&logger, "").unwrap_err();
/// assert_eq!(err.to_string(), "cannot open ''");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $namespace:expr, $($arg:tt)+) => {
        return ::core::result::Result::Err(
            ::core::convert::From::from($logger.error($namespace, format!($($arg)+)))
        )
    };
}

/// Log a fatal-level message. The process ends once it has been written.
///
/// # Examples
///
/// ```no_run
/// # use fanlog::prelude::*;
/// # let logger = Logger::builder().build();
/// use fanlog::fatal;
/// fatal!(logger, "main", "Unable to recover from error: {}", "disk full");
/// ```
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $namespace:expr, $($arg:tt)+) => {
        $logger.fatal($namespace, format!($($arg)+))
    };
}
