//! # fanlog
//!
//! Asynchronous logging that fans each record out to several outputs.
//!
//! ## Features
//!
//! - **Non-blocking callers**: records go through a bounded queue to one dispatcher thread
//! - **Per-output routing**: every output has its own namespace filter, level and formatter
//! - **Filter combinators**: exact, glob and regex namespace patterns joined with `and`/`or`/`not`
//! - **Outputs**: console, daily rotating files with repeat collapsing, NATS subjects, JSON lines
//!
//! ```
//! use fanlog::prelude::*;
//! use std::sync::Arc;
//!
//! let console = Arc::new(BufferWriter::new());
//! let logger = Logger::builder()
//!     .console_writer(console.clone())
//!     .console_colors(false)
//!     .build();
//!
//! info!(logger, "http", "listening on port {}", 8080);
//! logger.flush();
//! assert!(console.contents().contains("(http) [INFO]: listening on port 8080"));
//! ```

pub mod config;
pub mod core;
pub mod global;
pub mod macros;
pub mod registry;
pub mod writers;

pub mod prelude {
    pub use crate::config::{LoggingConfig, OutputConfig};
    pub use crate::core::{
        CancelSource, CancelToken, Clock, Filter, Formatter, LineFormatter, LogLevel, LogRecord,
        LogWriter, LoggedError, Logger, LoggerBuilder, LoggerError, LoggerMetrics, LoggerState,
        ManualClock, OutputBinding, OverflowPolicy, Result, StructuredFormatter,
        DEFAULT_SHUTDOWN_TIMEOUT,
    };
    pub use crate::registry::OutputRegistry;
    pub use crate::writers::{BufferWriter, ConsoleWriter, DailyFileWriter};
    pub use crate::{debug, error, fatal, info, log, warn};
}

pub use crate::core::{
    CancelSource, CancelToken, Clock, FatalHandler, Filter, FilterSpec, Formatter, LineFormatter,
    LogLevel, LogRecord, LogWriter, LoggedError, Logger, LoggerBuilder, LoggerError,
    LoggerMetrics, LoggerState, ManualClock, OutputBinding, OverflowPolicy, Result,
    StructuredFormatter, SystemClock, DEFAULT_QUEUE_CAPACITY, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use crate::registry::OutputRegistry;
