//! Core logger types and traits

pub mod ansi;
pub mod binding;
pub mod cancel;
pub mod clock;
pub mod error;
pub mod filter;
pub mod formatter;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod overflow_policy;
pub mod writer;

pub use binding::OutputBinding;
pub use cancel::{CancelSource, CancelToken};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{LoggedError, LoggerError, Result};
pub use filter::{Filter, FilterSpec};
pub use formatter::{Formatter, LineFormatter, StructuredFormatter};
pub use log_level::LogLevel;
pub use log_record::LogRecord;
pub use logger::{
    FatalHandler, Logger, LoggerBuilder, LoggerState, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use metrics::LoggerMetrics;
pub use overflow_policy::OverflowPolicy;
pub use writer::LogWriter;
