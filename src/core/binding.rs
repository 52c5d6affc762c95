//! Output bindings: which records go where, and how they look.

use super::filter::Filter;
use super::formatter::{Formatter, LineFormatter};
use super::log_level::LogLevel;
use super::log_record::LogRecord;
use super::writer::LogWriter;
use std::fmt;
use std::sync::Arc;

/// A filter, a minimum level, a formatter and a writer.
///
/// The formatter is owned by the binding, so one-shot formatter flags never leak
/// between outputs.
#[derive(Clone)]
pub struct OutputBinding {
    pub filter: Filter,
    pub min_level: LogLevel,
    pub formatter: Arc<dyn Formatter>,
    pub writer: Arc<dyn LogWriter>,
}

impl OutputBinding {
    pub fn new(
        filter: Filter,
        min_level: LogLevel,
        formatter: Arc<dyn Formatter>,
        writer: Arc<dyn LogWriter>,
    ) -> Self {
        Self {
            filter,
            min_level,
            formatter,
            writer,
        }
    }

    /// Binding with a [`LineFormatter`].
    pub fn line(
        filter: Filter,
        min_level: LogLevel,
        writer: Arc<dyn LogWriter>,
        colors: bool,
        trailing_newline: bool,
    ) -> Self {
        Self::new(
            filter,
            min_level,
            Arc::new(LineFormatter::new(colors, trailing_newline)),
            writer,
        )
    }

    /// Whether a record should be written to this output.
    pub fn accepts(&self, record: &LogRecord) -> bool {
        self.filter.matches(&record.namespace) && record.level >= self.min_level
    }

    /// Format a record for this output.
    pub fn render(&self, record: &LogRecord) -> String {
        self.formatter.format(record)
    }
}

impl fmt::Debug for OutputBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputBinding")
            .field("filter", &self.filter)
            .field("min_level", &self.min_level)
            .field("formatter", &self.formatter.name())
            .field("writer", &self.writer.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writers::BufferWriter;
    use chrono::Utc;

    #[test]
    fn test_accepts_checks_filter_and_level() {
        let binding = OutputBinding::line(
            Filter::exact("db"),
            LogLevel::Warn,
            Arc::new(BufferWriter::new()),
            false,
            true,
        );

        let now = Utc::now();
        assert!(binding.accepts(&LogRecord::new(LogLevel::Error, "db", "x", now)));
        assert!(binding.accepts(&LogRecord::new(LogLevel::Warn, "db", "x", now)));
        assert!(!binding.accepts(&LogRecord::new(LogLevel::Info, "db", "x", now)));
        assert!(!binding.accepts(&LogRecord::new(LogLevel::Fatal, "web", "x", now)));
    }

    #[test]
    fn test_debug_names_parts() {
        let binding = OutputBinding::line(
            Filter::match_all(),
            LogLevel::Debug,
            Arc::new(BufferWriter::new()),
            false,
            true,
        );
        let text = format!("{:?}", binding);
        assert!(text.contains("line"));
        assert!(text.contains("buffer"));
    }
}
