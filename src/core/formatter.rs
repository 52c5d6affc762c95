//! Record formatters
//!
//! Every output binding renders records with its own formatter:
//! - [`LineFormatter`]: `2025-01-08 10:30:45.123 (namespace) [INFO]: message`
//! - [`StructuredFormatter`]: `{"severity":"INFO","time":1736332245123000000,"context":"namespace","message":"message"}`

use super::ansi;
use super::log_record::LogRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

/// Layout of the line prefix timestamp (UTC, milliseconds truncated).
pub const TIMESTAMP_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Render a timestamp the way line output shows it.
///
/// ```
/// use chrono::DateTime;
/// use fanlog::core::formatter::format_timestamp;
///
/// let ts = DateTime::from_timestamp_nanos(1_612_345_678_901_999_999);
/// assert_eq!(format_timestamp(&ts), "2021-02-03 09:47:58.901");
/// ```
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_LAYOUT).to_string()
}

pub trait Formatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> String;

    /// Start the next output with a blank line.
    fn new_line(&self) {}

    /// Render the next output as the bare message.
    fn no_date_next_line(&self) {}

    fn name(&self) -> &str;
}

/// Human readable single-line output with optional colour expansion.
#[derive(Debug)]
pub struct LineFormatter {
    colors: bool,
    trailing_newline: bool,
    skip_prefix: AtomicBool,
    leading_newline: AtomicBool,
}

impl LineFormatter {
    pub fn new(colors: bool, trailing_newline: bool) -> Self {
        Self {
            colors,
            trailing_newline,
            skip_prefix: AtomicBool::new(false),
            leading_newline: AtomicBool::new(false),
        }
    }

    pub fn colors(&self) -> bool {
        self.colors
    }

    pub fn trailing_newline(&self) -> bool {
        self.trailing_newline
    }

    fn render(&self, record: &LogRecord) -> String {
        if self.skip_prefix.swap(false, Ordering::AcqRel) {
            return format!("{}\n", record.message);
        }

        let mut line = format!(
            "{} ({}) [{}]: {}",
            format_timestamp(&record.timestamp),
            record.namespace,
            record.level,
            record.message
        );
        if self.trailing_newline {
            line.push('\n');
        }
        line
    }
}

impl Default for LineFormatter {
    fn default() -> Self {
        Self::new(false, true)
    }
}

impl Formatter for LineFormatter {
    fn format(&self, record: &LogRecord) -> String {
        let mut line = self.render(record);

        if !self.colors {
            return match ansi::strip(&line) {
                (stripped, true) => stripped.into_owned(),
                (_, false) => line,
            };
        }

        // The blank-line request only applies to screen (colour) outputs.
        if self.leading_newline.swap(false, Ordering::AcqRel) {
            line.insert(0, '\n');
        }
        match ansi::expand(&line) {
            (expanded, true) => {
                let mut expanded = expanded.into_owned();
                let at = if expanded.ends_with('\n') {
                    expanded.len() - 1
                } else {
                    expanded.len()
                };
                expanded.insert_str(at, ansi::RESET);
                expanded
            }
            (_, false) => line,
        }
    }

    fn new_line(&self) {
        self.leading_newline.store(true, Ordering::Release);
    }

    fn no_date_next_line(&self) {
        self.skip_prefix.store(true, Ordering::Release);
    }

    fn name(&self) -> &str {
        "line"
    }
}

#[derive(Serialize)]
struct StructuredRecord<'a> {
    severity: &'static str,
    time: i64,
    context: &'a str,
    message: &'a str,
}

/// Compact JSON document per record.
#[derive(Debug, Clone, Default)]
pub struct StructuredFormatter {
    trailing_newline: bool,
}

impl StructuredFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Terminate each document with `\n` (JSON lines).
    #[must_use]
    pub fn with_trailing_newline(mut self, enabled: bool) -> Self {
        self.trailing_newline = enabled;
        self
    }
}

impl Formatter for StructuredFormatter {
    fn format(&self, record: &LogRecord) -> String {
        let document = StructuredRecord {
            severity: record.level.to_str(),
            time: record.unix_nanos(),
            context: &record.namespace,
            message: &record.message,
        };
        // Serializing plain strings and integers cannot fail.
        let mut json = serde_json::to_string(&document).unwrap_or_default();
        if self.trailing_newline {
            json.push('\n');
        }
        json
    }

    fn name(&self) -> &str {
        "structured"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;

    fn record(message: &str) -> LogRecord {
        LogRecord::new(
            LogLevel::Info,
            "app",
            message,
            DateTime::from_timestamp_nanos(1_612_345_678_901_234_567),
        )
    }

    #[test]
    fn test_structured_format() {
        let f = StructuredFormatter::new();
        let expected = r#"{"severity":"INFO","time":1612345678901234567,"context":"app","message":"This is a log message"}"#;
        assert_eq!(f.format(&record("This is a log message")), expected);
    }

    #[test]
    fn test_structured_ignores_one_shot_flags() {
        let f = StructuredFormatter::new().with_trailing_newline(true);
        f.new_line();
        f.no_date_next_line();
        let out = f.format(&record("x"));
        assert!(out.starts_with("{\"severity\""));
        assert!(out.ends_with("}\n"));
    }

    #[test]
    fn test_line_format_without_trailing_newline() {
        let f = LineFormatter::new(false, false);
        assert_eq!(
            f.format(&record("This is a log message")),
            "2021-02-03 09:47:58.901 (app) [INFO]: This is a log message"
        );
    }

    #[test]
    fn test_no_date_next_line_is_one_shot() {
        let f = LineFormatter::new(false, false);
        f.no_date_next_line();
        assert_eq!(f.format(&record("bare")), "bare\n");
        assert_eq!(
            f.format(&record("full")),
            "2021-02-03 09:47:58.901 (app) [INFO]: full"
        );
    }

    #[test]
    fn test_new_line_ignored_without_colors() {
        let f = LineFormatter::new(false, true);
        f.new_line();
        assert_eq!(
            f.format(&record("This is a log message")),
            "2021-02-03 09:47:58.901 (app) [INFO]: This is a log message\n"
        );
    }

    #[test]
    fn test_new_line_with_colors_is_one_shot() {
        let f = LineFormatter::new(true, true);
        f.new_line();
        assert!(f.format(&record("first")).starts_with("\n2021-02-03"));
        assert!(f.format(&record("second")).starts_with("2021-02-03"));
    }

    #[test]
    fn test_color_expansion_appends_reset() {
        let f = LineFormatter::new(true, true);
        let out = f.format(&record("{red}down{reset}"));
        assert_eq!(
            out,
            "2021-02-03 09:47:58.901 (app) [INFO]: \x1b[31mdown\x1b[0m\x1b[0m\n"
        );
    }

    #[test]
    fn test_color_tokens_stripped_without_colors() {
        let f = LineFormatter::new(false, true);
        assert_eq!(
            f.format(&record("{green}up{reset} {custom}")),
            "2021-02-03 09:47:58.901 (app) [INFO]: up {custom}\n"
        );
    }

    #[test]
    fn test_timestamp_truncates_millis() {
        let ts = DateTime::from_timestamp_nanos(1_601_406_307_123_999_999);
        assert_eq!(format_timestamp(&ts), "2020-09-29 19:05:07.123");
    }
}
