//! Logger configuration values
//!
//! These structs hold configuration that has already been loaded by the
//! application; reading files or environment variables is up to the caller.
//! Field names match the keys applications conventionally use under a
//! `logger` section:
//!
//! ```
//! use fanlog::config::LoggingConfig;
//!
//! let config: LoggingConfig = serde_json::from_str(r#"{
//!     "loglevel": "info",
//!     "exclude": "noisy*",
//!     "outputs": {
//!         "file": { "path": "/var/log/app", "filePrefix": "app-", "skipRepeating": false }
//!     }
//! }"#).unwrap();
//!
//! assert_eq!(config.outputs["file"].file_prefix.as_deref(), Some("app-"));
//! ```

use crate::core::filter::{filter_or_default, Filter};
use crate::core::{LogLevel, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level logger settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Console level name; unrecognized names mean debug
    pub loglevel: Option<String>,
    /// Console include pattern
    pub filter: Option<String>,
    /// Console exclude pattern
    pub exclude: Option<String>,
    /// Extra outputs keyed by output type name
    pub outputs: BTreeMap<String, OutputConfig>,
}

impl LoggingConfig {
    pub fn level(&self) -> LogLevel {
        parse_level(self.loglevel.as_deref(), LogLevel::Debug)
    }

    /// Console filter, falling back to `default` when no include pattern is set.
    pub fn console_filter(&self, default: Filter) -> Result<Filter> {
        filter_from_config(self.filter.as_deref(), self.exclude.as_deref(), default)
    }
}

/// Settings for one extra output. Which keys apply depends on the output type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputConfig {
    pub filter: Option<String>,
    pub exclude: Option<String>,
    pub log_level: Option<String>,
    pub path: Option<String>,
    pub file_prefix: Option<String>,
    pub file_suffix: Option<String>,
    pub skip_repeating: Option<bool>,
    pub subject: Option<String>,
    pub url: Option<String>,
    pub ansicodes: Option<bool>,
}

impl OutputConfig {
    /// Minimum level, `default_name` being used when none is configured.
    pub fn level(&self, default_name: &str) -> LogLevel {
        let raw = self.log_level.as_deref().unwrap_or(default_name);
        LogLevel::parse_or(raw, LogLevel::Debug)
    }

    /// Output filter; without an include pattern every namespace is included.
    pub fn namespace_filter(&self) -> Result<Filter> {
        filter_from_config(
            self.filter.as_deref(),
            self.exclude.as_deref(),
            Filter::match_all(),
        )
    }
}

fn parse_level(raw: Option<&str>, default: LogLevel) -> LogLevel {
    raw.map_or(default, |raw| LogLevel::parse_or(raw, default))
}

/// Namespaces matching `include` (or `default` without one) and not matching `exclude`.
///
/// ```
/// use fanlog::config::filter_from_config;
/// use fanlog::Filter;
///
/// let filter = filter_from_config(Some("db*"), Some("db.audit"), Filter::match_all()).unwrap();
/// assert!(filter.matches("db.query"));
/// assert!(!filter.matches("db.audit"));
/// assert!(!filter.matches("web"));
/// ```
pub fn filter_from_config(
    include: Option<&str>,
    exclude: Option<&str>,
    default: Filter,
) -> Result<Filter> {
    let include = filter_or_default(include, default)?;
    let exclude = filter_or_default(exclude, Filter::match_none())?;
    Ok(include.and(exclude.not()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config: LoggingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LoggingConfig::default());
        assert_eq!(config.level(), LogLevel::Debug);

        let filter = config.console_filter(Filter::underscore()).unwrap();
        assert!(filter.matches("app"));
        assert!(!filter.matches("_hidden"));
    }

    #[test]
    fn test_unknown_level_falls_back_to_debug() {
        let config = LoggingConfig {
            loglevel: Some("chatty".to_string()),
            ..Default::default()
        };
        assert_eq!(config.level(), LogLevel::Debug);

        let output = OutputConfig::default();
        assert_eq!(output.level("info"), LogLevel::Info);
        let output = OutputConfig {
            log_level: Some("WARN".to_string()),
            ..Default::default()
        };
        assert_eq!(output.level("info"), LogLevel::Warn);
    }

    #[test]
    fn test_output_keys_are_camel_case() {
        let output: OutputConfig = serde_json::from_str(
            r#"{"logLevel":"error","fileSuffix":".txt","skipRepeating":true,"ansicodes":true}"#,
        )
        .unwrap();
        assert_eq!(output.log_level.as_deref(), Some("error"));
        assert_eq!(output.file_suffix.as_deref(), Some(".txt"));
        assert_eq!(output.skip_repeating, Some(true));
        assert_eq!(output.ansicodes, Some(true));
    }

    #[test]
    fn test_exclude_only() {
        let output = OutputConfig {
            exclude: Some("_*".to_string()),
            ..Default::default()
        };
        let filter = output.namespace_filter().unwrap();
        assert!(filter.matches("app"));
        assert!(!filter.matches("_internal"));
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let output = OutputConfig {
            filter: Some("(unclosed".to_string()),
            ..Default::default()
        };
        assert!(output.namespace_filter().is_err());
    }
}
