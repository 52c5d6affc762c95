//! Output factories keyed by type name
//!
//! Configured outputs name their type (`file`, `nats`, `jsonstream`, ...). The
//! registry maps each lower-case name to a factory that turns an
//! [`OutputConfig`] into an [`OutputBinding`]. Applications can register their
//! own types next to the built-in ones.

use crate::config::OutputConfig;
use crate::core::formatter::StructuredFormatter;
use crate::core::{Logger, LoggerError, OutputBinding, Result};
use crate::writers::bus::{DEFAULT_SUBJECT, DEFAULT_URL};
use crate::writers::{BusWriter, ConsoleWriter, DailyFileWriter, NatsPublisher};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Namespace used for the logger's own messages.
pub const LOGGER_NAMESPACE: &str = "*";

pub const DEFAULT_FILE_PATH: &str = "/tmp/test_logs";
pub const DEFAULT_FILE_SUFFIX: &str = ".log";

pub type OutputFactory = Arc<dyn Fn(&OutputConfig) -> Result<OutputBinding> + Send + Sync>;

#[derive(Clone)]
pub struct OutputRegistry {
    factories: BTreeMap<String, OutputFactory>,
}

impl OutputRegistry {
    /// Registry with no output types.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry with the built-in `file`, `nats` and `jsonstream` types and their aliases.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for name in ["file", "filewriter"] {
            registry.register(name, file_output);
        }
        for name in ["nats", "natspublisher", "nats_publisher"] {
            registry.register(name, nats_output);
        }
        for name in ["jsonstream", "jsonout", "prod"] {
            registry.register(name, json_stream_output);
        }
        registry
    }

    /// Add or replace the factory for `name` (matched case-insensitively).
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&OutputConfig) -> Result<OutputBinding> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_lowercase(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_lowercase())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// # Errors
    ///
    /// Returns [`LoggerError::UnknownOutput`] for unregistered names, or the factory's error
    pub fn build(&self, name: &str, config: &OutputConfig) -> Result<OutputBinding> {
        let factory = self
            .factories
            .get(&name.to_lowercase())
            .ok_or_else(|| LoggerError::UnknownOutput(name.to_string()))?;
        factory(config)
    }

    /// Build every configured output and add them to `logger`.
    ///
    /// Nothing is added unless every output builds. Returns the number added.
    pub fn install(&self, logger: &Logger, outputs: &BTreeMap<String, OutputConfig>) -> Result<usize> {
        let bindings = outputs
            .iter()
            .map(|(name, config)| -> Result<_> { Ok((name, config, self.build(name, config)?)) })
            .collect::<Result<Vec<_>>>()?;

        let count = bindings.len();
        for (name, config, binding) in bindings {
            logger.info(
                LOGGER_NAMESPACE,
                format!(
                    "Adding log {} output; filter={} exclude={} level={}",
                    name.to_lowercase(),
                    config.filter.as_deref().unwrap_or(""),
                    config.exclude.as_deref().unwrap_or(""),
                    binding.min_level
                ),
            );
            logger.add_binding(binding);
        }
        Ok(count)
    }
}

impl Default for OutputRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OutputRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}

/// Daily file output: no colours, trailing newline, repeat collapsing on by default.
pub fn file_output(config: &OutputConfig) -> Result<OutputBinding> {
    let writer = DailyFileWriter::new(
        config.path.as_deref().unwrap_or(DEFAULT_FILE_PATH),
        config.file_prefix.as_deref().unwrap_or(""),
        config.file_suffix.as_deref().unwrap_or(DEFAULT_FILE_SUFFIX),
        config.skip_repeating.unwrap_or(true),
    )?;

    Ok(OutputBinding::line(
        config.namespace_filter()?,
        config.level("debug"),
        Arc::new(writer),
        false,
        true,
    ))
}

/// Message bus output: one message per record, no trailing newline.
pub fn nats_output(config: &OutputConfig) -> Result<OutputBinding> {
    let subject = config.subject.as_deref().unwrap_or(DEFAULT_SUBJECT);
    if subject.is_empty() {
        return Err(LoggerError::config("nats output", "empty publishing subject"));
    }
    let filter = config.namespace_filter()?;

    let publisher = NatsPublisher::connect(config.url.as_deref().unwrap_or(DEFAULT_URL))?;
    let writer = BusWriter::new(subject, Arc::new(publisher))?;

    Ok(OutputBinding::line(
        filter,
        config.level("debug"),
        Arc::new(writer),
        config.ansicodes.unwrap_or(false),
        false,
    ))
}

/// JSON lines on stderr, info and above by default.
pub fn json_stream_output(config: &OutputConfig) -> Result<OutputBinding> {
    Ok(OutputBinding::new(
        config.namespace_filter()?,
        config.level("info"),
        Arc::new(StructuredFormatter::new().with_trailing_newline(true)),
        Arc::new(ConsoleWriter::stderr()),
    ))
}
