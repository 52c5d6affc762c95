//! Process-wide logger
//!
//! The first caller to ask for the global logger constructs it; every later
//! caller receives the same instance, whatever arguments it passes.

use crate::config::LoggingConfig;
use crate::core::{CancelToken, Filter, LogLevel, Logger, Result};
use crate::registry::{OutputRegistry, LOGGER_NAMESPACE};
use parking_lot::{const_mutex, Mutex};
use std::sync::Arc;

static GLOBAL_LOGGER: Mutex<Option<Arc<Logger>>> = const_mutex(None);

/// The global logger, created with a stdout console output if there is none yet.
pub fn get_or_create(
    token: CancelToken,
    base_level: LogLevel,
    console_filter: Option<Filter>,
) -> Arc<Logger> {
    get_or_create_with(|| Logger::new(token, base_level, console_filter))
}

/// The global logger, created by `build` if there is none yet.
pub fn get_or_create_with<F>(build: F) -> Arc<Logger>
where
    F: FnOnce() -> Logger,
{
    let mut global = GLOBAL_LOGGER.lock();
    Arc::clone(global.get_or_insert_with(|| Arc::new(build())))
}

pub fn get_existing() -> Option<Arc<Logger>> {
    GLOBAL_LOGGER.lock().clone()
}

/// The global logger, created from configuration if there is none yet.
///
/// The console output uses the configured level and include/exclude patterns
/// (default: every namespace not starting with `_`); every entry of
/// `config.outputs` is built through `registry`. An existing logger is
/// returned unchanged.
///
/// # Errors
///
/// Returns error if a pattern does not compile or an output cannot be built;
/// no global logger is installed in that case.
pub fn get_or_try_create_from_config(
    token: CancelToken,
    config: &LoggingConfig,
    registry: &OutputRegistry,
) -> Result<Arc<Logger>> {
    let mut global = GLOBAL_LOGGER.lock();
    if let Some(existing) = global.as_ref() {
        return Ok(Arc::clone(existing));
    }

    let level = config.level();
    let console_filter = config.console_filter(Filter::underscore())?;
    let logger = Logger::new(token, level, Some(console_filter));
    registry.install(&logger, &config.outputs)?;
    logger.info(
        LOGGER_NAMESPACE,
        format!(
            "Creating global context with default logger level {} and namespace {}",
            level, LOGGER_NAMESPACE
        ),
    );

    let logger = Arc::new(logger);
    *global = Some(Arc::clone(&logger));
    Ok(logger)
}

/// Install `logger` unless one is already set. Returns the global logger either way.
pub fn set(logger: Arc<Logger>) -> Arc<Logger> {
    let mut global = GLOBAL_LOGGER.lock();
    match global.as_ref() {
        Some(existing) => {
            existing.warn(LOGGER_NAMESPACE, "Unable to set global logger");
            Arc::clone(existing)
        }
        None => {
            *global = Some(Arc::clone(&logger));
            logger
        }
    }
}

/// Remove the global logger, typically to shut it down at exit.
pub fn take() -> Option<Arc<Logger>> {
    GLOBAL_LOGGER.lock().take()
}
