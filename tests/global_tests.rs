//! Process-wide logger tests
//!
//! The global logger is shared by every test in this binary, so the steps run
//! sequentially inside one test.

use fanlog::config::{LoggingConfig, OutputConfig};
use fanlog::global;
use fanlog::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn shutdown_global() {
    if let Some(logger) = global::take() {
        assert!(logger.shutdown(Duration::from_secs(2)));
    }
}

#[test]
fn test_global_logger_lifecycle() {
    assert!(global::get_existing().is_none());

    // Concurrent first callers build exactly one logger.
    const CALLERS: usize = 8;
    let builds = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(CALLERS));
    let callers: Vec<_> = (0..CALLERS)
        .map(|_| {
            let builds = Arc::clone(&builds);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                global::get_or_create_with(|| {
                    builds.fetch_add(1, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                    Logger::builder().without_console().build()
                })
            })
        })
        .collect();
    let loggers: Vec<Arc<Logger>> = callers
        .into_iter()
        .map(|caller| caller.join().expect("caller panicked"))
        .collect();
    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(loggers.iter().all(|logger| Arc::ptr_eq(logger, &loggers[0])));
    drop(loggers);
    shutdown_global();
    assert!(global::get_existing().is_none());

    // First caller wins; later arguments are ignored.
    let console = Arc::new(BufferWriter::new());
    let first = global::get_or_create_with(|| {
        Logger::builder()
            .console_writer(console.clone())
            .console_colors(false)
            .base_level(LogLevel::Warn)
            .build()
    });
    let second = global::get_or_create(CancelToken::never(), LogLevel::Debug, Some(Filter::match_all()));
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &global::get_existing().unwrap()));

    second.info("app", "below console level");
    second.warn("app", "visible");
    second.flush();
    assert_eq!(console.lines().len(), 1);

    // Installing over an existing logger keeps the existing one and warns on it.
    let other = Arc::new(Logger::builder().without_console().build());
    let kept = global::set(Arc::clone(&other));
    assert!(Arc::ptr_eq(&kept, &first));
    kept.flush();
    assert!(console.contents().contains("(*) [WARN]: Unable to set global logger"));

    drop((first, second, kept));
    shutdown_global();
    assert!(global::get_existing().is_none());

    // Once empty, `set` installs the given logger.
    let installed = global::set(Arc::clone(&other));
    assert!(Arc::ptr_eq(&installed, &other));
    drop(installed);
    shutdown_global();

    // A failing configuration installs nothing.
    let mut bad = LoggingConfig::default();
    bad.outputs.insert("syslog".to_string(), OutputConfig::default());
    let result = global::get_or_try_create_from_config(
        CancelToken::never(),
        &bad,
        &OutputRegistry::new(),
    );
    assert!(matches!(result, Err(LoggerError::UnknownOutput(_))));
    assert!(global::get_existing().is_none());

    // A valid configuration builds the console plus every configured output.
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = LoggingConfig {
        loglevel: Some("error".to_string()),
        ..Default::default()
    };
    config.outputs.insert(
        "file".to_string(),
        OutputConfig {
            path: Some(temp_dir.path().to_string_lossy().into_owned()),
            ..Default::default()
        },
    );
    let logger = global::get_or_try_create_from_config(
        CancelToken::never(),
        &config,
        &OutputRegistry::new(),
    )
    .expect("Failed to create global logger");
    assert_eq!(logger.output_count(), 2);

    logger.debug("worker", "to the file only");
    drop(logger);
    shutdown_global();

    let files: Vec<_> = std::fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1);
    let content = std::fs::read_to_string(&files[0]).unwrap();
    assert!(content.contains("(*) [INFO]: Creating global context with default logger level ERROR and namespace *"));
    assert!(content.contains("(worker) [DEBUG]: to the file only"));
}
