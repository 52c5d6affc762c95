//! Main logger implementation

use super::{
    binding::OutputBinding,
    cancel::CancelToken,
    clock::{system_clock, Clock},
    error::LoggedError,
    filter::Filter,
    formatter::Formatter,
    log_level::LogLevel,
    log_record::LogRecord,
    metrics::LoggerMetrics,
    overflow_policy::OverflowPolicy,
    writer::LogWriter,
};
use crate::writers::ConsoleWriter;
use crossbeam_channel::{bounded, Receiver, Select, SendTimeoutError, Sender, TryRecvError, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default shutdown timeout for logger cleanup (5 seconds)
///
/// Used when the logger is dropped without explicit shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Records that may wait in the queue before producers start blocking.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Longest single wait a producer makes while holding the sender.
const SEND_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Invoked once after a fatal record has been written and the queue drained.
pub type FatalHandler = Arc<dyn Fn() + Send + Sync>;

/// Lifecycle of a logger. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LoggerState {
    /// Accepting records
    Running = 0,
    /// Writing out what is queued, rejecting new records
    Draining = 1,
    /// Stopped
    Closed = 2,
}

impl LoggerState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => LoggerState::Running,
            1 => LoggerState::Draining,
            _ => LoggerState::Closed,
        }
    }
}

enum Drained {
    Empty,
    Disconnected,
    Fatal,
}

/// Failure accounting shared by the dispatcher and the output workers.
struct Health {
    metrics: LoggerMetrics,
    panic_reported: AtomicBool,
}

impl Health {
    fn new() -> Self {
        Self {
            metrics: LoggerMetrics::new(),
            panic_reported: AtomicBool::new(false),
        }
    }

    /// Evaluate a binding's filter and level. A panicking filter counts as a miss.
    fn accepts(&self, binding: &OutputBinding, record: &LogRecord) -> bool {
        match catch_unwind(AssertUnwindSafe(|| binding.accepts(record))) {
            Ok(accepted) => accepted,
            Err(panic_info) => {
                self.metrics.record_filter_panic();
                self.report_panic(binding.writer.name(), "filter", panic_info);
                false
            }
        }
    }

    /// Format and write one record to one output, isolating writer panics.
    fn write(&self, binding: &OutputBinding, record: &LogRecord) {
        let result = catch_unwind(AssertUnwindSafe(|| {
            let text = binding.render(record);
            binding.writer.write(text.as_bytes())
        }));

        match result {
            Ok(Ok(())) => {}
            Ok(Err(_)) => {
                self.metrics.record_write_failure();
            }
            Err(panic_info) => {
                self.metrics.record_writer_panic();
                self.report_panic(binding.writer.name(), "write", panic_info);
            }
        }
    }

    fn flush(&self, binding: &OutputBinding) {
        match catch_unwind(AssertUnwindSafe(|| binding.writer.flush())) {
            Ok(Ok(())) => {}
            Ok(Err(_)) => {
                self.metrics.record_write_failure();
            }
            Err(panic_info) => {
                self.metrics.record_writer_panic();
                self.report_panic(binding.writer.name(), "flush", panic_info);
            }
        }
    }

    fn report_panic(&self, output: &str, during: &str, panic_info: Box<dyn Any + Send>) {
        if self.panic_reported.swap(true, Ordering::AcqRel) {
            return;
        }
        let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!(
            "[LOGGER CRITICAL] Output '{}' panicked during {}: {}. \
             Other outputs continue to function.",
            output, during, panic_msg
        );
    }
}

/// One record for one output worker. Dropping it tells the dispatcher the write is done.
struct WriteJob {
    record: Arc<LogRecord>,
    _done: Sender<()>,
}

/// A binding and the worker thread that writes to it when a record matches several outputs.
struct Output {
    binding: Arc<OutputBinding>,
    worker: Mutex<Option<Sender<WriteJob>>>,
}

impl Output {
    fn new(binding: OutputBinding) -> Self {
        Self {
            binding: Arc::new(binding),
            worker: Mutex::new(None),
        }
    }

    /// Hand a job to this output's worker, starting the worker on first use.
    ///
    /// The job comes back if no worker can take it.
    fn submit(&self, health: &Arc<Health>, job: WriteJob) -> std::result::Result<(), WriteJob> {
        let mut worker = self.worker.lock();
        if worker.is_none() {
            let (sender, receiver) = bounded::<WriteJob>(1);
            let binding = Arc::clone(&self.binding);
            let health = Arc::clone(health);
            let spawned = thread::Builder::new()
                .name(format!("fanlog-output-{}", binding.writer.name()))
                .spawn(move || {
                    for job in receiver {
                        health.write(&binding, &job.record);
                    }
                });
            if spawned.is_err() {
                return Err(job);
            }
            *worker = Some(sender);
        }

        match worker.as_ref() {
            Some(sender) => sender.send(job).map_err(|e| e.into_inner()),
            None => Err(job),
        }
    }

    /// Let the worker thread exit once its queue is empty.
    fn stop(&self) {
        self.worker.lock().take();
    }
}

struct Shared {
    state: AtomicU8,
    sender: RwLock<Option<Sender<LogRecord>>>,
    receiver: Receiver<LogRecord>,
    outputs: RwLock<Vec<Arc<Output>>>,
    /// Held for every dequeue so records are written in queue order.
    dispatch_lock: Mutex<()>,
    health: Arc<Health>,
    clock: Arc<dyn Clock>,
    overflow_policy: OverflowPolicy,
    on_fatal: FatalHandler,
    fatal_fired: AtomicBool,
}

impl Shared {
    fn state(&self) -> LoggerState {
        LoggerState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn advance_state(&self, to: LoggerState) {
        let mut current = self.state.load(Ordering::Acquire);
        while current < to as u8 {
            match self.state.compare_exchange(
                current,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    /// Stop accepting records and close the queue. Safe to call repeatedly.
    fn begin_shutdown(&self) {
        self.advance_state(LoggerState::Draining);
        self.sender.write().take();
    }

    fn enqueue(&self, record: LogRecord) -> bool {
        if self.state() != LoggerState::Running {
            self.health.metrics.record_dropped();
            return false;
        }

        let limit = if record.level >= LogLevel::Error {
            None
        } else {
            self.overflow_policy.wait_limit()
        };
        let started = Instant::now();
        let mut record = record;
        let mut reported_full = false;

        loop {
            {
                let guard = self.sender.read();
                let Some(sender) = guard.as_ref() else {
                    break;
                };

                match sender.try_send(record) {
                    Ok(()) => {
                        self.health.metrics.record_enqueued();
                        return true;
                    }
                    Err(TrySendError::Disconnected(_)) => break,
                    Err(TrySendError::Full(returned)) => record = returned,
                }

                if !reported_full {
                    self.health.metrics.record_queue_full();
                    reported_full = true;
                }

                let wait = match limit {
                    None => SEND_POLL_INTERVAL,
                    Some(limit) => {
                        let remaining = limit.saturating_sub(started.elapsed());
                        if remaining.is_zero() {
                            break;
                        }
                        remaining.min(SEND_POLL_INTERVAL)
                    }
                };

                match sender.send_timeout(record, wait) {
                    Ok(()) => {
                        self.health.metrics.record_enqueued();
                        return true;
                    }
                    Err(SendTimeoutError::Timeout(returned)) => record = returned,
                    Err(SendTimeoutError::Disconnected(_)) => break,
                }
            }

            // The read guard is released between polls so shutdown can close the queue.
            if self.state() != LoggerState::Running {
                break;
            }
        }

        self.health.metrics.record_dropped();
        false
    }

    /// Dispatch queued records until the queue is empty, closed, or a fatal record went out.
    fn drain(&self) -> Drained {
        let _guard = self.dispatch_lock.lock();
        loop {
            match self.receiver.try_recv() {
                Ok(record) => {
                    let fatal = record.level == LogLevel::Fatal;
                    self.dispatch(record);
                    if fatal {
                        return Drained::Fatal;
                    }
                }
                Err(TryRecvError::Empty) => return Drained::Empty,
                Err(TryRecvError::Disconnected) => return Drained::Disconnected,
            }
        }
    }

    /// Write one record to every accepting output.
    ///
    /// With several targets each output's worker writes concurrently; all of them
    /// finish before the next record is dispatched.
    fn dispatch(&self, record: LogRecord) {
        self.health.metrics.record_dispatched();

        let targets: Vec<Arc<Output>> = self
            .outputs
            .read()
            .iter()
            .filter(|output| self.health.accepts(&output.binding, &record))
            .cloned()
            .collect();

        match targets.as_slice() {
            [] => {}
            [output] => self.health.write(&output.binding, &record),
            _ => {
                let record = Arc::new(record);
                let (done, finished) = bounded::<()>(0);
                for output in &targets {
                    let job = WriteJob {
                        record: Arc::clone(&record),
                        _done: done.clone(),
                    };
                    if let Err(job) = output.submit(&self.health, job) {
                        self.health.write(&output.binding, &job.record);
                    }
                }
                drop(done);
                // Disconnects once every job has been dropped.
                let _ = finished.recv();
            }
        }
    }

    fn flush_writers(&self) {
        let outputs: Vec<Arc<Output>> = self.outputs.read().clone();
        for output in outputs {
            self.health.flush(&output.binding);
        }
    }

    /// Close the queue, write out everything left, and stop.
    fn finish(&self, fatal: bool) {
        self.begin_shutdown();
        let mut fatal = fatal;
        loop {
            match self.drain() {
                Drained::Fatal => fatal = true,
                Drained::Empty | Drained::Disconnected => break,
            }
        }
        self.flush_writers();
        for output in self.outputs.read().iter() {
            output.stop();
        }
        self.advance_state(LoggerState::Closed);

        if fatal && !self.fatal_fired.swap(true, Ordering::AcqRel) {
            (self.on_fatal)();
        }
    }

    fn run(shared: Arc<Shared>, cancel: CancelToken) {
        loop {
            let mut select = Select::new();
            let records = select.recv(&shared.receiver);
            if let Some(receiver) = cancel.receiver() {
                select.recv(receiver);
            }
            if select.ready() != records {
                if cancel.is_cancelled() {
                    break;
                }
                continue;
            }

            match shared.drain() {
                Drained::Empty => shared.flush_writers(),
                Drained::Disconnected => break,
                Drained::Fatal => {
                    shared.finish(true);
                    return;
                }
            }
        }
        shared.finish(false);
    }
}

/// Asynchronous fan-out logger.
///
/// Callers enqueue records; one dispatcher thread writes each record to every
/// output whose filter and level accept it. When several outputs match, each is
/// written by its own long-lived worker thread.
///
/// # Example
///
/// ```
/// use fanlog::prelude::*;
/// use std::sync::Arc;
///
/// let buffer = Arc::new(BufferWriter::new());
/// let logger = Logger::builder().without_console().build();
/// logger.add_output(Filter::match_all(), buffer.clone(), LogLevel::Info, false, true);
///
/// logger.info("app", "service started");
/// logger.flush();
///
/// assert!(buffer.contents().ends_with("(app) [INFO]: service started\n"));
/// ```
pub struct Logger {
    shared: Arc<Shared>,
    dispatcher: Mutex<Option<thread::JoinHandle<()>>>,
}

impl Logger {
    /// Logger with a colour console output on stdout.
    ///
    /// The console accepts records at `level` and above whose namespace passes
    /// `console_filter` (default: every namespace not starting with `_`).
    #[must_use]
    pub fn new(token: CancelToken, level: LogLevel, console_filter: Option<Filter>) -> Self {
        let mut builder = Self::builder().cancel_token(token).base_level(level);
        if let Some(filter) = console_filter {
            builder = builder.console_filter(filter);
        }
        builder.build()
    }

    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub fn state(&self) -> LoggerState {
        self.shared.state()
    }

    pub fn is_running(&self) -> bool {
        self.state() == LoggerState::Running
    }

    fn submit(&self, level: LogLevel, namespace: &str, message: String) -> bool {
        let record = LogRecord::new(level, namespace, message, self.shared.clock.now());
        self.shared.enqueue(record)
    }

    /// Queue a record. Returns whether it was accepted.
    pub fn log(&self, level: LogLevel, namespace: &str, message: impl Into<String>) -> bool {
        self.submit(level, namespace, message.into())
    }

    #[inline]
    pub fn debug(&self, namespace: &str, message: impl Into<String>) {
        self.log(LogLevel::Debug, namespace, message);
    }

    #[inline]
    pub fn info(&self, namespace: &str, message: impl Into<String>) {
        self.log(LogLevel::Info, namespace, message);
    }

    #[inline]
    pub fn warn(&self, namespace: &str, message: impl Into<String>) {
        self.log(LogLevel::Warn, namespace, message);
    }

    /// Queue an error record and hand back the error that aborts the caller.
    ///
    /// ```
    /// use fanlog::prelude::*;
    ///
    /// fn connect(logger: &Logger) -> std::result::Result<(), LoggedError> {
    ///     Err(logger.error("db", "connection refused"))
    /// }
    ///
    /// let logger = Logger::builder().without_console().build();
    /// assert_eq!(connect(&logger).unwrap_err().message, "connection refused");
    /// ```
    pub fn error(&self, namespace: &str, message: impl Into<String>) -> LoggedError {
        let message = message.into();
        self.submit(LogLevel::Error, namespace, message.clone());
        LoggedError::new(namespace, message)
    }

    /// Queue a fatal record.
    ///
    /// Once the dispatcher has written it, the queue is drained, the logger
    /// closes and the fatal handler runs (by default the process exits with
    /// status 1).
    pub fn fatal(&self, namespace: &str, message: impl Into<String>) {
        self.log(LogLevel::Fatal, namespace, message);
    }

    /// Add a line-formatted output. Applies from the next dispatched record.
    pub fn add_output(
        &self,
        filter: Filter,
        writer: Arc<dyn LogWriter>,
        min_level: LogLevel,
        colors: bool,
        trailing_newline: bool,
    ) {
        self.add_binding(OutputBinding::line(
            filter,
            min_level,
            writer,
            colors,
            trailing_newline,
        ));
    }

    pub fn add_output_with_formatter(
        &self,
        filter: Filter,
        writer: Arc<dyn LogWriter>,
        min_level: LogLevel,
        formatter: Arc<dyn Formatter>,
    ) {
        self.add_binding(OutputBinding::new(filter, min_level, formatter, writer));
    }

    pub fn add_binding(&self, binding: OutputBinding) {
        self.shared.outputs.write().push(Arc::new(Output::new(binding)));
    }

    pub fn output_count(&self) -> usize {
        self.shared.outputs.read().len()
    }

    /// Prefix the next line of every colour output with a blank line.
    pub fn new_line(&self) {
        for output in self.shared.outputs.read().iter() {
            output.binding.formatter.new_line();
        }
    }

    /// Render the next record of every output as the bare message.
    pub fn no_date_next_line(&self) {
        for output in self.shared.outputs.read().iter() {
            output.binding.formatter.no_date_next_line();
        }
    }

    /// Write everything queued so far, then flush every writer.
    ///
    /// Records queued by this thread before the call are written when it returns.
    pub fn flush(&self) {
        match self.shared.drain() {
            Drained::Fatal => self.shared.finish(true),
            Drained::Empty | Drained::Disconnected => self.shared.flush_writers(),
        }
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.shared.health.metrics
    }

    pub fn dropped_count(&self) -> u64 {
        self.shared.health.metrics.dropped_count()
    }

    /// Stop accepting records, write out the queue, and join the dispatcher.
    ///
    /// Returns `false` if the dispatcher did not finish within `timeout`.
    ///
    /// ```
    /// use fanlog::{Logger, LoggerState};
    /// use std::time::Duration;
    ///
    /// let logger = Logger::builder().without_console().build();
    /// assert!(logger.shutdown(Duration::from_secs(1)));
    /// assert_eq!(logger.state(), LoggerState::Closed);
    /// ```
    pub fn shutdown(&self, timeout: Duration) -> bool {
        self.shared.begin_shutdown();

        let handle = self.dispatcher.lock().take();
        if let Some(handle) = handle {
            let start = Instant::now();

            loop {
                if handle.is_finished() {
                    if let Err(e) = handle.join() {
                        eprintln!("[LOGGER ERROR] Dispatcher thread panicked during shutdown: {:?}", e);
                        self.shared.finish(false);
                        return false;
                    }
                    break;
                }

                if start.elapsed() >= timeout {
                    eprintln!(
                        "[LOGGER WARNING] Dispatcher thread did not finish within {:?} timeout. \
                         Some logs may be lost.",
                        timeout
                    );
                    *self.dispatcher.lock() = Some(handle);
                    return false;
                }

                thread::sleep(Duration::from_millis(10));
            }
        }

        self.shared.finish(false);
        true
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("state", &self.state())
            .field("outputs", &self.output_count())
            .field("overflow_policy", &self.shared.overflow_policy)
            .finish()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);

        let dropped = self.shared.health.metrics.dropped_count();
        if dropped > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger shutting down with {} dropped logs (drop rate: {:.2}%)",
                dropped,
                self.shared.health.metrics.drop_rate()
            );
        }
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use fanlog::prelude::*;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let console = Arc::new(BufferWriter::new());
/// let logger = Logger::builder()
///     .base_level(LogLevel::Info)
///     .console_writer(console.clone())
///     .console_colors(false)
///     .queue_capacity(1024)
///     .overflow_policy(OverflowPolicy::BlockWithTimeout(Duration::from_millis(50)))
///     .build();
///
/// logger.debug("app", "hidden");
/// logger.info("app", "shown");
/// logger.flush();
/// assert_eq!(console.lines().len(), 1);
/// ```
pub struct LoggerBuilder {
    queue_capacity: usize,
    base_level: LogLevel,
    console: bool,
    console_filter: Option<Filter>,
    console_writer: Option<Arc<dyn LogWriter>>,
    console_colors: bool,
    clock: Arc<dyn Clock>,
    on_fatal: FatalHandler,
    cancel: CancelToken,
    overflow_policy: OverflowPolicy,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            base_level: LogLevel::Debug,
            console: true,
            console_filter: None,
            console_writer: None,
            console_colors: true,
            clock: system_clock(),
            on_fatal: Arc::new(|| std::process::exit(1)),
            cancel: CancelToken::never(),
            overflow_policy: OverflowPolicy::default(),
        }
    }

    /// Capacity of the record queue (at least 1).
    #[must_use = "builder methods return a new value"]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Minimum level of the console output.
    #[must_use = "builder methods return a new value"]
    pub fn base_level(mut self, level: LogLevel) -> Self {
        self.base_level = level;
        self
    }

    /// Namespace filter of the console output. Default: [`Filter::underscore`].
    #[must_use = "builder methods return a new value"]
    pub fn console_filter(mut self, filter: Filter) -> Self {
        self.console_filter = Some(filter);
        self
    }

    /// Replace stdout as the console target.
    #[must_use = "builder methods return a new value"]
    pub fn console_writer(mut self, writer: Arc<dyn LogWriter>) -> Self {
        self.console_writer = Some(writer);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn console_colors(mut self, enabled: bool) -> Self {
        self.console_colors = enabled;
        self
    }

    /// Start with no outputs at all.
    #[must_use = "builder methods return a new value"]
    pub fn without_console(mut self) -> Self {
        self.console = false;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace process exit as the reaction to a fatal record.
    #[must_use = "builder methods return a new value"]
    pub fn on_fatal(mut self, handler: FatalHandler) -> Self {
        self.on_fatal = handler;
        self
    }

    /// Shut down once this token is cancelled.
    #[must_use = "builder methods return a new value"]
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// What debug, info and warn producers do when the queue is full.
    #[must_use = "builder methods return a new value"]
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    pub fn build(self) -> Logger {
        let (sender, receiver) = bounded(self.queue_capacity);

        let mut outputs = Vec::new();
        if self.console {
            let writer = self
                .console_writer
                .unwrap_or_else(|| Arc::new(ConsoleWriter::stdout()));
            let filter = self.console_filter.unwrap_or_else(Filter::underscore);
            outputs.push(Arc::new(Output::new(OutputBinding::line(
                filter,
                self.base_level,
                writer,
                self.console_colors,
                true,
            ))));
        }

        let shared = Arc::new(Shared {
            state: AtomicU8::new(LoggerState::Running as u8),
            sender: RwLock::new(Some(sender)),
            receiver,
            outputs: RwLock::new(outputs),
            dispatch_lock: Mutex::new(()),
            health: Arc::new(Health::new()),
            clock: self.clock,
            overflow_policy: self.overflow_policy,
            on_fatal: self.on_fatal,
            fatal_fired: AtomicBool::new(false),
        });

        let worker = Arc::clone(&shared);
        let cancel = self.cancel;
        let handle = thread::spawn(move || Shared::run(worker, cancel));

        Logger {
            shared,
            dispatcher: Mutex::new(Some(handle)),
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
