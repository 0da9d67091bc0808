//! Main logger implementation

use super::buffer::DEFAULT_MAX_BUFFER_SIZE;
use super::error::{LoggerError, Result};
use super::formatter::{Formatter, PatternFormatter};
use super::log_level::LogLevel;
use super::log_record::LogRecord;
use super::looper::{panic_message, DualBufferLoop};
use super::metrics::LoggerMetrics;
use super::registry::LoggerRegistry;
use super::sink::Sink;
use crate::sinks::StdoutSink;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe, Location};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

type SinkList = Arc<Mutex<Vec<Box<dyn Sink>>>>;

/// How rendered lines reach the sinks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LoggerMode {
    /// Write through to every sink on the calling thread
    #[default]
    Sync,
    /// Push into a double-buffered pipeline drained by a background thread
    Async,
}

/// A named logger with a level threshold, one formatter and an ordered list
/// of sinks.
///
/// In [`LoggerMode::Sync`] every call renders the line and writes it to all
/// sinks while holding the sink lock, so lines from concurrent callers never
/// interleave. In [`LoggerMode::Async`] the rendered line is pushed into a
/// [`DualBufferLoop`]; the drain thread replays it line by line to the sinks.
/// A saturated pipeline blocks the caller until the drain thread frees space.
pub struct Logger {
    name: String,
    mode: LoggerMode,
    threshold: AtomicU8,
    formatter: Box<dyn Formatter>,
    sinks: SinkList,
    looper: Option<DualBufferLoop>,
    /// Metrics for observability (delivered, dropped, rejected, blocked)
    metrics: Arc<LoggerMetrics>,
}

impl Logger {
    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use dualbuf_logger::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .name("worker")
    ///     .level(LogLevel::Info)
    ///     .async_mode()
    ///     .build()
    ///     .unwrap();
    /// logger.info("ready");
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub(crate) fn new_sync(
        name: String,
        level: LogLevel,
        formatter: Box<dyn Formatter>,
        sinks: Vec<Box<dyn Sink>>,
    ) -> Self {
        Self {
            name,
            mode: LoggerMode::Sync,
            threshold: AtomicU8::new(level as u8),
            formatter,
            sinks: Arc::new(Mutex::new(sinks)),
            looper: None,
            metrics: Arc::new(LoggerMetrics::new()),
        }
    }

    pub(crate) fn new_async(
        name: String,
        level: LogLevel,
        formatter: Box<dyn Formatter>,
        sinks: Vec<Box<dyn Sink>>,
        max_buffer_size: usize,
    ) -> Result<Self> {
        let sinks: SinkList = Arc::new(Mutex::new(sinks));
        let metrics = Arc::new(LoggerMetrics::new());

        let drain_sinks = Arc::clone(&sinks);
        let drain_metrics = Arc::clone(&metrics);
        let looper = DualBufferLoop::with_metrics(
            max_buffer_size,
            Arc::clone(&metrics),
            Box::new(move |batch: &[u8]| Self::replay(&drain_sinks, batch, &drain_metrics)),
        )?;

        Ok(Self {
            name,
            mode: LoggerMode::Async,
            threshold: AtomicU8::new(level as u8),
            formatter,
            sinks,
            looper: Some(looper),
            metrics,
        })
    }

    /// Split a swapped batch back into lines and hand each one to every sink.
    ///
    /// Runs on the drain thread. Sinks are flushed once per batch.
    fn replay(sinks: &SinkList, batch: &[u8], metrics: &LoggerMetrics) {
        let mut sinks = sinks.lock();
        for line in batch.split_inclusive(|&b| b == b'\n') {
            Self::fan_out(sinks.as_mut_slice(), line, metrics);
        }
        if let Err(e) = Self::flush_sinks(sinks.as_mut_slice()) {
            eprintln!("[LOGGER ERROR] Flush after batch failed: {}", e);
        }
    }

    /// Write one line to every sink in order.
    ///
    /// Each sink is wrapped in `catch_unwind`, so a failing or panicking sink
    /// never keeps the line from the sinks after it. Returns `true` when every
    /// sink accepted the line.
    fn fan_out(sinks: &mut [Box<dyn Sink>], line: &[u8], metrics: &LoggerMetrics) -> bool {
        let mut has_error = false;

        for (idx, sink) in sinks.iter_mut().enumerate() {
            let persisted = catch_unwind(AssertUnwindSafe(|| sink.persist(line)));
            match persisted {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    eprintln!("[LOGGER ERROR] Sink #{} ({}) failed: {}", idx, sink.name(), e);
                    has_error = true;
                }
                Err(panic_info) => {
                    eprintln!(
                        "[LOGGER CRITICAL] Sink #{} panicked: {}. \
                         Other sinks continue to function.",
                        idx,
                        panic_message(panic_info.as_ref())
                    );
                    has_error = true;
                }
            }
        }

        if has_error {
            metrics.record_dropped();
        } else {
            metrics.record_logged();
        }
        !has_error
    }

    /// Flush every sink, returning the first failure and reporting the rest
    fn flush_sinks(sinks: &mut [Box<dyn Sink>]) -> Result<()> {
        let mut first_error = None;

        for (idx, sink) in sinks.iter_mut().enumerate() {
            let flushed = match catch_unwind(AssertUnwindSafe(|| sink.flush())) {
                Ok(result) => result,
                Err(panic_info) => Err(LoggerError::other(format!(
                    "sink #{} panicked during flush: {}",
                    idx,
                    panic_message(panic_info.as_ref())
                ))),
            };
            if let Err(e) = flushed {
                if first_error.is_none() {
                    first_error = Some(e);
                } else {
                    eprintln!("[LOGGER ERROR] Sink #{} flush failed: {}", idx, e);
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> LoggerMode {
        self.mode
    }

    #[inline]
    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.threshold.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set_level(&self, level: LogLevel) {
        self.threshold.store(level as u8, Ordering::Relaxed);
    }

    /// Whether a record at `level` would pass the threshold
    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Off && level >= self.level()
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.lock().len()
    }

    /// Raise or lower the async pipeline ceiling. No-op for a sync logger.
    pub fn set_max_buffer_size(&self, max_buffer_size: usize) {
        if let Some(ref looper) = self.looper {
            looper.set_max_buffer_size(max_buffer_size);
        }
    }

    /// Current async pipeline ceiling, `None` for a sync logger
    pub fn max_buffer_size(&self) -> Option<usize> {
        self.looper.as_ref().map(DualBufferLoop::max_buffer_size)
    }

    /// Get the logger metrics for detailed observability
    ///
    /// # Example
    ///
    /// ```
    /// use dualbuf_logger::prelude::*;
    ///
    /// let logger = Logger::builder().name("metrics-demo").build().unwrap();
    ///
    /// // After logging operations...
    /// let metrics = logger.metrics();
    /// println!("Dropped: {}", metrics.dropped_count());
    /// println!("Total logged: {}", metrics.total_logged());
    /// println!("Drop rate: {:.2}%", metrics.drop_rate());
    /// ```
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Render and deliver one record.
    ///
    /// Filtering happens before the arguments are formatted. Failures never
    /// reach the caller: a pipeline refusal is counted in the metrics and,
    /// unless the logger was shut down, reported on stderr.
    pub fn emit(&self, level: LogLevel, file: &str, line: u32, args: fmt::Arguments<'_>) {
        match self.try_emit(level, file, line, args) {
            Ok(()) | Err(LoggerError::PipelineClosed) => {}
            Err(e) => {
                eprintln!("[LOGGER ERROR] Logger '{}' dropped a record: {}", self.name, e);
            }
        }
    }

    /// Same as [`emit`](Self::emit) but returns pipeline failures.
    ///
    /// Sink failures are isolated per sink and never surface here.
    ///
    /// # Errors
    ///
    /// - `CapacityExceeded` if the rendered line is larger than the async ceiling
    /// - `PipelineClosed` if the async logger was shut down
    pub fn try_emit(
        &self,
        level: LogLevel,
        file: &str,
        line: u32,
        args: fmt::Arguments<'_>,
    ) -> Result<()> {
        if !self.is_enabled(level) {
            return Ok(());
        }

        let payload: Cow<'_, str> = match args.as_str() {
            Some(text) => Cow::Borrowed(text),
            None => Cow::Owned(args.to_string()),
        };
        let record = LogRecord::new(self.name.as_str(), file, line, level, &payload);
        let rendered = self.formatter.format(&record);
        self.deliver(rendered.as_bytes())
    }

    fn deliver(&self, line: &[u8]) -> Result<()> {
        match self.looper {
            Some(ref looper) => looper.push(line),
            None => {
                let mut sinks = self.sinks.lock();
                Self::fan_out(sinks.as_mut_slice(), line, &self.metrics);
                Ok(())
            }
        }
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        let caller = Location::caller();
        self.emit(level, caller.file(), caller.line(), format_args!("{}", message.as_ref()));
    }

    #[inline]
    #[track_caller]
    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    #[track_caller]
    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    #[track_caller]
    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    #[track_caller]
    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    #[track_caller]
    pub fn fatal(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Fatal, message);
    }

    /// Wait until the drain thread delivered everything pushed so far (async
    /// mode), then flush every sink.
    ///
    /// Must not be called from inside a sink.
    pub fn flush(&self) -> Result<()> {
        if let Some(ref looper) = self.looper {
            looper.wait_idle();
        }
        let mut sinks = self.sinks.lock();
        Self::flush_sinks(sinks.as_mut_slice())
    }

    /// Stop the async pipeline after it delivered every pushed line, then
    /// flush the sinks.
    ///
    /// Safe to call more than once. Later async emits fail with
    /// `PipelineClosed`; a sync logger keeps working.
    pub fn shutdown(&self) -> Result<()> {
        if let Some(ref looper) = self.looper {
            looper.stop();
        }
        self.flush()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("level", &self.level())
            .field("sinks", &self.sink_count())
            .finish()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
        }

        let lost = self.metrics.dropped_count() + self.metrics.rejected_count();
        if lost > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger '{}' shutting down with {} lost lines (drop rate: {:.2}%)",
                self.name,
                lost,
                self.metrics.drop_rate()
            );
        }
    }
}

/// Builder for creating a Logger with fluent configuration
///
/// Defaults: level `Debug`, the default pattern, a single stdout sink, sync
/// mode and a 200 MiB async ceiling. A custom formatter takes precedence
/// over a pattern.
///
/// # Example
/// ```
/// use dualbuf_logger::prelude::*;
///
/// let logger = Logger::builder()
///     .name("http")
///     .level(LogLevel::Warn)
///     .pattern("[%p] %m%n")
///     .sink(StdoutSink::new())
///     .build()
///     .unwrap();
/// ```
pub struct LoggerBuilder {
    name: String,
    level: LogLevel,
    pattern: Option<String>,
    formatter: Option<Box<dyn Formatter>>,
    #[cfg_attr(not(feature = "console"), allow(dead_code))]
    colored: bool,
    sinks: Vec<Box<dyn Sink>>,
    mode: LoggerMode,
    max_buffer_size: usize,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            name: String::new(),
            level: LogLevel::Debug,
            pattern: None,
            formatter: None,
            colored: false,
            sinks: Vec::new(),
            mode: LoggerMode::Sync,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
        }
    }

    /// Set the logger name (required)
    #[must_use = "builder methods return a new value"]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set minimum log level
    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the format pattern; it is compiled by [`build`](Self::build)
    #[must_use = "builder methods return a new value"]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Use a custom formatter instead of a pattern
    #[must_use = "builder methods return a new value"]
    pub fn formatter<F: Formatter + 'static>(mut self, formatter: F) -> Self {
        self.formatter = Some(Box::new(formatter));
        self
    }

    /// Color the level text with ANSI escapes (pattern formatter only)
    #[must_use = "builder methods return a new value"]
    pub fn colored(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// Add a sink; sinks receive every line in the order they were added
    #[must_use = "builder methods return a new value"]
    pub fn sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn mode(mut self, mode: LoggerMode) -> Self {
        self.mode = mode;
        self
    }

    /// Shorthand for `mode(LoggerMode::Async)`
    #[must_use = "builder methods return a new value"]
    pub fn async_mode(self) -> Self {
        self.mode(LoggerMode::Async)
    }

    /// Ceiling of each pipeline buffer in async mode; ignored in sync mode
    #[must_use = "builder methods return a new value"]
    pub fn max_buffer_size(mut self, max_buffer_size: usize) -> Self {
        self.max_buffer_size = max_buffer_size;
        self
    }

    /// Build the Logger
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration` for an empty name or a zero buffer ceiling
    /// - `FormatPattern` if the pattern does not compile
    /// - `IoOperation` if the drain thread cannot be spawned
    pub fn build(self) -> Result<Logger> {
        validate_name(&self.name)?;
        if self.mode == LoggerMode::Async && self.max_buffer_size == 0 {
            return Err(LoggerError::config(
                "LoggerBuilder",
                "max_buffer_size must be greater than 0",
            ));
        }

        let formatter: Box<dyn Formatter> = match self.formatter {
            Some(formatter) => formatter,
            None => {
                let compiled = match self.pattern {
                    Some(pattern) => PatternFormatter::new(pattern)?,
                    None => PatternFormatter::default(),
                };
                #[cfg(feature = "console")]
                let compiled = compiled.with_colors(self.colored);
                Box::new(compiled)
            }
        };

        let mut sinks = self.sinks;
        if sinks.is_empty() {
            sinks.push(Box::new(StdoutSink::new()));
        }

        match self.mode {
            LoggerMode::Sync => Ok(Logger::new_sync(self.name, self.level, formatter, sinks)),
            LoggerMode::Async => Logger::new_async(
                self.name,
                self.level,
                formatter,
                sinks,
                self.max_buffer_size,
            ),
        }
    }

    /// Build the logger and publish it in `registry`.
    ///
    /// If the name is already taken the existing logger is returned and
    /// nothing is constructed.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build)
    pub fn register(self, registry: &LoggerRegistry) -> Result<Arc<Logger>> {
        validate_name(&self.name)?;
        if let Some(existing) = registry.get(&self.name) {
            return Ok(existing);
        }
        let logger = self.build()?;
        Ok(registry.insert(logger))
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LoggerError::config("LoggerBuilder", "logger name must not be empty"));
    }
    Ok(())
}
