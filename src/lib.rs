//! # Dual-buffer Logger
//!
//! An embeddable logging engine: leveled, pattern-formatted records fanned
//! out to one or more sinks, either synchronously or through a
//! double-buffered asynchronous pipeline.
//!
//! ## Features
//!
//! - **Async pipeline**: producers append to one buffer while a drain thread
//!   writes the other; buffers are exchanged without copying
//! - **Bounded memory**: buffers grow up to a ceiling, then producers block
//! - **Rolling files**: rotation by size or by aligned time buckets
//! - **Named loggers**: a registry with a root logger and first-wins names
//!
//! ## Example
//!
//! ```no_run
//! use dualbuf_logger::prelude::*;
//! use dualbuf_logger::{info, warn};
//!
//! let registry = LoggerRegistry::new();
//! let logger = Logger::builder()
//!     .name("app")
//!     .level(LogLevel::Info)
//!     .sink(StdoutSink::new())
//!     .sink(RollBySizeSink::new("logs/app", 10 * 1024 * 1024).unwrap())
//!     .async_mode()
//!     .register(&registry)
//!     .unwrap();
//!
//! info!(logger, "listening on port {}", 8080);
//! warn!(logger, "cache miss ratio {:.1}%", 12.5);
//! registry.shutdown_all();
//! ```

pub mod core;
pub mod macros;
pub mod sinks;
pub mod util;

pub mod prelude {
    pub use crate::core::{
        get_logger, root_logger, Formatter, LogLevel, LogRecord, Logger, LoggerBuilder,
        LoggerError, LoggerMetrics, LoggerMode, LoggerRegistry, PatternFormatter, Result, Sink,
    };
    pub use crate::sinks::{FileSink, RollBySizeSink, RollByTimeSink, StdoutSink, TimeUnit};
}

pub use core::{
    get_logger, root_logger, DeliveryCallback, DualBufferLoop, Formatter, GrowableBuffer,
    LogLevel, LogRecord, Logger, LoggerBuilder, LoggerError, LoggerMetrics, LoggerMode,
    LoggerRegistry, PatternFormatter, Result, Sink, DEFAULT_MAX_BUFFER_SIZE, DEFAULT_PATTERN,
    ROOT_LOGGER_NAME,
};
pub use sinks::{FileSink, RollBySizeSink, RollByTimeSink, StdoutSink, TimeUnit};
