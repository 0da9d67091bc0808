//! Core logger types and traits

pub mod buffer;
pub mod error;
pub mod formatter;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod looper;
pub mod metrics;
pub mod registry;
pub mod sink;

pub use buffer::{
    GrowableBuffer, DEFAULT_BUFFER_SIZE, DEFAULT_MAX_BUFFER_SIZE, INCREMENT_BUFFER_SIZE,
    THRESHOLD_BUFFER_SIZE,
};
pub use error::{LoggerError, Result};
pub use formatter::{Formatter, PatternFormatter, DEFAULT_PATTERN};
pub use log_level::LogLevel;
pub use log_record::LogRecord;
pub use logger::{Logger, LoggerBuilder, LoggerMode};
pub use looper::{DeliveryCallback, DualBufferLoop};
pub use metrics::LoggerMetrics;
pub use registry::{get_logger, root_logger, LoggerRegistry, ROOT_LOGGER_NAME};
pub use sink::Sink;
