//! Built-in sink implementations

pub mod file;
pub mod roll_by_size;
pub mod roll_by_time;
pub mod stdout;

pub use crate::core::Sink;
pub use file::FileSink;
pub use roll_by_size::RollBySizeSink;
pub use roll_by_time::{RollByTimeSink, TimeUnit};
pub use stdout::StdoutSink;
