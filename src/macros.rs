//! Logging macros for ergonomic log message formatting.
//!
//! The macros capture the call site with `file!()`/`line!()` and hand the
//! arguments to [`Logger::emit`](crate::Logger::emit) as `format_args!`, so
//! nothing is formatted when the level is filtered out.
//!
//! # Examples
//!
//! ```
//! use dualbuf_logger::prelude::*;
//! use dualbuf_logger::info;
//!
//! let logger = Logger::builder().name("server").build().unwrap();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! ```

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use dualbuf_logger::prelude::*;
/// # let logger = Logger::builder().name("doc").build().unwrap();
/// use dualbuf_logger::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.emit($level, file!(), line!(), format_args!($($arg)+))
    };
}

/// Log a debug-level message.
///
/// ```
/// # use dualbuf_logger::prelude::*;
/// # let logger = Logger::builder().name("doc").build().unwrap();
/// use dualbuf_logger::debug;
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// ```
/// # use dualbuf_logger::prelude::*;
/// # let logger = Logger::builder().name("doc").build().unwrap();
/// use dualbuf_logger::warn;
/// warn!(logger, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
