//! Error types for the logging engine

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// A push larger than the buffer ceiling, can never succeed
    #[error("Buffer capacity exceeded: {requested} bytes requested, ceiling is {max} bytes")]
    CapacityExceeded { requested: usize, max: usize },

    /// The async pipeline has been stopped
    #[error("Async pipeline is closed")]
    PipelineClosed,

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Format pattern could not be compiled
    #[error("Invalid format pattern '{pattern}': {message}")]
    FormatPattern { pattern: String, message: String },

    /// File sink error with path
    #[error("File sink error for '{path}': {message}")]
    FileSink { path: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotation { path: String, message: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a capacity exceeded error
    pub fn capacity_exceeded(requested: usize, max: usize) -> Self {
        LoggerError::CapacityExceeded { requested, max }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a format pattern error
    pub fn format_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FormatPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create a file sink error
    pub fn file_sink(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileSink {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// True for configuration-time failures (bad name, bad pattern)
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LoggerError::InvalidConfiguration { .. } | LoggerError::FormatPattern { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::capacity_exceeded(100, 64);
        assert!(matches!(err, LoggerError::CapacityExceeded { requested: 100, max: 64 }));

        let err = LoggerError::config("LoggerBuilder", "empty name");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
        assert!(err.is_configuration());

        let err = LoggerError::file_sink("/var/log/app.log", "Permission denied");
        assert!(matches!(err, LoggerError::FileSink { .. }));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::capacity_exceeded(100, 64);
        assert_eq!(
            err.to_string(),
            "Buffer capacity exceeded: 100 bytes requested, ceiling is 64 bytes"
        );

        let err = LoggerError::file_rotation("/var/log/app", "Disk full");
        assert_eq!(
            err.to_string(),
            "File rotation failed for '/var/log/app': Disk full"
        );

        let err = LoggerError::format_pattern("%q", "unknown directive '%q'");
        assert_eq!(
            err.to_string(),
            "Invalid format pattern '%q': unknown directive '%q'"
        );

        assert_eq!(LoggerError::PipelineClosed.to_string(), "Async pipeline is closed");
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::io_operation("create log directory", "cannot create /root/x", io_err);

        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("create log directory"));
        assert!(err.to_string().contains("cannot create /root/x"));
    }
}
