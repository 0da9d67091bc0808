//! Log record structure

use super::log_level::LogLevel;
use chrono::{DateTime, Local, Timelike};
use std::cell::RefCell;

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

/// Get cached thread ID, computing and caching it on first access
fn current_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| format!("{:?}", std::thread::current().id()))
            .clone()
    })
}

/// Get cached thread name, computing and caching it on first access
fn current_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| std::thread::current().name().map(String::from))
            .clone()
    })
}

/// One emitted record, built once per call and consumed by the formatter.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub logger_name: String,
    pub file: String,
    pub line: u32,
    pub thread_id: String,
    pub thread_name: Option<String>,
    pub level: LogLevel,
    /// Wall-clock time truncated to whole seconds
    pub timestamp: DateTime<Local>,
    pub payload: String,
}

impl LogRecord {
    /// Escape line terminators so a record always renders as a single line.
    fn sanitize_payload(payload: &str) -> String {
        if !payload.contains(['\n', '\r', '\t']) {
            return payload.to_string();
        }
        payload
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(
        logger_name: impl Into<String>,
        file: impl Into<String>,
        line: u32,
        level: LogLevel,
        payload: &str,
    ) -> Self {
        let now = Local::now();
        Self {
            logger_name: logger_name.into(),
            file: file.into(),
            line,
            thread_id: current_thread_id(),
            thread_name: current_thread_name(),
            level,
            timestamp: now.with_nanosecond(0).unwrap_or(now),
            payload: Self::sanitize_payload(payload),
        }
    }

    /// Override the timestamp, mostly useful for deterministic formatting
    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Thread name when set, otherwise the thread id
    pub fn thread_label(&self) -> &str {
        self.thread_name.as_deref().unwrap_or(&self.thread_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_is_sanitized() {
        let record = LogRecord::new("root", "main.rs", 7, LogLevel::Info, "a\nb\rc\td");
        assert_eq!(record.payload, "a\\nb\\rc\\td");
    }

    #[test]
    fn test_timestamp_has_second_resolution() {
        let record = LogRecord::new("root", "main.rs", 7, LogLevel::Info, "x");
        assert_eq!(record.timestamp.nanosecond(), 0);
    }

    #[test]
    fn test_thread_label_prefers_name() {
        let handle = std::thread::Builder::new()
            .name("worker-7".to_string())
            .spawn(|| LogRecord::new("root", "main.rs", 1, LogLevel::Debug, "x"))
            .unwrap();
        let record = handle.join().unwrap();
        assert_eq!(record.thread_label(), "worker-7");
        assert!(record.thread_id.starts_with("ThreadId("));
    }
}
