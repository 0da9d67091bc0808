//! Named logger registry
//!
//! A registry maps names to shared loggers and always holds a `"root"`
//! logger (sync, `Debug`, default pattern, stdout). Entries are never
//! removed, so a handle obtained once stays valid for the registry's
//! lifetime.
//!
//! Components should receive a `&LoggerRegistry`; [`LoggerRegistry::global`]
//! is the process-wide instance for code that has no registry to hand.

use super::formatter::PatternFormatter;
use super::log_level::LogLevel;
use super::logger::Logger;
use crate::sinks::StdoutSink;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Name under which the root logger is registered
pub const ROOT_LOGGER_NAME: &str = "root";

static GLOBAL_REGISTRY: OnceLock<LoggerRegistry> = OnceLock::new();

pub struct LoggerRegistry {
    root: Arc<Logger>,
    loggers: RwLock<HashMap<String, Arc<Logger>>>,
}

impl LoggerRegistry {
    /// Create a registry containing only the root logger
    pub fn new() -> Self {
        let root = Arc::new(Logger::new_sync(
            ROOT_LOGGER_NAME.to_string(),
            LogLevel::Debug,
            Box::new(PatternFormatter::default()),
            vec![Box::new(StdoutSink::new())],
        ));

        let mut loggers = HashMap::new();
        loggers.insert(ROOT_LOGGER_NAME.to_string(), Arc::clone(&root));

        Self {
            root,
            loggers: RwLock::new(loggers),
        }
    }

    /// The process-wide registry, created on first use.
    ///
    /// A static is never dropped: call [`shutdown_all`](Self::shutdown_all)
    /// before exit so async loggers deliver their pending lines.
    pub fn global() -> &'static LoggerRegistry {
        GLOBAL_REGISTRY.get_or_init(LoggerRegistry::new)
    }

    pub fn root(&self) -> Arc<Logger> {
        Arc::clone(&self.root)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Logger>> {
        self.loggers.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.loggers.read().contains_key(name)
    }

    /// Publish `logger` under its name.
    ///
    /// The first logger registered under a name wins: if the name is taken,
    /// `logger` is dropped and the existing handle is returned.
    pub fn insert(&self, logger: Logger) -> Arc<Logger> {
        let mut loggers = self.loggers.write();
        if let Some(existing) = loggers.get(logger.name()) {
            return Arc::clone(existing);
        }
        let logger = Arc::new(logger);
        loggers.insert(logger.name().to_string(), Arc::clone(&logger));
        logger
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loggers.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.loggers.read().len()
    }

    /// Never true: the root logger is always present
    pub fn is_empty(&self) -> bool {
        self.loggers.read().is_empty()
    }

    /// Stop every async logger after it delivered its pending lines, and
    /// flush every sink. Loggers stay registered; async ones reject further
    /// records.
    pub fn shutdown_all(&self) {
        let loggers: Vec<Arc<Logger>> = self.loggers.read().values().cloned().collect();
        for logger in loggers {
            if let Err(e) = logger.shutdown() {
                eprintln!(
                    "[LOGGER ERROR] Failed to shut down logger '{}': {}",
                    logger.name(),
                    e
                );
            }
        }
    }
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Look up a logger in the global registry
pub fn get_logger(name: &str) -> Option<Arc<Logger>> {
    LoggerRegistry::global().get(name)
}

/// Root logger of the global registry
pub fn root_logger() -> Arc<Logger> {
    LoggerRegistry::global().root()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::LoggerError;
    use crate::core::logger::LoggerMode;

    #[test]
    fn test_new_registry_has_root() {
        let registry = LoggerRegistry::new();
        let root = registry.root();
        assert_eq!(root.name(), ROOT_LOGGER_NAME);
        assert_eq!(root.mode(), LoggerMode::Sync);
        assert_eq!(root.level(), LogLevel::Debug);
        assert!(registry.contains(ROOT_LOGGER_NAME));
        assert_eq!(registry.names(), vec!["root".to_string()]);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = LoggerRegistry::new();
        let logger = Logger::builder()
            .name("net")
            .level(LogLevel::Warn)
            .register(&registry)
            .unwrap();

        let found = registry.get("net").unwrap();
        assert!(Arc::ptr_eq(&logger, &found));
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.names(), vec!["net".to_string(), "root".to_string()]);
    }

    #[test]
    fn test_name_collision_returns_existing() {
        let registry = LoggerRegistry::new();
        let first = Logger::builder()
            .name("db")
            .level(LogLevel::Error)
            .register(&registry)
            .unwrap();
        let second = Logger::builder()
            .name("db")
            .level(LogLevel::Debug)
            .async_mode()
            .register(&registry)
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.level(), LogLevel::Error);
        assert_eq!(second.mode(), LoggerMode::Sync);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_collision_skips_pattern_compilation() {
        let registry = LoggerRegistry::new();
        Logger::builder().name("api").register(&registry).unwrap();

        // The existing logger is returned before the bad pattern is compiled
        let existing = Logger::builder()
            .name("api")
            .pattern("%q")
            .register(&registry)
            .unwrap();
        assert_eq!(existing.name(), "api");
    }

    #[test]
    fn test_register_invalid_name() {
        let registry = LoggerRegistry::new();
        let err = Logger::builder().register(&registry).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_insert_first_writer_wins() {
        let registry = LoggerRegistry::new();
        let a = registry.insert(Logger::builder().name("x").build().unwrap());
        let b = registry.insert(
            Logger::builder()
                .name("x")
                .level(LogLevel::Fatal)
                .build()
                .unwrap(),
        );
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.level(), LogLevel::Debug);
    }

    #[test]
    fn test_shutdown_all_stops_async_loggers() {
        let registry = LoggerRegistry::new();
        let logger = Logger::builder()
            .name("bg")
            .async_mode()
            .register(&registry)
            .unwrap();

        registry.shutdown_all();
        let err = logger
            .try_emit(LogLevel::Info, file!(), line!(), format_args!("late"))
            .unwrap_err();
        assert!(matches!(err, LoggerError::PipelineClosed));
    }

    #[test]
    fn test_global_registry_is_shared() {
        let registry = LoggerRegistry::global();
        assert!(std::ptr::eq(registry, LoggerRegistry::global()));
        assert!(Arc::ptr_eq(&root_logger(), &registry.root()));

        Logger::builder()
            .name("registry-global-test")
            .register(registry)
            .unwrap();
        assert!(get_logger("registry-global-test").is_some());
    }
}
