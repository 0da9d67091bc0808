//! Integration tests for the logging engine
//!
//! These tests verify:
//! - Log injection prevention
//! - Sync and async delivery to file sinks
//! - Fan-out order across several sinks
//! - Size and time based rotation end-to-end
//! - Registry construction contracts

use dualbuf_logger::prelude::*;
use dualbuf_logger::{info, ROOT_LOGGER_NAME};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .expect("Failed to read dir")
        .map(|entry| entry.expect("Bad dir entry").path())
        .collect();
    files.sort();
    files
}

#[test]
fn test_log_injection_prevention() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("injection_test.log");

    let logger = Logger::builder()
        .name("auth")
        .level(LogLevel::Info)
        .sink(FileSink::new(&log_file).expect("Failed to create sink"))
        .build()
        .expect("Failed to build logger");

    // Try to inject fake log entries with newlines
    let malicious_message = "User login\n[12:00:00][main][auth][x.rs:1][ERROR]\tFake error\r\nINFO";
    logger.info(malicious_message);
    logger.flush().expect("Failed to flush");

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    assert!(content.contains("\\n"));
    assert!(content.contains("\\r"));
    assert!(content.contains("\\t"));

    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1, "Log should be a single line, not multiple");
}

#[test]
fn test_default_pattern_layout() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("layout.log");

    let logger = Logger::builder()
        .name("layout")
        .sink(FileSink::new(&log_file).expect("Failed to create sink"))
        .build()
        .expect("Failed to build logger");

    logger.warn("disk at 91%");
    logger.flush().expect("Failed to flush");

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    assert!(content.contains("][layout]["));
    assert!(content.contains(&format!("[{}:", file!())));
    assert!(content.ends_with("[WARN]\tdisk at 91%\n"), "got {:?}", content);
}

#[test]
fn test_sync_file_logging() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("nested/dir/sync.log");

    let logger = Logger::builder()
        .name("sync")
        .pattern("%p %m%n")
        .sink(FileSink::new(&log_file).expect("Failed to create sink"))
        .build()
        .expect("Failed to build logger");

    for i in 0..20 {
        info!(logger, "Message {}", i);
    }
    logger.flush().expect("Failed to flush");

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    let expected: String = (0..20).map(|i| format!("INFO Message {}\n", i)).collect();
    assert_eq!(content, expected);
}

#[test]
fn test_async_logging() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("async_test.log");

    let logger = Logger::builder()
        .name("async")
        .pattern("%m%n")
        .sink(FileSink::new(&log_file).expect("Failed to create sink"))
        .async_mode()
        .build()
        .expect("Failed to build logger");

    for i in 0..50 {
        logger.info(format!("Message {}", i));
    }
    logger.flush().expect("Failed to flush");

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 50, "Should have 50 log entries");
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(*line, format!("Message {}", i));
    }
}

#[test]
fn test_async_drop_delivers_pending_lines() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("drop.log");

    {
        let logger = Logger::builder()
            .name("dropped")
            .pattern("%m%n")
            .sink(FileSink::new(&log_file).expect("Failed to create sink"))
            .async_mode()
            .build()
            .expect("Failed to build logger");
        for i in 0..1000 {
            info!(logger, "pending {}", i);
        }
    }

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    assert_eq!(content.lines().count(), 1000);
    assert_eq!(content.lines().last(), Some("pending 999"));
}

#[test]
fn test_fan_out_to_every_sink() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let first = temp_dir.path().join("first.log");
    let second = temp_dir.path().join("second.log");

    let logger = Logger::builder()
        .name("fanout")
        .pattern("%c|%m%n")
        .sink(FileSink::new(&first).expect("Failed to create sink"))
        .sink(FileSink::new(&second).expect("Failed to create sink"))
        .async_mode()
        .build()
        .expect("Failed to build logger");

    logger.error("one");
    logger.fatal("two");
    logger.shutdown().expect("Failed to shut down");

    let expected = "fanout|one\nfanout|two\n";
    assert_eq!(fs::read_to_string(&first).expect("read first"), expected);
    assert_eq!(fs::read_to_string(&second).expect("read second"), expected);
}

#[test]
fn test_oversized_line_leaves_no_trace() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("small.log");

    let logger = Logger::builder()
        .name("small")
        .pattern("%m%n")
        .sink(FileSink::new(&log_file).expect("Failed to create sink"))
        .async_mode()
        .max_buffer_size(64)
        .build()
        .expect("Failed to build logger");

    let long = "x".repeat(99);
    let err = logger
        .try_emit(LogLevel::Info, file!(), line!(), format_args!("{}", long))
        .unwrap_err();
    assert!(matches!(err, LoggerError::CapacityExceeded { requested: 100, max: 64 }));

    logger.flush().expect("Failed to flush");
    assert_eq!(fs::read_to_string(&log_file).expect("read"), "");

    // Raising the ceiling lets the same record through
    logger.set_max_buffer_size(256);
    logger
        .try_emit(LogLevel::Info, file!(), line!(), format_args!("{}", long))
        .expect("Emit after resize failed");
    logger.flush().expect("Failed to flush");
    assert_eq!(fs::read_to_string(&log_file).expect("read").len(), 100);
}

#[test]
fn test_roll_by_size_ten_lines() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let base = temp_dir.path().join("roll");

    let logger = Logger::builder()
        .name("roller")
        .pattern("%m%n")
        .sink(RollBySizeSink::new(&base, 1024).expect("Failed to create sink"))
        .build()
        .expect("Failed to build logger");

    // 199 payload bytes plus the newline
    let lines: Vec<String> = (0..10)
        .map(|i| format!("{:<199}", format!("line-{}", i)))
        .collect();
    for line in &lines {
        logger.info(line);
    }
    logger.flush().expect("Failed to flush");

    let files = files_in(temp_dir.path());
    assert_eq!(files.len(), 2, "files: {:?}", files);

    let mut contents: Vec<String> = files
        .iter()
        .map(|f| fs::read_to_string(f).expect("read rolled file"))
        .collect();
    contents.sort_by_key(|c| !c.starts_with("line-0 "));

    assert_eq!(contents[0].len(), 1000);
    assert!(contents[0].len() <= 1024);
    let expected: String = lines.iter().map(|l| format!("{}\n", l)).collect();
    assert_eq!(contents.concat(), expected);

    for file in &files {
        let name = file.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("roll_"), "unexpected name {}", name);
        assert!(name.ends_with(".log"), "unexpected name {}", name);
    }
}

#[test]
fn test_roll_by_time_secondly() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let base = temp_dir.path().join("ticks");

    let logger = Logger::builder()
        .name("ticker")
        .pattern("%m%n")
        .sink(RollByTimeSink::new(&base, TimeUnit::Secondly).expect("Failed to create sink"))
        .build()
        .expect("Failed to build logger");

    logger.info("at T");
    let next_second =
        TimeUnit::Secondly.floor(chrono::Local::now()) + TimeUnit::Secondly.length();
    while chrono::Local::now() < next_second {
        thread::sleep(Duration::from_millis(20));
    }
    logger.info("at T+1");
    logger.flush().expect("Failed to flush");

    let non_empty: Vec<(PathBuf, String)> = files_in(temp_dir.path())
        .into_iter()
        .map(|f| {
            let content = fs::read_to_string(&f).expect("read bucket file");
            (f, content)
        })
        .filter(|(_, c)| !c.is_empty())
        .collect();

    assert_eq!(non_empty.len(), 2, "files: {:?}", non_empty);
    let mut bodies: Vec<&str> = non_empty.iter().map(|(_, c)| c.as_str()).collect();
    bodies.sort();
    assert_eq!(bodies, vec!["at T\n", "at T+1\n"]);
    for (path, _) in &non_empty {
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("ticks_"));
        assert!(name.ends_with("_0.log"), "unexpected name {}", name);
    }
}

#[test]
fn test_registry_end_to_end() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("registry.log");
    let registry = LoggerRegistry::new();

    let logger = Logger::builder()
        .name("service")
        .pattern("%c %p %m%n")
        .level(LogLevel::Info)
        .sink(FileSink::new(&log_file).expect("Failed to create sink"))
        .async_mode()
        .register(&registry)
        .expect("Failed to register");

    let again = registry.get("service").expect("Logger not registered");
    info!(again, "started");
    logger.debug("filtered");
    registry.shutdown_all();

    assert_eq!(
        fs::read_to_string(&log_file).expect("read"),
        "service INFO started\n"
    );
    assert_eq!(
        registry.names(),
        vec![ROOT_LOGGER_NAME.to_string(), "service".to_string()]
    );
}

#[test]
fn test_invalid_configuration_fails_loudly() {
    assert!(Logger::builder().name("").build().unwrap_err().is_configuration());
    assert!(Logger::builder()
        .name("bad")
        .pattern("[%d{%H:%M")
        .build()
        .unwrap_err()
        .is_configuration());
    assert!(matches!(
        RollBySizeSink::new("anything", 0),
        Err(LoggerError::InvalidConfiguration { .. })
    ));
}
