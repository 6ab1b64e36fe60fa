//! Unit tests for log.rs
//!
//! Tests Logger trait, LogEntry, LogSeverity, and DefaultLogger filtering/formatting.

use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

fn make_entry(severity: LogSeverity, message: &str) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "galaxy3d::SpatialIndex".to_string(),
        message: message.to_string(),
        file: None,
        line: None,
    }
}

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_debug() {
    assert_eq!(format!("{:?}", LogSeverity::Trace), "Trace");
    assert_eq!(format!("{:?}", LogSeverity::Error), "Error");
}

// ============================================================================
// LOG ENTRY TESTS
// ============================================================================

#[test]
fn test_log_entry_with_file_line() {
    let entry = LogEntry {
        severity: LogSeverity::Error,
        timestamp: SystemTime::now(),
        source: "galaxy3d::SpatialIndex".to_string(),
        message: "Non-finite AABB".to_string(),
        file: Some("spatial_index.rs"),
        line: Some(42),
    };

    let cloned = entry.clone();
    assert_eq!(cloned.severity, LogSeverity::Error);
    assert_eq!(cloned.file, Some("spatial_index.rs"));
    assert_eq!(cloned.line, Some(42));
}

// ============================================================================
// DEFAULT LOGGER TESTS
// ============================================================================

#[test]
fn test_default_logger_threshold_is_info() {
    let logger = DefaultLogger::default();
    assert_eq!(logger.min_severity(), LogSeverity::Info);
    assert!(!logger.accepts(LogSeverity::Trace));
    assert!(!logger.accepts(LogSeverity::Debug));
    assert!(logger.accepts(LogSeverity::Info));
    assert!(logger.accepts(LogSeverity::Error));
}

#[test]
fn test_default_logger_custom_threshold() {
    let logger = DefaultLogger::with_min_severity(LogSeverity::Trace);
    assert!(logger.accepts(LogSeverity::Trace));

    let logger = DefaultLogger::with_min_severity(LogSeverity::Error);
    assert!(!logger.accepts(LogSeverity::Warn));
}

#[test]
fn test_default_logger_all_severities_do_not_panic() {
    let logger = DefaultLogger::with_min_severity(LogSeverity::Trace);
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        logger.log(&make_entry(severity, "message"));
    }
}

#[test]
fn test_format_entry_without_location() {
    colored::control::set_override(false);
    let line = DefaultLogger::format_entry(&make_entry(LogSeverity::Info, "index created"));
    assert!(line.contains("[INFO ]"));
    assert!(line.contains("[galaxy3d::SpatialIndex]"));
    assert!(line.ends_with("index created"));
}

#[test]
fn test_format_entry_with_location() {
    colored::control::set_override(false);
    let mut entry = make_entry(LogSeverity::Error, "bad bounds");
    entry.file = Some("spatial_index.rs");
    entry.line = Some(7);

    let line = DefaultLogger::format_entry(&entry);
    assert!(line.contains("[ERROR]"));
    assert!(line.ends_with("bad bounds (spatial_index.rs:7)"));
}

// ============================================================================
// CUSTOM LOGGER TESTS
// ============================================================================

struct CountingLogger {
    count: Arc<Mutex<usize>>,
}

impl Logger for CountingLogger {
    fn log(&self, _entry: &LogEntry) {
        *self.count.lock().unwrap() += 1;
    }
}

#[test]
fn test_custom_logger_implementation() {
    let count = Arc::new(Mutex::new(0));
    let logger = CountingLogger { count: count.clone() };

    logger.log(&make_entry(LogSeverity::Debug, "a"));
    logger.log(&make_entry(LogSeverity::Debug, "b"));

    assert_eq!(*count.lock().unwrap(), 2);
}

#[test]
fn test_logger_trait_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DefaultLogger>();
    assert_send_sync::<CountingLogger>();
}
