//! Integration tests for Engine logging system
//!
//! These tests verify the messages the spatial index emits through the
//! global logger: lifecycle at INFO, maintenance at DEBUG, rejected
//! input at ERROR with source location.
//!
//! Run with: cargo test --test logging_integration_tests

use galaxy_3d_spatial::galaxy3d::Engine;
use galaxy_3d_spatial::galaxy3d::log::{Logger, LogEntry, LogSeverity};
use galaxy_3d_spatial::galaxy3d::scene::{AABB, EntryMap, SceneEntity, SpatialIndex};
use galaxy_3d_spatial::glam::Vec3;
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn with_severity(entries: &[LogEntry], severity: LogSeverity) -> Vec<LogEntry> {
    entries.iter().filter(|e| e.severity == severity).cloned().collect()
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_index_creation_is_logged() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    let _index = SpatialIndex::new(256.0, 4).unwrap();

    {
        let captured = entries.lock().unwrap();
        let info = with_severity(&captured, LogSeverity::Info);
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].source, "galaxy3d::SpatialIndex");
        assert!(info[0].message.contains("max depth 4"));
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_invalid_config_logs_error() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    assert!(SpatialIndex::new(-5.0, 2).is_err());

    {
        let captured = entries.lock().unwrap();
        let errors = with_severity(&captured, LogSeverity::Error);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].source, "galaxy3d::OctreeConfig");
        assert!(errors[0].file.is_some());
        assert!(errors[0].line.is_some());
        // No index was created
        assert!(with_severity(&captured, LogSeverity::Info).is_empty());
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_rejected_insert_logs_error_with_location() {
    let mut entries_map = EntryMap::with_key();
    let mut index = SpatialIndex::new(100.0, 2).unwrap();
    let bad = entries_map.insert(SceneEntity::object(AABB::new(
        Vec3::new(0.0, f32::NAN, 0.0),
        Vec3::ONE,
    )));

    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    assert!(index.insert(&mut entries_map, bad).is_err());

    {
        let captured = entries.lock().unwrap();
        assert_eq!(captured.len(), 1);
        let entry = &captured[0];
        assert_eq!(entry.severity, LogSeverity::Error);
        assert_eq!(entry.source, "galaxy3d::SpatialIndex");
        assert!(entry.message.contains("non-finite"));
        assert!(entry.file.is_some_and(|file| file.ends_with("spatial_index.rs")));
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_cleanup_logs_pruned_cells() {
    let mut entries_map = EntryMap::with_key();
    let mut index = SpatialIndex::new(100.0, 3).unwrap();
    let key = entries_map.insert(SceneEntity::object(AABB::cube(Vec3::splat(30.0), 2.0)));
    index.insert(&mut entries_map, key).unwrap();
    index.remove(&mut entries_map, key);

    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    let pruned = index.cleanup();
    assert_eq!(pruned, 3);
    // Nothing left to prune: stays silent
    assert_eq!(index.cleanup(), 0);

    {
        let captured = entries.lock().unwrap();
        let debug = with_severity(&captured, LogSeverity::Debug);
        assert_eq!(debug.len(), 1);
        assert!(debug[0].message.contains("pruned 3"));
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_logger_reset() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    Engine::log(LogSeverity::Warn, "test", "captured".to_string());
    Engine::reset_logger();
    Engine::log(LogSeverity::Warn, "test", "not captured".to_string());

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].message, "captured");
}
