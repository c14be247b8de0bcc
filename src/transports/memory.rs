//! In-memory transport that captures records

use crate::core::{LogRecord, Result, Transport, TransportRef};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Transport that keeps every record it receives
///
/// Clones share the same buffer, so a test can keep one handle and give
/// another to the logger.
///
/// # Example
///
/// ```
/// use rust_log_layer::prelude::*;
///
/// let memory = MemoryTransport::new("memory");
/// let logger = Logger::builder().transport(memory.clone()).build();
///
/// logger.warn("disk almost full");
/// assert_eq!(memory.messages(), vec!["disk almost full".to_string()]);
/// ```
#[derive(Clone)]
pub struct MemoryTransport {
    id: Arc<str>,
    enabled: Arc<AtomicBool>,
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemoryTransport {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Arc::from(id.into()),
            enabled: Arc::new(AtomicBool::new(true)),
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Toggle delivery; a disabled transport receives nothing
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// `message_text()` of every captured record
    pub fn messages(&self) -> Vec<String> {
        self.records.lock().iter().map(LogRecord::message_text).collect()
    }

    /// Composed data of every captured record, `Null` when there was none
    pub fn data(&self) -> Vec<Value> {
        self.records
            .lock()
            .iter()
            .map(|r| r.data().cloned().map_or(Value::Null, Value::Object))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Transport for MemoryTransport {
    fn id(&self) -> &str {
        &self.id
    }

    fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    fn send(&self, record: &LogRecord) -> Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

impl From<MemoryTransport> for TransportRef {
    fn from(transport: MemoryTransport) -> Self {
        TransportRef::new(transport)
    }
}
