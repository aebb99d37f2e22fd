use parking_lot::RwLock;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::info;

use super::TelemetrySink;
use crate::error::TelemetryError;

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn publish(&self, _topic: &str, _payload: &Value) -> Result<(), TelemetryError> {
        Ok(())
    }
}

/// Offline mode: every record goes to the log under the `telemetry` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn publish(&self, topic: &str, payload: &Value) -> Result<(), TelemetryError> {
        info!(target: "telemetry", topic, %payload, "publish");
        Ok(())
    }
}

// ============================================================================
// RECORDING SINK - Bounded in-memory history, shared between clones
// ============================================================================

#[derive(Clone)]
pub struct RecordingSink {
    entries: Arc<RwLock<VecDeque<(String, Value)>>>,
    max_size: usize,
}

impl RecordingSink {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(max_size.min(4096)))),
            max_size: max_size.max(1),
        }
    }

    pub fn read_all(&self) -> Vec<(String, Value)> {
        self.entries.read().iter().cloned().collect()
    }

    /// Payloads published on `topic`, oldest first.
    pub fn on_topic(&self, topic: &str) -> Vec<Value> {
        self.entries
            .read()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl TelemetrySink for RecordingSink {
    fn publish(&self, topic: &str, payload: &Value) -> Result<(), TelemetryError> {
        let mut log = self.entries.write();
        log.push_back((topic.to_string(), payload.clone()));
        if log.len() > self.max_size {
            log.pop_front();
        }
        Ok(())
    }
}
