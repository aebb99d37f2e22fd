use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use super::TelemetrySink;
use crate::error::TelemetryError;

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub topic: String,
    pub payload: Value,
}

/// Non-blocking hand-off to a forwarder thread. A full queue is reported as
/// an unavailable sink instead of stalling the tick.
#[derive(Clone)]
pub struct ChannelSink {
    tx: Sender<Envelope>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, Receiver<Envelope>) {
        let (tx, rx) = bounded(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl TelemetrySink for ChannelSink {
    fn publish(&self, topic: &str, payload: &Value) -> Result<(), TelemetryError> {
        let envelope = Envelope {
            topic: topic.to_string(),
            payload: payload.clone(),
        };
        self.tx.try_send(envelope).map_err(|e| match e {
            TrySendError::Full(_) => TelemetryError::SinkUnavailable("queue full".into()),
            TrySendError::Disconnected(_) => {
                TelemetryError::SinkUnavailable("forwarder disconnected".into())
            }
        })
    }
}

/// Drains `rx` into `downstream` until every sender is dropped or `shutdown`
/// is set. Records already queued when `shutdown` is seen are still
/// forwarded. Returns the number of records forwarded.
pub fn spawn_forwarder(
    rx: Receiver<Envelope>,
    downstream: Box<dyn TelemetrySink>,
    shutdown: Arc<AtomicBool>,
) -> thread::JoinHandle<u64> {
    thread::spawn(move || {
        let mut forwarded = 0u64;
        loop {
            if shutdown.load(Ordering::Relaxed) {
                // hand over what is already queued, then stop
                for envelope in rx.try_iter() {
                    forward(downstream.as_ref(), &envelope, &mut forwarded);
                }
                debug!(forwarded, "telemetry forwarder shutting down");
                break;
            }

            // timeout lets the shutdown flag be observed
            let envelope = match rx.recv_timeout(Duration::from_millis(100)) {
                Ok(e) => e,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };

            forward(downstream.as_ref(), &envelope, &mut forwarded);
        }
        forwarded
    })
}

fn forward(downstream: &dyn TelemetrySink, envelope: &Envelope, forwarded: &mut u64) {
    match downstream.publish(&envelope.topic, &envelope.payload) {
        Ok(()) => *forwarded += 1,
        Err(e) => warn!(topic = %envelope.topic, error = %e, "downstream publish failed"),
    }
}
