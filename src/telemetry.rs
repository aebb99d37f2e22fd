//! Telemetry module - Best-effort publication of states and alerts

pub mod channel;
pub mod publisher;
pub mod sink;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TelemetryError;

pub use channel::{spawn_forwarder, ChannelSink, Envelope};
pub use publisher::Publisher;
pub use sink::{LogSink, NullSink, RecordingSink};

/// Destination for structured telemetry records.
///
/// Implementations may fail; callers on the simulation path never propagate
/// those failures.
pub trait TelemetrySink: Send {
    fn publish(&self, topic: &str, payload: &Value) -> Result<(), TelemetryError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub topic_prefix: String,
    /// Queue depth between the simulation and a forwarder thread.
    pub channel_capacity: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            topic_prefix: "datacenter/fuzzy".to_string(),
            channel_capacity: 256,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    pub control: String,
    pub temperature: String,
    pub alert: String,
}

impl Topics {
    pub fn with_prefix(prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches('/');
        Self {
            control: format!("{}/control", prefix),
            temperature: format!("{}/temp", prefix),
            alert: format!("{}/alert", prefix),
        }
    }
}

impl Default for Topics {
    fn default() -> Self {
        Self::with_prefix(&TelemetryConfig::default().topic_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics_from_prefix() {
        let topics = Topics::with_prefix("site-a/crac/");
        assert_eq!(topics.control, "site-a/crac/control");
        assert_eq!(topics.temperature, "site-a/crac/temp");
        assert_eq!(topics.alert, "site-a/crac/alert");
        assert_eq!(Topics::default().alert, "datacenter/fuzzy/alert");
    }
}
