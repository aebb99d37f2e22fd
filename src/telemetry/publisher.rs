use serde_json::{json, Value};
use tracing::warn;

use super::{TelemetrySink, Topics};
use crate::alert::AlertEvent;
use crate::simulation::SimulationState;

/// Routes states and alerts to their topics. Failures are logged and counted,
/// never returned.
pub struct Publisher {
    sink: Box<dyn TelemetrySink>,
    topics: Topics,
    failures: u64,
}

impl Publisher {
    pub fn new(sink: Box<dyn TelemetrySink>, topics: Topics) -> Self {
        Self {
            sink,
            topics,
            failures: 0,
        }
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    /// Total failed publishes since construction.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Publishes one tick's records. Returns how many of them failed.
    pub fn publish_tick(&mut self, state: &SimulationState, alerts: &[AlertEvent]) -> u64 {
        let before = self.failures;

        let topic = self.topics.control.clone();
        match serde_json::to_value(state) {
            Ok(record) => self.send(&topic, &record),
            Err(e) => self.record_failure(&topic, &e.to_string()),
        }

        let topic = self.topics.temperature.clone();
        self.send(
            &topic,
            &json!({ "minute": state.minute, "temperature": state.temperature }),
        );

        let topic = self.topics.alert.clone();
        for alert in alerts {
            match serde_json::to_value(alert) {
                Ok(record) => self.send(&topic, &record),
                Err(e) => self.record_failure(&topic, &e.to_string()),
            }
        }

        self.failures - before
    }

    fn send(&mut self, topic: &str, payload: &Value) {
        if let Err(e) = self.sink.publish(topic, payload) {
            self.record_failure(topic, &e.to_string());
        }
    }

    fn record_failure(&mut self, topic: &str, reason: &str) {
        self.failures += 1;
        warn!(topic, reason, total_failures = self.failures, "telemetry publish dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertKind;
    use crate::error::TelemetryError;
    use crate::telemetry::RecordingSink;

    struct Broken;

    impl TelemetrySink for Broken {
        fn publish(&self, _topic: &str, _payload: &Value) -> Result<(), TelemetryError> {
            Err(TelemetryError::SinkUnavailable("broker down".into()))
        }
    }

    fn sample_state() -> SimulationState {
        SimulationState {
            minute: 3,
            temperature: 23.5,
            error: 1.0,
            error_delta: 0.5,
            control_output: 55.0,
            thermal_load: 40.0,
            external_temp: 21.0,
        }
    }

    #[test]
    fn routes_records_to_topics() {
        let sink = RecordingSink::new(16);
        let mut publisher = Publisher::new(Box::new(sink.clone()), Topics::default());
        let alert = AlertEvent {
            kind: AlertKind::Oscillation,
            minute: 3,
            measurement: 1.7,
        };
        assert_eq!(publisher.publish_tick(&sample_state(), &[alert]), 0);

        let control = sink.on_topic("datacenter/fuzzy/control");
        assert_eq!(control[0]["controlOutput"], 55.0);
        assert_eq!(control[0]["errorDelta"], 0.5);
        let temp = sink.on_topic("datacenter/fuzzy/temp");
        assert_eq!(temp[0], json!({ "minute": 3, "temperature": 23.5 }));
        let alerts = sink.on_topic("datacenter/fuzzy/alert");
        assert_eq!(alerts[0]["kind"], "OSCILLATION");
    }

    #[test]
    fn keeps_configured_topics() {
        let publisher = Publisher::new(Box::new(RecordingSink::new(4)), Topics::with_prefix("site-b"));
        assert_eq!(publisher.topics().control, "site-b/control");
        assert_eq!(publisher.topics().alert, "site-b/alert");
    }

    #[test]
    fn failures_are_counted_not_raised() {
        let mut publisher = Publisher::new(Box::new(Broken), Topics::default());
        assert_eq!(publisher.publish_tick(&sample_state(), &[]), 2);
        assert_eq!(publisher.failures(), 2);
    }
}
