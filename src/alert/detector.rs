use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use super::window::RollingWindow;
use crate::error::ConfigError;
use crate::simulation::SimulationState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub high_threshold: f64,
    pub low_threshold: f64,
    pub sustained_window: usize,
    pub sustained_threshold: f64,
    pub oscillation_window: usize,
    pub oscillation_threshold: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            high_threshold: 26.0,
            low_threshold: 18.0,
            sustained_window: 10,
            sustained_threshold: 90.0,
            oscillation_window: 5,
            oscillation_threshold: 1.5,
        }
    }
}

impl AlertConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.low_threshold < self.high_threshold) {
            return Err(ConfigError::Invalid(format!(
                "alerts.low_threshold {} must be below alerts.high_threshold {}",
                self.low_threshold, self.high_threshold
            )));
        }
        if self.sustained_window == 0 {
            return Err(ConfigError::Invalid("alerts.sustained_window must be positive".into()));
        }
        if self.oscillation_window < 2 {
            return Err(ConfigError::Invalid(
                "alerts.oscillation_window needs at least two samples".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    HighTemperature,
    LowTemperature,
    SustainedOutput,
    Oscillation,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::HighTemperature => write!(f, "HIGH_TEMPERATURE"),
            AlertKind::LowTemperature => write!(f, "LOW_TEMPERATURE"),
            AlertKind::SustainedOutput => write!(f, "SUSTAINED_OUTPUT"),
            AlertKind::Oscillation => write!(f, "OSCILLATION"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub minute: u32,
    /// Temperature for threshold alerts, control output for sustained output,
    /// largest consecutive jump for oscillation.
    pub measurement: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TemperatureBand {
    Normal,
    High,
    Low,
}

// ============================================================================
// ALERT DETECTOR - Rolling-window checks over the emitted state stream
// ============================================================================

#[derive(Debug, Clone)]
pub struct AlertDetector {
    config: AlertConfig,
    band: TemperatureBand,
    sustained_armed: bool,
    outputs: RollingWindow,
    temperatures: RollingWindow,
}

impl AlertDetector {
    pub fn new(config: AlertConfig) -> Self {
        Self {
            outputs: RollingWindow::new(config.sustained_window),
            temperatures: RollingWindow::new(config.oscillation_window),
            band: TemperatureBand::Normal,
            sustained_armed: true,
            config,
        }
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Feeds one state and returns the alerts it raises, in a fixed order:
    /// threshold, sustained output, oscillation.
    pub fn observe(&mut self, state: &SimulationState) -> Vec<AlertEvent> {
        let mut alerts = Vec::new();

        if let Some(kind) = self.check_threshold(state.temperature) {
            alerts.push(AlertEvent {
                kind,
                minute: state.minute,
                measurement: state.temperature,
            });
        }

        if self.check_sustained(state.control_output) {
            alerts.push(AlertEvent {
                kind: AlertKind::SustainedOutput,
                minute: state.minute,
                measurement: state.control_output,
            });
        }

        if let Some(jump) = self.check_oscillation(state.temperature) {
            alerts.push(AlertEvent {
                kind: AlertKind::Oscillation,
                minute: state.minute,
                measurement: jump,
            });
        }

        for alert in &alerts {
            info!(kind = %alert.kind, minute = alert.minute, measurement = alert.measurement, "alert raised");
        }
        alerts
    }

    /// Edge-triggered: fires on entering an abnormal band, re-arms in the normal band.
    fn check_threshold(&mut self, temperature: f64) -> Option<AlertKind> {
        let band = if temperature > self.config.high_threshold {
            TemperatureBand::High
        } else if temperature < self.config.low_threshold {
            TemperatureBand::Low
        } else {
            TemperatureBand::Normal
        };
        let previous = std::mem::replace(&mut self.band, band);
        match band {
            TemperatureBand::High if previous != TemperatureBand::High => {
                Some(AlertKind::HighTemperature)
            }
            TemperatureBand::Low if previous != TemperatureBand::Low => {
                Some(AlertKind::LowTemperature)
            }
            _ => None,
        }
    }

    /// Latched: fires once when the window saturates, re-arms when it no longer is.
    fn check_sustained(&mut self, control_output: f64) -> bool {
        self.outputs.push(control_output);
        let saturated =
            self.outputs.is_full() && self.outputs.all_at_least(self.config.sustained_threshold);
        if !saturated {
            self.sustained_armed = true;
            return false;
        }
        std::mem::replace(&mut self.sustained_armed, false)
    }

    fn check_oscillation(&mut self, temperature: f64) -> Option<f64> {
        self.temperatures.push(temperature);
        if !self.temperatures.is_full() {
            return None;
        }
        self.temperatures
            .max_step()
            .filter(|jump| *jump >= self.config.oscillation_threshold)
    }

    /// Drops every buffered sample and re-arms all alerts.
    pub fn reset(&mut self) {
        self.band = TemperatureBand::Normal;
        self.sustained_armed = true;
        self.outputs.clear();
        self.temperatures.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(minute: u32, temperature: f64, control_output: f64) -> SimulationState {
        SimulationState {
            minute,
            temperature,
            error: temperature - 22.0,
            error_delta: 0.0,
            control_output,
            thermal_load: 50.0,
            external_temp: 22.0,
        }
    }

    fn kinds(alerts: &[AlertEvent]) -> Vec<AlertKind> {
        alerts.iter().map(|a| a.kind).collect()
    }

    #[test]
    fn high_temperature_fires_once_per_excursion() {
        let mut det = AlertDetector::new(AlertConfig::default());
        let temps = [22.0, 26.5, 26.8, 26.6, 25.9, 26.2];
        let fired: Vec<usize> = temps
            .iter()
            .enumerate()
            .filter(|(i, t)| {
                det.observe(&state(*i as u32, **t, 50.0))
                    .iter()
                    .any(|a| a.kind == AlertKind::HighTemperature)
            })
            .map(|(i, _)| i)
            .collect();
        assert_eq!(fired, vec![1, 5]);
    }

    #[test]
    fn direct_swing_to_low_fires_low() {
        let mut det = AlertDetector::new(AlertConfig::default());
        assert_eq!(kinds(&det.observe(&state(0, 27.0, 50.0))), vec![AlertKind::HighTemperature]);
        assert_eq!(kinds(&det.observe(&state(1, 17.0, 50.0))), vec![AlertKind::LowTemperature]);
        assert!(det.observe(&state(2, 17.5, 50.0)).is_empty());
    }

    #[test]
    fn sustained_output_rearms_after_break() {
        let mut det = AlertDetector::new(AlertConfig::default());
        let mut fired = Vec::new();
        let outputs = std::iter::repeat(95.0)
            .take(12)
            .chain(std::iter::once(60.0))
            .chain(std::iter::repeat(92.0).take(10));
        for (minute, out) in outputs.enumerate() {
            let alerts = det.observe(&state(minute as u32, 22.0, out));
            if alerts.iter().any(|a| a.kind == AlertKind::SustainedOutput) {
                fired.push(minute);
            }
        }
        // the dip at 12 keeps the window unsaturated until 12 + 10
        assert_eq!(fired, vec![9, 22]);
    }

    #[test]
    fn oscillation_needs_a_full_window() {
        let mut det = AlertDetector::new(AlertConfig::default());
        let temps = [22.0, 24.0, 22.0, 22.1];
        for (i, t) in temps.iter().enumerate() {
            assert!(det.observe(&state(i as u32, *t, 50.0)).is_empty());
        }
        let alerts = det.observe(&state(4, 22.2, 50.0));
        assert_eq!(kinds(&alerts), vec![AlertKind::Oscillation]);
        assert_eq!(alerts[0].measurement, 2.0);
    }

    #[test]
    fn reset_rearms_everything() {
        let mut det = AlertDetector::new(AlertConfig::default());
        for minute in 0..10 {
            det.observe(&state(minute, 27.0, 95.0));
        }
        det.reset();
        let mut kinds_seen = Vec::new();
        for minute in 0..10 {
            kinds_seen.extend(kinds(&det.observe(&state(minute, 27.0, 95.0))));
        }
        assert_eq!(
            kinds_seen,
            vec![AlertKind::HighTemperature, AlertKind::SustainedOutput]
        );
    }
}
