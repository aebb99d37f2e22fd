use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Discrete-time thermal model of the room:
///
/// `T[n+1] = retention*T[n] + cooling_gain*P + load_gain*Q + external_gain*Text + offset`
///
/// Stateless and unclamped. The defaults give a stable fixed point near 24 °C
/// at 50 % cooling and 50 % load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantModel {
    pub retention: f64,
    pub cooling_gain: f64,
    pub load_gain: f64,
    pub external_gain: f64,
    pub offset: f64,
}

impl Default for PlantModel {
    fn default() -> Self {
        Self {
            retention: 0.9,
            cooling_gain: -0.08,
            load_gain: 0.05,
            external_gain: 0.02,
            offset: 3.5,
        }
    }
}

impl PlantModel {
    /// Every coefficient must be a finite number.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let coefficients = [
            ("retention", self.retention),
            ("cooling_gain", self.cooling_gain),
            ("load_gain", self.load_gain),
            ("external_gain", self.external_gain),
            ("offset", self.offset),
        ];
        match coefficients.iter().find(|(_, v)| !v.is_finite()) {
            Some((name, value)) => Err(ConfigError::Invalid(format!(
                "plant.{} must be finite, got {}",
                name, value
            ))),
            None => Ok(()),
        }
    }

    pub fn next_temperature(
        &self,
        temperature: f64,
        control_output: f64,
        thermal_load: f64,
        external_temp: f64,
    ) -> f64 {
        self.retention * temperature
            + self.cooling_gain * control_output
            + self.load_gain * thermal_load
            + self.external_gain * external_temp
            + self.offset
    }

    /// Temperature at which the plant stays put for constant inputs, if the
    /// recurrence is contracting.
    pub fn fixed_point(&self, control_output: f64, thermal_load: f64, external_temp: f64) -> Option<f64> {
        if self.retention.abs() >= 1.0 {
            return None;
        }
        let drive = self.cooling_gain * control_output
            + self.load_gain * thermal_load
            + self.external_gain * external_temp
            + self.offset;
        Some(drive / (1.0 - self.retention))
    }
}
