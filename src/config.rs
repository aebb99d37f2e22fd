// Configuration loading and validation
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::alert::AlertConfig;
use crate::controller::{crac_controller_config, DEFAULT_FALLBACK_OUTPUT};
use crate::error::ConfigError;
use crate::fuzzy::{ControllerConfig, Universe};
use crate::plant::{DisturbanceConfig, PlantModel};
use crate::telemetry::TelemetryConfig;

/// Physically plausible temperature band the plant output is clamped to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureClamp {
    pub min: f64,
    pub max: f64,
}

impl TemperatureClamp {
    pub fn apply(&self, temperature: f64) -> f64 {
        temperature.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub setpoint: f64,
    /// Minutes before the minute counter wraps to 0.
    pub horizon: u32,
    /// Seed for the disturbance random source.
    pub seed: u64,
    pub fallback_output: f64,
    /// Overrides the output universe step of the controller.
    pub output_resolution: Option<f64>,
    pub temperature_clamp: Option<TemperatureClamp>,
    pub plant: PlantModel,
    pub disturbances: DisturbanceConfig,
    pub alerts: AlertConfig,
    pub telemetry: TelemetryConfig,
    /// Replaces the built-in CRAC rule base when present.
    pub controller: Option<ControllerConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            setpoint: 22.0,
            horizon: 1440,
            seed: 42,
            fallback_output: DEFAULT_FALLBACK_OUTPUT,
            output_resolution: None,
            temperature_clamp: None,
            plant: PlantModel::default(),
            disturbances: DisturbanceConfig::default(),
            alerts: AlertConfig::default(),
            telemetry: TelemetryConfig::default(),
            controller: None,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.setpoint.is_finite() {
            return Err(ConfigError::Invalid("setpoint must be finite".into()));
        }
        if self.horizon == 0 {
            return Err(ConfigError::Invalid("horizon must be positive".into()));
        }
        if let Some(step) = self.output_resolution {
            let output = match &self.controller {
                Some(controller) => controller.output.universe,
                None => crac_controller_config().output.universe,
            };
            Universe { resolution: step, ..output }
                .validate()
                .map_err(|reason| ConfigError::Invalid(format!("output_resolution: {}", reason)))?;
        }
        if let Some(clamp) = self.temperature_clamp {
            if !(clamp.min < clamp.max) {
                return Err(ConfigError::Invalid(format!(
                    "temperature_clamp min {} must be below max {}",
                    clamp.min, clamp.max
                )));
            }
        }
        if self.telemetry.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "telemetry.channel_capacity must be positive".into(),
            ));
        }
        self.plant.validate()?;
        self.disturbances.validate()?;
        self.alerts.validate()?;
        Ok(())
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

/// Reads and validates a TOML config file.
pub fn load_config(path: impl AsRef<Path>) -> Result<SimulationConfig, ConfigError> {
    let s = std::fs::read_to_string(path)?;
    SimulationConfig::from_toml_str(&s)
}

/// Like `load_config`, but logs the problem and falls back to defaults.
pub fn load_or_default(path: impl AsRef<Path>) -> SimulationConfig {
    let path = path.as_ref();
    match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "using default configuration");
            SimulationConfig::default()
        }
    }
}
