//! Controller module - Fuzzy CRAC controller with explicit fallback policy

pub mod rulebase;

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use crate::error::{ControlError, InferenceError};
use crate::fuzzy::{ControllerConfig, InferenceEngine, InferenceTrace};

pub use rulebase::crac_controller_config;

/// Control output used when inference degenerates: the midpoint of 0..100.
pub const DEFAULT_FALLBACK_OUTPUT: f64 = 50.0;

/// Cooling power bounds in percent. Output universes must stay inside them.
pub const OUTPUT_MIN: f64 = 0.0;
pub const OUTPUT_MAX: f64 = 100.0;

const INPUT_COUNT: usize = 4;

// ============================================================================
// FUZZY CONTROLLER - Four named inputs, one crisp cooling power
// ============================================================================

/// Built once, then shared read-only by every tick and by direct `infer` calls.
#[derive(Debug)]
pub struct FuzzyController {
    engine: InferenceEngine,
    fallback_output: f64,
    fallbacks: AtomicU64,
}

impl FuzzyController {
    /// Builds the controller. A malformed rule base aborts construction.
    pub fn new(config: ControllerConfig, fallback_output: f64) -> Result<Self, ControlError> {
        if config.inputs.len() != INPUT_COUNT {
            return Err(ControlError::InputArity {
                expected: INPUT_COUNT,
                got: config.inputs.len(),
            });
        }
        let engine = InferenceEngine::new(config)?;
        let universe = engine.config().output.universe;
        if universe.min < OUTPUT_MIN || universe.max > OUTPUT_MAX {
            return Err(ControlError::OutputRange {
                min: universe.min,
                max: universe.max,
            });
        }
        if !universe.contains(fallback_output) {
            return Err(ControlError::FallbackOutOfRange {
                value: fallback_output,
                min: universe.min,
                max: universe.max,
            });
        }
        Ok(Self {
            engine,
            fallback_output,
            fallbacks: AtomicU64::new(0),
        })
    }

    /// Default CRAC rule base, optionally with a different output grid step.
    pub fn crac(output_resolution: Option<f64>) -> Result<Self, ControlError> {
        let mut config = crac_controller_config();
        if let Some(step) = output_resolution {
            config.output.universe.resolution = step;
        }
        Self::new(config, DEFAULT_FALLBACK_OUTPUT)
    }

    /// Cooling power for the given inputs. Never fails: a degenerate inference
    /// yields the fallback output and is counted.
    pub fn infer(&self, error: f64, error_delta: f64, external_temp: f64, thermal_load: f64) -> f64 {
        match self.try_infer(error, error_delta, external_temp, thermal_load) {
            Ok(output) => output,
            Err(reason) => {
                let total = self.fallbacks.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    %reason,
                    error,
                    error_delta,
                    external_temp,
                    thermal_load,
                    fallback = self.fallback_output,
                    total_fallbacks = total,
                    "inference degenerated, applying fallback output"
                );
                self.fallback_output
            }
        }
    }

    /// Raw inference without the fallback policy.
    pub fn try_infer(
        &self,
        error: f64,
        error_delta: f64,
        external_temp: f64,
        thermal_load: f64,
    ) -> Result<f64, InferenceError> {
        self.engine
            .infer(&[error, error_delta, external_temp, thermal_load])
    }

    pub fn trace(
        &self,
        error: f64,
        error_delta: f64,
        external_temp: f64,
        thermal_load: f64,
    ) -> Result<InferenceTrace, InferenceError> {
        self.engine
            .trace(&[error, error_delta, external_temp, thermal_load])
    }

    /// Number of inferences answered by the fallback policy so far.
    pub fn fallback_count(&self) -> u64 {
        self.fallbacks.load(Ordering::Relaxed)
    }

    pub fn fallback_output(&self) -> f64 {
        self.fallback_output
    }

    pub fn config(&self) -> &ControllerConfig {
        self.engine.config()
    }
}
