use serde::{Deserialize, Serialize};

/// Record emitted once per tick. `temperature` is the plant output of the
/// tick; `error` and `error_delta` are what the controller saw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationState {
    pub minute: u32,
    pub temperature: f64,
    pub error: f64,
    pub error_delta: f64,
    pub control_output: f64,
    pub thermal_load: f64,
    pub external_temp: f64,
}

/// Mutable part of the closed loop carried from one tick to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopState {
    pub minute: u32,
    pub temperature: f64,
    pub previous_error: f64,
}

impl LoopState {
    /// Start of a run: minute 0, at the setpoint, no error history.
    pub fn initial(setpoint: f64) -> Self {
        Self {
            minute: 0,
            temperature: setpoint,
            previous_error: 0.0,
        }
    }
}
