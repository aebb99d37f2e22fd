//! Simulation module - Closed-loop stepping of controller, plant and alerts

pub mod shared;
pub mod state;
pub mod stepper;

pub use shared::SimulationHandle;
pub use state::{LoopState, SimulationState};
pub use stepper::{advance, build_controller, LoopParams, Simulation, TickContext, TickOutcome};
