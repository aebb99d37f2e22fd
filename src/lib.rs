pub mod alert;
pub mod config;
pub mod controller;
pub mod error;
pub mod fuzzy;
pub mod logging;
pub mod metrics;
pub mod plant;
pub mod runtime;
pub mod simulation;
pub mod telemetry;

pub use alert::{AlertConfig, AlertDetector, AlertEvent, AlertKind};
pub use config::{load_config, SimulationConfig};
pub use controller::{crac_controller_config, FuzzyController};
pub use error::{ConfigError, ControlError, InferenceError, TelemetryError};
pub use fuzzy::{ControllerConfig, InferenceEngine, MembershipFunction};
pub use plant::{DisturbanceConfig, DisturbanceProfile, PlantModel};
pub use simulation::{Simulation, SimulationHandle, SimulationState};
pub use telemetry::{TelemetrySink, Topics};
