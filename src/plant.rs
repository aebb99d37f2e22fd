//! Plant module - Room thermal model and the disturbances acting on it

pub mod disturbance;
pub mod model;

pub use disturbance::{DisturbanceConfig, DisturbanceProfile, DisturbanceSample, LoadBand};
pub use model::PlantModel;
