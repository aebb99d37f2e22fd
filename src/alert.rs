//! Alert module - Threshold, sustained-output and oscillation detection

pub mod detector;
pub mod window;

pub use detector::{AlertConfig, AlertDetector, AlertEvent, AlertKind};
pub use window::RollingWindow;
