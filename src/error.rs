//! Error types for controller construction, inference, configuration and telemetry

use std::io;
use thiserror::Error;

/// Failures detected while building a controller. All of them are fatal at startup.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    #[error("rule #{rule} references undefined term `{label}` of variable `{variable}`")]
    MalformedRule {
        rule: usize,
        variable: String,
        label: String,
    },

    #[error("invalid universe for `{variable}`: {reason}")]
    InvalidUniverse { variable: String, reason: String },

    #[error("invalid membership function `{variable}.{label}`: {reason}")]
    InvalidMembership {
        variable: String,
        label: String,
        reason: String,
    },

    #[error("variable `{0}` is defined more than once")]
    DuplicateVariable(String),

    #[error("term `{label}` is defined more than once in `{variable}`")]
    DuplicateTerm { variable: String, label: String },

    #[error("controller expects {expected} input variables, config defines {got}")]
    InputArity { expected: usize, got: usize },

    #[error("output universe [{min}, {max}] exceeds the cooling power range [0, 100]")]
    OutputRange { min: f64, max: f64 },

    #[error("fallback output {value} lies outside the output universe [{min}, {max}]")]
    FallbackOutOfRange { value: f64, min: f64, max: f64 },
}

/// Runtime outcomes of a single inference call on the raw engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InferenceError {
    /// Every rule had zero firing strength, the centroid is undefined.
    #[error("no rule fired, aggregated output set is empty")]
    NoRuleFired,

    #[error("input for `{variable}` is not a finite number")]
    NonFiniteInput { variable: String },

    #[error("expected {expected} crisp inputs, got {got}")]
    InputArity { expected: usize, got: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Controller(#[from] ControlError),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TelemetryError {
    #[error("telemetry sink unavailable: {0}")]
    SinkUnavailable(String),
}
