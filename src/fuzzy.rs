//! Fuzzy module - Membership functions, linguistic variables, rules and inference

pub mod engine;
pub mod membership;
pub mod rule;
pub mod variable;

pub use engine::{ControllerConfig, InferenceEngine, InferenceTrace};
pub use membership::MembershipFunction;
pub use rule::{Antecedent, Rule};
pub use variable::{LinguisticVariable, Term, Universe};
