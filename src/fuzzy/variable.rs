use serde::{Deserialize, Serialize};

use super::membership::MembershipFunction;
use crate::error::ControlError;

/// Upper bound on the number of grid points a universe may sample.
pub const MAX_GRID_POINTS: f64 = 1_000_000.0;

/// Closed numeric domain of a linguistic variable, sampled every `resolution`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    pub min: f64,
    pub max: f64,
    pub resolution: f64,
}

impl Universe {
    pub fn new(min: f64, max: f64, resolution: f64) -> Self {
        Self { min, max, resolution }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err("bounds must be finite".to_string());
        }
        if self.min >= self.max {
            return Err(format!("min {} must be below max {}", self.min, self.max));
        }
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(format!("resolution must be positive, got {}", self.resolution));
        }
        if self.resolution > self.max - self.min {
            return Err(format!(
                "resolution {} is wider than the universe",
                self.resolution
            ));
        }
        if (self.max - self.min) / self.resolution > MAX_GRID_POINTS {
            return Err(format!(
                "resolution {} yields more than {} grid points",
                self.resolution, MAX_GRID_POINTS
            ));
        }
        Ok(())
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.min && x <= self.max
    }

    pub fn clamp(&self, x: f64) -> f64 {
        x.clamp(self.min, self.max)
    }

    /// Discretization grid from `min` to `max` inclusive.
    ///
    /// Points are computed as `min + i * resolution` to avoid accumulating
    /// rounding error; the last point is pinned to `max` when the step divides
    /// the span.
    pub fn samples(&self) -> Vec<f64> {
        let span = (self.max - self.min) / self.resolution;
        let steps = (span + 1e-9).floor() as usize;
        let mut grid: Vec<f64> = (0..=steps)
            .map(|i| self.min + i as f64 * self.resolution)
            .collect();
        if let Some(last) = grid.last_mut() {
            if (*last - self.max).abs() < self.resolution * 1e-6 {
                *last = self.max;
            }
        }
        grid
    }
}

/// A labeled fuzzy set of a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub label: String,
    pub membership: MembershipFunction,
}

/// A named universe partitioned into labeled terms. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinguisticVariable {
    pub name: String,
    pub universe: Universe,
    pub terms: Vec<Term>,
}

impl LinguisticVariable {
    pub fn new(name: impl Into<String>, universe: Universe) -> Self {
        Self {
            name: name.into(),
            universe,
            terms: Vec::new(),
        }
    }

    /// Builder-style term registration.
    pub fn with_term(mut self, label: impl Into<String>, membership: MembershipFunction) -> Self {
        self.terms.push(Term {
            label: label.into(),
            membership,
        });
        self
    }

    pub fn term_index(&self, label: &str) -> Option<usize> {
        self.terms.iter().position(|t| t.label == label)
    }

    pub fn term(&self, label: &str) -> Option<&Term> {
        self.terms.iter().find(|t| t.label == label)
    }

    /// Degree of every term at `x`, in term order. `x` is clamped to the universe.
    pub fn fuzzify(&self, x: f64) -> Vec<f64> {
        let x = self.universe.clamp(x);
        self.terms.iter().map(|t| t.membership.evaluate(x)).collect()
    }

    pub fn validate(&self) -> Result<(), ControlError> {
        self.universe
            .validate()
            .map_err(|reason| ControlError::InvalidUniverse {
                variable: self.name.clone(),
                reason,
            })?;

        for (i, term) in self.terms.iter().enumerate() {
            if self.terms[..i].iter().any(|t| t.label == term.label) {
                return Err(ControlError::DuplicateTerm {
                    variable: self.name.clone(),
                    label: term.label.clone(),
                });
            }

            let invalid = |reason: String| ControlError::InvalidMembership {
                variable: self.name.clone(),
                label: term.label.clone(),
                reason,
            };
            term.membership.validate().map_err(invalid)?;

            let (lo, hi) = term.membership.support();
            if !self.universe.contains(lo) || !self.universe.contains(hi) {
                return Err(invalid(format!(
                    "support [{}, {}] leaves universe [{}, {}]",
                    lo, hi, self.universe.min, self.universe.max
                )));
            }
        }
        Ok(())
    }
}
