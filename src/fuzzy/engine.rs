//! Mamdani inference: fuzzify, fire rules, clip and aggregate, centroid.

use serde::{Deserialize, Serialize};

use super::rule::{Antecedent, CompiledAntecedent, Rule};
use super::variable::LinguisticVariable;
use crate::error::{ControlError, InferenceError};

/// Declarative controller definition: ordered inputs, one output, ordered rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub inputs: Vec<LinguisticVariable>,
    pub output: LinguisticVariable,
    pub rules: Vec<Rule>,
}

impl ControllerConfig {
    pub fn input(&self, name: &str) -> Option<&LinguisticVariable> {
        self.inputs.iter().find(|v| v.name == name)
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    antecedent: CompiledAntecedent,
    consequent: usize,
}

/// Immutable, validated inference engine. Safe to share across threads.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    config: ControllerConfig,
    rules: Vec<CompiledRule>,
    output_grid: Vec<f64>,
    /// Membership of every output term sampled on `output_grid`.
    output_curves: Vec<Vec<f64>>,
}

/// Intermediate values of one inference call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceTrace {
    /// (variable, label, degree) for every input term.
    pub degrees: Vec<(String, String, f64)>,
    pub firing_strengths: Vec<f64>,
    pub grid: Vec<f64>,
    pub aggregate: Vec<f64>,
    /// `None` when no rule fired.
    pub output: Option<f64>,
}

impl InferenceEngine {
    /// Validates the config and resolves every rule reference.
    pub fn new(config: ControllerConfig) -> Result<Self, ControlError> {
        for (i, var) in config.inputs.iter().enumerate() {
            if config.inputs[..i].iter().any(|v| v.name == var.name) || var.name == config.output.name
            {
                return Err(ControlError::DuplicateVariable(var.name.clone()));
            }
            var.validate()?;
        }
        config.output.validate()?;

        let rules = config
            .rules
            .iter()
            .enumerate()
            .map(|(idx, rule)| compile_rule(&config, idx, rule))
            .collect::<Result<Vec<_>, _>>()?;

        let output_grid = config.output.universe.samples();
        let output_curves = config
            .output
            .terms
            .iter()
            .map(|t| output_grid.iter().map(|x| t.membership.evaluate(*x)).collect())
            .collect();

        Ok(Self {
            config,
            rules,
            output_grid,
            output_curves,
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn output_grid(&self) -> &[f64] {
        &self.output_grid
    }

    /// Degrees of every input term, one row per input variable.
    ///
    /// Inputs outside a universe are clamped to its bounds.
    pub fn fuzzify(&self, inputs: &[f64]) -> Result<Vec<Vec<f64>>, InferenceError> {
        if inputs.len() != self.config.inputs.len() {
            return Err(InferenceError::InputArity {
                expected: self.config.inputs.len(),
                got: inputs.len(),
            });
        }
        self.config
            .inputs
            .iter()
            .zip(inputs)
            .map(|(var, &x)| {
                if !x.is_finite() {
                    return Err(InferenceError::NonFiniteInput {
                        variable: var.name.clone(),
                    });
                }
                Ok(var.fuzzify(x))
            })
            .collect()
    }

    pub fn firing_strengths(&self, degrees: &[Vec<f64>]) -> Vec<f64> {
        self.rules
            .iter()
            .map(|r| r.antecedent.strength(degrees))
            .collect()
    }

    /// Pointwise max over every rule's consequent clipped at its strength.
    pub fn aggregate(&self, strengths: &[f64]) -> Vec<f64> {
        let mut curve = vec![0.0; self.output_grid.len()];
        for (rule, &sigma) in self.rules.iter().zip(strengths) {
            if sigma <= 0.0 {
                continue;
            }
            let contribution = &self.output_curves[rule.consequent];
            for (acc, &mu) in curve.iter_mut().zip(contribution) {
                let clipped = mu.min(sigma);
                if clipped > *acc {
                    *acc = clipped;
                }
            }
        }
        curve
    }

    /// Centroid of `aggregate` over the output grid.
    pub fn defuzzify(&self, aggregate: &[f64]) -> Result<f64, InferenceError> {
        let (num, den) = self
            .output_grid
            .iter()
            .zip(aggregate)
            .fold((0.0, 0.0), |(num, den), (&x, &mu)| (num + x * mu, den + mu));
        if den <= 0.0 {
            return Err(InferenceError::NoRuleFired);
        }
        Ok(self.config.output.universe.clamp(num / den))
    }

    /// Crisp control value for one set of crisp inputs, in input order.
    pub fn infer(&self, inputs: &[f64]) -> Result<f64, InferenceError> {
        let degrees = self.fuzzify(inputs)?;
        let strengths = self.firing_strengths(&degrees);
        let aggregate = self.aggregate(&strengths);
        self.defuzzify(&aggregate)
    }

    pub fn trace(&self, inputs: &[f64]) -> Result<InferenceTrace, InferenceError> {
        let degrees = self.fuzzify(inputs)?;
        let strengths = self.firing_strengths(&degrees);
        let aggregate = self.aggregate(&strengths);
        let output = match self.defuzzify(&aggregate) {
            Ok(value) => Some(value),
            Err(InferenceError::NoRuleFired) => None,
            Err(other) => return Err(other),
        };

        let labelled = self
            .config
            .inputs
            .iter()
            .zip(&degrees)
            .flat_map(|(var, row)| {
                var.terms
                    .iter()
                    .zip(row)
                    .map(move |(t, &d)| (var.name.clone(), t.label.clone(), d))
            })
            .collect();

        Ok(InferenceTrace {
            degrees: labelled,
            firing_strengths: strengths,
            grid: self.output_grid.clone(),
            aggregate,
            output,
        })
    }
}

fn compile_rule(
    config: &ControllerConfig,
    idx: usize,
    rule: &Rule,
) -> Result<CompiledRule, ControlError> {
    let consequent = config.output.term_index(&rule.consequent).ok_or_else(|| {
        ControlError::MalformedRule {
            rule: idx,
            variable: config.output.name.clone(),
            label: rule.consequent.clone(),
        }
    })?;
    Ok(CompiledRule {
        antecedent: compile_antecedent(config, idx, &rule.antecedent)?,
        consequent,
    })
}

fn compile_antecedent(
    config: &ControllerConfig,
    idx: usize,
    expr: &Antecedent,
) -> Result<CompiledAntecedent, ControlError> {
    Ok(match expr {
        Antecedent::Term { variable, label } => {
            let malformed = || ControlError::MalformedRule {
                rule: idx,
                variable: variable.clone(),
                label: label.clone(),
            };
            let var_idx = config
                .inputs
                .iter()
                .position(|v| &v.name == variable)
                .ok_or_else(malformed)?;
            let term_idx = config.inputs[var_idx]
                .term_index(label)
                .ok_or_else(malformed)?;
            CompiledAntecedent::Term {
                variable: var_idx,
                term: term_idx,
            }
        }
        Antecedent::And(l, r) => CompiledAntecedent::And(
            Box::new(compile_antecedent(config, idx, l)?),
            Box::new(compile_antecedent(config, idx, r)?),
        ),
        Antecedent::Or(l, r) => CompiledAntecedent::Or(
            Box::new(compile_antecedent(config, idx, l)?),
            Box::new(compile_antecedent(config, idx, r)?),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::{MembershipFunction, Universe};

    fn tiny_config() -> ControllerConfig {
        ControllerConfig {
            inputs: vec![LinguisticVariable::new("x", Universe::new(0.0, 10.0, 0.5))
                .with_term("low", MembershipFunction::triangular(0.0, 0.0, 5.0))
                .with_term("high", MembershipFunction::triangular(5.0, 10.0, 10.0))],
            output: LinguisticVariable::new("y", Universe::new(0.0, 100.0, 1.0))
                .with_term("off", MembershipFunction::triangular(0.0, 0.0, 40.0))
                .with_term("on", MembershipFunction::triangular(60.0, 100.0, 100.0)),
            rules: vec![
                Rule::new(Antecedent::is("x", "low"), "off"),
                Rule::new(Antecedent::is("x", "high"), "on"),
            ],
        }
    }

    #[test]
    fn rejects_rule_with_unknown_label() {
        let mut cfg = tiny_config();
        cfg.rules
            .push(Rule::new(Antecedent::is("x", "medium"), "on"));
        let err = InferenceEngine::new(cfg).unwrap_err();
        assert_eq!(
            err,
            ControlError::MalformedRule {
                rule: 2,
                variable: "x".into(),
                label: "medium".into()
            }
        );
    }

    #[test]
    fn rejects_rule_with_unknown_consequent() {
        let mut cfg = tiny_config();
        cfg.rules.push(Rule::new(Antecedent::is("x", "low"), "max"));
        assert!(matches!(
            InferenceEngine::new(cfg),
            Err(ControlError::MalformedRule { rule: 2, .. })
        ));
    }

    #[test]
    fn rejects_unknown_variable_inside_nested_tree() {
        let mut cfg = tiny_config();
        cfg.rules.push(Rule::new(
            Antecedent::is("x", "low").or(Antecedent::is("z", "low")),
            "off",
        ));
        assert!(matches!(
            InferenceEngine::new(cfg),
            Err(ControlError::MalformedRule { .. })
        ));
    }

    #[test]
    fn single_rule_centroid_is_clipped_term_centroid() {
        let engine = InferenceEngine::new(tiny_config()).unwrap();
        let out = engine.infer(&[10.0]).unwrap();
        assert!(out > 80.0 && out <= 100.0, "got {out}");
        let out = engine.infer(&[0.0]).unwrap();
        assert!(out < 20.0, "got {out}");
    }

    #[test]
    fn midpoint_blends_symmetrically() {
        let engine = InferenceEngine::new(tiny_config()).unwrap();
        // both terms are zero at exactly 5.0
        assert_eq!(engine.infer(&[5.0]), Err(InferenceError::NoRuleFired));
        let lo = engine.infer(&[4.0]).unwrap();
        let hi = engine.infer(&[6.0]).unwrap();
        assert!((lo + hi - 100.0).abs() < 1e-9);
    }

    #[test]
    fn arity_and_non_finite_inputs_are_reported() {
        let engine = InferenceEngine::new(tiny_config()).unwrap();
        assert_eq!(
            engine.infer(&[1.0, 2.0]),
            Err(InferenceError::InputArity { expected: 1, got: 2 })
        );
        assert!(matches!(
            engine.infer(&[f64::NAN]),
            Err(InferenceError::NonFiniteInput { .. })
        ));
    }

    #[test]
    fn trace_reports_every_stage() {
        let engine = InferenceEngine::new(tiny_config()).unwrap();
        let trace = engine.trace(&[7.5]).unwrap();
        assert_eq!(trace.degrees.len(), 2);
        assert_eq!(trace.degrees[1], ("x".into(), "high".into(), 0.5));
        assert_eq!(trace.firing_strengths, vec![0.0, 0.5]);
        assert_eq!(trace.grid.len(), trace.aggregate.len());
        assert!(trace.aggregate.iter().all(|mu| *mu <= 0.5));
        assert!(trace.output.is_some());

        assert_eq!(engine.trace(&[5.0]).unwrap().output, None);
    }
}
