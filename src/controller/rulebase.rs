//! Default CRAC rule base.
//!
//! Inputs, in order: temperature error (measured minus setpoint), error delta
//! per tick, external temperature and thermal load. Output: cooling power in
//! percent. The table is plain data; any `ControllerConfig` with four inputs
//! can replace it.

use crate::fuzzy::{
    Antecedent, ControllerConfig, LinguisticVariable, MembershipFunction as Mf, Rule, Universe,
};

pub const ERROR: &str = "error";
pub const ERROR_DELTA: &str = "error_delta";
pub const EXTERNAL_TEMP: &str = "external_temp";
pub const THERMAL_LOAD: &str = "thermal_load";
pub const COOLING_POWER: &str = "cooling_power";

fn error_variable() -> LinguisticVariable {
    // finer terms around zero
    LinguisticVariable::new(ERROR, Universe::new(-10.0, 10.0, 0.1))
        .with_term("NL", Mf::trapezoidal(-10.0, -10.0, -6.0, -3.0))
        .with_term("NS", Mf::triangular(-5.0, -3.0, -1.0))
        .with_term("ZE", Mf::triangular(-2.0, 0.0, 2.0))
        .with_term("PS", Mf::triangular(1.0, 3.0, 5.0))
        .with_term("PL", Mf::trapezoidal(3.0, 6.0, 10.0, 10.0))
}

fn error_delta_variable() -> LinguisticVariable {
    LinguisticVariable::new(ERROR_DELTA, Universe::new(-3.0, 3.0, 0.1))
        .with_term("falling_fast", Mf::triangular(-3.0, -3.0, -1.5))
        .with_term("falling", Mf::triangular(-2.0, -1.0, 0.0))
        .with_term("stable", Mf::triangular(-0.5, 0.0, 0.5))
        .with_term("rising", Mf::triangular(0.0, 1.0, 2.0))
        .with_term("rising_fast", Mf::triangular(1.5, 3.0, 3.0))
}

fn external_temp_variable() -> LinguisticVariable {
    LinguisticVariable::new(EXTERNAL_TEMP, Universe::new(10.0, 40.0, 0.1))
        .with_term("low", Mf::triangular(10.0, 10.0, 20.0))
        .with_term("medium", Mf::triangular(18.0, 25.0, 30.0))
        .with_term("high", Mf::triangular(28.0, 35.0, 40.0))
}

fn thermal_load_variable() -> LinguisticVariable {
    LinguisticVariable::new(THERMAL_LOAD, Universe::new(0.0, 100.0, 1.0))
        .with_term("low", Mf::triangular(0.0, 0.0, 35.0))
        .with_term("medium", Mf::triangular(25.0, 50.0, 75.0))
        .with_term("high", Mf::triangular(60.0, 80.0, 100.0))
}

fn cooling_power_variable() -> LinguisticVariable {
    LinguisticVariable::new(COOLING_POWER, Universe::new(0.0, 100.0, 1.0))
        .with_term("very_low", Mf::triangular(0.0, 0.0, 20.0))
        .with_term("low", Mf::triangular(10.0, 30.0, 45.0))
        .with_term("medium", Mf::triangular(35.0, 50.0, 65.0))
        .with_term("high", Mf::triangular(55.0, 70.0, 85.0))
        .with_term("very_high", Mf::triangular(80.0, 100.0, 100.0))
}

fn when(variable: &str, label: &str) -> Antecedent {
    Antecedent::is(variable, label)
}

fn both(a: (&str, &str), b: (&str, &str)) -> Antecedent {
    when(a.0, a.1).and(when(b.0, b.1))
}

fn rules() -> Vec<Rule> {
    let mut rules = vec![
        // large errors dominate
        Rule::new(when(ERROR, "PL"), "very_high"),
        Rule::new(when(ERROR, "NL"), "very_low"),
    ];

    // moderate errors, shaped by trend
    let trend = [
        ("PS", "rising_fast", "high"),
        ("PS", "rising", "high"),
        ("PS", "stable", "medium"),
        ("PS", "falling", "low"),
        ("PS", "falling_fast", "very_low"),
        ("NS", "falling_fast", "very_low"),
        ("NS", "falling", "low"),
        ("NS", "stable", "medium"),
        ("NS", "rising", "high"),
        ("NS", "rising_fast", "high"),
    ];
    for (err, delta, out) in trend {
        rules.push(Rule::new(both((ERROR, err), (ERROR_DELTA, delta)), out));
    }

    // near the setpoint, feed forward from the disturbances
    for (level, out) in [("low", "low"), ("medium", "medium"), ("high", "high")] {
        rules.push(Rule::new(both((ERROR, "ZE"), (EXTERNAL_TEMP, level)), out));
    }
    for (level, out) in [("low", "low"), ("medium", "medium"), ("high", "high")] {
        rules.push(Rule::new(both((ERROR, "ZE"), (THERMAL_LOAD, level)), out));
    }

    // moderate errors against load, then against external temperature
    for disturbance in [THERMAL_LOAD, EXTERNAL_TEMP] {
        for (err, level, out) in [
            ("PS", "high", "high"),
            ("PS", "medium", "medium"),
            ("PS", "low", "low"),
            ("NS", "high", "high"),
            ("NS", "medium", "medium"),
            ("NS", "low", "very_low"),
        ] {
            rules.push(Rule::new(both((ERROR, err), (disturbance, level)), out));
        }
    }

    rules
}

/// The built-in 30-rule CRAC controller definition.
pub fn crac_controller_config() -> ControllerConfig {
    ControllerConfig {
        inputs: vec![
            error_variable(),
            error_delta_variable(),
            external_temp_variable(),
            thermal_load_variable(),
        ],
        output: cooling_power_variable(),
        rules: rules(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::InferenceEngine;

    #[test]
    fn default_rule_base_is_well_formed() {
        let cfg = crac_controller_config();
        assert_eq!(cfg.inputs.len(), 4);
        assert_eq!(cfg.rules.len(), 30);
        assert!(InferenceEngine::new(cfg).is_ok());
    }

    #[test]
    fn inputs_are_looked_up_by_name() {
        let cfg = crac_controller_config();
        let error = cfg.input(ERROR).unwrap();
        assert_eq!(error.terms.len(), 5);
        assert_eq!(error.term("ZE").unwrap().membership, Mf::triangular(-2.0, 0.0, 2.0));
        assert!(error.term("zero").is_none());
        assert_eq!(cfg.input(THERMAL_LOAD).unwrap().universe.max, 100.0);
        assert!(cfg.input(COOLING_POWER).is_none());
    }

    #[test]
    fn every_output_term_is_reachable() {
        let cfg = crac_controller_config();
        for term in &cfg.output.terms {
            assert!(
                cfg.rules.iter().any(|r| r.consequent == term.label),
                "no rule concludes {}",
                term.label
            );
        }
    }
}
