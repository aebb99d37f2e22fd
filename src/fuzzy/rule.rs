use serde::{Deserialize, Serialize};

/// Antecedent expression tree over (variable, label) pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Antecedent {
    Term { variable: String, label: String },
    And(Box<Antecedent>, Box<Antecedent>),
    Or(Box<Antecedent>, Box<Antecedent>),
}

impl Antecedent {
    pub fn is(variable: impl Into<String>, label: impl Into<String>) -> Self {
        Antecedent::Term {
            variable: variable.into(),
            label: label.into(),
        }
    }

    pub fn and(self, other: Antecedent) -> Self {
        Antecedent::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Antecedent) -> Self {
        Antecedent::Or(Box::new(self), Box::new(other))
    }

    /// Every (variable, label) leaf in left-to-right order.
    pub fn terms(&self) -> Vec<(&str, &str)> {
        let mut out = Vec::new();
        self.collect_terms(&mut out);
        out
    }

    fn collect_terms<'a>(&'a self, out: &mut Vec<(&'a str, &'a str)>) {
        match self {
            Antecedent::Term { variable, label } => out.push((variable, label)),
            Antecedent::And(l, r) | Antecedent::Or(l, r) => {
                l.collect_terms(out);
                r.collect_terms(out);
            }
        }
    }
}

/// `IF antecedent THEN output IS consequent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub antecedent: Antecedent,
    pub consequent: String,
}

impl Rule {
    pub fn new(antecedent: Antecedent, consequent: impl Into<String>) -> Self {
        Self {
            antecedent,
            consequent: consequent.into(),
        }
    }
}

/// Antecedent with names resolved to (input index, term index).
#[derive(Debug, Clone)]
pub(crate) enum CompiledAntecedent {
    Term { variable: usize, term: usize },
    And(Box<CompiledAntecedent>, Box<CompiledAntecedent>),
    Or(Box<CompiledAntecedent>, Box<CompiledAntecedent>),
}

impl CompiledAntecedent {
    /// Firing strength: min for AND, max for OR.
    pub(crate) fn strength(&self, degrees: &[Vec<f64>]) -> f64 {
        match self {
            CompiledAntecedent::Term { variable, term } => degrees[*variable][*term],
            CompiledAntecedent::And(l, r) => l.strength(degrees).min(r.strength(degrees)),
            CompiledAntecedent::Or(l, r) => l.strength(degrees).max(r.strength(degrees)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_nests_left_to_right() {
        let expr = Antecedent::is("error", "PS")
            .and(Antecedent::is("delta", "S"))
            .or(Antecedent::is("load", "A"));
        assert_eq!(
            expr.terms(),
            vec![("error", "PS"), ("delta", "S"), ("load", "A")]
        );
        assert!(matches!(expr, Antecedent::Or(_, _)));
    }

    #[test]
    fn compiled_strength_uses_min_and_max() {
        let degrees = vec![vec![0.2, 0.9], vec![0.6]];
        let and = CompiledAntecedent::And(
            Box::new(CompiledAntecedent::Term { variable: 0, term: 1 }),
            Box::new(CompiledAntecedent::Term { variable: 1, term: 0 }),
        );
        assert_eq!(and.strength(&degrees), 0.6);

        let or = CompiledAntecedent::Or(
            Box::new(CompiledAntecedent::Term { variable: 0, term: 0 }),
            Box::new(CompiledAntecedent::Term { variable: 1, term: 0 }),
        );
        assert_eq!(or.strength(&degrees), 0.6);
    }
}
