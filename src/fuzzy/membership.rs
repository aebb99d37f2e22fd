use serde::{Deserialize, Serialize};

/// Piecewise-linear membership shapes.
///
/// `evaluate` never clamps its argument. Callers clamp crisp inputs to the
/// owning universe before fuzzification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum MembershipFunction {
    /// Zero below `a`, rises to 1 at `b`, falls back to zero at `c`.
    Triangular { a: f64, b: f64, c: f64 },
    /// Zero below `a`, rises to 1 at `b`, plateau until `c`, zero again at `d`.
    Trapezoidal { a: f64, b: f64, c: f64, d: f64 },
}

impl MembershipFunction {
    pub fn triangular(a: f64, b: f64, c: f64) -> Self {
        MembershipFunction::Triangular { a, b, c }
    }

    pub fn trapezoidal(a: f64, b: f64, c: f64, d: f64) -> Self {
        MembershipFunction::Trapezoidal { a, b, c, d }
    }

    pub fn breakpoints(&self) -> Vec<f64> {
        match *self {
            MembershipFunction::Triangular { a, b, c } => vec![a, b, c],
            MembershipFunction::Trapezoidal { a, b, c, d } => vec![a, b, c, d],
        }
    }

    /// Closed interval outside of which the degree is zero.
    pub fn support(&self) -> (f64, f64) {
        match *self {
            MembershipFunction::Triangular { a, c, .. } => (a, c),
            MembershipFunction::Trapezoidal { a, d, .. } => (a, d),
        }
    }

    /// Checks that breakpoints are finite and non-decreasing.
    pub fn validate(&self) -> Result<(), String> {
        let points = self.breakpoints();
        if points.iter().any(|p| !p.is_finite()) {
            return Err(format!("breakpoints must be finite, got {:?}", points));
        }
        if points.windows(2).any(|w| w[0] > w[1]) {
            return Err(format!("breakpoints must be non-decreasing, got {:?}", points));
        }
        Ok(())
    }

    /// Degree of truth of `x`, always in [0, 1]. NaN maps to 0.
    pub fn evaluate(&self, x: f64) -> f64 {
        match *self {
            MembershipFunction::Triangular { a, b, c } => {
                if !(x >= a && x <= c) {
                    0.0
                } else if x == b {
                    1.0
                } else if x < b {
                    // a <= x < b, so b > a
                    (x - a) / (b - a)
                } else {
                    (c - x) / (c - b)
                }
            }
            MembershipFunction::Trapezoidal { a, b, c, d } => {
                if !(x >= a && x <= d) {
                    0.0
                } else if x >= b && x <= c {
                    1.0
                } else if x < b {
                    (x - a) / (b - a)
                } else {
                    (d - x) / (d - c)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangular_shape() {
        let mf = MembershipFunction::triangular(1.0, 3.0, 5.0);
        assert_eq!(mf.evaluate(0.5), 0.0);
        assert_eq!(mf.evaluate(1.0), 0.0);
        assert_eq!(mf.evaluate(2.0), 0.5);
        assert_eq!(mf.evaluate(3.0), 1.0);
        assert_eq!(mf.evaluate(4.0), 0.5);
        assert_eq!(mf.evaluate(5.0), 0.0);
        assert_eq!(mf.evaluate(7.0), 0.0);
    }

    #[test]
    fn degenerate_triangles_are_steps() {
        let left = MembershipFunction::triangular(-3.0, -3.0, -1.5);
        assert_eq!(left.evaluate(-3.0), 1.0);
        assert_eq!(left.evaluate(-3.1), 0.0);
        assert!((left.evaluate(-2.25) - 0.5).abs() < 1e-12);

        let right = MembershipFunction::triangular(80.0, 100.0, 100.0);
        assert_eq!(right.evaluate(100.0), 1.0);
        assert_eq!(right.evaluate(100.5), 0.0);
        assert_eq!(right.evaluate(90.0), 0.5);

        let spike = MembershipFunction::triangular(2.0, 2.0, 2.0);
        assert_eq!(spike.evaluate(2.0), 1.0);
        assert_eq!(spike.evaluate(2.0001), 0.0);
    }

    #[test]
    fn trapezoid_plateau_and_shoulders() {
        let mf = MembershipFunction::trapezoidal(-10.0, -10.0, -6.0, -3.0);
        assert_eq!(mf.evaluate(-10.0), 1.0);
        assert_eq!(mf.evaluate(-8.0), 1.0);
        assert_eq!(mf.evaluate(-6.0), 1.0);
        assert!((mf.evaluate(-4.5) - 0.5).abs() < 1e-12);
        assert_eq!(mf.evaluate(-3.0), 0.0);
        assert_eq!(mf.evaluate(-11.0), 0.0);

        let mf = MembershipFunction::trapezoidal(3.0, 6.0, 10.0, 10.0);
        assert!((mf.evaluate(5.0) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(mf.evaluate(10.0), 1.0);
    }

    #[test]
    fn nan_has_no_membership() {
        assert_eq!(MembershipFunction::triangular(0.0, 1.0, 2.0).evaluate(f64::NAN), 0.0);
        assert_eq!(
            MembershipFunction::trapezoidal(0.0, 1.0, 2.0, 3.0).evaluate(f64::NAN),
            0.0
        );
    }

    #[test]
    fn validation_rejects_unordered_points() {
        assert!(MembershipFunction::triangular(3.0, 1.0, 5.0).validate().is_err());
        assert!(MembershipFunction::trapezoidal(0.0, 1.0, f64::INFINITY, 3.0)
            .validate()
            .is_err());
        assert!(MembershipFunction::trapezoidal(0.0, 0.0, 0.0, 0.0).validate().is_ok());
    }
}
