//! # Composite Simpson's rule
//!
//! Definite integral of a compiled function of one variable over `[a, b]`.
//!
//! Failure policy differs between the endpoints and the interior:
//! - `f(a)` and `f(b)` must evaluate to finite numbers, otherwise the integration fails;
//! - an interior point that fails to evaluate or is not finite is left out of the sum
//!   (its term contributes 0) and its abscissa is reported.
//!
//! # Example
//! ```
//! use RustedFormulaPlot::numerical::simpson::integrate;
//! use RustedFormulaPlot::symbolic::evaluator::Evaluator;
//! let f = Evaluator::new().compile("x^2").unwrap();
//! let value = integrate(&f, 0.0, 3.0, 1000).unwrap();
//! assert!((value - 9.0).abs() < 1e-6);
//! ```
use crate::symbolic::evaluator::Evaluator;
use crate::symbolic::parse_expr::CompileError;
use crate::symbolic::symbolic_lambdify::{EvalError, ScalarFunction};
use log::{debug, warn};
use std::fmt;

pub const DEFAULT_SEGMENTS: usize = 1000;

/// Error types for definite integration
#[derive(Debug, Clone, PartialEq)]
pub enum IntegrationError {
    /// `a` or `b` is `NaN` or infinite
    InvalidBounds { a: f64, b: f64 },
    /// the integrand is not finite (or cannot be evaluated) at an endpoint
    NonFiniteEndpoint { x: f64, cause: Option<EvalError> },
    Compile(CompileError),
}

impl fmt::Display for IntegrationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IntegrationError::InvalidBounds { a, b } => {
                write!(f, "Invalid integration bounds: a = {}, b = {}", a, b)
            }
            IntegrationError::NonFiniteEndpoint { x, cause: None } => {
                write!(f, "Integration failed: non-finite endpoint at x = {}", x)
            }
            IntegrationError::NonFiniteEndpoint { x, cause: Some(err) } => {
                write!(f, "Integration failed: non-finite endpoint at x = {} ({})", x, err)
            }
            IntegrationError::Compile(err) => write!(f, "Invalid expression for integration: {}", err),
        }
    }
}

impl std::error::Error for IntegrationError {}

impl From<CompileError> for IntegrationError {
    fn from(err: CompileError) -> Self {
        IntegrationError::Compile(err)
    }
}

/// Value of the integral together with how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationReport {
    pub value: f64,
    /// even number of subintervals actually used
    pub segments: usize,
    /// `(b - a) / segments`, negative when `a > b`
    pub step: f64,
    /// interior abscissae whose term was left out
    pub skipped: Vec<f64>,
}

/// Segment count actually used for a requested count: 0 gives `DEFAULT_SEGMENTS`, otherwise at
/// least 2 and rounded up to even.
pub fn even_segments(requested: usize) -> usize {
    let n = if requested == 0 {
        DEFAULT_SEGMENTS
    } else {
        requested.max(2)
    };
    if n % 2 == 0 {
        n
    } else if n == usize::MAX {
        n - 1
    } else {
        n + 1
    }
}

/// Segment count from a raw numeric input: non-finite or zero gives `DEFAULT_SEGMENTS`;
/// otherwise `max(2, |n|)` truncated toward zero and rounded up to even.
pub fn normalize_segments(requested: f64) -> usize {
    if !requested.is_finite() || requested == 0.0 {
        return DEFAULT_SEGMENTS;
    }
    even_segments(requested.abs().max(2.0) as usize)
}

fn endpoint<F: ScalarFunction>(f: &F, x: f64) -> Result<f64, IntegrationError> {
    match f.evaluate(x) {
        Ok(y) if y.is_finite() => Ok(y),
        Ok(_) => Err(IntegrationError::NonFiniteEndpoint { x, cause: None }),
        Err(err) => Err(IntegrationError::NonFiniteEndpoint { x, cause: Some(err) }),
    }
}

fn check_bounds(a: f64, b: f64) -> Result<(), IntegrationError> {
    if a.is_finite() && b.is_finite() {
        Ok(())
    } else {
        Err(IntegrationError::InvalidBounds { a, b })
    }
}

/// Composite Simpson's rule with the details of the computation.
pub fn integrate_report<F: ScalarFunction>(
    f: &F,
    a: f64,
    b: f64,
    segments: usize,
) -> Result<IntegrationReport, IntegrationError> {
    check_bounds(a, b)?;
    let n = even_segments(segments);
    if a == b {
        return Ok(IntegrationReport {
            value: 0.0,
            segments: n,
            step: 0.0,
            skipped: Vec::new(),
        });
    }
    let h = (b - a) / n as f64;
    let fa = endpoint(f, a)?;
    let fb = endpoint(f, b)?;

    let mut sum = fa + fb;
    let mut skipped = Vec::new();
    for i in 1..n {
        let x = a + i as f64 * h;
        match f.evaluate(x) {
            Ok(fx) if fx.is_finite() => {
                let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
                sum += weight * fx;
            }
            _ => skipped.push(x),
        }
    }
    if !skipped.is_empty() {
        warn!(
            "{}: {} interior point(s) not finite and left out of the sum, first at x = {}",
            f.name(),
            skipped.len(),
            skipped[0]
        );
    }
    let value = h / 3.0 * sum;
    debug!(
        "integral of {} over [{}, {}] with {} segments = {}",
        f.name(),
        a,
        b,
        n,
        value
    );
    Ok(IntegrationReport {
        value,
        segments: n,
        step: h,
        skipped,
    })
}

/// Composite Simpson's rule: approximates the integral of `f` from `a` to `b`.
pub fn integrate<F: ScalarFunction>(
    f: &F,
    a: f64,
    b: f64,
    segments: usize,
) -> Result<f64, IntegrationError> {
    integrate_report(f, a, b, segments).map(|report| report.value)
}

/// Compiles `formula` and integrates it. Bounds are checked first and an empty interval gives 0
/// without compiling.
pub fn integrate_formula(
    evaluator: &Evaluator,
    formula: &str,
    a: f64,
    b: f64,
    segments: usize,
) -> Result<IntegrationReport, IntegrationError> {
    check_bounds(a, b)?;
    if a == b {
        return Ok(IntegrationReport {
            value: 0.0,
            segments: even_segments(segments),
            step: 0.0,
            skipped: Vec::new(),
        });
    }
    let compiled = evaluator.compile(formula)?;
    integrate_report(&compiled, a, b, segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::symbolic_lambdify::{ClosureFunction, CompiledExpr};
    use approx::assert_relative_eq;
    use std::cell::Cell;

    fn compile(formula: &str) -> CompiledExpr {
        Evaluator::new().compile(formula).unwrap()
    }

    #[test]
    fn test_zero_width_interval() {
        let f = compile("1/x");
        assert_eq!(integrate(&f, 0.0, 0.0, 10).unwrap(), 0.0);
        assert_eq!(integrate(&compile("exp(x)"), 2.5, 2.5, 7).unwrap(), 0.0);
        let report = integrate_formula(&Evaluator::new(), "not a formula (", 1.0, 1.0, 0).unwrap();
        assert_eq!(report.value, 0.0);
    }

    #[test]
    fn test_linear_exact_for_any_even_n() {
        let f = compile("x");
        for n in [2, 4, 6, 10, 100, 1000] {
            assert_relative_eq!(integrate(&f, 0.0, 1.0, n).unwrap(), 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_cubic_exact_with_two_segments() {
        let f = compile("x^3");
        assert_relative_eq!(integrate(&f, 0.0, 2.0, 2).unwrap(), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_square() {
        let f = compile("x^2");
        assert_relative_eq!(integrate(&f, 0.0, 3.0, 1000).unwrap(), 9.0, epsilon = 1e-6);
    }

    #[test]
    fn test_smooth_functions() {
        let f = compile("sin(x)");
        assert_relative_eq!(
            integrate(&f, 0.0, std::f64::consts::PI, 1000).unwrap(),
            2.0,
            epsilon = 1e-10
        );
        let f = compile("exp(x)");
        assert_relative_eq!(
            integrate(&f, 0.0, 1.0, 100).unwrap(),
            std::f64::consts::E - 1.0,
            epsilon = 1e-8
        );
    }

    #[test]
    fn test_orientation_antisymmetry() {
        let f = compile("sin(x) + x^2");
        for n in [2, 10, 1000] {
            let forward = integrate(&f, -1.0, 2.0, n).unwrap();
            let backward = integrate(&f, 2.0, -1.0, n).unwrap();
            assert_relative_eq!(forward, -backward, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_odd_segments_bumped() {
        let f = compile("exp(x) * sin(3x)");
        let five = integrate_report(&f, 0.0, 1.0, 5).unwrap();
        let six = integrate_report(&f, 0.0, 1.0, 6).unwrap();
        assert_eq!(five.segments, 6);
        assert_eq!(five.value, six.value);
    }

    #[test]
    fn test_segment_normalization() {
        assert_eq!(normalize_segments(f64::NAN), DEFAULT_SEGMENTS);
        assert_eq!(normalize_segments(f64::INFINITY), DEFAULT_SEGMENTS);
        assert_eq!(normalize_segments(0.0), DEFAULT_SEGMENTS);
        assert_eq!(normalize_segments(-0.0), DEFAULT_SEGMENTS);
        assert_eq!(normalize_segments(-5.0), 6);
        assert_eq!(normalize_segments(0.3), 2);
        assert_eq!(normalize_segments(1.0), 2);
        assert_eq!(normalize_segments(7.9), 8);
        assert_eq!(normalize_segments(1000.0), 1000);
        assert_eq!(even_segments(0), DEFAULT_SEGMENTS);
        assert_eq!(even_segments(3), 4);
        assert_eq!(even_segments(usize::MAX), usize::MAX - 1);
    }

    #[test]
    fn test_non_finite_endpoint_fails() {
        let f = compile("1/x");
        assert_eq!(
            integrate(&f, 0.0, 1.0, 10),
            Err(IntegrationError::NonFiniteEndpoint { x: 0.0, cause: None })
        );
        assert_eq!(
            integrate(&f, -1.0, 0.0, 10),
            Err(IntegrationError::NonFiniteEndpoint { x: 0.0, cause: None })
        );
        let f = compile("x + k");
        assert_eq!(
            integrate(&f, 0.0, 1.0, 10),
            Err(IntegrationError::NonFiniteEndpoint {
                x: 0.0,
                cause: Some(EvalError::UndefinedSymbol("k".to_string()))
            })
        );
    }

    #[test]
    fn test_interior_singularity_skipped() {
        let f = compile("1/x");
        let report = integrate_report(&f, -1.0, 1.0, 4).unwrap();
        assert_eq!(report.skipped, vec![0.0]);
        assert_relative_eq!(report.value, 0.0, epsilon = 1e-12);
        assert_relative_eq!(report.step, 0.5);
    }

    #[test]
    fn test_invalid_bounds_rejected_before_evaluation() {
        let calls = Cell::new(0usize);
        let f = ClosureFunction::new(
            |x| {
                calls.set(calls.get() + 1);
                x
            },
            "counting".to_string(),
        );
        for (a, b) in [
            (f64::NAN, 1.0),
            (0.0, f64::INFINITY),
            (f64::NEG_INFINITY, f64::INFINITY),
            (f64::NAN, f64::NAN),
        ] {
            let result = integrate(&f, a, b, 10);
            assert!(matches!(result, Err(IntegrationError::InvalidBounds { .. })));
        }
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_integrate_formula_compile_error() {
        let result = integrate_formula(&Evaluator::new(), "sin(x", 0.0, 1.0, 10);
        assert!(matches!(result, Err(IntegrationError::Compile(_))));
        let message = result.unwrap_err().to_string();
        assert!(message.starts_with("Invalid expression for integration"));
    }
}
