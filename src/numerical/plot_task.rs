//! Plot and integration requests: normalization, compilation with fallback to the raw formula,
//! sampling of the function and of its derivative, and the definite integral.
//!
//! Compilation policy: the normalized formula is compiled first; if it does not compile the raw
//! input is tried; if neither compiles the plot degrades to an empty series with an error message
//! and the integration fails with [`IntegrationError::Compile`].
use crate::numerical::sampler::{Domain, SampleSeries, sample};
use crate::numerical::simpson::{
    DEFAULT_SEGMENTS, IntegrationError, IntegrationReport, integrate_report, normalize_segments,
};
use crate::symbolic::evaluator::Evaluator;
use crate::symbolic::normalization::{FormulaNormalizer, Normalization};
use crate::symbolic::parse_expr::CompileError;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_lambdify::CompiledExpr;
use log::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct PlotRequest {
    pub formula: String,
    pub domain: Domain,
    /// also plot the symbolic derivative
    pub derivative: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivativeSeries {
    /// rendering of the derivative, e.g. "cos(x) + 0.5"
    pub text: String,
    pub series: SampleSeries,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotOutcome {
    pub normalization: Normalization,
    /// the formula that actually compiled
    pub expression: Option<String>,
    pub series: SampleSeries,
    pub derivative: Option<DerivativeSeries>,
    pub error: Option<String>,
}

struct Compiled {
    formula: String,
    expr: Expr,
    function: CompiledExpr,
}

fn compile_one(evaluator: &Evaluator, formula: &str) -> Result<Compiled, CompileError> {
    let (expr, function) = evaluator.parse_and_compile(formula)?;
    Ok(Compiled {
        formula: formula.to_string(),
        expr,
        function,
    })
}

/// Compiles the normalized formula, falling back to the raw input.
fn compile_with_fallback(
    evaluator: &Evaluator,
    normalization: &Normalization,
    raw: &str,
) -> Result<Compiled, CompileError> {
    let candidate = normalization.expression();
    match compile_one(evaluator, candidate) {
        Ok(compiled) => Ok(compiled),
        Err(err) if candidate != raw => {
            warn!(
                "normalized formula '{}' does not compile ({}), trying '{}'",
                candidate, err, raw
            );
            compile_one(evaluator, raw)
        }
        Err(err) => Err(err),
    }
}

fn normalize<N: FormulaNormalizer + ?Sized>(normalizer: &N, raw: &str) -> Normalization {
    let normalization = normalizer.normalize(raw);
    match normalization.reason() {
        Some(reason) => info!("{}", reason),
        None => info!("formula '{}' normalized to '{}'", raw, normalization.expression()),
    }
    normalization
}

/// Builds the series to plot for one request. Never fails: compile errors degrade to an empty
/// series with `error` set.
pub fn build_plot<N: FormulaNormalizer + ?Sized>(
    request: &PlotRequest,
    evaluator: &Evaluator,
    normalizer: &N,
) -> PlotOutcome {
    let normalization = normalize(normalizer, &request.formula);
    let compiled = match compile_with_fallback(evaluator, &normalization, &request.formula) {
        Ok(compiled) => compiled,
        Err(err) => {
            warn!("formula '{}' not plotted: {}", request.formula, err);
            return PlotOutcome {
                normalization,
                expression: None,
                series: SampleSeries::empty(),
                derivative: None,
                error: Some(format!("Invalid expression: {}", err)),
            };
        }
    };
    let series = sample(&compiled.function, &request.domain);
    let derivative = if request.derivative {
        let derivative = evaluator.derive_expr(&compiled.expr);
        info!("f'({}) = {}", evaluator.variable(), derivative.text);
        Some(DerivativeSeries {
            series: derivative.sample(&request.domain),
            text: derivative.text,
        })
    } else {
        None
    };
    PlotOutcome {
        normalization,
        expression: Some(compiled.formula),
        series,
        derivative,
        error: None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationRequest {
    pub formula: String,
    pub a: f64,
    pub b: f64,
    /// raw segment count; `None` means `DEFAULT_SEGMENTS`
    pub segments: Option<f64>,
}

/// Integrates the requested formula over `[a, b]` with the same normalization and compile
/// fallback as [`build_plot`].
pub fn run_integration<N: FormulaNormalizer + ?Sized>(
    request: &IntegrationRequest,
    evaluator: &Evaluator,
    normalizer: &N,
) -> Result<IntegrationReport, IntegrationError> {
    let (a, b) = (request.a, request.b);
    if !a.is_finite() || !b.is_finite() {
        return Err(IntegrationError::InvalidBounds { a, b });
    }
    let segments = request
        .segments
        .map(normalize_segments)
        .unwrap_or(DEFAULT_SEGMENTS);
    if a == b {
        return Ok(IntegrationReport {
            value: 0.0,
            segments,
            step: 0.0,
            skipped: Vec::new(),
        });
    }
    let normalization = normalize(normalizer, &request.formula);
    let compiled = compile_with_fallback(evaluator, &normalization, &request.formula)?;
    let report = integrate_report(&compiled.function, a, b, segments)?;
    info!(
        "integral of {} over [{}, {}] = {}",
        compiled.formula,
        a,
        b,
        format_integral(report.value)
    );
    Ok(report)
}

/// Integral value for display: rounded to 6 decimals, without a negative zero.
pub fn format_integral(value: f64) -> String {
    let rounded = (value * 1e6).round() / 1e6;
    let rounded = if rounded.is_finite() { rounded } else { value };
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{}", rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::normalization::{FallbackReason, NotConfigured, RuleBasedNormalizer};
    use approx::assert_relative_eq;

    fn request(formula: &str, derivative: bool) -> PlotRequest {
        PlotRequest {
            formula: formula.to_string(),
            domain: Domain::default(),
            derivative,
        }
    }

    #[test]
    fn test_default_formula_with_derivative() {
        let outcome = build_plot(&request("sin(x) + 0.5 * x", true), &Evaluator::new(), &NotConfigured);
        assert_eq!(outcome.series.len(), 400);
        assert_eq!(outcome.series.undefined_count(), 0);
        assert_eq!(outcome.expression.as_deref(), Some("sin(x) + 0.5 * x"));
        assert_eq!(
            outcome.normalization.reason(),
            Some(&FallbackReason::NotConfigured)
        );
        let derivative = outcome.derivative.unwrap();
        assert_eq!(derivative.text, "cos(x) + 0.5");
        assert_eq!(derivative.series.len(), 400);
        assert_eq!(outcome.error, None);
    }

    #[test]
    fn test_no_derivative_requested() {
        let outcome = build_plot(&request("x^2", false), &Evaluator::new(), &NotConfigured);
        assert!(outcome.derivative.is_none());
        assert_eq!(outcome.series.len(), 400);
    }

    #[test]
    fn test_normalized_formula_is_used() {
        let normalizer = RuleBasedNormalizer::new().unwrap();
        let outcome = build_plot(&request("y = sen(x)²", true), &Evaluator::new(), &normalizer);
        assert_eq!(outcome.expression.as_deref(), Some("sin(x)^2"));
        assert!(outcome.normalization.used_service());
        assert_eq!(outcome.derivative.unwrap().text, "2 * sin(x) * cos(x)");
    }

    #[test]
    fn test_falls_back_to_raw_formula() {
        let broken = |_raw: &str| Normalization::Normalized("sin(x".to_string());
        let outcome = build_plot(&request("cos(x)", true), &Evaluator::new(), &broken);
        assert_eq!(outcome.expression.as_deref(), Some("cos(x)"));
        assert_eq!(outcome.series.len(), 400);
        // derivative of what compiled, not of the normalized text
        assert_eq!(outcome.derivative.unwrap().text, "-sin(x)");
    }

    #[test]
    fn test_total_compile_failure_degrades_to_empty() {
        let outcome = build_plot(&request("sin(x", true), &Evaluator::new(), &NotConfigured);
        assert!(outcome.series.is_empty());
        assert!(outcome.derivative.is_none());
        assert!(outcome.expression.is_none());
        assert!(outcome.error.unwrap().starts_with("Invalid expression"));
    }

    #[test]
    fn test_deeply_nested_formula_degrades_to_empty() {
        let formula = format!("{}x{}", "(".repeat(10_000), ")".repeat(10_000));
        let outcome = build_plot(&request(&formula, true), &Evaluator::new(), &NotConfigured);
        assert!(outcome.series.is_empty());
        assert!(outcome.derivative.is_none());
        assert!(outcome.error.unwrap().contains("nested too deeply"));

        let outcome = build_plot(&request("1e400 * x^2", true), &Evaluator::new(), &NotConfigured);
        assert!(outcome.series.is_empty());
        assert!(outcome.error.unwrap().contains("number out of range"));
    }

    #[test]
    fn test_run_integration() {
        let evaluator = Evaluator::new();
        let req = IntegrationRequest {
            formula: "x^2".to_string(),
            a: 0.0,
            b: 3.0,
            segments: None,
        };
        let report = run_integration(&req, &evaluator, &NotConfigured).unwrap();
        assert_eq!(report.segments, DEFAULT_SEGMENTS);
        assert_relative_eq!(report.value, 9.0, epsilon = 1e-6);
        assert_eq!(format_integral(report.value), "9");

        let req = IntegrationRequest {
            segments: Some(-5.0),
            ..req
        };
        assert_eq!(run_integration(&req, &evaluator, &NotConfigured).unwrap().segments, 6);
    }

    #[test]
    fn test_run_integration_errors() {
        let evaluator = Evaluator::new();
        let bad_bounds = IntegrationRequest {
            formula: "x".to_string(),
            a: f64::NAN,
            b: 1.0,
            segments: None,
        };
        assert!(matches!(
            run_integration(&bad_bounds, &evaluator, &NotConfigured),
            Err(IntegrationError::InvalidBounds { .. })
        ));
        let bad_formula = IntegrationRequest {
            formula: "x +".to_string(),
            a: 0.0,
            b: 1.0,
            segments: None,
        };
        assert!(matches!(
            run_integration(&bad_formula, &evaluator, &NotConfigured),
            Err(IntegrationError::Compile(_))
        ));
        let pole = IntegrationRequest {
            formula: "1/x".to_string(),
            a: 0.0,
            b: 1.0,
            segments: None,
        };
        let err = run_integration(&pole, &evaluator, &NotConfigured).unwrap_err();
        assert!(err.to_string().contains("non-finite endpoint"));
        let empty = IntegrationRequest {
            formula: "x +".to_string(),
            a: 2.0,
            b: 2.0,
            segments: None,
        };
        assert_eq!(run_integration(&empty, &evaluator, &NotConfigured).unwrap().value, 0.0);
    }

    #[test]
    fn test_format_integral() {
        assert_eq!(format_integral(0.5), "0.5");
        assert_eq!(format_integral(1.0 / 3.0), "0.333333");
        assert_eq!(format_integral(-1e-9), "0");
        assert_eq!(format_integral(-2.5), "-2.5");
    }
}
