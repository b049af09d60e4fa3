//! # Sampler
//!
//! Turns a compiled function of one variable into an ordered, plottable sequence of points
//! `(x_i, f(x_i))` on an evenly spaced grid. A point where evaluation fails or gives a non-finite
//! value is kept in the series as undefined (`y == None`); sampling never aborts.
//!
//! ## Main Structures
//! - `Domain` - interval and sample count, the count is always clamped to `[2, 2000]`
//! - `SampleSeries` - the points, with helpers for plotting (finite runs, y range)
//! - `Precision` - rounding applied to the returned values (4 decimals by default)
//!
//! # Example
//! ```
//! use RustedFormulaPlot::numerical::sampler::{Domain, sample};
//! use RustedFormulaPlot::symbolic::evaluator::Evaluator;
//! let f = Evaluator::new().compile("1/x").unwrap();
//! let series = sample(&f, &Domain::new(-1.0, 1.0, 5));
//! assert_eq!(series.len(), 5);
//! assert_eq!(series.points()[2].y, None);
//! assert_eq!(series.undefined_count(), 1);
//! ```
use crate::symbolic::evaluator::{Derivative, Evaluator};
use crate::symbolic::symbolic_lambdify::ScalarFunction;
use log::{debug, warn};

pub const DEFAULT_SAMPLES: usize = 400;
pub const MIN_SAMPLES: usize = 2;
pub const MAX_SAMPLES: usize = 2000;

/// Closed interval `[min, max]` with the number of grid points.
///
/// `min >= max` is accepted: the grid is then reversed or collapsed to one abscissa.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    min: f64,
    max: f64,
    count: usize,
}

impl Domain {
    /// `count` is clamped to `[MIN_SAMPLES, MAX_SAMPLES]`
    pub fn new(min: f64, max: f64, count: usize) -> Self {
        Self {
            min,
            max,
            count: count.clamp(MIN_SAMPLES, MAX_SAMPLES),
        }
    }

    /// Domain from a free-form sample count as typed in a form field.
    ///
    /// Non-numeric, empty, `NaN` or zero input gives `DEFAULT_SAMPLES`; anything else is clamped
    /// to `[2, 2000]` and truncated toward zero.
    pub fn from_inputs(min: f64, max: f64, raw_count: &str) -> Self {
        let count = match raw_count.trim().parse::<f64>() {
            Ok(value) if !value.is_nan() && value != 0.0 => {
                value.clamp(MIN_SAMPLES as f64, MAX_SAMPLES as f64) as usize
            }
            _ => DEFAULT_SAMPLES,
        };
        Self::new(min, max, count)
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// `(max - min) / (count - 1)`; negative for a reversed domain
    pub fn step(&self) -> f64 {
        (self.max - self.min) / (self.count as f64 - 1.0)
    }

    /// `x_i = min + i * step` for `i` in `0..count`
    pub fn abscissae(&self) -> impl Iterator<Item = f64> + '_ {
        let step = self.step();
        (0..self.count).map(move |i| self.min + step * i as f64)
    }
}

impl Default for Domain {
    fn default() -> Self {
        Self::new(-10.0, 10.0, DEFAULT_SAMPLES)
    }
}

/// Rounding applied to sampled values before they are returned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Precision {
    /// round half away from zero to this many decimal digits
    Display(u32),
    Full,
}

impl Default for Precision {
    fn default() -> Self {
        Precision::Display(4)
    }
}

impl Precision {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Precision::Full => value,
            Precision::Display(digits) => {
                let factor = 10f64.powi(*digits as i32);
                let rounded = (value * factor).round() / factor;
                // too large to scale: already has no fractional part worth rounding
                if rounded.is_finite() { rounded } else { value }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub x: f64,
    /// `None` marks a point where the function is undefined
    pub y: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSeries {
    points: Vec<SamplePoint>,
}

impl SampleSeries {
    pub fn new(points: Vec<SamplePoint>) -> Self {
        Self { points }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[SamplePoint] {
        &self.points
    }

    pub fn xs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    /// points with a finite value
    pub fn defined(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points.iter().filter_map(|p| p.y.map(|y| (p.x, y)))
    }

    pub fn undefined_count(&self) -> usize {
        self.points.iter().filter(|p| p.y.is_none()).count()
    }

    /// smallest and largest defined value, `None` if nothing is defined
    pub fn y_range(&self) -> Option<(f64, f64)> {
        self.defined().fold(None, |acc, (_, y)| match acc {
            None => Some((y, y)),
            Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
        })
    }

    /// Maximal runs of consecutive defined points. A line drawn per run leaves a gap
    /// wherever the function is undefined.
    pub fn runs(&self) -> Vec<Vec<(f64, f64)>> {
        let mut runs = Vec::new();
        let mut current = Vec::new();
        for point in &self.points {
            match point.y {
                Some(y) => current.push((point.x, y)),
                None => {
                    if !current.is_empty() {
                        runs.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if !current.is_empty() {
            runs.push(current);
        }
        runs
    }
}

/// Samples `f` on `domain` with values rounded to 4 decimals.
pub fn sample<F: ScalarFunction>(f: &F, domain: &Domain) -> SampleSeries {
    sample_with(f, domain, Precision::default())
}

/// Samples `f` on `domain`. Evaluation errors and non-finite values become undefined points.
pub fn sample_with<F: ScalarFunction>(f: &F, domain: &Domain, precision: Precision) -> SampleSeries {
    let points: Vec<SamplePoint> = domain
        .abscissae()
        .map(|x| {
            let y = match f.evaluate(x) {
                Ok(y) if y.is_finite() => Some(precision.apply(y)),
                _ => None,
            };
            SamplePoint {
                x: precision.apply(x),
                y,
            }
        })
        .collect();
    let series = SampleSeries::new(points);
    let undefined = series.undefined_count();
    if undefined > 0 {
        debug!(
            "{}: {} of {} samples undefined",
            f.name(),
            undefined,
            series.len()
        );
    }
    series
}

/// Compiles `formula` and samples it; a formula that does not compile gives an empty series.
pub fn sample_formula(evaluator: &Evaluator, formula: &str, domain: &Domain) -> SampleSeries {
    match evaluator.compile(formula) {
        Ok(compiled) => sample(&compiled, domain),
        Err(err) => {
            warn!("formula '{}' not sampled: {}", formula, err);
            SampleSeries::empty()
        }
    }
}

/// Samples a derivative when one is available, otherwise returns an empty series.
pub fn sample_derivative<F: ScalarFunction>(derivative: Option<&F>, domain: &Domain) -> SampleSeries {
    match derivative {
        Some(f) => sample(f, domain),
        None => SampleSeries::empty(),
    }
}

impl Derivative {
    pub fn sample(&self, domain: &Domain) -> SampleSeries {
        sample(&self.compiled, domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::symbolic_lambdify::{ClosureFunction, CompiledExpr};
    use approx::assert_relative_eq;

    fn compile(formula: &str) -> CompiledExpr {
        Evaluator::new().compile(formula).unwrap()
    }

    #[test]
    fn test_grid_properties() {
        let f = compile("x");
        for (min, max, count) in [(-10.0, 10.0, 400), (0.0, 1.0, 2), (-3.5, 7.25, 1999)] {
            let domain = Domain::new(min, max, count);
            let series = sample(&f, &domain);
            assert_eq!(series.len(), count);
            assert_relative_eq!(series.points()[0].x, min, epsilon = 1e-4);
            assert_relative_eq!(series.points()[count - 1].x, max, epsilon = 1e-4);
            assert!(series.points().windows(2).all(|w| w[1].x > w[0].x));
            assert_eq!(series.undefined_count(), 0);
        }
    }

    #[test]
    fn test_count_clamped() {
        assert_eq!(Domain::new(0.0, 1.0, 0).count(), 2);
        assert_eq!(Domain::new(0.0, 1.0, 1).count(), 2);
        assert_eq!(Domain::new(0.0, 1.0, 5000).count(), 2000);
        assert_eq!(Domain::new(0.0, 1.0, 400).count(), 400);
    }

    #[test]
    fn test_count_from_inputs() {
        let count = |raw: &str| Domain::from_inputs(0.0, 1.0, raw).count();
        assert_eq!(count("abc"), 400);
        assert_eq!(count(""), 400);
        assert_eq!(count("0"), 400);
        assert_eq!(count("NaN"), 400);
        assert_eq!(count("-7"), 2);
        assert_eq!(count(" 12.9 "), 12);
        assert_eq!(count("1e9"), 2000);
        assert_eq!(count("inf"), 2000);
        assert_eq!(count("250"), 250);
    }

    #[test]
    fn test_undefined_at_pole() {
        let f = compile("1/x");
        let series = sample(&f, &Domain::new(-1.0, 1.0, 5));
        let ys: Vec<Option<f64>> = series.points().iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![Some(-1.0), Some(-2.0), None, Some(2.0), Some(1.0)]);
        assert_eq!(series.runs().len(), 2);
        assert_eq!(series.y_range(), Some((-2.0, 2.0)));
    }

    #[test]
    fn test_evaluation_errors_are_undefined() {
        let f = compile("x + k");
        let series = sample(&f, &Domain::new(0.0, 1.0, 10));
        assert_eq!(series.len(), 10);
        assert_eq!(series.undefined_count(), 10);
        assert!(series.runs().is_empty());
        assert_eq!(series.y_range(), None);
        let f = compile("sqrt(x)");
        let series = sample(&f, &Domain::new(-1.0, 1.0, 3));
        assert_eq!(series.undefined_count(), 1);
    }

    #[test]
    fn test_rounding_policy() {
        let third = ClosureFunction::new(|x| x / 3.0, "third".to_string());
        let domain = Domain::new(0.0, 1.0, 2);
        let rounded = sample(&third, &domain);
        assert_eq!(rounded.points()[1].y, Some(0.3333));
        let full = sample_with(&third, &domain, Precision::Full);
        assert_eq!(full.points()[1].y, Some(1.0 / 3.0));
        assert_eq!(Precision::Display(4).apply(-2.71828), -2.7183);
        assert_eq!(Precision::Display(4).apply(1e300), 1e300);
    }

    #[test]
    fn test_reversed_and_degenerate_domain() {
        let f = compile("x");
        let series = sample(&f, &Domain::new(1.0, -1.0, 3));
        assert_eq!(series.xs(), vec![1.0, 0.0, -1.0]);
        let series = sample(&f, &Domain::new(2.0, 2.0, 4));
        assert_eq!(series.len(), 4);
        assert!(series.points().iter().all(|p| p.x == 2.0));
    }

    #[test]
    fn test_sample_formula_degrades_to_empty() {
        let evaluator = Evaluator::new();
        let domain = Domain::default();
        assert!(sample_formula(&evaluator, "sin(x", &domain).is_empty());
        assert_eq!(sample_formula(&evaluator, "sin(x)", &domain).len(), 400);
    }

    #[test]
    fn test_sample_derivative() {
        let domain = Domain::new(0.0, 2.0, 3);
        assert!(sample_derivative::<CompiledExpr>(None, &domain).is_empty());
        let derivative = Evaluator::new().derive("x^2", "x").unwrap();
        let series = sample_derivative(Some(&derivative.compiled), &domain);
        let ys: Vec<f64> = series.defined().map(|(_, y)| y).collect();
        assert_eq!(ys, vec![0.0, 2.0, 4.0]);
        assert_eq!(derivative.sample(&domain), series);
    }
}
