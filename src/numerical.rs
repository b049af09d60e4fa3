/// Sampling of a compiled formula on an evenly spaced grid, with undefined points kept as gaps
///  Example#1
/// ```
/// use RustedFormulaPlot::numerical::sampler::{Domain, sample_formula};
/// use RustedFormulaPlot::symbolic::evaluator::Evaluator;
/// let series = sample_formula(&Evaluator::new(), "sin(x) + 0.5 * x", &Domain::from_inputs(-10.0, 10.0, "400"));
/// assert_eq!(series.len(), 400);
/// ```
pub mod sampler;
/// Definite integral by the composite Simpson's rule
///  Example#1
/// ```
/// use RustedFormulaPlot::numerical::simpson::integrate_formula;
/// use RustedFormulaPlot::symbolic::evaluator::Evaluator;
/// let report = integrate_formula(&Evaluator::new(), "x^2", 0.0, 3.0, 1000).unwrap();
/// assert!((report.value - 9.0).abs() < 1e-6);
/// ```
pub mod simpson;
/// Plot and integration requests: normalization, compile fallback, derivative
pub mod plot_task;
