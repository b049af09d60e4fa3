use crate::numerical::plot_task::{IntegrationRequest, PlotOutcome, format_integral};
use crate::numerical::simpson::IntegrationReport;
use tabled::{builder::Builder, settings::Style};

fn table(rows: Vec<Vec<String>>) -> String {
    let mut table = Builder::from(rows).build();
    table.with(Style::modern_rounded());
    table.to_string()
}

fn row(key: &str, value: String) -> Vec<String> {
    vec![key.to_string(), value]
}

/// Table describing a plot outcome
pub fn plot_summary(raw_formula: &str, outcome: &PlotOutcome) -> String {
    let mut rows = vec![row("formula", raw_formula.to_string())];
    match outcome.normalization.reason() {
        Some(reason) => rows.push(row("normalization", reason.to_string())),
        None => rows.push(row(
            "normalized",
            outcome.normalization.expression().to_string(),
        )),
    }
    rows.push(row(
        "plotted",
        outcome.expression.clone().unwrap_or_else(|| "-".to_string()),
    ));
    rows.push(row("samples", outcome.series.len().to_string()));
    rows.push(row("undefined", outcome.series.undefined_count().to_string()));
    if let Some((lo, hi)) = outcome.series.y_range() {
        rows.push(row("f range", format!("[{}, {}]", lo, hi)));
    }
    if let Some(derivative) = &outcome.derivative {
        rows.push(row("f'", derivative.text.clone()));
        rows.push(row(
            "f' undefined",
            derivative.series.undefined_count().to_string(),
        ));
    }
    if let Some(error) = &outcome.error {
        rows.push(row("error", error.clone()));
    }
    table(rows)
}

/// Table describing a definite integral
pub fn integration_summary(request: &IntegrationRequest, report: &IntegrationReport) -> String {
    let rows = vec![
        row("integrand", request.formula.clone()),
        row("interval", format!("[{}, {}]", request.a, request.b)),
        row("segments", report.segments.to_string()),
        row("step", report.step.to_string()),
        row("skipped points", report.skipped.len().to_string()),
        row("integral", format_integral(report.value)),
    ];
    table(rows)
}
