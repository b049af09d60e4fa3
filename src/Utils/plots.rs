use crate::numerical::sampler::SampleSeries;
use plotters::prelude::*;
use std::error::Error;

/// (min, max) widened so that a flat or empty range still gives a drawable axis
fn padded(range: Option<(f64, f64)>) -> (f64, f64) {
    match range {
        None => (-1.0, 1.0),
        Some((lo, hi)) if lo == hi => (lo - 1.0, hi + 1.0),
        Some((lo, hi)) => {
            let margin = 0.05 * (hi - lo);
            (lo - margin, hi + margin)
        }
    }
}

fn x_range(series: &SampleSeries) -> Option<(f64, f64)> {
    series.points().iter().fold(None, |acc, p| match acc {
        None => Some((p.x, p.x)),
        Some((lo, hi)) => Some((lo.min(p.x), hi.max(p.x))),
    })
}

fn merge(a: Option<(f64, f64)>, b: Option<(f64, f64)>) -> Option<(f64, f64)> {
    match (a, b) {
        (Some((a_lo, a_hi)), Some((b_lo, b_hi))) => Some((a_lo.min(b_lo), a_hi.max(b_hi))),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Draws `f(x)` and optionally `f'(x)` into a PNG file. Every run of defined points is a separate
/// line, so undefined samples show up as gaps.
pub fn plot_series(
    filename: &str,
    caption: &str,
    arg: &str,
    function: &SampleSeries,
    derivative: Option<(&str, &SampleSeries)>,
) -> Result<(), Box<dyn Error>> {
    let (x_min, x_max) = padded(x_range(function));
    let y_range = merge(
        function.y_range(),
        derivative.and_then(|(_, series)| series.y_range()),
    );
    let (y_min, y_max) = padded(y_range);

    let root_area = BitMapBackend::new(filename, (800, 600)).into_drawing_area();
    root_area.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root_area)
        .caption(caption, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc(arg)
        .y_desc(format!("f({})", arg))
        .draw()?;

    let mut curves = vec![(format!("f({})", arg), function, RED)];
    if let Some((text, series)) = derivative {
        curves.push((format!("f'({}) = {}", arg, text), series, BLUE));
    }

    for (label, series, color) in curves {
        for (i, run) in series.runs().into_iter().enumerate() {
            let drawn = chart.draw_series(LineSeries::new(run, &color))?;
            if i == 0 {
                drawn
                    .label(label.clone())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
            }
        }
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root_area.present()?;
    Ok(())
}
