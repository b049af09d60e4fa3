use crate::numerical::sampler::SampleSeries;
use csv::Writer;
use std::fs::File;
use std::io::Write;

fn cell(y: Option<f64>) -> String {
    y.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes `x, f(x)[, f'(x)]` rows; undefined values are empty cells.
pub fn write_series_csv<W: Write>(
    writer: W,
    arg: &str,
    function: &SampleSeries,
    derivative: Option<&SampleSeries>,
) -> Result<(), csv::Error> {
    let mut writer = Writer::from_writer(writer);
    let derivative = derivative.filter(|d| !d.is_empty());

    let mut headers = vec![arg.to_string(), format!("f({})", arg)];
    if derivative.is_some() {
        headers.push(format!("f'({})", arg));
    }
    writer.write_record(&headers)?;

    for (i, point) in function.points().iter().enumerate() {
        let mut row_data = vec![point.x.to_string(), cell(point.y)];
        if let Some(derivative) = derivative {
            row_data.push(cell(derivative.points().get(i).and_then(|p| p.y)));
        }
        writer.write_record(&row_data)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn save_series_to_csv(
    filename: &str,
    arg: &str,
    function: &SampleSeries,
    derivative: Option<&SampleSeries>,
) -> Result<(), csv::Error> {
    let file = File::create(filename)?;
    write_series_csv(file, arg, function, derivative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerical::sampler::{Domain, sample};
    use crate::symbolic::evaluator::Evaluator;

    #[test]
    fn test_undefined_cells_are_empty() {
        let evaluator = Evaluator::new();
        let f = evaluator.compile("1/x").unwrap();
        let df = evaluator.derive("1/x", "x").unwrap();
        let domain = Domain::new(-1.0, 1.0, 3);
        let series = sample(&f, &domain);
        let derivative = df.sample(&domain);

        let mut buffer = Vec::new();
        write_series_csv(&mut buffer, "x", &series, Some(&derivative)).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "x,f(x),f'(x)\n-1,-1,-1\n0,,\n1,1,-1\n");
    }

    #[test]
    fn test_without_derivative() {
        let f = Evaluator::new().compile("2x").unwrap();
        let series = sample(&f, &Domain::new(0.0, 1.0, 2));
        let mut buffer = Vec::new();
        write_series_csv(&mut buffer, "x", &series, Some(&SampleSeries::empty())).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "x,f(x)\n0,0\n1,2\n");
    }
}
