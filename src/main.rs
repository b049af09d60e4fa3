#![allow(non_snake_case)]
use RustedFormulaPlot::Utils::config::PlotterConfig;
use RustedFormulaPlot::Utils::csv_export::save_series_to_csv;
use RustedFormulaPlot::Utils::logger::init_logger;
use RustedFormulaPlot::Utils::plots::plot_series;
use RustedFormulaPlot::Utils::summary::{integration_summary, plot_summary};
use RustedFormulaPlot::numerical::plot_task::{
    IntegrationRequest, PlotRequest, build_plot, run_integration,
};
use RustedFormulaPlot::numerical::sampler::Domain;
use RustedFormulaPlot::symbolic::evaluator::Evaluator;
use RustedFormulaPlot::symbolic::normalization::{
    FormulaNormalizer, NotConfigured, RuleBasedNormalizer,
};
use clap::Parser;
use log::{error, info};
use std::error::Error;

#[derive(Parser)]
#[command(author, version, about = "Plot a formula of x, its derivative and its definite integral", long_about = None)]
struct Cli {
    /// Formula in x, e.g. "sin(x) + 0.5 * x"
    #[arg(short, long)]
    formula: Option<String>,
    /// Left end of the plotted interval
    #[arg(long, allow_negative_numbers = true)]
    min: Option<f64>,
    /// Right end of the plotted interval
    #[arg(long, allow_negative_numbers = true)]
    max: Option<f64>,
    /// Number of samples, clamped to [2, 2000]; anything non-numeric means 400
    #[arg(short, long, allow_hyphen_values = true)]
    samples: Option<String>,
    /// Also plot the symbolic derivative
    #[arg(short, long)]
    derivative: bool,
    /// Integrate over [A, B] with Simpson's rule
    #[arg(long, num_args = 2, value_names = ["A", "B"], allow_negative_numbers = true)]
    integrate: Option<Vec<f64>>,
    /// Number of Simpson segments (made even, default 1000)
    #[arg(long, allow_negative_numbers = true)]
    segments: Option<f64>,
    /// Formula normalizer: none | rules
    #[arg(long)]
    normalize: Option<String>,
    /// TOML task file; command line flags take precedence
    #[arg(short, long)]
    config: Option<String>,
    /// Write x, f(x), f'(x) to this CSV file
    #[arg(long)]
    csv: Option<String>,
    /// Draw the plot into this PNG file
    #[arg(long)]
    png: Option<String>,
    /// debug | info | warn | error | off
    #[arg(long)]
    loglevel: Option<String>,
}

impl Cli {
    fn apply_to(self, config: &mut PlotterConfig) {
        if let Some(formula) = self.formula {
            config.formula = formula;
        }
        if let Some(min) = self.min {
            config.x_min = min;
        }
        if let Some(max) = self.max {
            config.x_max = max;
        }
        if let Some(samples) = self.samples {
            config.samples = samples;
        }
        if self.derivative {
            config.derivative = true;
        }
        if let Some(bounds) = self.integrate {
            if let [a, b] = bounds[..] {
                config.integrate = true;
                config.integral_a = a;
                config.integral_b = b;
            }
        }
        if let Some(segments) = self.segments {
            config.segments = segments;
        }
        if let Some(normalize) = self.normalize {
            config.normalize = normalize;
        }
        if self.csv.is_some() {
            config.csv = self.csv;
        }
        if self.png.is_some() {
            config.png = self.png;
        }
        if let Some(loglevel) = self.loglevel {
            config.loglevel = loglevel;
        }
    }
}

fn normalizer_by_name(name: &str) -> Result<Box<dyn FormulaNormalizer>, Box<dyn Error>> {
    match name {
        "none" => Ok(Box::new(NotConfigured)),
        "rules" => Ok(Box::new(RuleBasedNormalizer::new()?)),
        other => Err(format!("normalizer must be none or rules, got '{}'", other).into()),
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => PlotterConfig::from_file(path)?,
        None => PlotterConfig::default(),
    };
    cli.apply_to(&mut config);

    if let Some(name) = init_logger(&config.loglevel, config.log_file)? {
        info!("logging to {}", name);
    }
    let normalizer = normalizer_by_name(&config.normalize)?;
    let evaluator = Evaluator::new();

    let request = PlotRequest {
        formula: config.formula.clone(),
        domain: Domain::from_inputs(config.x_min, config.x_max, &config.samples),
        derivative: config.derivative,
    };
    let outcome = build_plot(&request, &evaluator, normalizer.as_ref());
    println!("{}", plot_summary(&request.formula, &outcome));

    let derivative = outcome.derivative.as_ref();
    if let Some(path) = &config.csv {
        save_series_to_csv(path, "x", &outcome.series, derivative.map(|d| &d.series))?;
        info!("samples written to {}", path);
    }
    if let Some(path) = &config.png {
        let caption = outcome.expression.as_deref().unwrap_or(&request.formula);
        plot_series(
            path,
            caption,
            "x",
            &outcome.series,
            derivative.map(|d| (d.text.as_str(), &d.series)),
        )?;
        info!("plot written to {}", path);
    }

    if config.integrate {
        let integration = IntegrationRequest {
            formula: config.formula.clone(),
            a: config.integral_a,
            b: config.integral_b,
            segments: Some(config.segments),
        };
        match run_integration(&integration, &evaluator, normalizer.as_ref()) {
            Ok(report) => println!("{}", integration_summary(&integration, &report)),
            Err(err) => {
                error!("{}", err);
                println!("{}", err);
            }
        }
    }
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
