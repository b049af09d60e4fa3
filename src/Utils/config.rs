//! TOML task file for the `formula_plot` binary.
//!
//! ```toml
//! [plot]
//! formula = "sin(x) + 0.5 * x"
//! x_min = -10
//! x_max = 10
//! samples = 400
//! derivative = true
//! normalize = "rules"   # or "none"
//!
//! [integral]
//! a = -1
//! b = 1
//! segments = 1000
//!
//! [output]
//! csv = "plot.csv"
//! png = "plot.png"
//! loglevel = "info"
//! log_file = false
//! ```
//! Every key is optional.
use std::fmt;
use toml::{Table, Value};

#[derive(Debug)]
pub enum ConfigError {
    Io { path: String, source: std::io::Error },
    Parse(String),
    InvalidValue { key: String, expected: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => write!(f, "cannot read {}: {}", path, source),
            ConfigError::Parse(msg) => write!(f, "invalid TOML: {}", msg),
            ConfigError::InvalidValue { key, expected } => {
                write!(f, "invalid value for '{}': expected {}", key, expected)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotterConfig {
    pub formula: String,
    pub x_min: f64,
    pub x_max: f64,
    /// raw sample count, clamped later by `Domain::from_inputs`
    pub samples: String,
    pub derivative: bool,
    pub normalize: String,
    /// an [integral] section is present
    pub integrate: bool,
    pub integral_a: f64,
    pub integral_b: f64,
    pub segments: f64,
    pub csv: Option<String>,
    pub png: Option<String>,
    pub loglevel: String,
    pub log_file: bool,
}

impl Default for PlotterConfig {
    fn default() -> Self {
        Self {
            formula: "sin(x) + 0.5 * x".to_string(),
            x_min: -10.0,
            x_max: 10.0,
            samples: "400".to_string(),
            derivative: false,
            normalize: "none".to_string(),
            integrate: false,
            integral_a: -1.0,
            integral_b: 1.0,
            segments: 1000.0,
            csv: None,
            png: None,
            loglevel: "info".to_string(),
            log_file: false,
        }
    }
}

fn invalid(section: &str, key: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        key: format!("{}.{}", section, key),
        expected,
    }
}

struct Section<'a> {
    name: &'a str,
    table: Option<&'a Table>,
}

impl<'a> Section<'a> {
    fn new(root: &'a Table, name: &'a str) -> Result<Self, ConfigError> {
        let table = match root.get(name) {
            None => None,
            Some(Value::Table(table)) => Some(table),
            Some(_) => {
                return Err(ConfigError::InvalidValue {
                    key: name.to_string(),
                    expected: "a table",
                });
            }
        };
        Ok(Self { name, table })
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.table.and_then(|t| t.get(key))
    }

    fn f64(&self, key: &str, default: f64) -> Result<f64, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(Value::Float(v)) => Ok(*v),
            Some(Value::Integer(v)) => Ok(*v as f64),
            Some(_) => Err(invalid(self.name, key, "a number")),
        }
    }

    fn bool(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(Value::Boolean(v)) => Ok(*v),
            Some(_) => Err(invalid(self.name, key, "true or false")),
        }
    }

    fn string(&self, key: &str) -> Result<Option<String>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(v)) => Ok(Some(v.clone())),
            Some(_) => Err(invalid(self.name, key, "a string")),
        }
    }

    /// numbers and strings are both kept as text, like a form field
    fn raw(&self, key: &str) -> Result<Option<String>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(v)) => Ok(Some(v.clone())),
            Some(Value::Integer(v)) => Ok(Some(v.to_string())),
            Some(Value::Float(v)) => Ok(Some(v.to_string())),
            Some(_) => Err(invalid(self.name, key, "a number")),
        }
    }
}

impl PlotterConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let root = text
            .parse::<Table>()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        let defaults = Self::default();
        let plot = Section::new(&root, "plot")?;
        let integral = Section::new(&root, "integral")?;
        let output = Section::new(&root, "output")?;
        Ok(Self {
            formula: plot.string("formula")?.unwrap_or(defaults.formula),
            x_min: plot.f64("x_min", defaults.x_min)?,
            x_max: plot.f64("x_max", defaults.x_max)?,
            samples: plot.raw("samples")?.unwrap_or(defaults.samples),
            derivative: plot.bool("derivative", defaults.derivative)?,
            normalize: plot.string("normalize")?.unwrap_or(defaults.normalize),
            integrate: integral.table.is_some(),
            integral_a: integral.f64("a", defaults.integral_a)?,
            integral_b: integral.f64("b", defaults.integral_b)?,
            segments: integral.f64("segments", defaults.segments)?,
            csv: output.string("csv")?,
            png: output.string("png")?,
            loglevel: output.string("loglevel")?.unwrap_or(defaults.loglevel),
            log_file: output.bool("log_file", defaults.log_file)?,
        })
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
