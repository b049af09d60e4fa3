use chrono::Local;
use log::{LevelFilter, debug};
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::fmt;
use std::fs::File;

#[derive(Debug)]
pub enum LoggerError {
    UnknownLevel(String),
    Io(std::io::Error),
}

impl fmt::Display for LoggerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LoggerError::UnknownLevel(level) => write!(
                f,
                "loglevel must be debug, info, warn, error or off, got '{}'",
                level
            ),
            LoggerError::Io(err) => write!(f, "cannot create log file: {}", err),
        }
    }
}

impl std::error::Error for LoggerError {}

pub fn parse_level(level: &str) -> Result<LevelFilter, LoggerError> {
    match level.trim().to_lowercase().as_str() {
        "debug" => Ok(LevelFilter::Debug),
        "info" => Ok(LevelFilter::Info),
        "warn" => Ok(LevelFilter::Warn),
        "error" => Ok(LevelFilter::Error),
        "off" => Ok(LevelFilter::Off),
        _ => Err(LoggerError::UnknownLevel(level.to_string())),
    }
}

/// log_<date>_<time>.txt
pub fn log_file_name() -> String {
    let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
    format!("log_{}.txt", date_and_time)
}

/// Terminal logger plus, if `to_file`, a copy written to a timestamped file whose name is returned.
/// A second initialization in the same process is ignored.
pub fn init_logger(level: &str, to_file: bool) -> Result<Option<String>, LoggerError> {
    let log_option = parse_level(level)?;
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        log_option,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    let mut file_name = None;
    if to_file {
        let name = log_file_name();
        let file = File::create(&name).map_err(LoggerError::Io)?;
        loggers.push(WriteLogger::new(log_option, Config::default(), file));
        file_name = Some(name);
    }
    if CombinedLogger::init(loggers).is_err() {
        debug!("logger already initialized");
    }
    Ok(file_name)
}
