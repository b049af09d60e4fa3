//! different utility modules used throughout the project
/// logger setup: terminal and timestamped log file
pub mod logger;
/// tiny module to save sampled series into a csv file
pub mod csv_export;
/// tiny module to plot sampled series into a png file
pub mod plots;
/// reading the task file of the binary
pub mod config;
/// pretty-printed summaries of plots and integrals
pub mod summary;
