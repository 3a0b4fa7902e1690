//! Defines command-line interface options using `clap` for the sensor_stats application.

use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// A CLI tool for summarizing sensor exports
#[derive(Parser, Debug)]
#[command(
    version,
    name = "sensor_stats",
    about = "Monthly min/mean/max per device and sensor, computed in parallel"
)]
pub struct Args {
    /// Path to the sensor export (delimiter is detected from the header)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Path of the `;`-separated report to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// Number of worker threads. Defaults to the number of online processors.
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Ignore observations before this date, formatted as YYYY-MM-DD
    #[arg(long, value_parser = parse_date_arg, default_value = "2024-03-01")]
    pub start_date: NaiveDate,

    /// Enable verbose output.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}': expected 'YYYY-MM-DD'.", s))
}
