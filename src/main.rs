//! Entry point for the sensor_stats application.
//! Handles CLI parsing, logging setup, and runs the export → batch → report pipeline.

use clap::Parser;
use sensor_stats::errors::{Result, SensorStatsError};
use sensor_stats::ingest::read_observations;
use sensor_stats::parallel::{get_parallel_info, ParallelConfig};
use sensor_stats::report::{ReportConfig, SensorReport};

mod cli;

use cli::Args;

fn main() {
    let args = Args::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(level)
        .parse_default_env()
        .init();

    log::info!("sensor_stats {} loaded", env!("CARGO_PKG_VERSION"));

    if let Err(error) = run(&args) {
        log::error!("{error}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let parallel = ParallelConfig::new(args.threads);
    parallel.validate()?;

    if args.verbose {
        get_parallel_info().log_info();
    }

    let config = ReportConfig {
        start_date: args
            .start_date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| SensorStatsError::InvalidInput {
                message: format!("start date {} is out of range", args.start_date),
            })?,
        parallel,
    };

    let observations = read_observations(&args.input)?;
    let report = SensorReport::build(&observations, &config);
    report.write_csv(&args.output)?;

    println!("✅ Saved result to {}", args.output.display());
    Ok(())
}
