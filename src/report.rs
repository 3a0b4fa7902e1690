//! Monthly per-device sensor report
//!
//! Groups observations by device, month and sensor, reduces every group in a
//! single parallel batch and writes the `;`-separated summary table.

use crate::errors::Result;
use crate::ingest::{Observation, SENSORS};
use crate::parallel::ParallelConfig;
use crate::statistics::{BatchEngine, BatchSummary, Series, SeriesStats, StatOperation};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Key columns leading every report line.
pub const KEY_COLUMNS: [&str; 3] = ["device", "ano-mes", "sensor"];

/// Statistic columns following the key columns, in output order.
pub const VALUE_COLUMNS: [StatOperation; 3] =
    [StatOperation::Max, StatOperation::Mean, StatOperation::Min];

/// Observations before 2024-03-01 are ignored unless configured otherwise.
pub fn default_start_date() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

/// Settings for building a report
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Earliest timestamp kept
    pub start_date: DateTime<Utc>,
    pub parallel: ParallelConfig,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            start_date: default_start_date(),
            parallel: ParallelConfig::default(),
        }
    }
}

/// One line of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub device: String,
    pub month: String,
    pub sensor: &'static str,
    pub stats: SeriesStats,
}

/// Samples of one (device, month) group, split by sensor.
struct Group {
    device: String,
    month: String,
    samples: [Vec<f64>; SENSORS.len()],
}

/// Computed report, ready to be written.
#[derive(Debug, Clone)]
pub struct SensorReport {
    rows: Vec<ReportRow>,
    batch: BatchSummary,
}

impl SensorReport {
    /// Builds the report from raw observations.
    ///
    /// Every device × month × sensor combination gets a row; combinations
    /// without samples report zero statistics. Months come from every kept
    /// observation, including those without a device.
    pub fn build(observations: &[Observation], config: &ReportConfig) -> Self {
        let mut kept: Vec<&Observation> = observations
            .iter()
            .filter(|o| o.timestamp >= config.start_date)
            .collect();
        kept.sort_by_key(|o| o.timestamp);
        log::debug!(
            "{} of {} observations on or after {}",
            kept.len(),
            observations.len(),
            config.start_date
        );

        let mut groups: Vec<Group> = Vec::new();
        let mut group_index: HashMap<(String, String), usize> = HashMap::new();
        let mut devices: Vec<String> = Vec::new();
        let mut months: Vec<String> = Vec::new();

        for observation in kept {
            let month = observation.month();
            if !months.contains(&month) {
                months.push(month.clone());
            }
            // Rows without a device still count towards the month axis
            let Some(device) = observation.device.as_deref() else {
                continue;
            };

            let key = (device.to_string(), month.clone());
            let idx = *group_index.entry(key).or_insert_with(|| {
                groups.push(Group {
                    device: device.to_string(),
                    month,
                    samples: Default::default(),
                });
                groups.len() - 1
            });
            if !devices.iter().any(|d| d == device) {
                devices.push(device.to_string());
            }

            let group = &mut groups[idx];
            for (samples, reading) in group.samples.iter_mut().zip(observation.readings) {
                if let Some(value) = reading {
                    samples.push(value);
                }
            }
        }

        let mut batch: Vec<Series<'_>> = groups
            .iter()
            .flat_map(|g| g.samples.iter().map(Series::from))
            .collect();
        let summary = BatchEngine::new()
            .with_config(config.parallel.clone())
            .run(&mut batch);

        let mut rows: Vec<ReportRow> = groups
            .iter()
            .flat_map(|g| SENSORS.iter().map(move |&sensor| (g, sensor)))
            .zip(&batch)
            .map(|((g, sensor), series)| ReportRow {
                device: g.device.clone(),
                month: g.month.clone(),
                sensor,
                stats: series.stats(),
            })
            .collect();

        let seen: HashSet<(&str, &str)> = groups
            .iter()
            .map(|g| (g.device.as_str(), g.month.as_str()))
            .collect();
        let mut filled = Vec::new();
        for device in &devices {
            for month in &months {
                if seen.contains(&(device.as_str(), month.as_str())) {
                    continue;
                }
                filled.extend(SENSORS.iter().map(|&sensor| ReportRow {
                    device: device.clone(),
                    month: month.clone(),
                    sensor,
                    stats: SeriesStats::EMPTY,
                }));
            }
        }
        if !filled.is_empty() {
            log::debug!("Filled {} rows for device/month pairs without data", filled.len());
        }
        rows.extend(filled);

        rows.sort_by(|a, b| {
            (a.month.as_str(), a.device.as_str(), a.sensor)
                .cmp(&(b.month.as_str(), b.device.as_str(), b.sensor))
        });

        Self {
            rows,
            batch: summary,
        }
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    /// Bookkeeping of the batch that produced the statistics.
    pub fn batch(&self) -> &BatchSummary {
        &self.batch
    }

    /// Writes the report as `;`-separated text with values rounded to three
    /// decimals.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `writer` fails.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut out = csv::WriterBuilder::new()
            .delimiter(b';')
            .from_writer(writer);
        out.write_record(
            KEY_COLUMNS
                .into_iter()
                .chain(VALUE_COLUMNS.map(StatOperation::column_name)),
        )?;
        for row in &self.rows {
            let values = VALUE_COLUMNS.map(|op| format_value(op.select(&row.stats)));
            out.write_record(
                [row.device.as_str(), row.month.as_str(), row.sensor]
                    .into_iter()
                    .chain(values.iter().map(String::as_str)),
            )?;
        }
        out.flush()?;
        Ok(())
    }

    /// Writes the report to a file, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.write_to(file)?;
        log::info!(
            "Wrote {} report rows to {}",
            self.rows.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}

/// Rounds to three decimals.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Formats a rounded value, always keeping a decimal point (`2.0`, not `2`).
pub fn format_value(value: f64) -> String {
    format!("{:?}", round3(value))
}
