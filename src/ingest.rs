//! Sensor export ingestion
//!
//! Reads delimited sensor exports into [`Observation`]s. Two row shapes are
//! accepted in the same file: plain rows with one column per sensor, and rows
//! whose `device` cell holds a JSON payload carrying a list of readings.

use crate::errors::{Result, SensorStatsError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;
use std::fs;
use std::path::Path;

/// Sensor columns, in report order.
pub const SENSORS: [&str; 6] = [
    "temperatura",
    "umidade",
    "luminosidade",
    "ruido",
    "eco2",
    "etvoc",
];

/// Column holding the device name (or a JSON payload).
pub const DEVICE_COLUMN: &str = "device";

/// Column holding the sample timestamp.
pub const TIME_COLUMN: &str = "data";

const DELIMITER_CANDIDATES: [u8; 4] = [b';', b',', b'|', b'\t'];

/// Cells read as "not available", as pandas does by default.
const NA_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Maps a payload variable name onto its sensor column.
pub fn sensor_for_variable(variable: &str) -> Option<&'static str> {
    match variable {
        "temperature" => Some("temperatura"),
        "humidity" => Some("umidade"),
        "luminosity" => Some("luminosidade"),
        "noise" => Some("ruido"),
        "eco2" => Some("eco2"),
        "etvoc" => Some("etvoc"),
        _ => None,
    }
}

fn sensor_index(sensor: &str) -> Option<usize> {
    SENSORS.iter().position(|&s| s == sensor)
}

/// One timestamped row of readings.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Reporting device; `None` when the row names none.
    pub device: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Readings indexed like [`SENSORS`]; `None` when absent.
    pub readings: [Option<f64>; SENSORS.len()],
}

impl Observation {
    pub fn new(device: Option<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            device,
            timestamp,
            readings: [None; SENSORS.len()],
        }
    }

    /// Calendar month of the observation, formatted `YYYY-MM`.
    pub fn month(&self) -> String {
        self.timestamp.format("%Y-%m").to_string()
    }

    pub fn reading(&self, sensor: &str) -> Option<f64> {
        sensor_index(sensor).and_then(|i| self.readings[i])
    }
}

fn is_na(cell: &str) -> bool {
    NA_TOKENS.contains(&cell)
}

/// Sensor cells additionally use `-` for "no reading".
fn is_missing_sample(cell: &str) -> bool {
    cell == "-" || is_na(cell)
}

/// Picks the delimiter among `; , | \t` that occurs most often in the header
/// line. Ties go to the earlier candidate; `;` when none occurs.
pub fn sniff_delimiter(header: &str) -> u8 {
    let mut best = DELIMITER_CANDIDATES[0];
    let mut best_count = 0;
    for &candidate in &DELIMITER_CANDIDATES {
        let count = header.bytes().filter(|&b| b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

/// Parses a sensor cell: decimal commas are accepted, missing-value markers
/// and NaN map to `None`.
pub fn parse_sample(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', ".");
    let cleaned = cleaned.trim();
    if is_missing_sample(cleaned) {
        return None;
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_nan() => None,
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("Ignoring unparsable sample value '{}'", raw);
            None
        }
    }
}

/// Parses a payload value, which may carry a leading `+` and a decimal comma.
fn parse_payload_value(value: &JsonValue) -> Option<f64> {
    let text = match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    };
    let cleaned = text.trim().trim_start_matches('+').replace(',', ".");
    cleaned.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Parses a timestamp in RFC 3339 or a common `YYYY-MM-DD[ HH:MM[:SS[.f]]]`
/// layout. Times without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(raw, fmt) {
            return Some(ts.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Expands a JSON payload into one observation per usable reading.
///
/// Malformed payloads yield nothing. Entries with an unknown variable, an
/// unparsable value or an unparsable time are skipped.
pub fn parse_json_payload(payload: &str) -> Vec<Observation> {
    let obj: JsonValue = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => {
            log::debug!("Skipping malformed JSON payload: {}", e);
            return Vec::new();
        }
    };

    let device = ["device_name", "device_id"]
        .iter()
        .filter_map(|key| obj.get(key))
        .find_map(|v| match v {
            JsonValue::Null => None,
            JsonValue::String(s) if s.is_empty() => None,
            JsonValue::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
        .unwrap_or_else(|| "unknown".to_string());

    let Some(entries) = obj.get("data").and_then(JsonValue::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let sensor = entry
                .get("variable")
                .and_then(JsonValue::as_str)
                .and_then(sensor_for_variable)?;
            let value = parse_payload_value(entry.get("value")?)?;
            let timestamp = entry
                .get("time")
                .and_then(JsonValue::as_str)
                .and_then(parse_timestamp)?;

            let mut observation = Observation::new(Some(device.clone()), timestamp);
            observation.readings[sensor_index(sensor)?] = Some(value);
            Some(observation)
        })
        .collect()
}

/// Reads observations from delimited text.
///
/// # Errors
///
/// Returns an error if the header line is empty, lacks the device or time
/// column, or if the text is not valid delimited data.
pub fn read_observations_from_str(text: &str, delimiter: u8) -> Result<Vec<Observation>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(SensorStatsError::InvalidInput {
            message: "export has no header line".to_string(),
        });
    }
    let column = |name: &str| headers.iter().position(|h| h == name);

    let device_idx = column(DEVICE_COLUMN).ok_or_else(|| SensorStatsError::MissingColumn {
        column: DEVICE_COLUMN.to_string(),
    })?;
    let time_idx = column(TIME_COLUMN).ok_or_else(|| SensorStatsError::MissingColumn {
        column: TIME_COLUMN.to_string(),
    })?;
    let sensor_idx: Vec<Option<usize>> = SENSORS.iter().map(|&s| column(s)).collect();

    let mut observations = Vec::new();
    let mut dropped = 0_usize;
    for record in reader.records() {
        let record = record?;
        let device = record.get(device_idx).unwrap_or("");

        if device.starts_with('{') {
            observations.extend(parse_json_payload(device));
            continue;
        }

        let Some(timestamp) = record.get(time_idx).and_then(parse_timestamp) else {
            dropped += 1;
            continue;
        };
        let device = device.trim();
        let device = (!is_na(device)).then(|| device.to_string());

        let mut observation = Observation::new(device, timestamp);
        for (slot, idx) in observation.readings.iter_mut().zip(&sensor_idx) {
            *slot = idx.and_then(|i| record.get(i)).and_then(parse_sample);
        }
        observations.push(observation);
    }

    if dropped > 0 {
        log::debug!("Dropped {} rows without a valid time", dropped);
    }
    Ok(observations)
}

/// Reads a sensor export, sniffing the delimiter from its header line.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid export.
pub fn read_observations<P: AsRef<Path>>(path: P) -> Result<Vec<Observation>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let header = text.lines().next().unwrap_or("");
    let delimiter = sniff_delimiter(header);
    log::debug!(
        "Reading {} with delimiter {:?}",
        path.display(),
        delimiter as char
    );

    let observations = read_observations_from_str(&text, delimiter)?;
    log::info!(
        "Loaded {} observations from {}",
        observations.len(),
        path.display()
    );
    Ok(observations)
}
