//! Centralized error handling for sensor_stats
//!
//! The batch reduction itself never fails. These types cover the fallible
//! edges around it: reading sensor exports, writing reports and validating
//! configuration.

use std::fmt;

/// Main error type for sensor_stats operations
#[derive(Debug)]
pub enum SensorStatsError {
    /// I/O operation errors
    IoError(std::io::Error),

    /// Delimited file read/write errors
    CsvError(csv::Error),

    /// Required column missing from an input file
    MissingColumn { column: String },

    /// Malformed input or argument
    InvalidInput { message: String },

    /// Thread pool configuration error
    ThreadPoolError(String),

    /// Generic error for ad-hoc messages
    Generic(String),
}

impl fmt::Display for SensorStatsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorStatsError::IoError(e) => write!(f, "I/O error: {}", e),
            SensorStatsError::CsvError(e) => write!(f, "CSV error: {}", e),
            SensorStatsError::MissingColumn { column } => {
                write!(f, "Required column '{}' not found in input", column)
            }
            SensorStatsError::InvalidInput { message } => write!(f, "Invalid input: {}", message),
            SensorStatsError::ThreadPoolError(msg) => write!(f, "Thread pool error: {}", msg),
            SensorStatsError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for SensorStatsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SensorStatsError::IoError(e) => Some(e),
            SensorStatsError::CsvError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SensorStatsError {
    fn from(error: std::io::Error) -> Self {
        SensorStatsError::IoError(error)
    }
}

impl From<csv::Error> for SensorStatsError {
    fn from(error: csv::Error) -> Self {
        SensorStatsError::CsvError(error)
    }
}

impl From<String> for SensorStatsError {
    fn from(error: String) -> Self {
        SensorStatsError::Generic(error)
    }
}

impl From<&str> for SensorStatsError {
    fn from(error: &str) -> Self {
        SensorStatsError::Generic(error.to_string())
    }
}

/// Result type alias for sensor_stats operations
pub type Result<T> = std::result::Result<T, SensorStatsError>;
