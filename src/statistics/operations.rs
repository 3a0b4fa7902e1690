//! Core statistical operations
//!
//! This module defines the per-series reduction run by every worker.

use super::series::{Series, SeriesStats};

/// Statistics produced for each series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatOperation {
    /// Minimum value
    Min,
    /// Maximum value
    Max,
    /// Arithmetic mean
    Mean,
}

impl StatOperation {
    /// Report column holding this statistic
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::Min => "valor_minimo",
            Self::Max => "valor_maximo",
            Self::Mean => "valor_medio",
        }
    }

    /// Read this statistic out of a computed summary
    #[must_use]
    pub fn select(self, stats: &SeriesStats) -> f64 {
        match self {
            Self::Min => stats.min,
            Self::Max => stats.max,
            Self::Mean => stats.mean,
        }
    }
}

/// Computes min, max and mean of a sample slice in a single linear scan.
///
/// The mean is a plain running sum in scan order divided by the count. An
/// empty slice yields [`SeriesStats::EMPTY`].
#[must_use]
pub fn summarize(values: &[f64]) -> SeriesStats {
    let Some(&first) = values.first() else {
        return SeriesStats::EMPTY;
    };

    let mut min = first;
    let mut max = first;
    let mut sum = 0.0_f64;
    for &v in values {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
        sum += v;
    }

    #[allow(clippy::cast_precision_loss)]
    let mean = sum / values.len() as f64;

    SeriesStats { min, max, mean }
}

/// Populates `min`, `max` and `mean` of one series from its samples.
pub fn reduce_series(series: &mut Series<'_>) {
    let stats = summarize(series.values);
    series.set_stats(stats);
}

/// Reduces every series of a contiguous range.
pub fn reduce_range(series: &mut [Series<'_>]) {
    for s in series.iter_mut() {
        reduce_series(s);
    }
}
