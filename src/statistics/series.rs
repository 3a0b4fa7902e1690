//! Series records passed through the batch engine.

/// Summary statistics of one series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl SeriesStats {
    /// Statistics of a series with no samples.
    pub const EMPTY: SeriesStats = SeriesStats {
        min: 0.0,
        max: 0.0,
        mean: 0.0,
    };
}

/// One sequence of samples plus its computed summary.
///
/// The samples are borrowed from the caller, who keeps ownership of the
/// storage for as long as the series lives. The engine only reads `values`
/// and only writes `min`, `max` and `mean`.
#[derive(Debug, Clone, PartialEq)]
pub struct Series<'a> {
    pub values: &'a [f64],
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl<'a> Series<'a> {
    /// Wrap a sample slice. Output fields start at zero and carry no meaning
    /// until the series has been through a batch.
    pub fn new(values: &'a [f64]) -> Self {
        Self {
            values,
            min: 0.0,
            max: 0.0,
            mean: 0.0,
        }
    }

    /// Number of valid samples.
    pub fn n(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn stats(&self) -> SeriesStats {
        SeriesStats {
            min: self.min,
            max: self.max,
            mean: self.mean,
        }
    }

    pub(crate) fn set_stats(&mut self, stats: SeriesStats) {
        self.min = stats.min;
        self.max = stats.max;
        self.mean = stats.mean;
    }
}

impl<'a> From<&'a [f64]> for Series<'a> {
    fn from(values: &'a [f64]) -> Self {
        Series::new(values)
    }
}

impl<'a> From<&'a Vec<f64>> for Series<'a> {
    fn from(values: &'a Vec<f64>) -> Self {
        Series::new(values.as_slice())
    }
}
