//! sensor_stats: parallel summary statistics for batches of sensor series
//!
//! A Rust library for computing the minimum, maximum and arithmetic mean of
//! many independent numeric series at once. The batch is split into balanced
//! contiguous partitions and each partition is reduced on its own worker
//! thread; the call returns only after every worker has been joined.
//!
//! ## Key Features
//!
//! - **Parallel Processing**: One worker per partition on a per-call pool
//! - **Hardware Probing**: Processor count queried fresh on every batch
//! - **Deterministic Results**: Each series depends only on its own samples
//! - **Sensor Reports**: Monthly per-device summaries from delimited exports
//!
//! ## Module Organization
//!
//! The library is organized into logical modules:
//!
//! - [`statistics`]: Series, partitioning and the batch reduction engine
//! - [`parallel`]: Processor probing and worker-count configuration
//! - [`ingest`]: Reading sensor exports (plain rows and JSON payloads)
//! - [`report`]: Grouping, batch reduction and report writing
//! - [`errors`]: Centralized error handling
//!
//! ## Usage Examples
//!
//! ```rust
//! use sensor_stats::prelude::*;
//!
//! let a = [3.0, 1.0, 2.0];
//! let b: [f64; 0] = [];
//! let c = [5.0];
//! let mut batch = vec![Series::new(&a), Series::new(&b), Series::new(&c)];
//!
//! compute_stats_batch(&mut batch);
//!
//! assert_eq!((batch[0].min, batch[0].max, batch[0].mean), (1.0, 3.0, 2.0));
//! assert_eq!((batch[1].min, batch[1].max, batch[1].mean), (0.0, 0.0, 0.0));
//! assert_eq!((batch[2].min, batch[2].max, batch[2].mean), (5.0, 5.0, 5.0));
//! ```
//!
//! Diagnostics go through the `log` facade and cost nothing unless the host
//! installs a logger.

// Core modules
pub mod errors;
pub mod ingest;
pub mod parallel;
pub mod report;
pub mod statistics;

// Direct re-exports for the public API
pub use errors::{Result, SensorStatsError};
pub use parallel::{processor_count, ParallelConfig, ProcessorCounter};
pub use statistics::{compute_stats_batch, Series, SeriesStats};

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::errors::{Result, SensorStatsError};
    pub use crate::ingest::{read_observations, Observation};
    pub use crate::parallel::{processor_count, HostCounter, ParallelConfig, ProcessorCounter};
    pub use crate::report::{ReportConfig, SensorReport};
    pub use crate::statistics::{
        compute_stats_batch, BatchEngine, BatchSummary, Dispatch, Series, SeriesStats,
        StatOperation,
    };
}
