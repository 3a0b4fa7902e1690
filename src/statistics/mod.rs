//! Statistical computations and parallel batch reduction
//!
//! This module computes min, max and mean for batches of independent series,
//! spreading the batch across worker threads.
//!
//! # Organization
//!
//! This module is organized into submodules:
//! - [`series`]: Series records and their summary statistics
//! - [`operations`]: Per-series reduction run by each worker
//! - [`partition`]: Balanced splitting of a batch into worker ranges
//! - [`parallel`]: The batch engine that dispatches and joins workers

pub mod operations;
pub mod parallel;
pub mod partition;
pub mod series;

// Re-export the main types and functions for convenience
pub use operations::{reduce_range, reduce_series, summarize, StatOperation};
pub use parallel::{compute_stats_batch, compute_stats_batch_with, BatchEngine, BatchSummary, Dispatch};
pub use partition::{balanced_partitions, split_partitions, Partition};
pub use series::{Series, SeriesStats};
