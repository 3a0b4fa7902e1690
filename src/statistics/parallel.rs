//! Batch reduction engine
//!
//! Partitions a batch of series into balanced contiguous ranges and reduces
//! each range on its own worker. Workers run on a rayon pool built fresh for
//! the call from scoped threads, so every worker has been joined by the time
//! the call returns.

use super::operations::reduce_range;
use super::partition::{balanced_partitions, split_partitions, Partition};
use super::series::Series;
use crate::errors::{Result, SensorStatsError};
use crate::parallel::{HostCounter, ParallelConfig, ProcessorCounter};
use rayon::ThreadPoolBuilder;

/// Runs one worker per partition and joins them all before returning.
pub(crate) type Dispatcher = fn(&mut [Series<'_>], &[Partition]) -> Result<()>;

/// How a batch was executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Empty batch, nothing ran
    Skipped,
    /// One worker per partition on a per-call pool
    Parallel,
    /// Workers could not be started; the calling thread reduced everything
    Sequential,
}

/// Bookkeeping of one batch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub nseries: usize,
    pub nthreads: usize,
    pub partitions: Vec<Partition>,
    pub dispatch: Dispatch,
}

impl BatchSummary {
    fn skipped() -> Self {
        Self {
            nseries: 0,
            nthreads: 0,
            partitions: Vec::new(),
            dispatch: Dispatch::Skipped,
        }
    }
}

/// Parallel batch reducer with an injectable processor counter.
#[derive(Debug, Clone)]
pub struct BatchEngine<P: ProcessorCounter = HostCounter> {
    counter: P,
    config: ParallelConfig,
    dispatcher: Dispatcher,
}

impl<P: ProcessorCounter + Default> Default for BatchEngine<P> {
    fn default() -> Self {
        Self::with_counter(P::default())
    }
}

impl BatchEngine<HostCounter> {
    /// Engine using the build-time host counter and no forced thread count
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: ProcessorCounter> BatchEngine<P> {
    /// Engine asking `counter` for the processor count
    pub fn with_counter(counter: P) -> Self {
        Self {
            counter,
            config: ParallelConfig::default(),
            dispatcher: dispatch_workers,
        }
    }

    /// Replace how workers are started
    #[must_use]
    pub(crate) fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Replace the parallel configuration
    #[must_use]
    pub fn with_config(mut self, config: ParallelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ParallelConfig {
        &self.config
    }

    /// Populates `min`, `max` and `mean` of every series in the batch.
    ///
    /// Blocks until every worker has finished. Each series' result depends
    /// only on its own samples, never on partition boundaries or scheduling.
    pub fn run(&self, series: &mut [Series<'_>]) -> BatchSummary {
        if series.is_empty() {
            log::debug!("compute_stats_batch called with an empty batch");
            return BatchSummary::skipped();
        }

        let nseries = series.len();
        let ncpus = self.config.resolve_threads(&self.counter);
        let nthreads = ncpus.min(nseries);
        log::info!(
            "compute_stats_batch nseries={} nthreads={}",
            nseries,
            nthreads
        );

        let partitions = balanced_partitions(nseries, nthreads);
        let dispatch = match (self.dispatcher)(&mut *series, &partitions) {
            Ok(()) => Dispatch::Parallel,
            Err(e) => {
                log::warn!(
                    "failed to start {} workers ({}), reducing batch on the calling thread",
                    nthreads,
                    e
                );
                reduce_range(series);
                Dispatch::Sequential
            }
        };

        log::info!("compute_stats_batch completed");
        BatchSummary {
            nseries,
            nthreads,
            partitions,
            dispatch,
        }
    }
}

/// Starts a scoped pool with one thread per partition and reduces each
/// partition on its own task.
fn dispatch_workers(series: &mut [Series<'_>], partitions: &[Partition]) -> Result<()> {
    ThreadPoolBuilder::new()
        .num_threads(partitions.len())
        .thread_name(|i| format!("stats-worker-{i}"))
        .build_scoped(
            |thread| thread.run(),
            |pool| {
                let chunks = split_partitions(series, partitions);
                pool.scope(|scope| {
                    for (partition, chunk) in partitions.iter().zip(chunks) {
                        scope.spawn(move |_| {
                            log::debug!(
                                "worker begin={} end={}",
                                partition.begin,
                                partition.end
                            );
                            reduce_range(chunk);
                        });
                    }
                });
            },
        )
        .map_err(|e| SensorStatsError::ThreadPoolError(e.to_string()))
}

/// Computes min, max and mean for every series of the batch, in place.
///
/// An empty batch is a no-op. The processor count is queried fresh on every
/// call and at most one worker per series is started.
pub fn compute_stats_batch(series: &mut [Series<'_>]) {
    BatchEngine::new().run(series);
}

/// Same as [`compute_stats_batch`] with an explicit parallel configuration.
pub fn compute_stats_batch_with(series: &mut [Series<'_>], config: &ParallelConfig) -> BatchSummary {
    BatchEngine::new().with_config(config.clone()).run(series)
}
