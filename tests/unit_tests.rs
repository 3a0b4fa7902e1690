//! Unit tests for sensor_stats modules
//!
//! Cover the processor counter, partitioning, per-series reduction and the
//! batch engine's guarantees.

use sensor_stats::{
    errors::SensorStatsError,
    parallel::{
        get_parallel_info, processor_count, AvailableParallelism, OnlineProcessors,
        ParallelConfig, ProcessorCounter,
    },
    statistics::{
        balanced_partitions, compute_stats_batch, compute_stats_batch_with, reduce_range,
        split_partitions, summarize, BatchEngine, Dispatch, Partition, Series, SeriesStats,
        StatOperation,
    },
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counter returning a fixed count and recording how often it was asked.
struct FixedCounter {
    count: usize,
    calls: AtomicUsize,
}

impl FixedCounter {
    fn new(count: usize) -> Self {
        Self {
            count,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProcessorCounter for FixedCounter {
    fn processor_count(&self) -> usize {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.count
    }
}

/// Deterministic pseudo-random samples.
fn lcg_values(seed: u64, len: usize) -> Vec<f64> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 11) as f64 / (1u64 << 53) as f64) * 200.0 - 100.0
        })
        .collect()
}

fn reference_stats(values: &[f64]) -> SeriesStats {
    if values.is_empty() {
        return SeriesStats::EMPTY;
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for v in values {
        sum += v;
    }
    SeriesStats {
        min,
        max,
        mean: sum / values.len() as f64,
    }
}

fn assert_close(actual: f64, expected: f64) {
    let tolerance = 1e-12 * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_error_types() {
    let missing = SensorStatsError::MissingColumn {
        column: "device".to_string(),
    };
    assert!(format!("{}", missing).contains("Required column 'device'"));

    let pool_err = SensorStatsError::ThreadPoolError("boom".to_string());
    assert_eq!(format!("{}", pool_err), "Thread pool error: boom");

    let generic: SensorStatsError = "Test error".into();
    assert_eq!(format!("{}", generic), "Test error");

    let io: SensorStatsError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(format!("{}", io).starts_with("I/O error"));
    assert!(std::error::Error::source(&io).is_some());
}

#[test]
fn test_processor_counters_are_positive() {
    assert!(processor_count() >= 1);
    assert!(OnlineProcessors.processor_count() >= 1);
    assert!(AvailableParallelism.processor_count() >= 1);

    let info = get_parallel_info();
    assert!(info.host_processors >= 1);
    assert!(info.online_processors >= 1);
    assert!(info.physical_cores >= 1);
    assert!(info.available_parallelism >= 1);

    // Logging without an installed logger must not panic
    info.log_info();
}

#[test]
fn test_online_processors_fall_back_to_configured_count() {
    assert_eq!(OnlineProcessors::from_readings(Some(8), Some(16)), 8);
    // A zero or failed online reading falls back to the configured count
    assert_eq!(OnlineProcessors::from_readings(Some(0), Some(4)), 4);
    assert_eq!(OnlineProcessors::from_readings(None, Some(3)), 3);
    // Nothing usable at all still yields one processor
    assert_eq!(OnlineProcessors::from_readings(None, None), 1);
    assert_eq!(OnlineProcessors::from_readings(Some(0), Some(0)), 1);
    assert_eq!(OnlineProcessors::from_readings(None, Some(0)), 1);
}

#[test]
fn test_parallel_config() {
    let default_config = ParallelConfig::default();
    assert!(default_config.num_threads.is_none());
    assert!(default_config.validate().is_ok());

    let config_4 = ParallelConfig::with_threads(4);
    assert_eq!(config_4.num_threads, Some(4));
    assert_eq!(config_4.resolve_threads(&FixedCounter::new(16)), 4);

    let all_cores = ParallelConfig::all_cores();
    assert!(all_cores.num_threads.unwrap() >= 1);

    let counter = FixedCounter::new(6);
    assert_eq!(default_config.resolve_threads(&counter), 6);
    assert_eq!(counter.calls(), 1);

    // A misbehaving counter is still floored at one worker
    assert_eq!(default_config.resolve_threads(&FixedCounter::new(0)), 1);

    match ParallelConfig::with_threads(0).validate() {
        Err(SensorStatsError::ThreadPoolError(msg)) => assert!(msg.contains("at least 1")),
        other => panic!("Expected ThreadPoolError, got {:?}", other),
    }
}

#[test]
fn test_balanced_partitions_cover_every_index_once() {
    for nseries in 1..=40 {
        for nthreads in 1..=nseries {
            let partitions = balanced_partitions(nseries, nthreads);
            assert_eq!(partitions.len(), nthreads);

            let mut visited = vec![0_u32; nseries];
            for p in &partitions {
                for i in p.range() {
                    visited[i] += 1;
                }
            }
            assert!(
                visited.iter().all(|&v| v == 1),
                "nseries={nseries} nthreads={nthreads}: {visited:?}"
            );

            let sizes: Vec<usize> = partitions.iter().map(Partition::len).collect();
            let largest = *sizes.iter().max().unwrap();
            let smallest = *sizes.iter().min().unwrap();
            assert!(largest - smallest <= 1);
            assert!(smallest >= 1);
            // Larger partitions come first
            assert!(sizes.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}

#[test]
fn test_balanced_partitions_edge_cases() {
    assert!(balanced_partitions(0, 4).is_empty());

    // 10 series over 4 workers: 3, 3, 2, 2
    let partitions = balanced_partitions(10, 4);
    assert_eq!(
        partitions,
        vec![
            Partition { begin: 0, end: 3 },
            Partition { begin: 3, end: 6 },
            Partition { begin: 6, end: 8 },
            Partition { begin: 8, end: 10 },
        ]
    );

    // More workers than series are clamped, zero workers become one
    assert_eq!(balanced_partitions(3, 8).len(), 3);
    assert_eq!(balanced_partitions(5, 0), vec![Partition { begin: 0, end: 5 }]);
}

#[test]
fn test_split_partitions_hands_out_disjoint_slices() {
    let mut items: Vec<usize> = vec![0; 17];
    let partitions = balanced_partitions(items.len(), 5);
    let chunks = split_partitions(&mut items, &partitions);
    assert_eq!(chunks.len(), 5);

    for (worker, chunk) in chunks.into_iter().enumerate() {
        for slot in chunk.iter_mut() {
            *slot += worker + 1;
        }
    }

    // Every index was written exactly once, by the worker owning it
    for p in &partitions {
        let owner = partitions.iter().position(|q| q == p).unwrap();
        assert!(items[p.range()].iter().all(|&v| v == owner + 1));
    }
}

#[test]
fn test_summarize() {
    assert_eq!(summarize(&[]), SeriesStats::EMPTY);
    assert_eq!(
        summarize(&[7.25]),
        SeriesStats {
            min: 7.25,
            max: 7.25,
            mean: 7.25
        }
    );
    assert_eq!(
        summarize(&[3.0, 1.0, 2.0]),
        SeriesStats {
            min: 1.0,
            max: 3.0,
            mean: 2.0
        }
    );
    assert_eq!(
        summarize(&[-4.0, -8.0, 0.0, 12.0]),
        SeriesStats {
            min: -8.0,
            max: 12.0,
            mean: 0.0
        }
    );
}

#[test]
fn test_stat_operation() {
    let stats = summarize(&[1.0, 5.0, 3.0]);
    assert_eq!(StatOperation::Min.select(&stats), 1.0);
    assert_eq!(StatOperation::Max.select(&stats), 5.0);
    assert_eq!(StatOperation::Mean.select(&stats), 3.0);
    assert_eq!(StatOperation::Mean.column_name(), "valor_medio");
    assert_eq!(StatOperation::Max.column_name(), "valor_maximo");
    assert_ne!(StatOperation::Min, StatOperation::Max);
}

#[test]
fn test_compute_stats_batch_example() {
    let a = [3.0, 1.0, 2.0];
    let b: [f64; 0] = [];
    let c = [5.0];
    let mut batch = vec![Series::new(&a), Series::new(&b), Series::new(&c)];

    compute_stats_batch(&mut batch);

    assert_eq!(
        batch[0].stats(),
        SeriesStats {
            min: 1.0,
            max: 3.0,
            mean: 2.0
        }
    );
    assert_eq!(batch[1].stats(), SeriesStats::EMPTY);
    assert_eq!(
        batch[2].stats(),
        SeriesStats {
            min: 5.0,
            max: 5.0,
            mean: 5.0
        }
    );
}

#[test]
fn test_empty_batch_is_a_noop() {
    let counter = FixedCounter::new(4);
    let engine = BatchEngine::with_counter(counter);
    let mut batch: Vec<Series<'_>> = Vec::new();

    let summary = engine.run(&mut batch);

    assert_eq!(summary.dispatch, Dispatch::Skipped);
    assert_eq!(summary.nthreads, 0);
    assert!(summary.partitions.is_empty());

    // The free function accepts an empty slice as well
    compute_stats_batch(&mut []);
}

#[test]
fn test_empty_series_overwrites_stale_output() {
    let empty: [f64; 0] = [];
    let mut series = Series::new(&empty);
    series.min = 42.0;
    series.max = f64::NAN;
    series.mean = -1.0;
    let mut batch = vec![series];

    compute_stats_batch(&mut batch);

    assert_eq!(batch[0].min, 0.0);
    assert_eq!(batch[0].max, 0.0);
    assert_eq!(batch[0].mean, 0.0);
}

#[test]
fn test_engine_caps_workers_at_batch_size() {
    let values: Vec<Vec<f64>> = (0..3).map(|i| lcg_values(i, 10)).collect();
    let mut batch: Vec<Series<'_>> = values.iter().map(Series::from).collect();

    let engine = BatchEngine::with_counter(FixedCounter::new(8));
    let first = engine.run(&mut batch);
    let second = engine.run(&mut batch);

    // Never more workers than series
    assert_eq!(first.nthreads, 3);
    assert_eq!(first.partitions.len(), 3);
    assert_eq!(first.dispatch, Dispatch::Parallel);
    assert_eq!(second, first);
}

#[test]
fn test_engine_queries_counter_fresh_on_every_batch() {
    let values = lcg_values(9, 4);
    let mut batch = vec![Series::new(&values)];
    let counter = FixedCounter::new(2);
    let engine = BatchEngine::with_counter(&counter);

    engine.run(&mut batch);
    engine.run(&mut batch);
    assert_eq!(counter.calls(), 2);

    // Empty batches return before probing
    engine.run(&mut []);
    assert_eq!(counter.calls(), 2);

    // A forced thread count bypasses the counter
    let forced = BatchEngine::with_counter(&counter).with_config(ParallelConfig::with_threads(3));
    let summary = forced.run(&mut batch);
    assert_eq!(summary.nthreads, 1);
    assert_eq!(counter.calls(), 2);
}

#[test]
fn test_results_match_sequential_reference() {
    let values: Vec<Vec<f64>> = (0..257).map(|i| lcg_values(i, (i as usize * 7) % 50)).collect();
    let mut batch: Vec<Series<'_>> = values.iter().map(Series::from).collect();

    let summary = compute_stats_batch_with(&mut batch, &ParallelConfig::with_threads(6));
    assert_eq!(summary.nseries, 257);
    assert_eq!(summary.nthreads, 6);

    for (series, samples) in batch.iter().zip(&values) {
        let expected = reference_stats(samples);
        assert_eq!(series.min, expected.min);
        assert_eq!(series.max, expected.max);
        assert_close(series.mean, expected.mean);
    }
}

#[test]
fn test_results_independent_of_thread_count() {
    let values: Vec<Vec<f64>> = (0..100).map(|i| lcg_values(i + 1000, 1 + i as usize % 33)).collect();

    let mut single: Vec<Series<'_>> = values.iter().map(Series::from).collect();
    let mut parallel: Vec<Series<'_>> = values.iter().map(Series::from).collect();

    let one = compute_stats_batch_with(&mut single, &ParallelConfig::with_threads(1));
    let many = compute_stats_batch_with(&mut parallel, &ParallelConfig::all_cores());
    assert_eq!(one.nthreads, 1);
    assert_eq!(many.nthreads, processor_count().min(100));

    assert_eq!(single, parallel);
}

#[test]
fn test_recomputation_is_idempotent() {
    let values: Vec<Vec<f64>> = (0..20).map(|i| lcg_values(i, 15)).collect();
    let mut batch: Vec<Series<'_>> = values.iter().map(Series::from).collect();

    compute_stats_batch(&mut batch);
    let first: Vec<SeriesStats> = batch.iter().map(Series::stats).collect();
    compute_stats_batch(&mut batch);
    let second: Vec<SeriesStats> = batch.iter().map(Series::stats).collect();

    assert_eq!(first, second);
}

#[test]
fn test_reduce_range_sequential_path() {
    let a = [2.0, 4.0];
    let b = [-1.0];
    let mut batch = vec![Series::new(&a), Series::new(&b)];

    reduce_range(&mut batch);

    assert_eq!(batch[0].mean, 3.0);
    assert_eq!(batch[1].min, -1.0);
    assert_eq!(batch[0].n(), 2);
    assert!(!batch[1].is_empty());
}
