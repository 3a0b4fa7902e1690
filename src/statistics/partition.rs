//! Balanced partitioning of a batch into per-worker ranges.

use std::ops::Range;

/// Half-open `[begin, end)` index range of a batch owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub begin: usize,
    pub end: usize,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.begin..self.end
    }
}

/// Splits `[0, nseries)` into contiguous ranges of near-equal size.
///
/// With `per = nseries / nthreads` and `extra = nseries % nthreads`, the first
/// `extra` partitions hold `per + 1` items and the rest hold `per`. `nthreads`
/// is clamped into `[1, nseries]`, so no partition is ever empty. An empty
/// batch yields no partitions.
pub fn balanced_partitions(nseries: usize, nthreads: usize) -> Vec<Partition> {
    if nseries == 0 {
        return Vec::new();
    }
    let nthreads = nthreads.clamp(1, nseries);
    let per = nseries / nthreads;
    let extra = nseries % nthreads;

    let mut partitions = Vec::with_capacity(nthreads);
    let mut pos = 0;
    for t in 0..nthreads {
        let begin = pos;
        let end = begin + per + usize::from(t < extra);
        partitions.push(Partition { begin, end });
        pos = end;
    }
    debug_assert_eq!(pos, nseries);
    partitions
}

/// Hands out one exclusive sub-slice per partition.
///
/// `partitions` must be contiguous, start at 0 and cover `items` exactly, as
/// produced by [`balanced_partitions`]. The returned slices are disjoint, so
/// each can be moved to a different worker.
pub fn split_partitions<'b, T>(items: &'b mut [T], partitions: &[Partition]) -> Vec<&'b mut [T]> {
    let mut rest = items;
    let mut chunks = Vec::with_capacity(partitions.len());
    for partition in partitions {
        let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(partition.len());
        chunks.push(chunk);
        rest = tail;
    }
    debug_assert!(rest.is_empty(), "partitions do not cover the batch");
    chunks
}
