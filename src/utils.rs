//! Partition-size heuristics.

/// Number of worker threads to use when the caller does not say.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Column blocks per row band for `n` columns and `workers` bands.
///
/// Two blocks per worker keep the wavefront pipeline busy after the fill
/// phase; the count never exceeds `n` and is at least one.
#[inline]
pub fn default_col_blocks(n: usize, workers: usize) -> usize {
    workers.saturating_mul(2).clamp(1, n.max(1))
}
