//! Error taxonomy shared by the engine, the merge queue and the scheduler.

use thiserror::Error;

/// Errors surfaced by alignment and scheduling entry points.
///
/// `InvalidInput` and `Scheduling` are always reported before any parallel
/// work is dispatched. `WorkerFailure` aborts the whole run; there is no
/// partial result and no retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignError {
    /// Malformed sequence arguments or policy configuration.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// `top()` was called on a merge queue holding no values.
    #[error("merge queue is empty")]
    EmptyQueue,

    /// Invalid worker count or partitioning configuration.
    #[error("scheduling error: {0}")]
    Scheduling(String),

    /// A worker failed while computing its block; the run is aborted.
    #[error("worker {worker} failed: {message}")]
    WorkerFailure { worker: usize, message: String },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AlignError>;
