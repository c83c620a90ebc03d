//! Bulk-Synchronous-Parallel DP alignment (BSP-Align)
//!
//! This crate computes alignment scores (LCS / edit-distance style metrics)
//! between two sequences with a dynamic-programming recurrence whose scoring
//! is pluggable, and evaluates that recurrence either sequentially or across
//! worker threads in bulk-synchronous supersteps.
//!
//! ## Core idea
//! 1. Describe your scoring as a [`ScoringPolicy`]: a per-cell update from
//!    three neighbours, boundary values and a final score conversion.
//! 2. Use [`AlignmentEngine`] for a sequential, linear-space evaluation.
//! 3. Use [`BspScheduler`] to split the matrix into row bands x column blocks
//!    and sweep its anti-diagonals in supersteps. Workers publish trailing
//!    rows into a [`MergeQueue`](merge_queue::MergeQueue) and meet at a
//!    generation barrier before the next superstep.
//!
//! Both paths produce bit-identical raw corner values for every policy.
//!
//! ## Quick start
//! ```
//! use bsp_align::{policies::LcsScoring, AlignmentEngine, SchedulerBuilder};
//!
//! let engine = AlignmentEngine::new(LcsScoring);
//! assert_eq!(engine.align(b"ACCG", b"ACGC").unwrap(), 3.0);
//! // internal cells are kept in doubled units
//! assert_eq!(engine.raw_corner(b"ACCG", b"ACGC").unwrap(), 6);
//!
//! let scheduler = SchedulerBuilder::new(LcsScoring).workers(2).build().unwrap();
//! let report = scheduler.run(b"ACCG", b"ACGC").unwrap();
//! assert_eq!(report.score, 3.0);
//! ```
//!
//! ## Built-in policies
//! The `policies` module contains:
//! - Longest Common Subsequence in doubled units ([`policies::LcsScoring`])
//! - Substitution-matrix scoring with gap open/continuation
//!   ([`policies::PairwiseScoring`])
//!
//! ## Bit-vector module
//! [`bitops`] owns process-wide lookup tables. Engines initialise it on
//! construction; the tables stay resident until a single
//! [`bitops::teardown`], which binaries trigger through
//! [`bitops::exit_guard`].

pub mod bitops;
pub mod blocks;
pub mod builder;
pub mod engine;
pub mod error;
pub mod merge_queue;
pub mod policies;
pub mod scheduler;
pub mod superstep;
pub mod traits;
pub mod utils;

pub use crate::builder::SchedulerBuilder;
pub use crate::engine::AlignmentEngine;
pub use crate::error::{AlignError, Result};
pub use crate::scheduler::{BspScheduler, RunReport};
pub use crate::traits::ScoringPolicy;

/// Align two sequences sequentially under `policy`.
pub fn align<T, P: ScoringPolicy<T>>(left: &[T], top: &[T], policy: P) -> Result<P::Score> {
    AlignmentEngine::new(policy).align(left, top)
}

/// Align two sequences with `workers` BSP workers under `policy`.
///
/// Fails with [`AlignError::Scheduling`] if `workers < 1`.
pub fn run<T, P>(left: &[T], top: &[T], policy: P, workers: usize) -> Result<RunReport<P::Score>>
where
    T: Sync,
    P: ScoringPolicy<T>,
{
    SchedulerBuilder::new(policy)
        .workers(workers)
        .build()?
        .run(left, top)
}
