//! Core trait definitions for pluggable DP scoring.
//!
//! To run an alignment, implement [`ScoringPolicy`] for a struct that captures
//! your scoring parameters (substitution scores, gap costs, normalization).
//!
//! The trait encodes the capability pair the engine needs:
//! - Cell update: the recurrence for one DP cell from its three neighbours.
//! - Score conversion: mapping the raw corner cell to the reported score.
//! - Boundary initialisation for row 0 and column 0.
//!
//! The engine and the BSP scheduler are generic over the policy, so every
//! call to [`ScoringPolicy::update`] is statically dispatched.

use std::fmt::Debug;

/// Scoring rules for a DP alignment over symbols of type `T`.
///
/// Semantics:
/// - The matrix has `(m+1) x (n+1)` cells for `left.len() == m` and
///   `top.len() == n`.
/// - Cells with `i == 0` or `j == 0` come from [`boundary`](Self::boundary).
/// - Every other cell is `update(left[i-1], top[j-1], diag, up, left)`.
/// - The caller-visible result is `convert(cell(m, n), m, n)`.
///
/// `update` must be monotone in its three neighbour arguments.
pub trait ScoringPolicy<T>: Sync {
    /// Internal DP element stored in the matrix.
    type Cell: Copy + Send + Sync + Debug + PartialEq;

    /// Public score returned to callers.
    type Score;

    /// Value of a boundary cell, i.e. `i == 0` or `j == 0`.
    fn boundary(&self, i: usize, j: usize) -> Self::Cell;

    /// Compute cell `(i, j)` from the compared symbols and its neighbours:
    /// `diag = (i-1, j-1)`, `up = (i-1, j)`, `left = (i, j-1)`.
    fn update(
        &self,
        left_sym: &T,
        top_sym: &T,
        diag: Self::Cell,
        up: Self::Cell,
        left: Self::Cell,
    ) -> Self::Cell;

    /// Convert the raw corner cell into the reported score.
    fn convert(&self, raw: Self::Cell, m: usize, n: usize) -> Self::Score;
}

impl<T, P: ScoringPolicy<T>> ScoringPolicy<T> for &P {
    type Cell = P::Cell;
    type Score = P::Score;

    #[inline]
    fn boundary(&self, i: usize, j: usize) -> Self::Cell {
        (**self).boundary(i, j)
    }

    #[inline]
    fn update(
        &self,
        left_sym: &T,
        top_sym: &T,
        diag: Self::Cell,
        up: Self::Cell,
        left: Self::Cell,
    ) -> Self::Cell {
        (**self).update(left_sym, top_sym, diag, up, left)
    }

    #[inline]
    fn convert(&self, raw: Self::Cell, m: usize, n: usize) -> Self::Score {
        (**self).convert(raw, m, n)
    }
}
