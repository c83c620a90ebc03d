//! Generic DP alignment engine.
//!
//! This module evaluates the `(m+1) x (n+1)` recurrence described by a
//! [`ScoringPolicy`]:
//! 1. Row 0 and column 0 come from [`ScoringPolicy::boundary`].
//! 2. Every other cell is [`ScoringPolicy::update`] of its three neighbours.
//! 3. The corner cell goes through [`ScoringPolicy::convert`].
//!
//! Only one row (or one column, whichever is shorter) is resident at a time.
//! The same row-sweep kernel evaluates rectangular blocks for the BSP
//! scheduler, see [`compute_block`].

use crate::bitops::{self, BitOps};
use crate::error::{AlignError, Result};
use crate::policies::LcsScoring;
use crate::traits::ScoringPolicy;

/// Trailing boundaries of an evaluated block.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockOutput<C> {
    /// Last row of the block, `w + 1` cells including the left corner.
    pub bottom_row: Vec<C>,
    /// Last column of the block, `h + 1` cells including the top corner.
    pub right_col: Vec<C>,
}

/// Sweep `left_seq` row by row over a resident row.
///
/// On entry `row` holds the row above the block (`top_seq.len() + 1` cells);
/// on exit it holds the block's last row. `left_col(i)` supplies column 0 of
/// row `i` (1-based) and `row_end` observes the last cell of each new row.
#[inline]
fn sweep_rows<T, P, L, R>(
    policy: &P,
    left_seq: &[T],
    top_seq: &[T],
    row: &mut [P::Cell],
    left_col: L,
    mut row_end: R,
) where
    P: ScoringPolicy<T>,
    L: Fn(usize) -> P::Cell,
    R: FnMut(P::Cell),
{
    let w = top_seq.len();
    debug_assert_eq!(row.len(), w + 1);
    for (i, ls) in left_seq.iter().enumerate() {
        let mut diag = row[0];
        row[0] = left_col(i + 1);
        for j in 1..=w {
            let up = row[j];
            row[j] = policy.update(ls, &top_seq[j - 1], diag, up, row[j - 1]);
            diag = up;
        }
        row_end(row[w]);
    }
}

/// Column-major counterpart of [`sweep_rows`], used when `top` is longer.
#[inline]
fn sweep_columns<T, P>(policy: &P, left_seq: &[T], top_seq: &[T], col: &mut [P::Cell])
where
    P: ScoringPolicy<T>,
{
    let m = left_seq.len();
    debug_assert_eq!(col.len(), m + 1);
    for (j, ts) in top_seq.iter().enumerate() {
        let mut diag = col[0];
        col[0] = policy.boundary(0, j + 1);
        for i in 1..=m {
            let left = col[i];
            col[i] = policy.update(&left_seq[i - 1], ts, diag, col[i - 1], left);
            diag = left;
        }
    }
}

/// Evaluate one rectangular block of the DP matrix.
///
/// - `left_seq`: the block's slice of the left sequence (`h` symbols, rows).
/// - `top_seq`: the block's slice of the top sequence (`w` symbols, columns).
/// - `top_row`: the `w + 1` cells directly above the block, corner first.
/// - `left_col`: the `h + 1` cells directly left of the block, corner first.
///
/// `top_row[0]` and `left_col[0]` both name the shared corner cell.
pub fn compute_block<T, P>(
    policy: &P,
    left_seq: &[T],
    top_seq: &[T],
    top_row: &[P::Cell],
    left_col: &[P::Cell],
) -> BlockOutput<P::Cell>
where
    P: ScoringPolicy<T>,
{
    let h = left_seq.len();
    let w = top_seq.len();
    debug_assert_eq!(top_row.len(), w + 1, "top boundary width mismatch");
    debug_assert_eq!(left_col.len(), h + 1, "left boundary height mismatch");
    debug_assert!(top_row[0] == left_col[0], "block corners disagree");

    let mut row = top_row.to_vec();
    let mut right_col = Vec::with_capacity(h + 1);
    right_col.push(row[w]);
    sweep_rows(
        policy,
        left_seq,
        top_seq,
        &mut row,
        |i| left_col[i],
        |cell| right_col.push(cell),
    );
    BlockOutput {
        bottom_row: row,
        right_col,
    }
}

/// Reject inputs whose cell index space does not fit in `usize`.
pub(crate) fn check_index_space(m: usize, n: usize) -> Result<()> {
    m.checked_add(1)
        .zip(n.checked_add(1))
        .and_then(|(rows, cols)| rows.checked_mul(cols))
        .map(|_| ())
        .ok_or_else(|| {
            AlignError::InvalidInput(format!(
                "DP matrix for lengths {m} x {n} exceeds the addressable cell count"
            ))
        })
}

/// Sequential alignment engine for a scoring policy `P`.
///
/// Typical usage:
/// ```
/// use bsp_align::{AlignmentEngine, policies::LcsScoring};
///
/// let engine = AlignmentEngine::new(LcsScoring);
/// let score = engine.align(b"ACCGGTCGAG", b"GTCGTTCGGA").unwrap();
/// assert_eq!(score, 6.0);
/// ```
pub struct AlignmentEngine<P> {
    policy: P,
    bitops: BitOps,
}

impl<P> AlignmentEngine<P> {
    /// Create an engine; initialises the bit-vector module if needed.
    pub fn new(policy: P) -> Self {
        Self {
            policy,
            bitops: bitops::init(),
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn into_policy(self) -> P {
        self.policy
    }

    /// Bit-vector primitives shared by every engine in the process.
    pub fn bitops(&self) -> &BitOps {
        &self.bitops
    }

    /// Raw (unconverted) corner cell `(m, n)`.
    pub fn raw_corner<T>(&self, left: &[T], top: &[T]) -> Result<P::Cell>
    where
        P: ScoringPolicy<T>,
    {
        let (m, n) = (left.len(), top.len());
        check_index_space(m, n)?;
        let policy = &self.policy;
        if m >= n {
            let mut row: Vec<P::Cell> = (0..=n).map(|j| policy.boundary(0, j)).collect();
            sweep_rows(policy, left, top, &mut row, |i| policy.boundary(i, 0), |_| {});
            Ok(row[n])
        } else {
            let mut col: Vec<P::Cell> = (0..=m).map(|i| policy.boundary(i, 0)).collect();
            sweep_columns(policy, left, top, &mut col);
            Ok(col[m])
        }
    }

    /// Align `left` (rows) against `top` (columns) and convert the corner.
    pub fn align<T>(&self, left: &[T], top: &[T]) -> Result<P::Score>
    where
        P: ScoringPolicy<T>,
    {
        #[cfg(feature = "tracing")]
        let span = tracing::info_span!("align", m = left.len(), n = top.len());
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let raw = self.raw_corner(left, top)?;
        Ok(self.policy.convert(raw, left.len(), top.len()))
    }
}

impl AlignmentEngine<LcsScoring> {
    /// Bit-parallel LCS length of two byte strings.
    ///
    /// Agrees with [`align`](Self::align) and runs in
    /// `O(|top| * ceil(|left| / 64))` word operations.
    pub fn lcs_length(&self, left: &[u8], top: &[u8]) -> Result<usize> {
        check_index_space(left.len(), top.len())?;
        #[cfg(feature = "tracing")]
        let span = tracing::info_span!("lcs_bit_parallel", m = left.len(), n = top.len());
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        Ok(self.bitops.lcs_length(left, top))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_table(s: &[u8], t: &[u8]) -> Vec<Vec<i64>> {
        let p = LcsScoring;
        let mut dp = vec![vec![0i64; t.len() + 1]; s.len() + 1];
        for i in 1..=s.len() {
            for j in 1..=t.len() {
                dp[i][j] = ScoringPolicy::<u8>::update(
                    &p,
                    &s[i - 1],
                    &t[j - 1],
                    dp[i - 1][j - 1],
                    dp[i - 1][j],
                    dp[i][j - 1],
                );
            }
        }
        dp
    }

    #[test]
    fn row_and_column_sweeps_agree() {
        let engine = AlignmentEngine::new(LcsScoring);
        let a = b"GATTACAGATTACA";
        let b = b"TACGAT";
        assert_eq!(
            engine.raw_corner(a, b).unwrap(),
            engine.raw_corner(b, a).unwrap()
        );
        assert_eq!(engine.raw_corner(a, b).unwrap(), full_table(a, b)[a.len()][b.len()]);
        assert_eq!(engine.raw_corner(b, a).unwrap(), full_table(b, a)[b.len()][a.len()]);
    }

    #[test]
    fn empty_sequences_use_boundary() {
        let engine = AlignmentEngine::new(LcsScoring);
        let empty: &[u8] = &[];
        assert_eq!(engine.align(empty, empty).unwrap(), 0.0);
        assert_eq!(engine.align(b"ACGT", empty).unwrap(), 0.0);
        assert_eq!(engine.align(empty, b"ACGT").unwrap(), 0.0);
    }

    #[test]
    fn block_matches_full_table_slice() {
        let s = b"ACCGGTCGAG";
        let t = b"GTCGTTCGGA";
        let dp = full_table(s, t);
        // block rows (3, 7], cols (2, 8]
        let top_row: Vec<i64> = dp[3][2..=8].to_vec();
        let left_col: Vec<i64> = (3..=7).map(|i| dp[i][2]).collect();
        let out = compute_block(&LcsScoring, &s[3..7], &t[2..8], &top_row, &left_col);
        assert_eq!(out.bottom_row, dp[7][2..=8].to_vec());
        let expected_right: Vec<i64> = (3..=7).map(|i| dp[i][8]).collect();
        assert_eq!(out.right_col, expected_right);
    }

    #[test]
    fn degenerate_block_passes_boundaries_through() {
        let out = compute_block::<u8, _>(&LcsScoring, &[], b"AC", &[4, 4, 6], &[4]);
        assert_eq!(out.bottom_row, vec![4, 4, 6]);
        assert_eq!(out.right_col, vec![6]);
    }

    #[test]
    fn index_space_overflow_is_invalid_input() {
        assert!(check_index_space(10, 10).is_ok());
        assert!(matches!(
            check_index_space(usize::MAX, 1),
            Err(AlignError::InvalidInput(_))
        ));
        assert!(matches!(
            check_index_space(usize::MAX / 2, 4),
            Err(AlignError::InvalidInput(_))
        ));
    }

    #[test]
    fn bit_parallel_fast_path_agrees_with_dp() {
        let engine = AlignmentEngine::new(LcsScoring);
        let a: Vec<u8> = (0..97u32).map(|i| b"ACGT"[(i * 7 % 5 % 4) as usize]).collect();
        let b: Vec<u8> = (0..71u32).map(|i| b"ACGT"[(i * 3 % 7 % 4) as usize]).collect();
        let cases: [(&[u8], &[u8]); 3] = [(&a, &b), (b"AGCAT", b"GAC"), (b"", b"ACGT")];
        for (s, t) in cases {
            let dp = engine.align(s, t).unwrap();
            assert_eq!(engine.lcs_length(s, t).unwrap() as f64, dp);
        }
    }
}
