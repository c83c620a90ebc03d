//! Block partitioning of the DP index space.
//!
//! The left sequence is split into contiguous row bands and the top sequence
//! into contiguous column blocks. Block `(r, c)` covers matrix rows
//! `(rows[r].start, rows[r].end]` and columns `(cols[c].start, cols[c].end]`;
//! it depends on `(r-1, c)` for its top boundary and `(r, c-1)` for its left
//! boundary, so all blocks on anti-diagonal `r + c = k` are independent and
//! form superstep `k`.

use crate::error::{AlignError, Result};

/// Contiguous half-open interval `[start, end)` of sequence positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    /// Inclusive start position.
    pub start: usize,
    /// Exclusive end position.
    pub end: usize,
}

impl BlockSpan {
    /// Number of positions covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the span covers nothing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split `len` positions into `parts` spans whose lengths differ by at most one.
fn split(len: usize, parts: usize) -> Vec<BlockSpan> {
    let base = len / parts;
    let extra = len % parts;
    let mut start = 0;
    (0..parts)
        .map(|k| {
            let size = base + usize::from(k < extra);
            let span = BlockSpan {
                start,
                end: start + size,
            };
            start += size;
            span
        })
        .collect()
}

/// Row-band x column-block partition of an `(m+1) x (n+1)` matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockGrid {
    rows: Vec<BlockSpan>,
    cols: Vec<BlockSpan>,
}

impl BlockGrid {
    /// Partition `m` rows into at most `row_bands` bands and `n` columns into
    /// at most `col_blocks` blocks. Neither count exceeds its sequence length
    /// (but is at least one), so no band or block is empty unless its whole
    /// sequence is.
    pub fn new(m: usize, n: usize, row_bands: usize, col_blocks: usize) -> Result<Self> {
        if row_bands == 0 {
            return Err(AlignError::Scheduling("need at least one row band".into()));
        }
        if col_blocks == 0 {
            return Err(AlignError::Scheduling("need at least one column block".into()));
        }
        Ok(Self {
            rows: split(m, row_bands.min(m.max(1))),
            cols: split(n, col_blocks.min(n.max(1))),
        })
    }

    #[inline]
    pub fn row_bands(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn col_blocks(&self) -> usize {
        self.cols.len()
    }

    #[inline]
    pub fn rows(&self, r: usize) -> BlockSpan {
        self.rows[r]
    }

    #[inline]
    pub fn cols(&self, c: usize) -> BlockSpan {
        self.cols[c]
    }

    /// Total number of blocks.
    pub fn len(&self) -> usize {
        self.rows.len() * self.cols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of supersteps needed to sweep every anti-diagonal.
    pub fn supersteps(&self) -> usize {
        self.rows.len() + self.cols.len() - 1
    }

    /// Column block that band `r` evaluates in superstep `k`, if any.
    #[inline]
    pub fn block_for(&self, r: usize, k: usize) -> Option<usize> {
        k.checked_sub(r).filter(|&c| c < self.cols.len())
    }

    /// All blocks `(r, c)` of superstep `k`.
    pub fn superstep_blocks(&self, k: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.rows.len()).filter_map(move |r| self.block_for(r, k).map(|c| (r, c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_span_is_empty() {
        let s = BlockSpan { start: 5, end: 5 };
        assert_eq!(s.len(), 0);
        assert!(s.is_empty());
    }

    #[test]
    fn split_balances_sizes() {
        let spans = split(10, 3);
        let lens: Vec<usize> = spans.iter().map(BlockSpan::len).collect();
        assert_eq!(lens, vec![4, 3, 3]);
        assert_eq!(spans[0].start, 0);
        assert_eq!(spans[2].end, 10);
        for w in spans.windows(2) {
            assert_eq!(w[0].end, w[1].start);
        }
    }

    #[test]
    fn counts_are_capped_by_lengths() {
        let g = BlockGrid::new(3, 0, 8, 8).unwrap();
        assert_eq!(g.row_bands(), 3);
        assert_eq!(g.col_blocks(), 1);
        assert!(g.cols(0).is_empty());
        assert_eq!(g.supersteps(), 3);
    }

    #[test]
    fn zero_counts_are_scheduling_errors() {
        assert!(matches!(
            BlockGrid::new(4, 4, 0, 2),
            Err(AlignError::Scheduling(_))
        ));
        assert!(matches!(
            BlockGrid::new(4, 4, 2, 0),
            Err(AlignError::Scheduling(_))
        ));
    }

    #[test]
    fn every_block_runs_in_exactly_one_superstep() {
        let g = BlockGrid::new(7, 11, 3, 4).unwrap();
        let mut seen = vec![0usize; g.len()];
        for k in 0..g.supersteps() {
            for (r, c) in g.superstep_blocks(k) {
                assert_eq!(r + c, k);
                seen[r * g.col_blocks() + c] += 1;
            }
        }
        assert!(seen.iter().all(|&n| n == 1));
        assert_eq!(g.block_for(2, 1), None);
        assert_eq!(g.block_for(0, 4), None);
        assert_eq!(g.block_for(1, 4), Some(3));
    }
}
