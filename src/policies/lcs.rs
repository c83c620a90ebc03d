//! Reference longest-common-subsequence scoring.
//!
//! Cells live in doubled units: a match adds 2 to the diagonal predecessor,
//! a mismatch takes the larger of the cells above and to the left. The
//! conversion step halves the corner value, so the reported score is the LCS
//! length and the raw corner is always exactly twice that.

use crate::traits::ScoringPolicy;

/// Increment applied on a symbol match, in internal (doubled) units.
pub const MATCH_UNITS: i64 = 2;

/// LCS scoring policy with a doubled internal score domain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LcsScoring;

impl LcsScoring {
    pub fn new() -> Self {
        Self
    }
}

impl<T: PartialEq> ScoringPolicy<T> for LcsScoring {
    type Cell = i64;
    type Score = f64;

    #[inline]
    fn boundary(&self, _i: usize, _j: usize) -> i64 {
        0
    }

    #[inline]
    fn update(&self, left_sym: &T, top_sym: &T, diag: i64, up: i64, left: i64) -> i64 {
        if left_sym == top_sym {
            diag + MATCH_UNITS
        } else {
            up.max(left)
        }
    }

    #[inline]
    fn convert(&self, raw: i64, _m: usize, _n: usize) -> f64 {
        raw as f64 / 2.0
    }
}
