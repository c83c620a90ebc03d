//! Substitution-matrix scoring with open/continuation gap scores.
//!
//! Input text is first translated into alphabet indices (two independent
//! translation maps, one per sequence role). Each DP cell packs the score and
//! two gap flags into one `i32`:
//!
//! ```text
//!   cell = score << 2 | flags
//!   flags bit 0: cell was reached through a horizontal gap (from the left)
//!   flags bit 1: cell was reached through a vertical gap (from above)
//! ```
//!
//! A gap that extends a gap of the same direction pays the continuation score
//! instead of the opening score. The diagonal move wins ties. Row 0 and
//! column 0 are zero, so leading gaps are free. The reported score is
//! `normalization * (corner >> 2)`; with the default matrix (2 per match)
//! and normalization 0.5 this counts matches in whole units.

use crate::error::{AlignError, Result};
use crate::traits::ScoringPolicy;

const GAP_H: i32 = 1;
const GAP_V: i32 = 2;

/// Configurable pairwise scoring policy over translated byte symbols.
#[derive(Clone, Debug)]
pub struct PairwiseScoring {
    allowed: Vec<u8>,
    map_left: [u8; 256],
    map_top: [u8; 256],
    alphabet_size: usize,
    /// Row-major `[left][top]`, `alphabet_size^2` entries.
    subst: Vec<i32>,
    gap_h: i32,
    gap_v: i32,
    gap_cont_h: i32,
    gap_cont_v: i32,
    lowercase: bool,
    normalization: f64,
}

impl Default for PairwiseScoring {
    fn default() -> Self {
        // a c g t n, where 'n' gets a distinct index per role so that it
        // never matches itself.
        let mut scoring = Self {
            allowed: Vec::new(),
            map_left: [0; 256],
            map_top: [0; 256],
            alphabet_size: 0,
            subst: Vec::new(),
            gap_h: -1,
            gap_v: -1,
            gap_cont_h: -1,
            gap_cont_v: -1,
            lowercase: true,
            normalization: 0.5,
        };
        scoring.set_alphabet(b"acgtn", &[0, 1, 2, 3, 4], &[0, 1, 2, 3, 5]);
        scoring.subst = (0..36)
            .map(|k| if k / 6 == k % 6 && k / 6 < 4 { 2 } else { 0 })
            .collect();
        scoring
    }
}

impl PairwiseScoring {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_alphabet(&mut self, allowed: &[u8], left: &[u8], top: &[u8]) {
        self.allowed = allowed.to_vec();
        self.map_left = [0; 256];
        self.map_top = [0; 256];
        let mut kmax = 0u8;
        for (pos, &ch) in allowed.iter().enumerate() {
            if let Some(&k) = left.get(pos) {
                self.map_left[ch as usize] = k;
                kmax = kmax.max(k);
            }
            if let Some(&k) = top.get(pos) {
                self.map_top[ch as usize] = k;
                kmax = kmax.max(k);
            }
        }
        self.alphabet_size = kmax as usize + 1;
    }

    /// Replace the alphabet and both translation maps.
    ///
    /// `left_map[p]` / `top_map[p]` is the index assigned to `allowed[p]` for
    /// the left / top sequence. The substitution matrix is reset to all zeros
    /// sized to the new alphabet.
    pub fn with_alphabet(
        mut self,
        allowed: &[u8],
        left_map: &[u8],
        top_map: &[u8],
    ) -> Result<Self> {
        if allowed.is_empty() {
            return Err(AlignError::InvalidInput("alphabet must not be empty".into()));
        }
        if left_map.len() != allowed.len() || top_map.len() != allowed.len() {
            return Err(AlignError::InvalidInput(format!(
                "translation maps must have {} entries (got {} and {})",
                allowed.len(),
                left_map.len(),
                top_map.len()
            )));
        }
        self.set_alphabet(allowed, left_map, top_map);
        self.subst = vec![0; self.alphabet_size * self.alphabet_size];
        Ok(self)
    }

    /// Replace the substitution matrix, given row-major as `[left][top]`.
    pub fn with_substitution_matrix(mut self, matrix: Vec<i32>) -> Result<Self> {
        let expected = self.alphabet_size * self.alphabet_size;
        if matrix.len() != expected {
            return Err(AlignError::InvalidInput(format!(
                "substitution matrix needs {expected} entries for an alphabet of {}, got {}",
                self.alphabet_size,
                matrix.len()
            )));
        }
        self.subst = matrix;
        Ok(self)
    }

    /// Gap-open scores for horizontal and vertical gaps.
    pub fn with_gap_scores(mut self, horizontal: i32, vertical: i32) -> Self {
        self.gap_h = horizontal;
        self.gap_v = vertical;
        self
    }

    /// Gap-continuation scores for horizontal and vertical gaps.
    pub fn with_gap_continuation(mut self, horizontal: i32, vertical: i32) -> Self {
        self.gap_cont_h = horizontal;
        self.gap_cont_v = vertical;
        self
    }

    pub fn with_normalization(mut self, normalization: f64) -> Self {
        self.normalization = normalization;
        self
    }

    /// Fold input to lowercase before translation (default on).
    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    pub fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }

    pub fn allowed(&self) -> &[u8] {
        &self.allowed
    }

    /// Translate text into alphabet indices using the left (`first == true`)
    /// or top translation map. Characters outside the alphabet map to 0.
    pub fn translate(&self, text: &[u8], first: bool) -> Vec<u8> {
        let map = if first { &self.map_left } else { &self.map_top };
        text.iter()
            .map(|&c| {
                let c = if self.lowercase { c.to_ascii_lowercase() } else { c };
                map[c as usize]
            })
            .collect()
    }

    #[inline]
    fn substitution(&self, left: u8, top: u8) -> i32 {
        let (l, t) = (left as usize, top as usize);
        if l >= self.alphabet_size || t >= self.alphabet_size {
            return 0;
        }
        self.subst[l * self.alphabet_size + t]
    }
}

impl ScoringPolicy<u8> for PairwiseScoring {
    type Cell = i32;
    type Score = f64;

    #[inline]
    fn boundary(&self, _i: usize, _j: usize) -> i32 {
        0
    }

    #[inline]
    fn update(&self, left_sym: &u8, top_sym: &u8, diag: i32, up: i32, left: i32) -> i32 {
        let from_left = (left >> 2)
            + if left & GAP_H != 0 {
                self.gap_cont_h
            } else {
                self.gap_h
            };
        let from_up = (up >> 2)
            + if up & GAP_V != 0 {
                self.gap_cont_v
            } else {
                self.gap_v
            };
        let from_diag = (diag >> 2) + self.substitution(*left_sym, *top_sym);

        let best_gap = from_left.max(from_up);
        if from_diag >= best_gap {
            return from_diag << 2;
        }
        let mut flags = 0;
        if from_left == best_gap {
            flags |= GAP_H;
        }
        if from_up == best_gap {
            flags |= GAP_V;
        }
        best_gap << 2 | flags
    }

    #[inline]
    fn convert(&self, raw: i32, _m: usize, _n: usize) -> f64 {
        self.normalization * f64::from(raw >> 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_alphabet_translation() {
        let p = PairwiseScoring::default();
        assert_eq!(p.alphabet_size(), 6);
        assert_eq!(p.translate(b"ACgtN", true), vec![0, 1, 2, 3, 4]);
        assert_eq!(p.translate(b"ACgtN", false), vec![0, 1, 2, 3, 5]);
    }

    #[test]
    fn n_never_matches_itself() {
        let p = PairwiseScoring::default();
        let l = p.translate(b"n", true)[0];
        let t = p.translate(b"n", false)[0];
        assert_eq!(p.substitution(l, t), 0);
        assert_eq!(p.substitution(0, 0), 2);
    }

    #[test]
    fn gap_flags_select_continuation_score() {
        let p = PairwiseScoring::default()
            .with_gap_scores(-4, -4)
            .with_gap_continuation(-1, -1);
        // left neighbour already inside a horizontal gap
        let left = 10 << 2 | GAP_H;
        let cell = p.update(&0, &1, 0, 0, left);
        assert_eq!(cell >> 2, 9);
        assert_eq!(cell & 3, GAP_H);
        // same neighbour without the flag pays the opening score
        let cell = p.update(&0, &1, 0, 0, 10 << 2);
        assert_eq!(cell >> 2, 6);
    }

    #[test]
    fn equal_gaps_set_both_flags() {
        let p = PairwiseScoring::default();
        let cell = p.update(&0, &1, -40, 5 << 2, 5 << 2);
        assert_eq!(cell >> 2, 4);
        assert_eq!(cell & 3, GAP_H | GAP_V);
    }

    #[test]
    fn diagonal_wins_ties() {
        let p = PairwiseScoring::default();
        let cell = p.update(&0, &1, 4 << 2, 5 << 2, 0);
        assert_eq!(cell, 4 << 2);
    }

    #[test]
    fn rejects_mis_sized_matrix() {
        let err = PairwiseScoring::default()
            .with_substitution_matrix(vec![1, 2, 3])
            .unwrap_err();
        assert!(matches!(err, AlignError::InvalidInput(_)));
    }

    #[test]
    fn custom_alphabet_resets_matrix() {
        let p = PairwiseScoring::default()
            .with_alphabet(b"xy", &[0, 1], &[0, 1])
            .and_then(|p| p.with_substitution_matrix(vec![3, -1, -1, 3]))
            .unwrap();
        assert_eq!(p.alphabet_size(), 2);
        assert_eq!(p.substitution(1, 1), 3);
        assert_eq!(p.substitution(0, 1), -1);
    }
}
