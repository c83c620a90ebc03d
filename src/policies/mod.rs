//! Built-in scoring policies.
//!
//! They are both usable and serve as templates for your own
//! [`ScoringPolicy`](crate::traits::ScoringPolicy) implementations:
//! - [`lcs`]      : longest common subsequence in doubled units.
//! - [`pairwise`] : substitution matrix with open/continuation gap scores.

pub mod lcs;
pub mod pairwise;

pub use lcs::LcsScoring;
pub use pairwise::PairwiseScoring;
