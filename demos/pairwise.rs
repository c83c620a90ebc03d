//! Example: DNA scoring with a substitution matrix and gap penalties.
//!
//! Run with:
//! `cargo run --example pairwise`

use bsp_align::{policies::PairwiseScoring, SchedulerBuilder};

fn main() -> bsp_align::Result<()> {
    let s = b"ACCGGTCGAGTGCGCGGAAGCCGGCCGAA";
    let t = b"gtcgttcggaatgccgttgctctgtaaa";

    let default = PairwiseScoring::default();
    let strict = PairwiseScoring::default()
        .with_gap_scores(-4, -4)
        .with_gap_continuation(-1, -1);

    for (name, policy) in [("default", default), ("affine-like", strict)] {
        let left = policy.translate(s, true);
        let top = policy.translate(t, false);
        let scheduler = SchedulerBuilder::new(policy).workers(3).build()?;
        let report = scheduler.run(&left, &top)?;
        let sequential = scheduler.engine().align(&left, &top)?;
        println!(
            "{name}: score {} (sequential {sequential}), {} blocks",
            report.score, report.blocks
        );
    }
    Ok(())
}
