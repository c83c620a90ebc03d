//! Example: Longest Common Subsequence, sequential and BSP-scheduled.
//!
//! Run with:
//! `cargo run --example lcs`

use bsp_align::{bitops, policies::LcsScoring, AlignmentEngine, SchedulerBuilder};

fn main() -> bsp_align::Result<()> {
    let s = b"ACCGGTCGAGTGCGCGGAAGCCGGCCGAA";
    let t = b"GTCGTTCGGAATGCCGTTGCTCTGTAAA";

    let engine = AlignmentEngine::new(LcsScoring);
    println!("LCS length (sequential): {}", engine.align(s, t)?);
    println!("Raw corner (doubled units): {}", engine.raw_corner(s, t)?);

    for workers in [1, 2, 4] {
        let scheduler = SchedulerBuilder::new(LcsScoring)
            .workers(workers)
            .build()?;
        let report = scheduler.run(s, t)?;
        println!(
            "LCS length ({workers} workers): {} in {} supersteps, {:?}",
            report.score, report.supersteps, report.elapsed
        );
    }

    println!("LCS length (bit-parallel): {}", bitops::init().lcs_length(s, t));
    Ok(())
}
