//! Runs as its own test binary so no other test touches the module's
//! process-wide state while it is inspected.

use bsp_align::{bitops, policies::LcsScoring, AlignmentEngine};

#[test]
fn tables_live_until_a_single_teardown() {
    assert!(!bitops::is_initialized());
    assert_eq!(bitops::teardown_count(), 0);

    let first = bitops::init();
    drop(first);
    assert!(bitops::is_initialized());

    // repeated engine construction and free-function calls reuse the tables
    bsp_align::align(b"ACGT", b"AGT", LcsScoring).unwrap();
    bsp_align::align(b"AGCAT", b"GAC", LcsScoring).unwrap();
    assert_eq!(bsp_align::run(b"ACCG", b"ACGC", LcsScoring, 2).unwrap().score, 3.0);
    assert!(bitops::is_initialized());
    assert_eq!(bitops::teardown_count(), 0);

    let engine = AlignmentEngine::new(LcsScoring);
    {
        let _guard = bitops::exit_guard();
    }
    assert!(bitops::is_torn_down());
    assert!(!bitops::is_initialized());
    assert_eq!(bitops::teardown_count(), 1);

    // later teardowns are no-ops
    bitops::teardown();
    drop(bitops::exit_guard());
    assert_eq!(bitops::teardown_count(), 1);

    // handles taken before teardown keep working, and so does a late init
    assert_eq!(engine.lcs_length(b"AGCAT", b"GAC").unwrap(), 2);
    assert_eq!(bitops::init().lcs_length(b"ACGT", b"AGT"), 3);
    assert!(!bitops::is_initialized());
    assert_eq!(bitops::teardown_count(), 1);
}
