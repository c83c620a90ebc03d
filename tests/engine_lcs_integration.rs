use bsp_align::{policies::LcsScoring, AlignmentEngine};

#[test]
fn lcs_example_integration() {
    let s = b"ACCGGTCGAGTGCGCGGAAGCCGGCCGAA";
    let t = b"GTCGTTCGGAATGCCGTTGCTCTGTAAA";
    let engine = AlignmentEngine::new(LcsScoring);
    assert_eq!(engine.align(s, t).unwrap(), 20.0);
    assert_eq!(engine.raw_corner(s, t).unwrap(), 40);
}

#[test]
fn short_pair_matches_brute_force() {
    // "AC" and "GC" are both maximal; no common subsequence of length 3 exists.
    let engine = AlignmentEngine::new(LcsScoring);
    assert_eq!(engine.align(b"AGCAT", b"GAC").unwrap(), 2.0);
    assert_eq!(engine.align(b"GAC", b"AGCAT").unwrap(), 2.0);
}

#[test]
fn free_functions_match_engine() {
    let s = b"HELLOWORLD";
    let t = b"YELLOWBIRD";
    let engine = AlignmentEngine::new(LcsScoring);
    let expected = engine.align(s, t).unwrap();
    assert_eq!(bsp_align::align(s, t, LcsScoring).unwrap(), expected);
    assert_eq!(bsp_align::run(s, t, LcsScoring, 3).unwrap().score, expected);
}

#[test]
fn generic_symbols() {
    let engine = AlignmentEngine::new(LcsScoring);
    let a = ["fn", "main", "(", ")", "{", "}"];
    let b = ["fn", "(", "{", "x", "}"];
    assert_eq!(engine.align(&a, &b).unwrap(), 4.0);
    let a: Vec<u32> = (0..50).collect();
    let b: Vec<u32> = (0..50).rev().collect();
    assert_eq!(engine.align(&a, &b).unwrap(), 1.0);
}
