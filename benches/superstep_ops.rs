use std::sync::Arc;

use bsp_align::{
    merge_queue::{MergeQueue, SharedMergeQueue},
    superstep::{Publication, SuperstepBarrier},
};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn bench_merge_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_queue");
    for &len in &[1_000usize, 100_000] {
        group.bench_function(format!("push_drain_{len}"), |b| {
            b.iter_batched(
                || {
                    let mut rng = StdRng::seed_from_u64(7);
                    (0..len).map(|_| rng.gen_range(0..1_000u32)).collect::<Vec<_>>()
                },
                |values| {
                    let mut q: MergeQueue<u32> = values.into_iter().collect();
                    for th in (0..1_000).step_by(100) {
                        criterion::black_box(q.drain(&th));
                    }
                    q.pop(&u32::MAX);
                    criterion::black_box(q.size())
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.bench_function("shared_publications_64x64", |b| {
        b.iter(|| {
            let q = SharedMergeQueue::new();
            for k in 0..64 {
                for band in 0..64 {
                    q.push(Publication {
                        superstep: k,
                        band,
                        block: k.saturating_sub(band),
                        bottom_row: vec![0i64; 8],
                    });
                }
                criterion::black_box(q.drain(&Publication::threshold(k)));
            }
        })
    });
    group.finish();
}

fn bench_barrier(c: &mut Criterion) {
    let mut group = c.benchmark_group("superstep_barrier");
    for &parties in &[2usize, 4] {
        group.bench_function(format!("rounds_1000_p{parties}"), |b| {
            b.iter(|| {
                let barrier = Arc::new(SuperstepBarrier::new(parties));
                std::thread::scope(|s| {
                    for _ in 0..parties {
                        let barrier = Arc::clone(&barrier);
                        s.spawn(move || {
                            for _ in 0..1_000 {
                                let _ = barrier.wait();
                            }
                        });
                    }
                });
                criterion::black_box(barrier.generation())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_merge_queue, bench_barrier);
criterion_main!(benches);
