//! Bulk-synchronous parallel scheduler for the DP engine.
//!
//! The matrix is split into a [`BlockGrid`] with one row band per worker.
//! Superstep `k` evaluates every block on anti-diagonal `r + c = k`:
//! 1. Each worker computes its block from boundaries published earlier and
//!    pushes its bottom row into the shared [`SharedMergeQueue`].
//! 2. All workers and the coordinator meet at the generation barrier.
//! 3. The coordinator drains the superstep's publications into per-column
//!    boundary slots, then releases the next superstep through the barrier.
//!
//! Right-hand columns never leave their worker: band `r` walks its column
//! blocks left to right and keeps the trailing column locally.
//!
//! A failing worker aborts the run after the current barrier. Nothing is
//! retried and no partial score is returned.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::blocks::BlockGrid;
use crate::engine::{check_index_space, compute_block, AlignmentEngine};
use crate::error::{AlignError, Result};
use crate::merge_queue::SharedMergeQueue;
use crate::superstep::{AbortGuard, Publication, SuperstepBarrier};
use crate::traits::ScoringPolicy;
use crate::utils::default_col_blocks;

/// Busy-work slice executed by warmup tasks.
const WARMUP_SLICE: Duration = Duration::from_millis(10);

/// Outcome of a scheduled run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport<S> {
    /// Converted corner score.
    pub score: S,
    /// Wall-clock time of the productive phase, warmup excluded.
    pub elapsed: Duration,
    /// Wall-clock time spent in warmup, if any ran.
    pub warmup: Option<Duration>,
    /// Supersteps executed.
    pub supersteps: usize,
    /// Blocks evaluated.
    pub blocks: usize,
    /// Row bands, i.e. workers that received work.
    pub bands: usize,
}

/// BSP scheduler over a scoring policy `P`.
///
/// Build one with [`SchedulerBuilder`](crate::builder::SchedulerBuilder):
/// ```
/// use bsp_align::{policies::LcsScoring, SchedulerBuilder};
///
/// let scheduler = SchedulerBuilder::new(LcsScoring).workers(3).build().unwrap();
/// let report = scheduler.run(b"ACCGGTCGAG", b"GTCGTTCGGA").unwrap();
/// assert_eq!(report.score, 6.0);
/// ```
pub struct BspScheduler<P> {
    engine: AlignmentEngine<P>,
    workers: usize,
    col_blocks: Option<usize>,
    warmup: Option<Duration>,
    /// Held for the whole of a run; the pool has room for one run at a time.
    running: Mutex<()>,
    #[cfg(feature = "parallel")]
    pool: rayon::ThreadPool,
}

impl<P> BspScheduler<P> {
    pub(crate) fn from_parts(
        policy: P,
        workers: usize,
        col_blocks: Option<usize>,
        warmup: Option<Duration>,
    ) -> Result<Self> {
        if workers < 1 {
            return Err(AlignError::Scheduling(format!(
                "worker count must be at least 1, got {workers}"
            )));
        }
        if col_blocks == Some(0) {
            return Err(AlignError::Scheduling(
                "column block count must be at least 1".into(),
            ));
        }
        #[cfg(feature = "parallel")]
        let pool = rayon::ThreadPoolBuilder::new()
            // one extra thread hosts the coordinator
            .num_threads(workers + 1)
            .thread_name(|i| format!("bsp-worker-{i}"))
            .build()
            .map_err(|e| AlignError::Scheduling(format!("cannot build worker pool: {e}")))?;
        Ok(Self {
            engine: AlignmentEngine::new(policy),
            workers,
            col_blocks,
            warmup,
            running: Mutex::new(()),
            #[cfg(feature = "parallel")]
            pool,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn policy(&self) -> &P {
        self.engine.policy()
    }

    /// The sequential engine sharing this scheduler's policy.
    pub fn engine(&self) -> &AlignmentEngine<P> {
        &self.engine
    }

    /// Exercise the worker pool with dummy parallel work for about `duration`.
    ///
    /// Has no effect on any computed score. Returns the time actually spent.
    pub fn warmup(&self, duration: Duration) -> Duration {
        let start = Instant::now();
        let (slices, tasks) = warmup_tasks(duration, self.workers);

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            self.pool
                .install(|| (0..tasks).into_par_iter().for_each(|_| spin(WARMUP_SLICE)));
        }
        #[cfg(not(feature = "parallel"))]
        std::thread::scope(|s| {
            for _ in 0..self.workers {
                s.spawn(|| {
                    for _ in 0..slices {
                        spin(WARMUP_SLICE);
                    }
                });
            }
        });

        #[cfg(not(any(feature = "parallel", feature = "tracing")))]
        let _ = tasks;
        let spent = start.elapsed();
        #[cfg(feature = "tracing")]
        tracing::debug!(tasks, spent_s = spent.as_secs_f64(), "warmup finished");
        spent
    }

    /// Align `left` (rows) against `top` (columns) in parallel supersteps.
    pub fn run<T>(&self, left: &[T], top: &[T]) -> Result<RunReport<P::Score>>
    where
        P: ScoringPolicy<T>,
        T: Sync,
    {
        let (m, n) = (left.len(), top.len());
        check_index_space(m, n)?;
        let col_blocks = self
            .col_blocks
            .unwrap_or_else(|| default_col_blocks(n, self.workers));
        let grid = BlockGrid::new(m, n, self.workers, col_blocks)?;

        // concurrent callers queue here instead of competing for pool threads
        let _running = lock(&self.running);
        let warmup = self.warmup.map(|d| self.warmup(d));

        #[cfg(feature = "tracing")]
        let span = tracing::info_span!(
            "bsp_run",
            m,
            n,
            bands = grid.row_bands(),
            col_blocks = grid.col_blocks()
        );
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let policy = self.engine.policy();
        let start = Instant::now();
        let (raw, supersteps, blocks) = if m == 0 || n == 0 {
            (policy.boundary(m, n), 0, 0)
        } else {
            let raw = self.execute(policy, &grid, left, top)?;
            (raw, grid.supersteps(), grid.len())
        };
        let score = policy.convert(raw, m, n);
        let elapsed = start.elapsed();

        Ok(RunReport {
            score,
            elapsed,
            warmup,
            supersteps,
            blocks,
            bands: grid.row_bands(),
        })
    }

    fn execute<T>(
        &self,
        policy: &P,
        grid: &BlockGrid,
        left: &[T],
        top: &[T],
    ) -> Result<P::Cell>
    where
        P: ScoringPolicy<T>,
        T: Sync,
    {
        let run = SuperstepRun::new(policy, grid, left, top);
        let worker = |band: usize| run.worker(band);
        let coordinator = || run.coordinate();

        #[cfg(feature = "parallel")]
        let outcome = self.pool.scope(|s| {
            for band in 0..grid.row_bands() {
                let worker = &worker;
                s.spawn(move |_| worker(band));
            }
            coordinator()
        });
        #[cfg(not(feature = "parallel"))]
        let outcome = std::thread::scope(|s| {
            for band in 0..grid.row_bands() {
                let worker = &worker;
                s.spawn(move || worker(band));
            }
            coordinator()
        });

        outcome
    }
}

/// Slices per worker and total busy-work tasks for a warmup of `duration`.
fn warmup_tasks(duration: Duration, workers: usize) -> (usize, usize) {
    let slices = duration.as_micros().div_ceil(WARMUP_SLICE.as_micros());
    let slices = usize::try_from(slices).unwrap_or(usize::MAX);
    (slices, slices.saturating_mul(workers))
}

fn spin(slice: Duration) {
    let until = Instant::now() + slice;
    let mut acc = 0u64;
    while Instant::now() < until {
        acc = std::hint::black_box(acc.wrapping_mul(6364136223846793005).wrapping_add(1));
    }
}

fn lock<U>(m: &Mutex<U>) -> MutexGuard<'_, U> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Shared state of one scheduled computation, created per run.
struct SuperstepRun<'a, T, P: ScoringPolicy<T>> {
    policy: &'a P,
    grid: &'a BlockGrid,
    left: &'a [T],
    top: &'a [T],
    queue: SharedMergeQueue<Publication<P::Cell>>,
    /// Top boundary waiting for the next band, one slot per column block.
    slots: Vec<Mutex<Option<Vec<P::Cell>>>>,
    barrier: SuperstepBarrier,
    failure: Mutex<Option<AlignError>>,
}

impl<'a, T, P> SuperstepRun<'a, T, P>
where
    T: Sync,
    P: ScoringPolicy<T>,
{
    fn new(policy: &'a P, grid: &'a BlockGrid, left: &'a [T], top: &'a [T]) -> Self {
        Self {
            policy,
            grid,
            left,
            top,
            queue: SharedMergeQueue::new(),
            slots: (0..grid.col_blocks()).map(|_| Mutex::new(None)).collect(),
            barrier: SuperstepBarrier::new(grid.row_bands() + 1),
            failure: Mutex::new(None),
        }
    }

    fn fail(&self, err: AlignError) {
        let mut slot = lock(&self.failure);
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    /// Evaluate block `(band, block)` of `superstep` and publish its bottom row.
    fn compute(
        &self,
        superstep: usize,
        band: usize,
        block: usize,
        left_col: &mut Vec<P::Cell>,
    ) -> Result<Publication<P::Cell>> {
        let rows = self.grid.rows(band);
        let cols = self.grid.cols(block);
        let top_row = if band == 0 {
            (cols.start..=cols.end)
                .map(|j| self.policy.boundary(0, j))
                .collect()
        } else {
            lock(&self.slots[block]).take().ok_or_else(|| AlignError::WorkerFailure {
                worker: band,
                message: format!("no boundary published above block ({band}, {block})"),
            })?
        };
        let out = compute_block(
            self.policy,
            &self.left[rows.start..rows.end],
            &self.top[cols.start..cols.end],
            &top_row,
            left_col,
        );
        *left_col = out.right_col;
        Ok(Publication {
            superstep,
            band,
            block,
            bottom_row: out.bottom_row,
        })
    }

    fn worker(&self, band: usize) {
        let rows = self.grid.rows(band);
        let mut left_col: Vec<P::Cell> = (rows.start..=rows.end)
            .map(|i| self.policy.boundary(i, 0))
            .collect();

        for k in 0..self.grid.supersteps() {
            if let Some(block) = self.grid.block_for(band, k) {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    self.compute(k, band, block, &mut left_col)
                }));
                match outcome {
                    Ok(Ok(publication)) => self.queue.push(publication),
                    Ok(Err(err)) => self.fail(err),
                    Err(payload) => self.fail(AlignError::WorkerFailure {
                        worker: band,
                        message: panic_message(payload.as_ref()),
                    }),
                }
            }
            // computed; then wait for the coordinator to merge
            if self.barrier.wait().is_err() || self.barrier.wait().is_err() {
                return;
            }
        }
    }

    fn coordinate(&self) -> Result<P::Cell> {
        let guard = AbortGuard::new(&self.barrier);
        let last_band = self.grid.row_bands() - 1;
        let last_block = self.grid.col_blocks() - 1;
        let mut corner = None;

        for k in 0..self.grid.supersteps() {
            #[cfg(feature = "tracing")]
            let span = tracing::trace_span!("superstep", k);
            #[cfg(feature = "tracing")]
            let _enter = span.enter();

            if self.barrier.wait().is_err() {
                break;
            }
            if let Some(err) = lock(&self.failure).take() {
                #[cfg(feature = "tracing")]
                tracing::error!(superstep = k, error = %err, "aborting run");
                // dropping the armed guard releases every waiting worker
                return Err(err);
            }

            let published = self.queue.drain(&Publication::threshold(k));
            debug_assert_eq!(published.len(), self.grid.superstep_blocks(k).count());
            for (publication, _) in published {
                if publication.band < last_band {
                    *lock(&self.slots[publication.block]) = Some(publication.bottom_row);
                } else if publication.block == last_block {
                    corner = publication.bottom_row.last().copied();
                }
            }
            if self.barrier.wait().is_err() {
                break;
            }
        }
        guard.disarm();

        corner.ok_or_else(|| AlignError::WorkerFailure {
            worker: last_band,
            message: "corner block was never published".into(),
        })
    }
}
