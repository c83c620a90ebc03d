use std::time::Duration;

use crate::error::Result;
use crate::scheduler::BspScheduler;
use crate::utils::default_workers;

/// Configuration for a [`BspScheduler`].
///
/// Defaults: one worker per available core, heuristic column blocks
/// ([`default_col_blocks`](crate::utils::default_col_blocks)), no warmup.
pub struct SchedulerBuilder<P> {
    policy: P,
    workers: Option<usize>,
    col_blocks: Option<usize>,
    warmup: Option<Duration>,
}

impl<P> SchedulerBuilder<P> {
    pub fn new(policy: P) -> Self {
        Self {
            policy,
            workers: None,
            col_blocks: None,
            warmup: None,
        }
    }

    /// Number of worker threads, i.e. row bands. Must be at least 1.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Column blocks per row band. Must be at least 1.
    pub fn col_blocks(mut self, col_blocks: usize) -> Self {
        self.col_blocks = Some(col_blocks);
        self
    }

    /// Run a warmup pass of roughly `duration` before each timed run.
    pub fn warmup(mut self, duration: Duration) -> Self {
        self.warmup = Some(duration);
        self
    }

    /// Like [`warmup`](Self::warmup), taking seconds; non-positive or
    /// non-finite values disable it.
    pub fn warmup_secs(mut self, secs: f64) -> Self {
        self.warmup = Duration::try_from_secs_f64(secs)
            .ok()
            .filter(|d| !d.is_zero());
        self
    }

    /// Validate the configuration and start the worker pool.
    pub fn build(self) -> Result<BspScheduler<P>> {
        let workers = self.workers.unwrap_or_else(default_workers);
        BspScheduler::from_parts(self.policy, workers, self.col_blocks, self.warmup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AlignError;
    use crate::policies::LcsScoring;

    #[test]
    fn defaults_use_available_cores() {
        let s = SchedulerBuilder::new(LcsScoring).build().unwrap();
        assert_eq!(s.workers(), default_workers());
    }

    #[test]
    fn zero_col_blocks_rejected_before_dispatch() {
        let err = SchedulerBuilder::new(LcsScoring)
            .workers(2)
            .col_blocks(0)
            .build()
            .err();
        assert!(matches!(err, Some(AlignError::Scheduling(_))));
    }

    #[test]
    fn non_positive_warmup_disables_it() {
        let s = SchedulerBuilder::new(LcsScoring)
            .workers(1)
            .warmup_secs(-1.0)
            .build()
            .unwrap();
        assert_eq!(s.run(b"AC", b"CA").unwrap().warmup, None);
    }
}
