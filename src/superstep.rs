//! Superstep bookkeeping: the generation barrier and boundary publications.

use std::cmp::Ordering;
use std::sync::{Condvar, Mutex, MutexGuard};

/// Returned by [`SuperstepBarrier::wait`] once the barrier has been aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierAborted;

struct BarrierState {
    arrived: usize,
    generation: u64,
    aborted: bool,
}

/// Reusable rendezvous for a fixed number of parties.
///
/// Every completed rendezvous advances the generation counter by one. Unlike
/// [`std::sync::Barrier`] it can be aborted, which releases all current and
/// future waiters with [`BarrierAborted`].
pub struct SuperstepBarrier {
    parties: usize,
    state: Mutex<BarrierState>,
    cvar: Condvar,
}

impl SuperstepBarrier {
    /// # Panics
    /// Panics if `parties == 0`.
    pub fn new(parties: usize) -> Self {
        assert!(parties > 0, "barrier needs at least one party");
        Self {
            parties,
            state: Mutex::new(BarrierState {
                arrived: 0,
                generation: 0,
                aborted: false,
            }),
            cvar: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn parties(&self) -> usize {
        self.parties
    }

    /// Number of completed rendezvous.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn is_aborted(&self) -> bool {
        self.lock().aborted
    }

    /// Block until all parties arrived; returns the generation just completed.
    pub fn wait(&self) -> Result<u64, BarrierAborted> {
        let mut st = self.lock();
        if st.aborted {
            return Err(BarrierAborted);
        }
        let gen = st.generation;
        st.arrived += 1;
        if st.arrived == self.parties {
            st.arrived = 0;
            st.generation += 1;
            self.cvar.notify_all();
            return Ok(gen);
        }
        while st.generation == gen && !st.aborted {
            st = self
                .cvar
                .wait(st)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        if st.generation == gen {
            Err(BarrierAborted)
        } else {
            Ok(gen)
        }
    }

    /// Release every waiter; all later `wait` calls fail immediately.
    pub fn abort(&self) {
        self.lock().aborted = true;
        self.cvar.notify_all();
    }
}

/// Aborts the barrier when dropped unless disarmed.
pub(crate) struct AbortGuard<'a> {
    barrier: &'a SuperstepBarrier,
    armed: bool,
}

impl<'a> AbortGuard<'a> {
    pub(crate) fn new(barrier: &'a SuperstepBarrier) -> Self {
        Self {
            barrier,
            armed: true,
        }
    }

    pub(crate) fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AbortGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.barrier.abort();
        }
    }
}

/// Trailing row published by block `(band, block)` in `superstep`.
///
/// Ordering and equality look only at `(superstep, band, block)`, which is
/// unique per block, so the merge queue yields publications grouped by
/// superstep and sorted by position inside it.
#[derive(Debug, Clone)]
pub struct Publication<C> {
    pub superstep: usize,
    pub band: usize,
    pub block: usize,
    pub bottom_row: Vec<C>,
}

impl<C> Publication<C> {
    fn key(&self) -> (usize, usize, usize) {
        (self.superstep, self.band, self.block)
    }

    /// Largest possible publication of `superstep`, used as a drain threshold.
    pub fn threshold(superstep: usize) -> Self {
        Self {
            superstep,
            band: usize::MAX,
            block: usize::MAX,
            bottom_row: Vec::new(),
        }
    }
}

impl<C> PartialEq for Publication<C> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<C> Eq for Publication<C> {}

impl<C> PartialOrd for Publication<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C> Ord for Publication<C> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}
