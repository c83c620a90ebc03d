//! Ordered multiset used to merge per-partition publications between
//! supersteps.
//!
//! Values are kept sorted ascending together with their multiplicity. The
//! minimum is always at the front; [`MergeQueue::pop`] discards everything at
//! or below a threshold and [`MergeQueue::drain`] hands those entries back in
//! ascending order.
//!
//! Callers must not push a value below a threshold that has already been
//! drained. The scheduler only pushes publications of the current superstep
//! before draining it, which keeps the drained stream monotone.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use crate::error::{AlignError, Result};

/// Sorted multiset with threshold draining.
#[derive(Clone, Debug)]
pub struct MergeQueue<T: Ord> {
    entries: BTreeMap<T, usize>,
    total: usize,
}

impl<T: Ord> Default for MergeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord> MergeQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            total: 0,
        }
    }

    /// Insert one occurrence of `value`.
    pub fn push(&mut self, value: T) {
        *self.entries.entry(value).or_insert(0) += 1;
        self.total += 1;
    }

    /// Smallest value currently held.
    pub fn top(&self) -> Result<&T> {
        self.entries
            .first_key_value()
            .map(|(v, _)| v)
            .ok_or(AlignError::EmptyQueue)
    }

    /// Remove every held value `<= threshold`, respecting multiplicity.
    pub fn pop(&mut self, threshold: &T) {
        while let Some(entry) = self.entries.first_entry() {
            if entry.key() > threshold {
                break;
            }
            self.total -= entry.remove();
        }
    }

    /// Like [`pop`](Self::pop), but return the removed `(value, multiplicity)`
    /// pairs in ascending order.
    pub fn drain(&mut self, threshold: &T) -> Vec<(T, usize)> {
        let mut out = Vec::new();
        while let Some(entry) = self.entries.first_entry() {
            if entry.key() > threshold {
                break;
            }
            let (value, count) = entry.remove_entry();
            self.total -= count;
            out.push((value, count));
        }
        out
    }

    /// Total multiplicity across all distinct values.
    #[inline]
    pub fn size(&self) -> usize {
        self.total
    }

    /// Number of distinct values held.
    #[inline]
    pub fn distinct(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Forget every held value.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.total = 0;
    }

    /// Iterate `(value, multiplicity)` pairs in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, usize)> + '_ {
        self.entries.iter().map(|(v, c)| (v, *c))
    }
}

impl<T: Ord> Extend<T> for MergeQueue<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for v in iter {
            self.push(v);
        }
    }
}

impl<T: Ord> FromIterator<T> for MergeQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut q = Self::new();
        q.extend(iter);
        q
    }
}

/// Dumps as `size(v1xk1,v2xk2,...)`, or just `0` when empty.
impl<T: Ord + fmt::Display> fmt::Display for MergeQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.total)?;
        if self.total > 0 {
            write!(f, "(")?;
            for (v, c) in self.iter() {
                write!(f, "{v}x{c},")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Merge queue that tolerates concurrent `push` from many workers.
///
/// `pop` and `drain` are meant for a single coordinating thread after all
/// producers of the current superstep have passed the barrier.
#[derive(Debug)]
pub struct SharedMergeQueue<T: Ord> {
    inner: Mutex<MergeQueue<T>>,
}

impl<T: Ord> Default for SharedMergeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord> SharedMergeQueue<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MergeQueue::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MergeQueue<T>> {
        // A producer that panicked mid-push never leaves a half-inserted entry.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, value: T) {
        self.lock().push(value);
    }

    pub fn pop(&self, threshold: &T) {
        self.lock().pop(threshold);
    }

    pub fn drain(&self, threshold: &T) -> Vec<(T, usize)> {
        self.lock().drain(threshold)
    }

    pub fn size(&self) -> usize {
        self.lock().size()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Unwrap into the plain queue once all producers are gone.
    pub fn into_inner(self) -> MergeQueue<T> {
        self.inner
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_on_empty_is_an_error() {
        let q: MergeQueue<i32> = MergeQueue::new();
        assert_eq!(q.top(), Err(AlignError::EmptyQueue));
        assert!(q.is_empty());
    }

    #[test]
    fn top_tracks_minimum() {
        let mut q = MergeQueue::new();
        q.push(7);
        q.push(3);
        q.push(9);
        assert_eq!(q.top(), Ok(&3));
        q.pop(&3);
        assert_eq!(q.top(), Ok(&7));
        assert_eq!(q.size(), 2);
    }

    #[test]
    fn pop_below_minimum_is_noop() {
        let mut q: MergeQueue<i32> = [5, 6, 6].into_iter().collect();
        q.pop(&4);
        assert_eq!(q.size(), 3);
        assert_eq!(q.distinct(), 2);
    }

    #[test]
    fn drain_returns_ascending_with_counts() {
        let mut q: MergeQueue<u32> = [4, 1, 4, 2, 9, 1, 1].into_iter().collect();
        let drained = q.drain(&4);
        assert_eq!(drained, vec![(1, 3), (2, 1), (4, 2)]);
        assert_eq!(q.size(), 1);
        assert_eq!(q.top(), Ok(&9));
    }

    #[test]
    fn display_dumps_entries() {
        let mut q: MergeQueue<i32> = MergeQueue::new();
        assert_eq!(q.to_string(), "0");
        q.extend([2, 1, 2]);
        assert_eq!(q.to_string(), "3(1x1,2x2,)");
    }

    #[test]
    fn shared_queue_accepts_concurrent_pushes() {
        let q = SharedMergeQueue::new();
        std::thread::scope(|s| {
            for w in 0..4u32 {
                let q = &q;
                s.spawn(move || {
                    for v in 0..100u32 {
                        q.push(v * 4 + w);
                    }
                });
            }
        });
        assert_eq!(q.size(), 400);
        let drained = q.drain(&u32::MAX);
        assert_eq!(drained.len(), 400);
        assert!(drained.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn clear_resets_between_computations() {
        let q = SharedMergeQueue::new();
        q.push(1);
        q.push(1);
        q.clear();
        assert_eq!(q.size(), 0);
        assert!(q.into_inner().is_empty());
    }
}
