//! Bit-vector acceleration module.
//!
//! Process-wide lookup tables with an explicit lifecycle:
//! - [`init`] builds the tables on first use and hands out a [`BitOps`]
//!   handle; later calls reuse them. The tables stay resident for the rest of
//!   the process, however many engines come and go.
//! - [`teardown`] releases them exactly once. Later calls are no-ops. Binaries
//!   hold an [`ExitGuard`] from [`exit_guard`] in `main` so teardown runs on
//!   the way out.
//!
//! Handles taken before teardown keep their tables alive until dropped. An
//! `init` after teardown hands out a private, unregistered copy.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

const WORD_BITS: usize = u64::BITS as usize;

struct Tables {
    popcount: [u8; 256],
    lowest_bit: [u8; 256],
}

impl Tables {
    fn build() -> Self {
        let mut popcount = [0u8; 256];
        let mut lowest_bit = [0u8; 256];
        for b in 0..256usize {
            popcount[b] = (b as u8).count_ones() as u8;
            // 8 marks "no bit set"
            lowest_bit[b] = if b == 0 { 8 } else { b.trailing_zeros() as u8 };
        }
        Self {
            popcount,
            lowest_bit,
        }
    }
}

static TABLES: Mutex<Option<Arc<Tables>>> = Mutex::new(None);
static TORN_DOWN: OnceLock<()> = OnceLock::new();

fn tables() -> MutexGuard<'static, Option<Arc<Tables>>> {
    TABLES.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Initialise the module (idempotent) and return a handle to its primitives.
pub fn init() -> BitOps {
    let mut slot = tables();
    if let Some(t) = slot.as_ref() {
        return BitOps {
            tables: Arc::clone(t),
        };
    }
    let t = Arc::new(Tables::build());
    if is_torn_down() {
        #[cfg(feature = "tracing")]
        tracing::warn!("bitops: init after teardown, using unshared tables");
    } else {
        #[cfg(feature = "tracing")]
        tracing::debug!("bitops: building lookup tables");
        *slot = Some(Arc::clone(&t));
    }
    BitOps { tables: t }
}

/// Release the process-wide tables. Only the first call has an effect.
pub fn teardown() {
    if TORN_DOWN.set(()).is_ok() {
        let released = tables().take().is_some();
        #[cfg(feature = "tracing")]
        tracing::debug!(released, "bitops: teardown");
        #[cfg(not(feature = "tracing"))]
        let _ = released;
    }
}

/// Whether the process-wide tables are currently resident.
pub fn is_initialized() -> bool {
    tables().is_some()
}

/// Whether [`teardown`] has run.
pub fn is_torn_down() -> bool {
    TORN_DOWN.get().is_some()
}

/// Number of completed teardowns: 0 before [`teardown`], 1 afterwards.
pub fn teardown_count() -> u64 {
    u64::from(is_torn_down())
}

/// Calls [`teardown`] when dropped. Hold one for the lifetime of `main`.
#[must_use = "teardown runs when the guard is dropped"]
#[derive(Debug)]
pub struct ExitGuard(());

pub fn exit_guard() -> ExitGuard {
    ExitGuard(())
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        teardown();
    }
}

/// Handle to the initialised bit-vector primitives.
#[derive(Clone)]
pub struct BitOps {
    tables: Arc<Tables>,
}

impl std::fmt::Debug for BitOps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitOps").finish_non_exhaustive()
    }
}

/// Per-symbol occurrence bitmasks of a byte pattern.
#[derive(Clone, Debug)]
pub struct MatchMasks {
    words: usize,
    len: usize,
    masks: Vec<u64>,
}

impl MatchMasks {
    /// Number of 64-bit words per mask.
    pub fn words(&self) -> usize {
        self.words
    }

    /// Length of the pattern the masks were built from.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bitmask of positions where the pattern holds `symbol`.
    #[inline]
    pub fn get(&self, symbol: u8) -> &[u64] {
        let start = symbol as usize * self.words;
        &self.masks[start..start + self.words]
    }
}

impl BitOps {
    /// Count set bits across a multi-word vector.
    pub fn popcount(&self, words: &[u64]) -> u32 {
        words
            .iter()
            .flat_map(|w| w.to_le_bytes())
            .map(|b| self.tables.popcount[b as usize] as u32)
            .sum()
    }

    /// Index of the lowest set bit, or `None` for an all-zero vector.
    pub fn lowest_set_bit(&self, words: &[u64]) -> Option<usize> {
        for (wi, w) in words.iter().enumerate() {
            for (bi, b) in w.to_le_bytes().iter().enumerate() {
                let low = self.tables.lowest_bit[*b as usize];
                if low < 8 {
                    return Some(wi * WORD_BITS + bi * 8 + low as usize);
                }
            }
        }
        None
    }

    /// Build occurrence masks for every byte value of `pattern`.
    pub fn match_masks(&self, pattern: &[u8]) -> MatchMasks {
        let words = pattern.len().div_ceil(WORD_BITS).max(1);
        let mut masks = vec![0u64; 256 * words];
        for (pos, &sym) in pattern.iter().enumerate() {
            masks[sym as usize * words + pos / WORD_BITS] |= 1u64 << (pos % WORD_BITS);
        }
        MatchMasks {
            words,
            len: pattern.len(),
            masks,
        }
    }

    /// Bit-parallel LCS length of two byte strings.
    ///
    /// Runs in O(|b| * ceil(|a| / 64)) word operations and is independent of
    /// the DP engine, which makes it a useful cross-check.
    pub fn lcs_length(&self, a: &[u8], b: &[u8]) -> usize {
        if a.is_empty() || b.is_empty() {
            return 0;
        }
        let masks = self.match_masks(a);
        let words = masks.words();
        let mut v = vec![!0u64; words];
        for &sym in b {
            let m = masks.get(sym);
            let mut carry = 0u64;
            for w in 0..words {
                let vw = v[w];
                let (s1, c1) = vw.overflowing_add(vw & m[w]);
                let (s2, c2) = s1.overflowing_add(carry);
                carry = (c1 | c2) as u64;
                v[w] = s2 | (vw & !m[w]);
            }
        }
        let tail = a.len() % WORD_BITS;
        if tail != 0 {
            v[words - 1] &= (1u64 << tail) - 1;
        }
        a.len() - self.popcount(&v) as usize
    }
}
