//! Indexed max-priority queue over token-pair frequencies.
//!
//! BPE merges change the frequency of pairs that already exist, not just
//! insert new ones, so the heap keeps a hash index from pair to array
//! position and adjusts entries in place. This keeps the heap small and
//! avoids the unbounded stale-entry accumulation of a lazy-delete scheme.
//!
//! Frequency 0 is a legal tombstone: the entry stays in the array, sinks
//! to the bottom under the heap property, and is only ever reported as the
//! maximum when no positive-frequency entry remains.

use std::cmp::Ordering;

use rustc_hash::FxHashMap;

use crate::error::HeapError;
use crate::types::{TokenFreq, TokenPair};

/// A pair together with its current frequency, as stored in the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairEntry {
    /// Frequency count of this token pair.
    pub freq: TokenFreq,

    /// The token pair being tracked.
    pub pair: TokenPair,
}

impl PartialOrd for PairEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        // Ord implementation ensures all entries are comparable.
        Some(self.cmp(other))
    }
}

/// Highest frequency wins; ties break by pair components so runs are
/// reproducible.
impl Ord for PairEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.freq
            .cmp(&other.freq)
            .then_with(|| self.pair.0.cmp(&other.pair.0))
            .then_with(|| self.pair.1.cmp(&other.pair.1))
    }
}

/// Max-heap of `{pair, freq}` entries with an index map for O(1) lookup
/// and O(log n) in-place frequency updates.
///
/// Every swap inside a sift updates the index map, so the mapping from
/// pair to array position is consistent after every operation.
#[derive(Debug, Default)]
pub struct PairHeap {
    /// Dense array in max-heap order by frequency.
    entries: Vec<PairEntry>,

    /// pair -> current position in `entries`.
    index: FxHashMap<TokenPair, usize>,
}

impl PairHeap {
    /// Creates an empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, tombstones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the heap holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current frequency of `pair`, or `None` if the pair is not indexed.
    pub fn get(&self, pair: TokenPair) -> Option<TokenFreq> {
        self.index.get(&pair).map(|&i| self.entries[i].freq)
    }

    /// The current maximum entry without removing it.
    pub fn peek_max(&self) -> Option<&PairEntry> {
        self.entries.first()
    }

    /// Inserts a new pair and sifts it into place.
    ///
    /// Returns the entry's final position in the heap array.
    ///
    /// # Errors
    ///
    /// * `HeapError::AlreadyPresent` if the pair is already indexed.
    /// * `HeapError::OutOfMemory` if entry storage cannot grow.
    pub fn insert(&mut self, pair: TokenPair, freq: TokenFreq) -> Result<usize, HeapError> {
        if self.index.contains_key(&pair) {
            return Err(HeapError::AlreadyPresent(pair));
        }
        self.entries.try_reserve(1)?;

        let i = self.entries.len();
        self.entries.push(PairEntry { freq, pair });
        self.index.insert(pair, i);
        Ok(self.sift_up(i))
    }

    /// Overwrites the frequency of a present pair and re-sifts it in the
    /// direction of the change.
    ///
    /// An update to frequency 0 leaves the entry in the heap as a
    /// tombstone. Returns the entry's final position.
    ///
    /// # Errors
    ///
    /// Returns `HeapError::Missing` if the pair is not indexed.
    pub fn update(&mut self, pair: TokenPair, new_freq: TokenFreq) -> Result<usize, HeapError> {
        let &i = self.index.get(&pair).ok_or(HeapError::Missing(pair))?;
        let old_freq = self.entries[i].freq;
        self.entries[i].freq = new_freq;

        let final_idx = match new_freq.cmp(&old_freq) {
            Ordering::Greater => self.sift_up(i),
            Ordering::Less => self.sift_down(i),
            Ordering::Equal => i,
        };
        Ok(final_idx)
    }

    /// Removes and returns the maximum entry.
    ///
    /// The last entry moves to the root and sifts down. A returned
    /// frequency of 0 means only tombstones were left.
    ///
    /// # Errors
    ///
    /// Returns `HeapError::Empty` if there are no entries.
    pub fn pop_max(&mut self) -> Result<PairEntry, HeapError> {
        let max = *self.entries.first().ok_or(HeapError::Empty)?;
        self.index.remove(&max.pair);

        let last = self.entries.len() - 1;
        if last > 0 {
            self.entries.swap(0, last);
            self.entries.pop();
            self.index.insert(self.entries[0].pair, 0);
            self.sift_down(0);
        } else {
            self.entries.pop();
        }
        Ok(max)
    }

    /// Iterates `(pair, freq)` in heap array order.
    pub fn iter(&self) -> impl Iterator<Item = (TokenPair, TokenFreq)> + '_ {
        self.entries.iter().map(|e| (e.pair, e.freq))
    }

    /// Swaps two entries and keeps the index map in step.
    fn swap_entries(&mut self, a: usize, b: usize) {
        self.entries.swap(a, b);
        self.index.insert(self.entries[a].pair, a);
        self.index.insert(self.entries[b].pair, b);
    }

    /// Moves the entry at `i` up until its parent outranks it.
    ///
    /// Returns the entry's final position.
    fn sift_up(&mut self, mut i: usize) -> usize {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.entries[i] <= self.entries[parent] {
                break;
            }
            self.swap_entries(i, parent);
            i = parent;
        }
        i
    }

    /// Moves the entry at `i` down below any child that outranks it.
    ///
    /// Returns the entry's final position.
    fn sift_down(&mut self, mut i: usize) -> usize {
        loop {
            let left = 2 * i + 1;
            if left >= self.entries.len() {
                break;
            }
            let right = left + 1;
            let best = if right < self.entries.len() && self.entries[right] > self.entries[left] {
                right
            } else {
                left
            };
            if self.entries[best] <= self.entries[i] {
                break;
            }
            self.swap_entries(i, best);
            i = best;
        }
        i
    }

    /// Checks the heap property and index-map consistency.
    #[cfg(test)]
    fn check_invariants(&self) {
        for i in 0..self.entries.len() {
            let left = 2 * i + 1;
            let right = 2 * i + 2;
            if left < self.entries.len() {
                assert!(
                    self.entries[i].freq >= self.entries[left].freq,
                    "heap property violated at {i}/{left}"
                );
            }
            if right < self.entries.len() {
                assert!(
                    self.entries[i].freq >= self.entries[right].freq,
                    "heap property violated at {i}/{right}"
                );
            }
            assert_eq!(self.index.get(&self.entries[i].pair), Some(&i));
        }
        assert_eq!(self.index.len(), self.entries.len());
    }
}
