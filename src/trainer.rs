//! Incremental BPE training loop.
//!
//! One linear pass seeds the pair heap with adjacent-pair counts; after
//! that every merge step pops the most frequent pair, rewrites its
//! occurrences in the skipping sequence, and repairs only the four pair
//! counts touched at each merge site. Work per step is bounded by the
//! merge sites themselves, never by a rescan of the whole sequence.

use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::config::TrainerConfig;
use crate::error::{HeapError, TrainError};
use crate::pairheap::PairHeap;
use crate::skipseq::SkipSeq;
use crate::types::{Token, TokenFreq, TokenPair};

/// A learned merge: the replaced pair and the token id emitted for it.
pub type Merge = ((Token, Token), Token);

/// BPE trainer owning the skipping sequence and the pair heap.
///
/// Holds exclusive mutable access to both for the whole training session;
/// no cursor or heap reference outlives a single step.
#[derive(Debug)]
pub struct BPETrainer {
    /// Training sequence; merges rewrite it in place.
    seq: SkipSeq,

    /// Adjacent-pair frequencies, kept exact by the per-site deltas.
    heap: PairHeap,

    /// Next token id to emit, strictly increasing from `first_emit_id`.
    next_id: Token,

    /// Training stops once `next_id` reaches this.
    target_vocab: Token,

    /// History of merges in emission order.
    merge_history: Vec<Merge>,
}

impl BPETrainer {
    /// Creates a trainer from an initial token sequence.
    ///
    /// The input is copied into the skipping sequence and scanned once to
    /// seed the pair heap.
    ///
    /// # Arguments
    ///
    /// * `tokens` - Initial sequence of tokens (e.g., byte values 0-255).
    /// * `config` - Validated knobs; `first_emit_id` must exceed every id
    ///   in `tokens`.
    ///
    /// # Errors
    ///
    /// Returns `TrainError::InvalidConfig` for bad knobs or an input token
    /// at or above `first_emit_id`, and propagates sequence or heap
    /// construction failures.
    pub fn new(tokens: &[Token], config: &TrainerConfig) -> Result<Self, TrainError> {
        config.validate()?;
        if let Some(&widest) = tokens.iter().max()
            && widest >= config.first_emit_id
        {
            return Err(TrainError::InvalidConfig(format!(
                "first_emit_id {} must exceed every input token id (saw {widest})",
                config.first_emit_id
            )));
        }

        let seq = SkipSeq::from_tokens(tokens, config.skip_bits)?;
        let mut trainer = Self {
            seq,
            heap: PairHeap::new(),
            next_id: config.first_emit_id,
            target_vocab: config.target_vocab_size,
            merge_history: Vec::new(),
        };
        trainer.seed_pair_counts()?;
        Ok(trainer)
    }

    /// Performs one merge: pops the most frequent pair, rewrites every
    /// occurrence left to right, and repairs the neighbouring pair counts.
    ///
    /// Returns `Ok(Some(merge))` with the emitted record, or `Ok(None)`
    /// when training is finished: the target vocabulary is reached, fewer
    /// than two live tokens remain, or no pair has positive frequency.
    ///
    /// A popped pair with no occurrences left still consumes a token id
    /// and is still recorded; the step just rewrites nothing.
    ///
    /// # Errors
    ///
    /// Propagates heap failures from the delta updates. These leave the
    /// trainer inconsistent; callers should stop training (see
    /// [`BPETrainer::train`], which does).
    pub fn merge_step(&mut self) -> Result<Option<Merge>, TrainError> {
        if self.next_id >= self.target_vocab || self.seq.live_len() < 2 {
            return Ok(None);
        }

        let top = match self.heap.pop_max() {
            Ok(entry) => entry,
            Err(HeapError::Empty) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        // Only tombstones left.
        if top.freq == 0 {
            return Ok(None);
        }

        let pair = top.pair;
        let new_id = self.next_id;
        self.next_id += 1;

        let mut rewrites = 0usize;
        let mut prev: Option<Token> = None;
        let mut cursor = self.seq.cursor();
        while let Some(current) = cursor.advance() {
            let Some(next) = cursor.peek() else { break };
            if current == pair.0 && next == pair.1 {
                // Capture the local context before rewriting; the popped
                // pair itself needs no delta, its entry already left the
                // heap with the pop.
                let left = prev;
                let right_right = cursor.peek2();
                cursor.replace_and_skip_next(new_id);
                apply_site_deltas(&mut self.heap, left, pair, right_right, new_id)?;
                rewrites += 1;
                prev = Some(new_id);
            } else {
                prev = Some(current);
            }
        }

        debug!(
            "merged ({}, {}) -> {} (freq {}, {} sites)",
            pair.0, pair.1, new_id, top.freq, rewrites
        );

        let record = ((pair.0, pair.1), new_id);
        self.merge_history.push(record);
        Ok(Some(record))
    }

    /// Runs merge steps until the target vocabulary size is reached or no
    /// further merge is possible.
    ///
    /// An internal error ends the loop early with whatever vocabulary was
    /// built so far, leaving a truncated but usable merge history.
    ///
    /// # Returns
    ///
    /// The number of merges performed.
    pub fn train(&mut self) -> usize {
        let mut performed = 0;
        loop {
            match self.merge_step() {
                Ok(Some(_)) => performed += 1,
                Ok(None) => break,
                Err(e) => {
                    warn!("training stopped early after {performed} merges: {e}");
                    break;
                }
            }
        }
        performed
    }

    /// Returns the current token sequence after all merges so far.
    pub fn encodings(&self) -> Vec<Token> {
        self.seq.tokens()
    }

    /// The complete history of merge operations in emission order.
    pub fn merge_history(&self) -> &[Merge] {
        &self.merge_history
    }

    /// The token id the next merge would emit.
    pub fn next_id(&self) -> Token {
        self.next_id
    }

    /// Seeds the pair heap from one cursor pass over the sequence.
    ///
    /// The left member of each counted pair is the value most recently
    /// returned by `advance`; the right member comes from `peek`.
    fn seed_pair_counts(&mut self) -> Result<(), TrainError> {
        let mut counts: FxHashMap<TokenPair, TokenFreq> = FxHashMap::default();
        {
            let mut cursor = self.seq.cursor();
            while let Some(left) = cursor.advance() {
                let Some(right) = cursor.peek() else { break };
                *counts.entry(TokenPair(left, right)).or_insert(0) += 1;
            }
        }

        for (pair, freq) in counts {
            self.heap.insert(pair, freq)?;
        }
        Ok(())
    }
}

/// Applies the four local frequency deltas around a freshly rewritten
/// merge site `(left, a, b, right_right)` -> `(left, new_id, right_right)`.
///
/// Decrementing a present pair saturates at 0 (the entry stays as a
/// tombstone); decrementing an absent pair is a no-op. Incrementing an
/// absent pair inserts it with frequency 1.
fn apply_site_deltas(
    heap: &mut PairHeap,
    left: Option<Token>,
    pair: TokenPair,
    right_right: Option<Token>,
    new_id: Token,
) -> Result<(), HeapError> {
    if let Some(l) = left {
        decrement(heap, TokenPair(l, pair.0))?;
        increment(heap, TokenPair(l, new_id))?;
    }
    if let Some(rr) = right_right {
        decrement(heap, TokenPair(pair.1, rr))?;
        increment(heap, TokenPair(new_id, rr))?;
    }
    Ok(())
}

fn increment(heap: &mut PairHeap, pair: TokenPair) -> Result<(), HeapError> {
    match heap.get(pair) {
        Some(freq) => heap.update(pair, freq + 1)?,
        None => heap.insert(pair, 1)?,
    };
    Ok(())
}

fn decrement(heap: &mut PairHeap, pair: TokenPair) -> Result<(), HeapError> {
    if let Some(freq) = heap.get(pair) {
        heap.update(pair, freq.saturating_sub(1))?;
    }
    Ok(())
}
