//! Bit-packed skipping sequence.
//!
//! The training sequence is stored as a flat `Vec<u32>` where each slot
//! carries a token id in its low bits and a forward skip distance in its
//! high bits. A skip of 0 marks the slot live; a nonzero skip marks it
//! dead and promises that the next live slot is *at least* that many
//! positions further along. Merges therefore delete in place without
//! shifting the tail, while iteration stays on contiguous memory.
//!
//! The skip field is a lower bound, not a pointer: iteration compounds
//! skips on the fly, and deletions opportunistically lengthen skips around
//! the deleted slot so long dead runs are crossed in fewer hops.

use crate::error::SeqError;
use crate::types::Token;

/// Bit-packed sequence of token ids with in-place logical delete.
///
/// Storage length is fixed at construction; only the live count decreases.
/// All mutation goes through the forward [`Cursor`] returned by
/// [`SkipSeq::cursor`].
#[derive(Debug)]
pub struct SkipSeq {
    /// Slot storage: value in the low `32 - skip_bits` bits, skip distance
    /// in the high `skip_bits` bits.
    slots: Vec<u32>,

    /// Number of slots whose skip field is 0.
    live: usize,

    /// Width of the value field.
    value_bits: u32,

    /// Mask selecting the value field of a slot.
    value_mask: u32,

    /// Largest skip distance the skip field can hold.
    max_skip: u32,
}

impl SkipSeq {
    /// Builds a sequence from an initial run of token ids.
    ///
    /// The input is copied; every slot starts live. `skip_bits` must be in
    /// `1..=16` (checked by the configuration layer, asserted here).
    ///
    /// # Errors
    ///
    /// * `SeqError::ValueTooWide` if any input id does not fit in
    ///   `32 - skip_bits` bits.
    /// * `SeqError::OutOfMemory` if slot storage cannot be allocated.
    pub fn from_tokens(tokens: &[Token], skip_bits: u32) -> Result<Self, SeqError> {
        debug_assert!((1..=16).contains(&skip_bits), "skip_bits out of range");

        let value_bits = u32::BITS - skip_bits;
        let value_mask = (1u32 << value_bits) - 1;
        let max_skip = (1u32 << skip_bits) - 1;

        let mut slots = Vec::new();
        slots.try_reserve_exact(tokens.len())?;
        for &token in tokens {
            if token > value_mask {
                return Err(SeqError::ValueTooWide {
                    value: token,
                    max: value_mask,
                });
            }
            slots.push(token);
        }

        Ok(Self {
            live: slots.len(),
            slots,
            value_bits,
            value_mask,
            max_skip,
        })
    }

    /// Number of live slots remaining.
    pub fn live_len(&self) -> usize {
        self.live
    }

    /// Fixed length of the underlying slot storage.
    pub fn storage_len(&self) -> usize {
        self.slots.len()
    }

    /// True when no live slots remain.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Collects the live token values in order with a fresh walk.
    pub fn tokens(&self) -> Vec<Token> {
        let mut out = Vec::with_capacity(self.live);
        let mut pos = self.next_live(0);
        while let Some(i) = pos {
            out.push(self.value_at(i));
            pos = self.next_live(i + 1);
        }
        out
    }

    /// Returns a forward cursor positioned before the first live slot.
    pub fn cursor(&mut self) -> Cursor<'_> {
        Cursor {
            seq: self,
            anchor: None,
        }
    }

    /// First live slot at or after `from`, compounding skips on the way.
    fn next_live(&self, from: usize) -> Option<usize> {
        let mut j = from;
        while j < self.slots.len() {
            let skip = self.skip_at(j);
            if skip == 0 {
                return Some(j);
            }
            j += skip as usize;
        }
        None
    }

    #[inline]
    fn value_at(&self, i: usize) -> Token {
        self.slots[i] & self.value_mask
    }

    #[inline]
    fn skip_at(&self, i: usize) -> u32 {
        self.slots[i] >> self.value_bits
    }

    #[inline]
    fn set_value(&mut self, i: usize, value: Token) {
        self.slots[i] = (self.slots[i] & !self.value_mask) | (value & self.value_mask);
    }

    #[inline]
    fn set_skip(&mut self, i: usize, skip: u32) {
        self.slots[i] = (self.slots[i] & self.value_mask) | (skip << self.value_bits);
    }
}

/// Forward cursor over the live slots of a [`SkipSeq`].
///
/// Before the first `advance` the cursor is in an initial state and
/// [`Cursor::replace_and_skip_next`] is forbidden; after an `advance` that
/// returned a value the cursor is anchored at that live slot.
#[derive(Debug)]
pub struct Cursor<'a> {
    seq: &'a mut SkipSeq,
    anchor: Option<usize>,
}

impl Cursor<'_> {
    /// Moves to the next live slot and returns its value, or `None` at the
    /// end of the sequence.
    pub fn advance(&mut self) -> Option<Token> {
        let start = match self.anchor {
            Some(i) => i + 1,
            None => 0,
        };
        let i = self.seq.next_live(start)?;
        self.anchor = Some(i);
        Some(self.seq.value_at(i))
    }

    /// Value at the next live slot past the cursor, without moving it.
    pub fn peek(&self) -> Option<Token> {
        let start = match self.anchor {
            Some(i) => i + 1,
            None => 0,
        };
        let i = self.seq.next_live(start)?;
        Some(self.seq.value_at(i))
    }

    /// Value at the live slot two steps past the cursor, without moving it.
    pub fn peek2(&self) -> Option<Token> {
        let start = match self.anchor {
            Some(i) => i + 1,
            None => 0,
        };
        let first = self.seq.next_live(start)?;
        let second = self.seq.next_live(first + 1)?;
        Some(self.seq.value_at(second))
    }

    /// Overwrites the anchored value with `value` and logically deletes the
    /// next live slot.
    ///
    /// This is the merge primitive: the anchored slot becomes the merged
    /// token and its right-hand partner is skipped over by all future
    /// walks. The cursor stays anchored at the rewritten slot. When no next
    /// live slot exists the call is a value overwrite and nothing else.
    ///
    /// Calling this before the first `advance` is a programming bug; it is
    /// caught by a debug assertion and ignored in release builds. A `value`
    /// wider than the value field is likewise a bug and is masked.
    pub fn replace_and_skip_next(&mut self, value: Token) {
        debug_assert!(value <= self.seq.value_mask, "replacement value too wide");

        let Some(i) = self.anchor else {
            debug_assert!(false, "replace_and_skip_next before first advance");
            return;
        };
        self.seq.set_value(i, value);

        let Some(n) = self.seq.next_live(i + 1) else {
            return;
        };

        // Kill n. Chaining onto n+1's skip keeps long dead runs cheap to
        // cross; capped at max_skip it stays a valid lower bound.
        let reach = if n + 1 < self.seq.slots.len() {
            1 + self.seq.skip_at(n + 1)
        } else {
            1
        };
        self.seq.set_skip(n, reach.min(self.seq.max_skip));
        self.seq.live -= 1;

        // The dead slot right after the anchor can now aim past n, so the
        // next advance from the anchor restarts with one longer hop.
        if n > i + 1 {
            let hop = ((n - i) as u32).min(self.seq.max_skip);
            self.seq.set_skip(i + 1, hop);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq_from(tokens: &[Token], skip_bits: u32) -> SkipSeq {
        match SkipSeq::from_tokens(tokens, skip_bits) {
            Ok(seq) => seq,
            Err(e) => panic!("construction failed: {e}"),
        }
    }

    /// Walks every slot and counts skip-field zeros directly.
    fn count_live_slots(seq: &SkipSeq) -> usize {
        (0..seq.storage_len()).filter(|&i| seq.skip_at(i) == 0).count()
    }

    #[test]
    fn test_basic_skip() {
        let mut seq = seq_from(&[10, 20, 30, 40, 50], 8);

        let mut cursor = seq.cursor();
        assert_eq!(cursor.advance(), Some(10));
        assert_eq!(cursor.advance(), Some(20));
        assert_eq!(cursor.advance(), Some(30));

        cursor.replace_and_skip_next(99);
        assert_eq!(cursor.advance(), Some(50));
        assert_eq!(cursor.advance(), None);

        assert_eq!(seq.tokens(), vec![10, 20, 99, 50]);
        assert_eq!(seq.live_len(), 4);
        assert_eq!(seq.storage_len(), 5);
    }

    #[test]
    fn test_overlapping_left_to_right_merges() {
        // Merge (10, 20) -> 50 at every left-to-right match.
        let mut seq = seq_from(&[10, 20, 10, 20, 50, 60, 70, 10, 20, 0, 0], 8);

        let mut cursor = seq.cursor();
        while let Some(current) = cursor.advance() {
            let Some(next) = cursor.peek() else { break };
            if current == 10 && next == 20 {
                cursor.replace_and_skip_next(50);
            }
        }

        assert_eq!(seq.tokens(), vec![50, 50, 50, 60, 70, 50, 0, 0]);
        assert_eq!(seq.live_len(), 8);
    }

    #[test]
    fn test_skip_bit_saturation() {
        // 2 skip bits cap the in-place skip distance at 3; correctness must
        // survive a dead run much longer than that.
        let tokens: Vec<Token> = (1..=31).collect();
        let mut seq = seq_from(&tokens, 2);

        for _ in 0..16 {
            let mut cursor = seq.cursor();
            for _ in 0..8 {
                assert!(cursor.advance().is_some());
            }
            let next = match cursor.peek() {
                Some(v) => v,
                None => panic!("expected a ninth live element"),
            };
            cursor.replace_and_skip_next(next);
        }

        let expected: Vec<Token> = vec![1, 2, 3, 4, 5, 6, 7, 24, 25, 26, 27, 28, 29, 30, 31];
        assert_eq!(seq.tokens(), expected);
        assert_eq!(seq.live_len(), 15);
    }

    #[test]
    fn test_live_count_matches_skip_zero_slots() {
        let mut seq = seq_from(&[5, 5, 5, 5, 5, 5], 8);
        assert_eq!(seq.live_len(), count_live_slots(&seq));

        let mut cursor = seq.cursor();
        assert_eq!(cursor.advance(), Some(5));
        cursor.replace_and_skip_next(9);
        assert_eq!(cursor.advance(), Some(5));
        cursor.replace_and_skip_next(9);

        assert_eq!(seq.live_len(), 4);
        assert_eq!(seq.live_len(), count_live_slots(&seq));
    }

    #[test]
    fn test_value_too_wide_rejected() {
        // 16 skip bits leave a 16-bit value field.
        let result = SkipSeq::from_tokens(&[1, 2, 0x1_0000], 16);
        match result {
            Err(SeqError::ValueTooWide { value, max }) => {
                assert_eq!(value, 0x1_0000);
                assert_eq!(max, 0xFFFF);
            }
            _ => panic!("expected ValueTooWide"),
        }
    }

    #[test]
    fn test_empty_input() {
        let mut seq = seq_from(&[], 8);
        assert!(seq.is_empty());
        assert_eq!(seq.tokens(), Vec::<Token>::new());
        assert_eq!(seq.cursor().advance(), None);
    }

    #[test]
    fn test_peek_before_first_advance() {
        let mut seq = seq_from(&[7, 8, 9], 8);
        let cursor = seq.cursor();
        // In the initial state the "next live position" is the first slot.
        assert_eq!(cursor.peek(), Some(7));
        assert_eq!(cursor.peek2(), Some(8));
    }

    #[test]
    fn test_peek_does_not_move_cursor() {
        let mut seq = seq_from(&[1, 2, 3], 8);
        let mut cursor = seq.cursor();
        assert_eq!(cursor.advance(), Some(1));
        assert_eq!(cursor.peek(), Some(2));
        assert_eq!(cursor.peek(), Some(2));
        assert_eq!(cursor.peek2(), Some(3));
        assert_eq!(cursor.advance(), Some(2));
    }

    #[test]
    fn test_peek2_past_end() {
        let mut seq = seq_from(&[1, 2], 8);
        let mut cursor = seq.cursor();
        assert_eq!(cursor.advance(), Some(1));
        assert_eq!(cursor.peek(), Some(2));
        assert_eq!(cursor.peek2(), None);
    }

    #[test]
    fn test_replace_at_last_live_is_value_overwrite_only() {
        let mut seq = seq_from(&[1, 2, 3], 8);
        let mut cursor = seq.cursor();
        assert_eq!(cursor.advance(), Some(1));
        assert_eq!(cursor.advance(), Some(2));
        assert_eq!(cursor.advance(), Some(3));
        cursor.replace_and_skip_next(42);

        assert_eq!(seq.live_len(), 3);
        assert_eq!(seq.tokens(), vec![1, 2, 42]);
    }

    #[test]
    fn test_walk_yields_subsequence_in_original_order() {
        let tokens: Vec<Token> = (0..64).collect();
        let mut seq = seq_from(&tokens, 4);

        // Three passes, each collapsing every adjacent pair onto its left
        // member: survivors double their stride each pass.
        for _ in 0..3 {
            let mut cursor = seq.cursor();
            while let Some(current) = cursor.advance() {
                if cursor.peek().is_some() {
                    cursor.replace_and_skip_next(current);
                }
            }
        }

        let expected: Vec<Token> = (0..64).step_by(8).collect();
        assert_eq!(seq.tokens(), expected);
        assert_eq!(seq.live_len(), 8);
        assert_eq!(seq.live_len(), count_live_slots(&seq));
    }

    #[test]
    fn test_dead_slot_never_revived() {
        let mut seq = seq_from(&[1, 2, 3, 4], 8);
        let mut cursor = seq.cursor();
        assert_eq!(cursor.advance(), Some(1));
        cursor.replace_and_skip_next(9);
        assert_ne!(seq.skip_at(1), 0);

        // Further traffic over the dead region must leave it dead.
        let mut cursor = seq.cursor();
        while cursor.advance().is_some() {}
        assert_ne!(seq.skip_at(1), 0);
        assert_eq!(seq.tokens(), vec![9, 3, 4]);
    }
}
