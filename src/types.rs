//! Type aliases and shared value types for BPE training.
//!
//! These provide semantic clarity and type safety throughout the codebase.

/// Represents a token identifier in the vocabulary.
///
/// Token IDs are assigned sequentially, starting from 0 for base tokens
/// (e.g., bytes 0-255) and incrementing for each learned merge operation.
/// IDs must fit in the value field of a sequence slot, i.e. in
/// `32 - skip_bits` bits (24 bits with the default 8-bit skip field).
pub type Token = u32;

/// Frequency count for token pairs during training.
///
/// Tracks how many times a token pair appears in the current sequence.
pub type TokenFreq = usize;

/// An ordered pair of adjacent tokens in the training sequence.
///
/// Used as a key for tracking pair frequencies during training.
/// Equality is componentwise; `(a, b)` and `(b, a)` are distinct pairs.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub struct TokenPair(pub Token, pub Token);
