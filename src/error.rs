use std::collections::TryReserveError;
use std::fmt;

use crate::types::{Token, TokenPair};

/// Errors that can occur when building a skipping sequence.
#[derive(Debug)]
pub enum SeqError {
    /// An input token does not fit in the slot's value field.
    ValueTooWide {
        /// The offending token id.
        value: Token,
        /// Largest id the configured value field can hold.
        max: Token,
    },
    /// Slot storage allocation failed.
    OutOfMemory,
}

impl fmt::Display for SeqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValueTooWide { value, max } => {
                write!(f, "token id {value} exceeds the value field maximum {max}")
            }
            Self::OutOfMemory => write!(f, "sequence storage allocation failed"),
        }
    }
}

impl std::error::Error for SeqError {}

impl From<TryReserveError> for SeqError {
    fn from(_: TryReserveError) -> Self {
        Self::OutOfMemory
    }
}

/// Errors that can occur on pair heap operations.
#[derive(Debug)]
pub enum HeapError {
    /// Insert of a pair that is already indexed.
    AlreadyPresent(TokenPair),
    /// Update of a pair that is not indexed.
    Missing(TokenPair),
    /// Pop from an empty heap.
    Empty,
    /// Entry storage allocation failed.
    OutOfMemory,
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyPresent(p) => {
                write!(f, "pair ({}, {}) is already present in the heap", p.0, p.1)
            }
            Self::Missing(p) => write!(f, "pair ({}, {}) is not present in the heap", p.0, p.1),
            Self::Empty => write!(f, "pop from an empty heap"),
            Self::OutOfMemory => write!(f, "heap storage allocation failed"),
        }
    }
}

impl std::error::Error for HeapError {}

impl From<TryReserveError> for HeapError {
    fn from(_: TryReserveError) -> Self {
        Self::OutOfMemory
    }
}

/// Errors that can occur when constructing or running a trainer.
#[derive(Debug)]
pub enum TrainError {
    /// A configuration value is out of range or inconsistent with the input.
    InvalidConfig(String),
    /// The skipping sequence could not be built.
    Seq(SeqError),
    /// A pair heap operation failed.
    Heap(HeapError),
}

impl fmt::Display for TrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Seq(e) => write!(f, "sequence error: {e}"),
            Self::Heap(e) => write!(f, "heap error: {e}"),
        }
    }
}

impl std::error::Error for TrainError {}

impl From<SeqError> for TrainError {
    fn from(e: SeqError) -> Self {
        Self::Seq(e)
    }
}

impl From<HeapError> for TrainError {
    fn from(e: HeapError) -> Self {
        Self::Heap(e)
    }
}
