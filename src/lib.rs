//! Fast BPE vocabulary training on a bit-packed skipping sequence.
//!
//! Training repeatedly replaces the most frequent adjacent token pair with
//! a fresh token id until the vocabulary reaches a target size. Two data
//! structures keep each step cheap on long inputs:
//!
//! - [`SkipSeq`]: the token sequence as flat `u32` slots, with a forward
//!   skip distance packed into the high bits so merges delete in place
//!   instead of shifting the tail.
//! - [`PairHeap`]: an indexed max-heap over pair frequencies, so the
//!   counts disturbed around each merge site are adjusted in place rather
//!   than rescanned.
//!
//! [`BPETrainer`] ties the two together. The caller supplies an owned
//! sequence of initial token ids (for byte-level training, one id per
//! byte) and receives the learned merges in emission order:
//!
//! ```
//! use skiptok::{BPETrainer, TrainerConfig};
//!
//! let input = vec![97, 98, 99, 98, 99, 100, 101];
//! let config = TrainerConfig::default().with_target_vocab_size(258);
//! let mut trainer = BPETrainer::new(&input, &config)?;
//!
//! trainer.train();
//! assert_eq!(trainer.merge_history(), &[((98, 99), 256), ((256, 256), 257)]);
//! assert_eq!(trainer.encodings(), vec![97, 257, 100, 101]);
//! # Ok::<(), skiptok::TrainError>(())
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(unused_must_use)]

mod config;
mod error;
mod pairheap;
mod skipseq;
mod trainer;
mod types;

#[cfg(feature = "python")]
mod python;

pub use config::TrainerConfig;
pub use error::{HeapError, SeqError, TrainError};
pub use pairheap::{PairEntry, PairHeap};
pub use skipseq::{Cursor, SkipSeq};
pub use trainer::{BPETrainer, Merge};
pub use types::{Token, TokenFreq, TokenPair};

#[cfg(feature = "python")]
pub use python::RustBPETrainer;
