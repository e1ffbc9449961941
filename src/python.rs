//! PyO3 bindings exposing the BPE trainer to Python.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::TrainerConfig;
use crate::error::TrainError;
use crate::trainer::BPETrainer;
use crate::types::Token;

/// Converts a `TrainError` into a Python `ValueError`.
fn train_err_to_pyerr(e: TrainError) -> PyErr {
    PyErr::new::<PyValueError, _>(e.to_string())
}

/// Python wrapper for the BPE trainer.
///
/// # Example (Python)
///
/// ```python
/// from skiptok import RustBPETrainer
///
/// data = open("corpus.bin", "rb").read()
/// trainer = RustBPETrainer(list(data), target_vocab_size=512)
///
/// trainer.train()
///
/// merges = trainer.get_merge_history()
/// tokens = trainer.get_tokens()
/// ```
#[pyclass]
pub struct RustBPETrainer {
    trainer: BPETrainer,
}

#[pymethods]
impl RustBPETrainer {
    /// Creates a new BPE trainer from an initial token sequence.
    ///
    /// Args:
    ///     tokens: Initial sequence of tokens (e.g., byte values 0-255).
    ///     target_vocab_size: Total vocabulary size to stop at, initial
    ///                        alphabet included (default: 512).
    ///     first_emit_id: The token ID assigned to the first merge; must
    ///                    exceed every input token ID (default: 256).
    ///     skip_bits: Width of the per-slot skip field, 1-16 (default: 8).
    ///
    /// Returns:
    ///     A new RustBPETrainer instance.
    ///
    /// Raises:
    ///     ValueError: If the configuration is out of range or an input
    ///                 token does not fit the configured value width.
    #[new]
    #[pyo3(signature = (tokens, target_vocab_size = 512, first_emit_id = 256, skip_bits = 8))]
    fn new(
        tokens: Vec<Token>,
        target_vocab_size: Token,
        first_emit_id: Token,
        skip_bits: u32,
    ) -> PyResult<Self> {
        let config = TrainerConfig {
            skip_bits,
            target_vocab_size,
            first_emit_id,
        };
        let trainer = BPETrainer::new(&tokens, &config).map_err(train_err_to_pyerr)?;
        Ok(Self { trainer })
    }

    /// Trains until the target vocabulary size is reached or no pair is
    /// left to merge.
    ///
    /// Returns:
    ///     The number of merges performed.
    ///
    /// Note:
    ///     The Python GIL is released while the Rust training loop runs.
    fn train(&mut self, py: Python<'_>) -> usize {
        let trainer = &mut self.trainer;
        // allow rust code to run without the GIL
        py.detach(move || trainer.train())
    }

    /// Performs a single merge on the most frequent token pair.
    ///
    /// Returns:
    ///     The merge as ((left_token, right_token), merged_token), or
    ///     None if no merge is possible.
    ///
    /// Raises:
    ///     ValueError: If the trainer's internal state was corrupted.
    fn merge_step(&mut self, py: Python<'_>) -> PyResult<Option<((Token, Token), Token)>> {
        let trainer = &mut self.trainer;
        py.detach(move || trainer.merge_step())
            .map_err(train_err_to_pyerr)
    }

    /// Returns the current token sequence after all merges.
    fn get_tokens(&self) -> Vec<Token> {
        self.trainer.encodings()
    }

    /// Returns the complete history of merge operations.
    ///
    /// Returns:
    ///     A list of tuples ((left_token, right_token), merged_token) in
    ///     the order the merges were learned.
    fn get_merge_history(&self) -> Vec<((Token, Token), Token)> {
        self.trainer.merge_history().to_vec()
    }

    /// Returns the token ID the next merge would emit.
    fn next_token_id(&self) -> Token {
        self.trainer.next_id()
    }
}

/// PyO3 module definition.
///
/// The function name must match the library name specified in Cargo.toml.
#[pymodule]
fn skiptok(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<RustBPETrainer>()?;
    Ok(())
}
