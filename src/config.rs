//! Training configuration.

use crate::error::TrainError;
use crate::types::Token;

/// Configuration for a BPE training run.
///
/// Use [`TrainerConfig::default`] for the byte-alphabet defaults and the
/// `with_*` helpers to adjust individual knobs.
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    /// Width of the per-slot skip field in bits, `1..=16`.
    ///
    /// Caps the largest in-place skip distance at `2^skip_bits - 1` and
    /// leaves `32 - skip_bits` bits for token ids.
    pub skip_bits: u32,

    /// Training stops once this many distinct token ids exist in total,
    /// including the initial alphabet.
    pub target_vocab_size: Token,

    /// The first token id issued for a merge.
    ///
    /// Must exceed every token id in the training input.
    pub first_emit_id: Token,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            skip_bits: 8,
            target_vocab_size: 512,
            first_emit_id: 256,
        }
    }
}

impl TrainerConfig {
    /// Sets the target vocabulary size.
    pub fn with_target_vocab_size(self, target_vocab_size: Token) -> Self {
        Self {
            target_vocab_size,
            ..self
        }
    }

    /// Sets the skip field width in bits.
    pub fn with_skip_bits(self, skip_bits: u32) -> Self {
        Self { skip_bits, ..self }
    }

    /// Sets the first token id issued for a merge.
    pub fn with_first_emit_id(self, first_emit_id: Token) -> Self {
        Self {
            first_emit_id,
            ..self
        }
    }

    /// Width of the slot value field in bits, derived from `skip_bits`.
    ///
    /// Bounds the largest token id the sequence can represent.
    pub fn value_bits(&self) -> u32 {
        Token::BITS - self.skip_bits
    }

    /// Checks that the configuration is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns `TrainError::InvalidConfig` if `skip_bits` is outside
    /// `1..=16` or the target vocabulary does not fit in the value field.
    pub fn validate(&self) -> Result<(), TrainError> {
        if !(1..=16).contains(&self.skip_bits) {
            return Err(TrainError::InvalidConfig(format!(
                "skip_bits must be in 1..=16, got {}",
                self.skip_bits
            )));
        }

        // Every id in [0, target_vocab_size) must fit in the value field.
        let id_space = 1u64 << self.value_bits();
        if u64::from(self.target_vocab_size) > id_space {
            return Err(TrainError::InvalidConfig(format!(
                "target vocab size {} exceeds the {}-bit id space",
                self.target_vocab_size,
                self.value_bits()
            )));
        }
        if u64::from(self.first_emit_id) >= id_space {
            return Err(TrainError::InvalidConfig(format!(
                "first_emit_id {} exceeds the {}-bit id space",
                self.first_emit_id,
                self.value_bits()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TrainerConfig::default();
        assert_eq!(config.skip_bits, 8);
        assert_eq!(config.target_vocab_size, 512);
        assert_eq!(config.first_emit_id, 256);
        assert_eq!(config.value_bits(), 24);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_skip_bits_out_of_range() {
        let config = TrainerConfig::default().with_skip_bits(0);
        assert!(config.validate().is_err());

        let config = TrainerConfig::default().with_skip_bits(17);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_target_vocab_must_fit_value_field() {
        // 16 skip bits leave 16 value bits: 65536 ids fit, 65537 do not.
        let config = TrainerConfig::default()
            .with_skip_bits(16)
            .with_target_vocab_size(65_536);
        assert!(config.validate().is_ok());

        let config = config.with_target_vocab_size(65_537);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_first_emit_id_must_fit_value_field() {
        let config = TrainerConfig::default()
            .with_skip_bits(16)
            .with_target_vocab_size(1024)
            .with_first_emit_id(70_000);
        assert!(config.validate().is_err());
    }
}
