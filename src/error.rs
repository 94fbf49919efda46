//! Error types for transaction processing

use thiserror::Error;

use crate::types::{Coin, SlotId};

/// Reasons a transaction fails verification against a UTXO resolver.
///
/// These are ordinary outcomes, not process faults: admission surfaces them
/// as `ProcessTxResult::Invalid` and block verification wraps them with the
/// offending slot. Contract violations (malformed alternate chains, undo
/// length mismatches) are fatal and panic instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxValidationError {
    #[error("Transaction has no inputs")]
    NoInputs,

    #[error("Transaction has no outputs")]
    NoOutputs,

    #[error("Too many inputs: {0}")]
    TooManyInputs(usize),

    #[error("Too many outputs: {0}")]
    TooManyOutputs(usize),

    #[error("Output {index} value {value} exceeds maximum money")]
    OutputTooLarge { index: usize, value: Coin },

    #[error("Witness count {witnesses} does not match input count {inputs}")]
    WitnessArityMismatch { witnesses: usize, inputs: usize },

    #[error("Distribution count {distributions} does not match output count {outputs}")]
    DistributionArityMismatch { distributions: usize, outputs: usize },

    #[error("Input {index} not found in UTXO view")]
    InputNotFound { index: usize },

    #[error("Coin sum overflows")]
    CoinOverflow,

    #[error("Input sum {input_sum} is less than output sum {output_sum}")]
    InsufficientInputs { input_sum: Coin, output_sum: Coin },

    #[error("Witness for input {index} rejected: {reason}")]
    WitnessRejected { index: usize, reason: String },
}

/// Verification failure for a block inside an alternate chain, decorated
/// with the slot of the offending block.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[Block's slot = {slot}] {source}")]
pub struct BlockVerifyError {
    pub slot: SlotId,
    #[source]
    pub source: TxValidationError,
}

pub type Result<T, E = TxValidationError> = std::result::Result<T, E>;
