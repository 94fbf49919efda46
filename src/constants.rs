//! Protocol constants for transaction processing

use crate::types::Coin;

/// Maximum money supply, in the smallest denomination
pub const MAX_MONEY: Coin = 45_000_000_000_000_000;

/// Maximum number of inputs per transaction
pub const MAX_INPUTS: usize = 1000;

/// Maximum number of outputs per transaction
pub const MAX_OUTPUTS: usize = 1000;

/// Default mempool capacity, overridable through `TxpConfig`
pub const DEFAULT_MAX_LOCAL_TXS: usize = 10_000;
