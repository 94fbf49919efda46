//! Core domain types for UTXO transaction processing

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hash type: 256-bit hash
pub type Hash = [u8; 32];

/// Transaction id: content hash of the transaction body
pub type TxId = Hash;

/// Hash of a block header
pub type BlockHeaderHash = Hash;

/// Destination of an output: hash of the key authorized to spend it
pub type Address = Hash;

/// Identity of a stakeholder receiving stake from an output
pub type StakeholderId = Hash;

/// Coin amount in the smallest denomination
pub type Coin = u64;

/// TxIn: 𝒯ℐ = ℍ × ℕ
///
/// References the `index`-th output of the transaction with id `tx_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxIn {
    pub tx_id: TxId,
    pub index: u32,
}

impl TxIn {
    pub fn new(tx_id: TxId, index: u32) -> Self {
        Self { tx_id, index }
    }
}

/// TxOut: 𝒯𝒪 = ℂ × 𝔸
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub value: Coin,
    pub address: Address,
}

/// Stake distribution of a single output: (stakeholder, portion) pairs
pub type TxOutDistribution = Vec<(StakeholderId, Coin)>;

/// TxOutAux: an output together with its stake distribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutAux {
    pub output: TxOut,
    pub distribution: TxOutDistribution,
}

/// Transaction: 𝒯𝒳 = 𝒯ℐ* × 𝒯𝒪*
///
/// The `i`-th output of a transaction with id `t` is referenced by
/// `TxIn { tx_id: t, index: i }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
}

impl Tx {
    /// Content hash of the transaction body.
    ///
    /// Inputs and outputs are folded into a single SHA-256 digest with
    /// length prefixes, so distinct bodies cannot collide structurally.
    pub fn id(&self) -> TxId {
        let mut hasher = Sha256::new();
        hasher.update((self.inputs.len() as u32).to_le_bytes());
        for input in &self.inputs {
            hasher.update(input.tx_id);
            hasher.update(input.index.to_le_bytes());
        }
        hasher.update((self.outputs.len() as u32).to_le_bytes());
        for output in &self.outputs {
            hasher.update(output.value.to_le_bytes());
            hasher.update(output.address);
        }
        hasher.finalize().into()
    }
}

/// Witness authorizing a single input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputWitness {
    pub key: Vec<u8>,
    pub signature: Vec<u8>,
}

/// TxWitness: one witness per input, in input order
pub type TxWitness = Vec<InputWitness>;

/// TxDistribution: one stake distribution per output, in output order
pub type TxDistribution = Vec<TxOutDistribution>;

/// TxAux ≡ 𝒯𝒳 × 𝒲 × 𝒟
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxAux {
    pub tx: Tx,
    pub witness: TxWitness,
    pub distribution: TxDistribution,
}

impl TxAux {
    /// Content hash of the enclosed transaction body.
    pub fn id(&self) -> TxId {
        self.tx.id()
    }
}

/// Undo for one transaction: the resolved outputs consumed by its inputs,
/// in input order. Length always equals the number of inputs.
pub type TxUndo = Vec<TxOutAux>;

/// Undo for one block: per-transaction undos in block order.
pub type BlockUndo = Vec<TxUndo>;

/// Slot identifier: epoch number and slot within the epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotId {
    pub epoch: u64,
    pub slot: u16,
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.epoch, self.slot)
    }
}

/// Block as consumed by the transaction processing core.
///
/// Blocks arrive pre-structured with their header hashes already computed
/// and validated upstream. Boundary (epoch-delimiting) blocks carry no
/// transactions and are skipped by payload verification, but still move
/// the tip when applied or rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub prev_hash: BlockHeaderHash,
    pub header_hash: BlockHeaderHash,
    pub slot: SlotId,
    pub is_boundary: bool,
    pub txs: Vec<TxAux>,
}
