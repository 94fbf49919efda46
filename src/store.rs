//! UTXO store interface and in-memory implementation

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::types::{BlockHeaderHash, TxIn, TxOutAux};

/// One mutation inside an atomic store batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    PutTip(BlockHeaderHash),
    AddTxOut(TxIn, TxOutAux),
    DelTxIn(TxIn),
}

/// Durable mapping `TxIn → TxOutAux` plus the chain tip.
///
/// `write_batch` must be atomic: a reader observes either none or all of a
/// batch's operations. Within one batch, deletions and additions never
/// target the same key, so application order is immaterial.
///
/// Reads may block on I/O; implementations provide their own internal
/// synchronization for concurrent point reads and batched writes.
pub trait UtxoStore: Send + Sync {
    /// Look up an unspent output. Returns `None` if spent or unknown.
    fn get(&self, input: &TxIn) -> Option<TxOutAux>;

    /// Hash of the most recently committed block header.
    fn tip(&self) -> BlockHeaderHash;

    /// Apply a batch of mutations atomically.
    fn write_batch(&self, ops: Vec<BatchOp>);
}

struct StoreInner {
    utxos: HashMap<TxIn, TxOutAux>,
    tip: BlockHeaderHash,
}

/// In-memory `UtxoStore` with no persistence.
///
/// Suitable for tests and embedders that keep the UTXO set resident;
/// production deployments back the trait with a persistent key-value store.
pub struct MemoryUtxoStore {
    inner: RwLock<StoreInner>,
}

impl MemoryUtxoStore {
    /// Create an empty store at the given tip.
    pub fn new(tip: BlockHeaderHash) -> Self {
        Self::with_utxos(tip, [])
    }

    /// Create a store pre-populated with unspent outputs.
    pub fn with_utxos(
        tip: BlockHeaderHash,
        utxos: impl IntoIterator<Item = (TxIn, TxOutAux)>,
    ) -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                utxos: utxos.into_iter().collect(),
                tip,
            }),
        }
    }

    /// Number of unspent outputs currently stored.
    pub fn utxo_count(&self) -> usize {
        self.inner.read().utxos.len()
    }

    /// Full copy of the store contents, for state comparison in tests.
    pub fn snapshot(&self) -> (BlockHeaderHash, HashMap<TxIn, TxOutAux>) {
        let inner = self.inner.read();
        (inner.tip, inner.utxos.clone())
    }
}

impl UtxoStore for MemoryUtxoStore {
    fn get(&self, input: &TxIn) -> Option<TxOutAux> {
        self.inner.read().utxos.get(input).cloned()
    }

    fn tip(&self) -> BlockHeaderHash {
        self.inner.read().tip
    }

    fn write_batch(&self, ops: Vec<BatchOp>) {
        // One write lock for the whole batch gives all-or-nothing visibility.
        let mut inner = self.inner.write();
        for op in ops {
            match op {
                BatchOp::PutTip(tip) => inner.tip = tip,
                BatchOp::AddTxOut(input, output) => {
                    inner.utxos.insert(input, output);
                }
                BatchOp::DelTxIn(input) => {
                    inner.utxos.remove(&input);
                }
            }
        }
    }
}
