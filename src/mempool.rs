//! Memory pool and transaction admission

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;

use crate::types::{BlockHeaderHash, TxAux, TxId, TxIn, TxOutAux};
use crate::verify::verify_tx;
use crate::witness::WitnessCheck;
use crate::TxpLocalData;

/// MemPool: admitted but not-yet-confirmed transactions.
///
/// Insertion order is significant: normalization falls back to it as the
/// tie-breaker after topological sorting, and block assembly reads the
/// pool front to back.
#[derive(Debug, Default)]
pub struct MemPool {
    txs: IndexMap<TxId, TxAux>,
}

impl MemPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: TxId, aux: TxAux) {
        self.txs.insert(id, aux);
    }

    pub fn contains(&self, id: &TxId) -> bool {
        self.txs.contains_key(id)
    }

    /// Remove a transaction, preserving the relative order of the rest.
    pub fn remove(&mut self, id: &TxId) -> Option<TxAux> {
        self.txs.shift_remove(id)
    }

    pub fn get(&self, id: &TxId) -> Option<&TxAux> {
        self.txs.get(id)
    }

    pub fn len(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&TxId, &TxAux)> {
        self.txs.iter()
    }

    /// Consume the pool, yielding entries in insertion order.
    pub fn into_entries(self) -> Vec<(TxId, TxAux)> {
        self.txs.into_iter().collect()
    }
}

/// Outcome of submitting one transaction for admission.
///
/// Always returned, never raised: every admission path maps to exactly one
/// of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessTxResult {
    /// Admitted into the mempool and applied to the local view.
    Added,
    /// Already present; state unchanged.
    Known,
    /// Mempool is at capacity; state unchanged.
    Overwhelmed,
    /// Failed the tip guard or verification; state unchanged.
    Invalid(String),
}

/// The atomic section of `processTx`.
///
/// The caller holds the local-state lock, has snapshotted `tip_before`
/// from the store and pre-resolved the transaction's inputs into
/// `resolved` — both outside the lock, so admission never touches the
/// store while holding it. A tip moved between snapshot and lock
/// acquisition shows up as a mismatch against the state-embedded tip and
/// aborts the admission.
pub(crate) fn try_admit(
    ld: &mut TxpLocalData,
    witness_check: &dyn WitnessCheck,
    max_local_txs: usize,
    tip_before: BlockHeaderHash,
    resolved: &HashMap<TxIn, TxOutAux>,
    id: TxId,
    aux: TxAux,
) -> ProcessTxResult {
    if ld.tip != tip_before {
        return ProcessTxResult::Invalid("Tips aren't same".to_string());
    }
    if ld.mempool.len() >= max_local_txs {
        return ProcessTxResult::Overwhelmed;
    }
    if ld.mempool.contains(&id) {
        return ProcessTxResult::Known;
    }

    let verified = {
        let view = &ld.view;
        // Deletions shadow everything; pending additions win over the
        // pre-resolved store values.
        let resolver = |input: &TxIn| {
            if view.is_deleted(input) {
                return None;
            }
            view.added(input)
                .cloned()
                .or_else(|| resolved.get(input).cloned())
        };
        verify_tx(true, witness_check, resolver, &id, &aux)
    };

    match verified {
        Err(e) => ProcessTxResult::Invalid(e.to_string()),
        Ok(undo) => {
            ld.view.apply_tx(id, &aux.tx, &aux.distribution);
            ld.mempool.insert(id, aux);
            ld.undos.insert(id, undo);
            debug!(mempool_len = ld.mempool.len(), "transaction admitted");
            ProcessTxResult::Added
        }
    }
}
