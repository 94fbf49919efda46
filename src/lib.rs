//! # txp-core
//!
//! Transaction processing core for a UTXO-based blockchain node.
//!
//! The crate maintains the authoritative set of unspent transaction
//! outputs behind the [`UtxoStore`] interface, ingests loose transactions
//! into a memory pool, and applies or rolls back blocks atomically while
//! keeping the mempool consistent with the chain tip.
//!
//! ## Architecture
//!
//! The system is layered around a two-tier picture of the UTXO set:
//! - [`UtxoStore`] — the durable mapping `TxIn → TxOutAux` plus the tip,
//!   mutated only through atomic batches
//! - [`UtxoView`] — an in-memory overlay (pending additions and deletions)
//!   so verification never touches the store for intermediate states
//! - [`MemPool`] — admitted but unconfirmed transactions in insertion order
//! - [`TxProcessor`] — the single owner of the composite local state
//!   `(view, mempool, undos, tip)`, which is the unit of atomic change
//!
//! Admission ([`TxProcessor::process_tx`]) may run concurrently from many
//! submission paths; block application and rollback run on the consensus
//! thread. All of them serialize on the local-state lock, and admission
//! carries a tip-match guard so a concurrently committed block can never
//! silently corrupt the mempool.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use txp_core::{
//!     InputWitness, MemoryUtxoStore, NullWitnessCheck, ProcessTxResult, Tx, TxAux, TxIn,
//!     TxOut, TxOutAux, TxProcessor, TxpConfig,
//! };
//!
//! // A store holding one spendable output at tip H0.
//! let funding = TxIn::new([1; 32], 0);
//! let coin = TxOutAux {
//!     output: TxOut { value: 100, address: [2; 32] },
//!     distribution: vec![],
//! };
//! let store = Arc::new(MemoryUtxoStore::with_utxos([0; 32], [(funding, coin)]));
//! let processor = TxProcessor::new(store, Arc::new(NullWitnessCheck), TxpConfig::default());
//!
//! // Submit a transaction spending it.
//! let aux = TxAux {
//!     tx: Tx {
//!         inputs: vec![funding],
//!         outputs: vec![TxOut { value: 100, address: [3; 32] }],
//!     },
//!     witness: vec![InputWitness { key: vec![], signature: vec![] }],
//!     distribution: vec![vec![]],
//! };
//! assert_eq!(processor.process_tx(aux.id(), aux), ProcessTxResult::Added);
//! assert_eq!(processor.mempool_len(), 1);
//! ```

pub mod apply;
pub mod constants;
pub mod error;
pub mod mempool;
pub mod normalize;
pub mod rollback;
pub mod store;
pub mod types;
pub mod verify;
pub mod view;
pub mod witness;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

pub use constants::*;
pub use error::{BlockVerifyError, Result, TxValidationError};
pub use mempool::{MemPool, ProcessTxResult};
pub use normalize::topsort_txs;
pub use store::{BatchOp, MemoryUtxoStore, UtxoStore};
pub use types::*;
pub use verify::{verify_and_apply_txs, verify_tx};
pub use view::UtxoView;
pub use witness::{address_of_key, NullWitnessCheck, PkWitnessCheck, WitnessCheck};

/// Configuration for the transaction processor.
#[derive(Debug, Clone)]
pub struct TxpConfig {
    /// Mempool capacity: admissions beyond this return `Overwhelmed`.
    pub max_local_txs: usize,
    /// Re-verify every chain handed to `apply_blocks` and treat a failure
    /// as fatal. Catches contract violations by the caller at the cost of
    /// verifying twice.
    pub assert_valid_blocks: bool,
}

impl Default for TxpConfig {
    fn default() -> Self {
        Self {
            max_local_txs: DEFAULT_MAX_LOCAL_TXS,
            assert_valid_blocks: false,
        }
    }
}

/// The composite local transaction-processing state: UTXO view, mempool,
/// per-transaction undos, and the tip the state was last normalized
/// against. Replaced atomically by admission, block application and
/// normalization.
///
/// Invariants:
/// - the undo map and the mempool hold exactly the same transaction ids,
///   and each undo has one entry per input of its transaction
/// - every mempool transaction verified against the view at admission time
/// - `tip` equals the store's committed tip at the moment the state was
///   last set or normalized
pub struct TxpLocalData {
    pub(crate) view: UtxoView,
    pub(crate) mempool: MemPool,
    pub(crate) undos: HashMap<TxId, TxUndo>,
    pub(crate) tip: BlockHeaderHash,
}

impl TxpLocalData {
    /// Empty state (fresh view, empty mempool) over `base` at `tip`.
    pub fn empty(base: Arc<dyn UtxoStore>, tip: BlockHeaderHash) -> Self {
        Self {
            view: UtxoView::new(base),
            mempool: MemPool::new(),
            undos: HashMap::new(),
            tip,
        }
    }

    pub fn view(&self) -> &UtxoView {
        &self.view
    }

    pub fn mempool(&self) -> &MemPool {
        &self.mempool
    }

    pub fn undo(&self, id: &TxId) -> Option<&TxUndo> {
        self.undos.get(id)
    }

    pub fn undo_count(&self) -> usize {
        self.undos.len()
    }

    pub fn tip(&self) -> BlockHeaderHash {
        self.tip
    }
}

/// Process-wide owner of the transaction-processing state.
///
/// Holds the store handle, the witness-verification seam and the
/// mutex-guarded [`TxpLocalData`]. Admission never writes to the store;
/// block operations own the store's write path and hold the state lock
/// across the batch commit and the subsequent normalization, so the two
/// sides can never observe each other half-done.
pub struct TxProcessor {
    store: Arc<dyn UtxoStore>,
    witness_check: Arc<dyn WitnessCheck>,
    config: TxpConfig,
    state: Mutex<TxpLocalData>,
}

impl TxProcessor {
    /// Create a processor over `store` with an empty mempool at the
    /// store's current tip.
    pub fn new(
        store: Arc<dyn UtxoStore>,
        witness_check: Arc<dyn WitnessCheck>,
        config: TxpConfig,
    ) -> Self {
        let tip = store.tip();
        let state = Mutex::new(TxpLocalData::empty(store.clone(), tip));
        Self {
            store,
            witness_check,
            config,
            state,
        }
    }

    /// ProcessTx: 𝒯𝒳 → {Added, Known, Overwhelmed, Invalid}
    ///
    /// Atomically admits one transaction if the tip hasn't moved and
    /// capacity allows. The store is read (tip snapshot, input
    /// pre-resolution) before the lock is taken; the tip-match guard
    /// inside the critical section rejects admissions that raced a block
    /// commit with `Invalid("Tips aren't same")`.
    pub fn process_tx(&self, id: TxId, aux: TxAux) -> ProcessTxResult {
        let tip_before = self.store.tip();
        let mut resolved = HashMap::new();
        for input in &aux.tx.inputs {
            if let Some(output) = self.store.get(input) {
                resolved.insert(*input, output);
            }
        }

        let mut ld = self.state.lock();
        let res = mempool::try_admit(
            &mut ld,
            self.witness_check.as_ref(),
            self.config.max_local_txs,
            tip_before,
            &resolved,
            id,
            aux,
        );
        if let ProcessTxResult::Invalid(reason) = &res {
            debug!(%reason, "transaction rejected");
        }
        res
    }

    /// TxVerifyBlocks: verify an alternate chain against the current
    /// store without committing anything. Returns one undo per
    /// non-boundary block, oldest first.
    pub fn verify_blocks(&self, chain: &[Block]) -> Result<Vec<BlockUndo>, BlockVerifyError> {
        apply::verify_blocks(self.store.clone(), self.witness_check.as_ref(), chain)
    }

    /// TxApplyBlocks: commit a definitely-valid alternate chain, oldest
    /// first, then normalize the mempool against the new tip.
    ///
    /// # Panics
    ///
    /// If the chain is empty, not based on the current tip, or (with
    /// `assert_valid_blocks`) fails re-verification. These are
    /// caller-contract violations and fail-stop.
    pub fn apply_blocks(&self, chain: &[Block]) {
        let mut ld = self.state.lock();
        apply::apply_blocks(
            &self.store,
            &mut ld,
            self.witness_check.as_ref(),
            chain,
            self.config.assert_valid_blocks,
        );
    }

    /// TxRollbackBlocks: reverse committed blocks, youngest first, using
    /// their undos. The mempool is left untouched; call
    /// [`normalize`](Self::normalize) once the rollback sequence (and any
    /// subsequent re-application) is complete.
    ///
    /// # Panics
    ///
    /// If `blunds` is empty, a block is not the tip when reversed, or an
    /// undo does not line up with its block.
    pub fn rollback_blocks(&self, blunds: &[(Block, BlockUndo)]) {
        let _ld = self.state.lock();
        rollback::rollback_blocks(&self.store, blunds);
    }

    /// Re-normalize the mempool against the store's current tip: drop
    /// transactions no longer valid, re-root the view, refresh the
    /// embedded tip.
    pub fn normalize(&self) {
        let mut ld = self.state.lock();
        normalize::normalize(&self.store, &mut ld, self.witness_check.as_ref());
    }

    /// Tip the local state was last normalized against.
    pub fn tip(&self) -> BlockHeaderHash {
        self.state.lock().tip
    }

    /// Number of transactions currently in the mempool.
    pub fn mempool_len(&self) -> usize {
        self.state.lock().mempool.len()
    }

    /// Snapshot of the mempool in insertion order — the payload a block
    /// producer would draw from.
    pub fn local_txs(&self) -> Vec<(TxId, TxAux)> {
        self.state
            .lock()
            .mempool
            .iter()
            .map(|(id, aux)| (*id, aux.clone()))
            .collect()
    }

    /// Run `f` against the locked local state. Diagnostics and tests.
    pub fn with_state<R>(&self, f: impl FnOnce(&TxpLocalData) -> R) -> R {
        f(&self.state.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn out_aux(value: Coin, address: Address) -> TxOutAux {
        TxOutAux {
            output: TxOut { value, address },
            distribution: vec![],
        }
    }

    fn spend(input: TxIn, value: Coin) -> TxAux {
        TxAux {
            tx: Tx {
                inputs: vec![input],
                outputs: vec![TxOut {
                    value,
                    address: [7; 32],
                }],
            },
            witness: vec![InputWitness {
                key: vec![],
                signature: vec![],
            }],
            distribution: vec![vec![]],
        }
    }

    fn processor_with_funding(
        tip: BlockHeaderHash,
        utxos: Vec<(TxIn, TxOutAux)>,
    ) -> (Arc<MemoryUtxoStore>, TxProcessor) {
        let store = Arc::new(MemoryUtxoStore::with_utxos(tip, utxos));
        let processor = TxProcessor::new(
            store.clone(),
            Arc::new(NullWitnessCheck),
            TxpConfig::default(),
        );
        (store, processor)
    }

    #[test]
    fn test_process_tx_added_then_known() {
        let funding = TxIn::new([1; 32], 0);
        let (_, processor) = processor_with_funding([0; 32], vec![(funding, out_aux(100, [2; 32]))]);

        let aux = spend(funding, 100);
        let id = aux.id();
        assert_eq!(processor.process_tx(id, aux.clone()), ProcessTxResult::Added);
        assert_eq!(processor.process_tx(id, aux), ProcessTxResult::Known);
        assert_eq!(processor.mempool_len(), 1);
    }

    #[test]
    fn test_process_tx_store_untouched() {
        let funding = TxIn::new([1; 32], 0);
        let (store, processor) =
            processor_with_funding([0; 32], vec![(funding, out_aux(100, [2; 32]))]);
        let before = store.snapshot();

        let aux = spend(funding, 100);
        processor.process_tx(aux.id(), aux);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_local_txs_in_admission_order() {
        let a_in = TxIn::new([1; 32], 0);
        let b_in = TxIn::new([1; 32], 1);
        let (_, processor) = processor_with_funding(
            [0; 32],
            vec![(a_in, out_aux(10, [2; 32])), (b_in, out_aux(20, [2; 32]))],
        );

        let a = spend(a_in, 10);
        let b = spend(b_in, 20);
        let a_id = a.id();
        let b_id = b.id();
        processor.process_tx(a_id, a);
        processor.process_tx(b_id, b);

        let ids: Vec<TxId> = processor.local_txs().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![a_id, b_id]);
    }

    #[test]
    fn test_tip_coherence_after_construction() {
        let (store, processor) = processor_with_funding([9; 32], vec![]);
        assert_eq!(processor.tip(), store.tip());
    }
}
