//! Block application and verification

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{BlockVerifyError, Result};
use crate::normalize::normalize;
use crate::store::{BatchOp, UtxoStore};
use crate::types::{Block, BlockUndo, TxIn, TxOutAux};
use crate::verify::verify_and_apply_txs;
use crate::view::UtxoView;
use crate::witness::WitnessCheck;
use crate::TxpLocalData;

/// TxVerifyBlocks: 𝒜 → Undo* | error
///
/// Verifies an alternate chain (oldest first) against a fresh view rooted
/// at the current store, applying each block's payload to the view as it
/// goes so later blocks see earlier effects. Boundary blocks carry no
/// payload and are skipped. The store itself is never written.
///
/// Returns one `BlockUndo` per non-boundary block, in chain order. A
/// failing block short-circuits with its slot attached to the error.
pub fn verify_blocks(
    store: Arc<dyn UtxoStore>,
    witness_check: &dyn WitnessCheck,
    chain: &[Block],
) -> Result<Vec<BlockUndo>, BlockVerifyError> {
    assert!(!chain.is_empty(), "AltChain must be non-empty");

    let mut view = UtxoView::new(store);
    let mut undos = Vec::new();
    for block in chain.iter().filter(|block| !block.is_boundary) {
        let txs = block.txs.iter().map(|aux| (aux.id(), aux));
        let undo = verify_and_apply_txs(false, witness_check, &mut view, txs)
            .map_err(|source| BlockVerifyError {
                slot: block.slot,
                source,
            })?;
        undos.push(undo);
    }
    Ok(undos)
}

/// TxApplyBlocks: commit an alternate chain of definitely-valid blocks.
///
/// The chain must be non-empty, oldest first, and based on the current
/// store tip; violations are caller-contract breakage and abort the
/// process rather than risk corrupting the store. With `assert_valid`
/// set the chain is re-verified first and a failure is equally fatal.
///
/// Each block becomes one atomic store batch; transactions superseded by
/// block inclusion are pruned from the mempool before the commit. After
/// the last block the mempool is normalized against the new tip.
///
/// The caller holds the local-state lock for the whole operation, so no
/// admission can observe a half-applied chain.
pub(crate) fn apply_blocks(
    store: &Arc<dyn UtxoStore>,
    ld: &mut TxpLocalData,
    witness_check: &dyn WitnessCheck,
    chain: &[Block],
    assert_valid: bool,
) {
    assert!(!chain.is_empty(), "AltChain must be non-empty");
    if store.tip() != chain[0].prev_hash {
        panic!("CantApplyBlocks: oldest block in AltChain is not based on tip");
    }
    if assert_valid {
        if let Err(e) = verify_blocks(store.clone(), witness_check, chain) {
            panic!("CantApplyBlocks: supposedly valid AltChain failed verification: {e}");
        }
    }

    for block in chain {
        apply_block(store, ld, block);
    }
    info!(blocks = chain.len(), "alternate chain applied");

    normalize(store, ld, witness_check);
}

fn apply_block(store: &Arc<dyn UtxoStore>, ld: &mut TxpLocalData, block: &Block) {
    let tip = store.tip();
    if tip != block.prev_hash {
        panic!(
            "tip mismatch while applying block at slot {}: store tip is not the block's parent",
            block.slot
        );
    }

    // Batch ordering is irrelevant to correctness: the store applies it as
    // one transaction and a valid chain never deletes a key it adds.
    let mut batch = Vec::with_capacity(1 + block.txs.len() * 2);
    batch.push(BatchOp::PutTip(block.header_hash));
    for aux in &block.txs {
        let tx_id = aux.id();
        for input in &aux.tx.inputs {
            batch.push(BatchOp::DelTxIn(*input));
        }
        for (index, output) in aux.tx.outputs.iter().enumerate() {
            batch.push(BatchOp::AddTxOut(
                TxIn::new(tx_id, index as u32),
                TxOutAux {
                    output: output.clone(),
                    distribution: aux.distribution[index].clone(),
                },
            ));
        }

        // superseded by block inclusion
        if ld.mempool.remove(&tx_id).is_some() {
            debug!("pruned block-included transaction from mempool");
        }
        ld.undos.remove(&tx_id);
    }
    store.write_batch(batch);
}
