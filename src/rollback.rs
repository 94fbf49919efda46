//! Block rollback via undo records

use std::sync::Arc;

use tracing::info;

use crate::store::{BatchOp, UtxoStore};
use crate::types::{Block, BlockUndo, TxIn};

/// TxRollbackBlocks: reverse committed blocks, youngest first.
///
/// Each `(block, undo)` pair is reversed independently: every input gets
/// its consumed output restored from the undo, every created output is
/// deleted, and the tip moves to the block's parent — all as one atomic
/// store batch. The undo must line up with the block (one entry per
/// transaction, one restored output per input); a mismatch means the
/// caller handed us undo data for a different block and is fatal.
///
/// The mempool is not touched here: callers re-normalize once the whole
/// rollback sequence is committed.
pub(crate) fn rollback_blocks(store: &Arc<dyn UtxoStore>, blunds: &[(Block, BlockUndo)]) {
    assert!(!blunds.is_empty(), "rollback requires at least one block");
    for (block, undo) in blunds {
        rollback_block(store, block, undo);
    }
    info!(blocks = blunds.len(), "blocks rolled back");
}

fn rollback_block(store: &Arc<dyn UtxoStore>, block: &Block, undo: &BlockUndo) {
    if store.tip() != block.header_hash {
        panic!(
            "tip mismatch while rolling back block at slot {}: block is not the current tip",
            block.slot
        );
    }
    if undo.len() != block.txs.len() {
        panic!(
            "undo length {} does not match transaction count {} in block at slot {}",
            undo.len(),
            block.txs.len(),
            block.slot
        );
    }

    let mut batch = vec![BatchOp::PutTip(block.prev_hash)];
    for (aux, tx_undo) in block.txs.iter().zip(undo) {
        if tx_undo.len() != aux.tx.inputs.len() {
            panic!(
                "undo length {} does not match input count {} for transaction in block at slot {}",
                tx_undo.len(),
                aux.tx.inputs.len(),
                block.slot
            );
        }
        let tx_id = aux.id();
        for (input, consumed) in aux.tx.inputs.iter().zip(tx_undo) {
            batch.push(BatchOp::AddTxOut(*input, consumed.clone()));
        }
        for index in 0..aux.tx.outputs.len() {
            batch.push(BatchOp::DelTxIn(TxIn::new(tx_id, index as u32)));
        }
    }
    store.write_batch(batch);
}
