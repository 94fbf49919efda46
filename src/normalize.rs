//! Mempool normalization after tip movement

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::mempool::MemPool;
use crate::store::UtxoStore;
use crate::types::{TxAux, TxId};
use crate::verify::verify_tx;
use crate::view::UtxoView;
use crate::witness::WitnessCheck;
use crate::TxpLocalData;

/// Topologically sort transactions by spend dependency.
///
/// If `b` spends an output of `a`, then `a` precedes `b` in the result.
/// Ties are broken by position in the input slice (insertion order).
/// Returns `None` when the dependency graph contains a cycle, including a
/// transaction spending its own output.
pub fn topsort_txs(txs: Vec<(TxId, TxAux)>) -> Option<Vec<(TxId, TxAux)>> {
    let n = txs.len();
    let index_of: HashMap<TxId, usize> = txs
        .iter()
        .enumerate()
        .map(|(position, (id, _))| (*id, position))
        .collect();

    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree = vec![0usize; n];
    for (consumer, (_, aux)) in txs.iter().enumerate() {
        let mut producers = HashSet::new();
        for input in &aux.tx.inputs {
            if let Some(&producer) = index_of.get(&input.tx_id) {
                if producers.insert(producer) {
                    dependents[producer].push(consumer);
                    in_degree[consumer] += 1;
                }
            }
        }
    }

    // Kahn's algorithm; the min-heap on original position makes the
    // insertion-order tie-break deterministic.
    let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
        .filter(|&position| in_degree[position] == 0)
        .map(Reverse)
        .collect();
    let mut order = Vec::with_capacity(n);
    while let Some(Reverse(position)) = ready.pop() {
        order.push(position);
        for &dependent in &dependents[position] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.push(Reverse(dependent));
            }
        }
    }
    if order.len() != n {
        return None;
    }

    let mut slots: Vec<Option<(TxId, TxAux)>> = txs.into_iter().map(Some).collect();
    Some(
        order
            .into_iter()
            .map(|position| slots[position].take().expect("topsort visits each position once"))
            .collect(),
    )
}

/// NormalizeMemPool: rebuild the mempool against the current store tip.
///
/// Sorts the pending transactions topologically, then re-verifies each one
/// against a fresh view rooted at the new tip, keeping the survivors in
/// topological order and dropping everything else together with its undo.
/// Running it twice in a row is a no-op the second time.
///
/// A dependency cycle cannot arise from admitted transactions; if one is
/// detected anyway the pool is reset wholesale rather than left in an
/// inconsistent state.
pub(crate) fn normalize(
    store: &Arc<dyn UtxoStore>,
    ld: &mut TxpLocalData,
    witness_check: &dyn WitnessCheck,
) {
    let new_tip = store.tip();
    let pending = std::mem::take(&mut ld.mempool).into_entries();
    let pending_count = pending.len();
    ld.undos.clear();

    let sorted = match topsort_txs(pending) {
        Some(sorted) => sorted,
        None => {
            warn!("mempool dependency cycle detected; dropping all pending transactions");
            *ld = TxpLocalData::empty(store.clone(), new_tip);
            return;
        }
    };

    let mut view = UtxoView::new(store.clone());
    let mut mempool = MemPool::new();
    let mut undos = HashMap::new();
    for (id, aux) in sorted {
        match verify_tx(false, witness_check, |input| view.get(input), &id, &aux) {
            Ok(undo) => {
                view.apply_tx(id, &aux.tx, &aux.distribution);
                mempool.insert(id, aux);
                undos.insert(id, undo);
            }
            Err(e) => {
                debug!("dropping invalidated mempool transaction: {e}");
            }
        }
    }

    if mempool.len() < pending_count {
        info!(
            kept = mempool.len(),
            dropped = pending_count - mempool.len(),
            "mempool normalized"
        );
    }

    ld.view = view;
    ld.mempool = mempool;
    ld.undos = undos;
    ld.tip = new_tip;
}
