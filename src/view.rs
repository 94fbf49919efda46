//! In-memory overlay over the UTXO store

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::store::UtxoStore;
use crate::types::{Tx, TxDistribution, TxId, TxIn, TxOutAux};

/// UtxoView: pending additions and deletions layered over a base store.
///
/// Reading a key consults the overlays first: a deleted key is absent, an
/// added key resolves to its pending output, and anything else falls
/// through to the base store. `add` and `del` are kept disjoint at all
/// times; `apply_tx` preserves this invariant.
///
/// Verification during block processing runs entirely against a view, so
/// intermediate states never touch the store.
pub struct UtxoView {
    add: HashMap<TxIn, TxOutAux>,
    del: HashSet<TxIn>,
    base: Arc<dyn UtxoStore>,
}

impl UtxoView {
    /// Fresh view with empty overlays rooted at `base`.
    pub fn new(base: Arc<dyn UtxoStore>) -> Self {
        Self {
            add: HashMap::new(),
            del: HashSet::new(),
            base,
        }
    }

    /// Overlay lookup: `del` shadows `add` shadows the base store.
    pub fn get(&self, input: &TxIn) -> Option<TxOutAux> {
        if self.del.contains(input) {
            return None;
        }
        if let Some(output) = self.add.get(input) {
            return Some(output.clone());
        }
        self.base.get(input)
    }

    /// ApplyTx: 𝒯𝒳 × 𝒱 → 𝒱
    ///
    /// Consumes every input (moving it into `del`) and creates every output
    /// (moving it into `add`). Callers verify the transaction first;
    /// `distribution` must be aligned with the outputs.
    pub fn apply_tx(&mut self, id: TxId, tx: &Tx, distribution: &TxDistribution) {
        for input in &tx.inputs {
            self.add.remove(input);
            self.del.insert(*input);
        }
        for (index, output) in tx.outputs.iter().enumerate() {
            let created = TxIn::new(id, index as u32);
            self.del.remove(&created);
            self.add.insert(
                created,
                TxOutAux {
                    output: output.clone(),
                    distribution: distribution[index].clone(),
                },
            );
        }
    }

    /// Whether the overlay marks this key as spent.
    pub fn is_deleted(&self, input: &TxIn) -> bool {
        self.del.contains(input)
    }

    /// Pending addition for this key, if any.
    pub fn added(&self, input: &TxIn) -> Option<&TxOutAux> {
        self.add.get(input)
    }

    /// Pending additions.
    pub fn additions(&self) -> &HashMap<TxIn, TxOutAux> {
        &self.add
    }

    /// Pending deletions.
    pub fn deletions(&self) -> &HashSet<TxIn> {
        &self.del
    }
}

impl fmt::Debug for UtxoView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UtxoView")
            .field("add", &self.add)
            .field("del", &self.del)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryUtxoStore;
    use crate::types::TxOut;

    fn out_aux(value: u64) -> TxOutAux {
        TxOutAux {
            output: TxOut {
                value,
                address: [9; 32],
            },
            distribution: vec![],
        }
    }

    fn view_over(utxos: Vec<(TxIn, TxOutAux)>) -> UtxoView {
        UtxoView::new(Arc::new(MemoryUtxoStore::with_utxos([0; 32], utxos)))
    }

    #[test]
    fn test_get_falls_through_to_base() {
        let input = TxIn::new([1; 32], 0);
        let view = view_over(vec![(input, out_aux(100))]);
        assert_eq!(view.get(&input), Some(out_aux(100)));
    }

    #[test]
    fn test_deletion_shadows_base() {
        let input = TxIn::new([1; 32], 0);
        let mut view = view_over(vec![(input, out_aux(100))]);

        let tx = Tx {
            inputs: vec![input],
            outputs: vec![],
        };
        view.apply_tx([2; 32], &tx, &vec![]);

        assert_eq!(view.get(&input), None);
        assert!(view.is_deleted(&input));
    }

    #[test]
    fn test_addition_resolves_before_base() {
        let input = TxIn::new([1; 32], 0);
        let mut view = view_over(vec![(input, out_aux(100))]);

        let tx = Tx {
            inputs: vec![input],
            outputs: vec![TxOut {
                value: 60,
                address: [3; 32],
            }],
        };
        let id = tx.id();
        view.apply_tx(id, &tx, &vec![vec![]]);

        assert_eq!(view.get(&TxIn::new(id, 0)), Some(out_aux_with(60, [3; 32])));
    }

    fn out_aux_with(value: u64, address: [u8; 32]) -> TxOutAux {
        TxOutAux {
            output: TxOut { value, address },
            distribution: vec![],
        }
    }

    #[test]
    fn test_overlays_stay_disjoint() {
        let input = TxIn::new([1; 32], 0);
        let mut view = view_over(vec![(input, out_aux(100))]);

        // tx_a spends the base output and creates one of its own
        let tx_a = Tx {
            inputs: vec![input],
            outputs: vec![TxOut {
                value: 100,
                address: [4; 32],
            }],
        };
        let id_a = tx_a.id();
        view.apply_tx(id_a, &tx_a, &vec![vec![]]);

        // tx_b spends tx_a's output: the key must move from add to del
        let tx_b = Tx {
            inputs: vec![TxIn::new(id_a, 0)],
            outputs: vec![],
        };
        view.apply_tx(tx_b.id(), &tx_b, &vec![]);

        for key in view.deletions() {
            assert!(!view.additions().contains_key(key));
        }
        assert_eq!(view.get(&TxIn::new(id_a, 0)), None);
    }
}
