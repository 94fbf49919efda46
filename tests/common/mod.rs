//! Shared builders for integration tests
#![allow(dead_code)]

use std::sync::Arc;

use txp_core::{
    Address, Block, BlockHeaderHash, Coin, InputWitness, MemoryUtxoStore, NullWitnessCheck,
    SlotId, Tx, TxAux, TxIn, TxOut, TxOutAux, TxProcessor, TxpConfig,
};

pub fn out_aux(value: Coin, address: Address) -> TxOutAux {
    TxOutAux {
        output: TxOut { value, address },
        distribution: vec![],
    }
}

pub fn out_aux_with_stake(value: Coin, address: Address, stakeholder: Address) -> TxOutAux {
    TxOutAux {
        output: TxOut { value, address },
        distribution: vec![(stakeholder, value)],
    }
}

/// Transaction with null witnesses and empty distributions, for tests that
/// run under `NullWitnessCheck`.
pub fn simple_tx(inputs: Vec<TxIn>, outputs: Vec<(Coin, Address)>) -> TxAux {
    let witness = inputs
        .iter()
        .map(|_| InputWitness {
            key: vec![],
            signature: vec![],
        })
        .collect();
    let distribution = outputs.iter().map(|_| vec![]).collect();
    TxAux {
        tx: Tx {
            inputs,
            outputs: outputs
                .into_iter()
                .map(|(value, address)| TxOut { value, address })
                .collect(),
        },
        witness,
        distribution,
    }
}

pub fn main_block(
    prev: BlockHeaderHash,
    header: BlockHeaderHash,
    slot: u16,
    txs: Vec<TxAux>,
) -> Block {
    Block {
        prev_hash: prev,
        header_hash: header,
        slot: SlotId { epoch: 0, slot },
        is_boundary: false,
        txs,
    }
}

pub fn boundary_block(prev: BlockHeaderHash, header: BlockHeaderHash, epoch: u64) -> Block {
    Block {
        prev_hash: prev,
        header_hash: header,
        slot: SlotId { epoch, slot: 0 },
        is_boundary: true,
        txs: vec![],
    }
}

/// Store seeded with the given unspent outputs and a processor over it
/// using the permissive witness check.
pub fn setup(
    tip: BlockHeaderHash,
    utxos: Vec<(TxIn, TxOutAux)>,
) -> (Arc<MemoryUtxoStore>, TxProcessor) {
    setup_with_config(tip, utxos, TxpConfig::default())
}

pub fn setup_with_config(
    tip: BlockHeaderHash,
    utxos: Vec<(TxIn, TxOutAux)>,
    config: TxpConfig,
) -> (Arc<MemoryUtxoStore>, TxProcessor) {
    let store = Arc::new(MemoryUtxoStore::with_utxos(tip, utxos));
    let processor = TxProcessor::new(store.clone(), Arc::new(NullWitnessCheck), config);
    (store, processor)
}
