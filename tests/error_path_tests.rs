//! Fatal contract violations and error surfaces

mod common;

use common::*;
use txp_core::{SlotId, TxIn, TxValidationError, TxpConfig};

const H0: [u8; 32] = [0; 32];
const H1: [u8; 32] = [0x11; 32];

#[test]
#[should_panic(expected = "AltChain must be non-empty")]
fn applying_an_empty_chain_is_fatal() {
    let (_, processor) = setup(H0, vec![]);
    processor.apply_blocks(&[]);
}

#[test]
#[should_panic(expected = "oldest block in AltChain is not based on tip")]
fn applying_a_chain_not_based_on_tip_is_fatal() {
    let (_, processor) = setup(H0, vec![]);
    let stray = main_block([0xBB; 32], H1, 0, vec![]);
    processor.apply_blocks(&[stray]);
}

#[test]
#[should_panic(expected = "supposedly valid AltChain failed verification")]
fn assert_mode_catches_invalid_chains() {
    let config = TxpConfig {
        assert_valid_blocks: true,
        ..TxpConfig::default()
    };
    let (_, processor) = setup_with_config(H0, vec![], config);

    // spends an output that does not exist anywhere
    let orphan = simple_tx(vec![TxIn::new([0xAA; 32], 0)], vec![(10, [0xD1; 32])]);
    let b1 = main_block(H0, H1, 0, vec![orphan]);
    processor.apply_blocks(&[b1]);
}

#[test]
#[should_panic(expected = "rollback requires at least one block")]
fn empty_rollback_is_fatal() {
    let (_, processor) = setup(H0, vec![]);
    processor.rollback_blocks(&[]);
}

#[test]
#[should_panic(expected = "tip mismatch")]
fn rolling_back_a_non_tip_block_is_fatal() {
    let (_, processor) = setup(H0, vec![]);
    // claims header H1, but the store tip is H0
    let b = main_block([0xBB; 32], H1, 0, vec![]);
    processor.rollback_blocks(&[(b, vec![])]);
}

#[test]
fn block_verification_error_carries_slot_context() {
    let (_, processor) = setup(H0, vec![]);
    let orphan = simple_tx(vec![TxIn::new([0xAA; 32], 0)], vec![(10, [0xD1; 32])]);
    let mut b1 = main_block(H0, H1, 3, vec![orphan]);
    b1.slot = SlotId { epoch: 2, slot: 3 };

    let err = processor.verify_blocks(&[b1]).unwrap_err();
    assert_eq!(err.slot, SlotId { epoch: 2, slot: 3 });
    assert_eq!(err.source, TxValidationError::InputNotFound { index: 0 });
    assert_eq!(
        err.to_string(),
        "[Block's slot = 2/3] Input 0 not found in UTXO view"
    );
}

#[test]
fn verification_failure_stops_at_first_bad_block() {
    let funding = TxIn::new([0xF0; 32], 0);
    let (_, processor) = setup(H0, vec![(funding, out_aux(100, [0xD0; 32]))]);

    let good = simple_tx(vec![funding], vec![(100, [0xD1; 32])]);
    let orphan = simple_tx(vec![TxIn::new([0xAA; 32], 0)], vec![(10, [0xD1; 32])]);
    let chain = vec![
        main_block(H0, H1, 0, vec![good]),
        main_block(H1, [0x22; 32], 1, vec![orphan]),
    ];

    let err = processor.verify_blocks(&chain).unwrap_err();
    assert_eq!(err.slot, SlotId { epoch: 0, slot: 1 });
}
