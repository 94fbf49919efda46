//! Witness verification for transaction inputs

use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1, VerifyOnly};
use sha2::{Digest, Sha256};

use crate::error::TxValidationError;
use crate::types::{Address, InputWitness, Tx, TxId, TxOutAux};

/// Witness-verification seam.
///
/// Decides whether `witness` authorizes spending `spent` through input
/// `index` of the transaction with id `tx_id`. Implementations must be
/// pure with respect to the transaction state; the processing core calls
/// this once per input during verification.
pub trait WitnessCheck: Send + Sync {
    fn verify_input(
        &self,
        tx_id: &TxId,
        tx: &Tx,
        index: usize,
        witness: &InputWitness,
        spent: &TxOutAux,
    ) -> Result<(), TxValidationError>;
}

/// Hash of a spending key, as stored in `TxOut::address`.
pub fn address_of_key(key: &[u8]) -> Address {
    Sha256::digest(key).into()
}

/// Default witness scheme: a compressed secp256k1 public key plus a compact
/// ECDSA signature over the transaction id. The key must hash to the spent
/// output's address.
pub struct PkWitnessCheck {
    secp: Secp256k1<VerifyOnly>,
}

impl PkWitnessCheck {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::verification_only(),
        }
    }
}

impl Default for PkWitnessCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl WitnessCheck for PkWitnessCheck {
    fn verify_input(
        &self,
        tx_id: &TxId,
        _tx: &Tx,
        index: usize,
        witness: &InputWitness,
        spent: &TxOutAux,
    ) -> Result<(), TxValidationError> {
        if address_of_key(&witness.key) != spent.output.address {
            return Err(TxValidationError::WitnessRejected {
                index,
                reason: "key does not hash to the output address".to_string(),
            });
        }
        let key = PublicKey::from_slice(&witness.key).map_err(|e| {
            TxValidationError::WitnessRejected {
                index,
                reason: format!("malformed public key: {e}"),
            }
        })?;
        let signature = Signature::from_compact(&witness.signature).map_err(|e| {
            TxValidationError::WitnessRejected {
                index,
                reason: format!("malformed signature: {e}"),
            }
        })?;
        let message = Message::from_digest(*tx_id);
        self.secp
            .verify_ecdsa(&message, &signature, &key)
            .map_err(|e| TxValidationError::WitnessRejected {
                index,
                reason: format!("signature verification failed: {e}"),
            })
    }
}

/// Witness check that accepts everything.
///
/// For embedders that verify witnesses upstream, and for tests that are
/// not exercising the signature path.
pub struct NullWitnessCheck;

impl WitnessCheck for NullWitnessCheck {
    fn verify_input(
        &self,
        _tx_id: &TxId,
        _tx: &Tx,
        _index: usize,
        _witness: &InputWitness,
        _spent: &TxOutAux,
    ) -> Result<(), TxValidationError> {
        Ok(())
    }
}
