//! Pure transaction verification against a UTXO resolver

use crate::constants::{MAX_INPUTS, MAX_MONEY, MAX_OUTPUTS};
use crate::error::{Result, TxValidationError};
use crate::types::{BlockUndo, Coin, TxAux, TxId, TxIn, TxOutAux, TxUndo};
use crate::view::UtxoView;
use crate::witness::WitnessCheck;

/// VerifyTx: 𝒯𝒳 × (𝒯ℐ → 𝒯𝒪?) → {valid, invalid}
///
/// For transaction aux `(tx, witness, distribution)` and resolver `r`:
/// 1. If `pure`: check structural laws (non-empty inputs/outputs, count
///    limits, per-output value bounds).
/// 2. Check witness and distribution arity against inputs/outputs.
/// 3. Resolve every input through `r`; any miss is a failure.
/// 4. Check value conservation: Σ resolved ≥ Σ outputs (overflow-checked).
/// 5. Check every input's witness against the output it spends.
///
/// On success returns the resolved outputs in input order — exactly the
/// transaction's undo. The resolver is never mutated.
pub fn verify_tx<R>(
    pure: bool,
    witness_check: &dyn WitnessCheck,
    resolver: R,
    id: &TxId,
    aux: &TxAux,
) -> Result<TxUndo>
where
    R: Fn(&TxIn) -> Option<TxOutAux>,
{
    let tx = &aux.tx;

    if pure {
        if tx.inputs.is_empty() {
            return Err(TxValidationError::NoInputs);
        }
        if tx.outputs.is_empty() {
            return Err(TxValidationError::NoOutputs);
        }
        if tx.inputs.len() > MAX_INPUTS {
            return Err(TxValidationError::TooManyInputs(tx.inputs.len()));
        }
        if tx.outputs.len() > MAX_OUTPUTS {
            return Err(TxValidationError::TooManyOutputs(tx.outputs.len()));
        }
        for (index, output) in tx.outputs.iter().enumerate() {
            if output.value > MAX_MONEY {
                return Err(TxValidationError::OutputTooLarge {
                    index,
                    value: output.value,
                });
            }
        }
    }

    if aux.witness.len() != tx.inputs.len() {
        return Err(TxValidationError::WitnessArityMismatch {
            witnesses: aux.witness.len(),
            inputs: tx.inputs.len(),
        });
    }
    if aux.distribution.len() != tx.outputs.len() {
        return Err(TxValidationError::DistributionArityMismatch {
            distributions: aux.distribution.len(),
            outputs: tx.outputs.len(),
        });
    }

    let mut resolved = Vec::with_capacity(tx.inputs.len());
    for (index, input) in tx.inputs.iter().enumerate() {
        match resolver(input) {
            Some(output) => resolved.push(output),
            None => return Err(TxValidationError::InputNotFound { index }),
        }
    }

    let input_sum = coin_sum(resolved.iter().map(|aux| aux.output.value))?;
    let output_sum = coin_sum(tx.outputs.iter().map(|output| output.value))?;
    if input_sum < output_sum {
        return Err(TxValidationError::InsufficientInputs {
            input_sum,
            output_sum,
        });
    }

    for (index, (witness, spent)) in aux.witness.iter().zip(&resolved).enumerate() {
        witness_check.verify_input(id, tx, index, witness, spent)?;
    }

    Ok(resolved)
}

/// VerifyAndApplyTxs: verify each transaction in order against `view`; on
/// success apply it so later transactions can spend its outputs. Returns
/// the per-transaction undos in input order, short-circuiting on the first
/// failure and leaving `view` at the last successful application.
pub fn verify_and_apply_txs<'a, I>(
    pure: bool,
    witness_check: &dyn WitnessCheck,
    view: &mut UtxoView,
    txs: I,
) -> Result<BlockUndo>
where
    I: IntoIterator<Item = (TxId, &'a TxAux)>,
{
    let mut undos = Vec::new();
    for (id, aux) in txs {
        let undo = verify_tx(pure, witness_check, |input| view.get(input), &id, aux)?;
        view.apply_tx(id, &aux.tx, &aux.distribution);
        undos.push(undo);
    }
    Ok(undos)
}

fn coin_sum(values: impl Iterator<Item = Coin>) -> Result<Coin> {
    let mut sum: Coin = 0;
    for value in values {
        sum = sum
            .checked_add(value)
            .ok_or(TxValidationError::CoinOverflow)?;
    }
    Ok(sum)
}
