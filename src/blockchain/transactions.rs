// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Payment transaction assembly for ADA transfers.
//!
//! Builds a single-recipient transaction from pure-ADA UTxOs:
//! largest-first input selection, one payment output, one change output,
//! linear fee (`min_fee_a * size + min_fee_b`), one vkey witness.
//! Outputs carrying native assets are never spent here.

use blake2::{digest::consts::U32, Blake2b, Digest};
use ciborium::Value;
use tracing::debug;

use super::signing::PaymentSigner;
use super::types::{ProtocolParameters, Utxo, ADA_DECIMALS, LOVELACE_PER_ADA};

/// Validity window added to the current slot.
pub const DEFAULT_TTL_SLOTS: u64 = 7200;

/// Slack for fee and change growing between the draft and the final body.
const FEE_PADDING_BYTES: u64 = 16;

/// Per-entry overhead in the min-UTxO formula.
const UTXO_ENTRY_OVERHEAD: u64 = 160;

/// Minimum output when the protocol parameters carry no `coins_per_utxo_size`.
const FALLBACK_MIN_OUTPUT: u64 = LOVELACE_PER_ADA;

type Blake2b256 = Blake2b<U32>;

/// Errors raised while preparing a transfer.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("Invalid amount `{0}`: expected a positive ADA value with at most 6 decimals")]
    InvalidAmount(String),

    #[error("Insufficient funds: need at least {required} lovelace, {available} lovelace spendable")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("Output of {amount} lovelace is below the minimum of {minimum} lovelace")]
    OutputBelowMinimum { amount: u64, minimum: u64 },

    #[error("Invalid UTxO reference: {0}")]
    InvalidInput(String),

    #[error("Transaction of {size} bytes exceeds the maximum of {max} bytes")]
    TooLarge { size: u64, max: u64 },

    #[error("CBOR encoding failed: {0}")]
    Encoding(String),
}

/// What to pay, to whom, and where change goes.
pub struct PaymentPlan<'a> {
    /// Recipient address bytes
    pub recipient: &'a [u8],
    /// Change address bytes
    pub change_address: &'a [u8],
    /// Amount in lovelace
    pub amount: u64,
    /// Last valid slot
    pub ttl: u64,
}

/// A signed transaction ready for submission.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub tx_hash: String,
    pub cbor: Vec<u8>,
    pub fee: u64,
    pub change: u64,
    pub input_count: usize,
}

/// Parse an ADA decimal string into lovelace. Zero is rejected.
pub fn parse_ada_amount(raw: &str) -> Result<u64, TransactionError> {
    let invalid = || TransactionError::InvalidAmount(raw.to_string());
    let trimmed = raw.trim();
    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));

    let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty())
        || !digits_only(whole)
        || !digits_only(fraction)
        || fraction.len() > ADA_DECIMALS
    {
        return Err(invalid());
    }

    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let fraction: u64 = if fraction.is_empty() {
        0
    } else {
        format!("{fraction:0<width$}", width = ADA_DECIMALS)
            .parse()
            .map_err(|_| invalid())?
    };

    let lovelace = whole
        .checked_mul(LOVELACE_PER_ADA)
        .and_then(|l| l.checked_add(fraction))
        .ok_or_else(invalid)?;

    if lovelace == 0 {
        return Err(invalid());
    }
    Ok(lovelace)
}

/// Select inputs, compute fee and change, and sign.
pub fn build_payment(
    utxos: &[Utxo],
    plan: &PaymentPlan<'_>,
    params: &ProtocolParameters,
    signer: &PaymentSigner,
) -> Result<SignedTransaction, TransactionError> {
    let minimum = min_output_lovelace(plan.recipient, params)?;
    if plan.amount < minimum {
        return Err(TransactionError::OutputBelowMinimum {
            amount: plan.amount,
            minimum,
        });
    }

    let mut candidates: Vec<&Utxo> = utxos.iter().filter(|u| u.is_pure_ada()).collect();
    candidates.sort_by_key(|u| std::cmp::Reverse(u.lovelace()));
    let available: u64 = candidates.iter().map(|u| u.lovelace()).sum();

    let mut inputs = Vec::with_capacity(candidates.len());
    let mut total = 0u64;

    for (position, utxo) in candidates.iter().enumerate() {
        inputs.push(input_value(utxo)?);
        total = total.saturating_add(utxo.lovelace());
        if total < plan.amount {
            continue;
        }

        let last = position + 1 == candidates.len();
        if let Some(tx) = try_finalize(&inputs, total, plan, params, signer, last)? {
            debug!(
                inputs = tx.input_count,
                fee = tx.fee,
                change = tx.change,
                size = tx.cbor.len(),
                "Transaction assembled"
            );
            return Ok(tx);
        }
    }

    Err(TransactionError::InsufficientFunds {
        required: plan.amount.saturating_add(params.min_fee_b),
        available,
    })
}

/// Fee for a transaction of `size` bytes.
pub fn linear_fee(params: &ProtocolParameters, size: u64) -> u64 {
    params
        .min_fee_a
        .saturating_mul(size)
        .saturating_add(params.min_fee_b)
}

/// Smallest lovelace value an output to `address` may carry.
pub fn min_output_lovelace(
    address: &[u8],
    params: &ProtocolParameters,
) -> Result<u64, TransactionError> {
    match params.coins_per_utxo_size {
        Some(per_byte) => {
            let size = encode(&output(address, u64::MAX))?.len() as u64;
            Ok(per_byte.saturating_mul(UTXO_ENTRY_OVERHEAD + size))
        }
        None => Ok(FALLBACK_MIN_OUTPUT),
    }
}

fn try_finalize(
    inputs: &[Value],
    total: u64,
    plan: &PaymentPlan<'_>,
    params: &ProtocolParameters,
    signer: &PaymentSigner,
    last: bool,
) -> Result<Option<SignedTransaction>, TransactionError> {
    let draft = sign_transaction(inputs, plan, total - plan.amount, 0, signer)?;
    let fee = linear_fee(params, draft.cbor.len() as u64 + FEE_PADDING_BYTES);

    let Some(change) = total.checked_sub(plan.amount + fee) else {
        return Ok(None);
    };

    let min_change = min_output_lovelace(plan.change_address, params)?;
    let (fee, change) = if change == 0 || change >= min_change {
        (fee, change)
    } else if last {
        // Dust change goes to the fee.
        (fee + change, 0)
    } else {
        return Ok(None);
    };

    let tx = sign_transaction(inputs, plan, change, fee, signer)?;
    let size = tx.cbor.len() as u64;
    if size > params.max_tx_size {
        return Err(TransactionError::TooLarge {
            size,
            max: params.max_tx_size,
        });
    }
    Ok(Some(tx))
}

fn sign_transaction(
    inputs: &[Value],
    plan: &PaymentPlan<'_>,
    change: u64,
    fee: u64,
    signer: &PaymentSigner,
) -> Result<SignedTransaction, TransactionError> {
    let mut outputs = vec![output(plan.recipient, plan.amount)];
    if change > 0 {
        outputs.push(output(plan.change_address, change));
    }

    let body = Value::Map(vec![
        (uint(0), Value::Array(inputs.to_vec())),
        (uint(1), Value::Array(outputs)),
        (uint(2), uint(fee)),
        (uint(3), uint(plan.ttl)),
    ]);

    let body_hash = Blake2b256::digest(encode(&body)?);
    let signature = signer.sign(&body_hash);

    let vkey_witness = Value::Array(vec![
        Value::Bytes(signer.public_key().to_vec()),
        Value::Bytes(signature.to_vec()),
    ]);
    let witness_set = Value::Map(vec![(uint(0), Value::Array(vec![vkey_witness]))]);

    let transaction = Value::Array(vec![body, witness_set, Value::Bool(true), Value::Null]);

    Ok(SignedTransaction {
        tx_hash: hex::encode(body_hash),
        cbor: encode(&transaction)?,
        fee,
        change,
        input_count: inputs.len(),
    })
}

fn input_value(utxo: &Utxo) -> Result<Value, TransactionError> {
    let hash = hex::decode(&utxo.tx_hash)
        .ok()
        .filter(|h| h.len() == 32)
        .ok_or_else(|| TransactionError::InvalidInput(utxo.tx_hash.clone()))?;
    Ok(Value::Array(vec![
        Value::Bytes(hash),
        uint(u64::from(utxo.output_index)),
    ]))
}

fn output(address: &[u8], lovelace: u64) -> Value {
    Value::Array(vec![Value::Bytes(address.to_vec()), uint(lovelace)])
}

fn uint(n: u64) -> Value {
    Value::Integer(n.into())
}

fn encode(value: &Value) -> Result<Vec<u8>, TransactionError> {
    let mut bytes = Vec::new();
    ciborium::ser::into_writer(value, &mut bytes)
        .map_err(|e| TransactionError::Encoding(e.to_string()))?;
    Ok(bytes)
}
