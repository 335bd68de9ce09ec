// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing key loading for ADA transfers.
//!
//! Keys arrive in one of three forms:
//! - a mnemonic phrase, or a file containing one
//! - a `cardano-cli` text envelope (`.skey` JSON with `cborHex`)
//! - a raw hex key (32-byte ed25519 seed, optionally CBOR-wrapped)
//!
//! Mnemonic keys sign with the extended BIP32-Ed25519 payment key and pay
//! from the base address; plain keys pay from the enterprise address.

use std::{fs, path::Path};

use ed25519_bip32::XPrv;
use ed25519_dalek::{Signer, SigningKey};
use serde::Deserialize;
use zeroize::Zeroizing;

use super::wallet::{
    base_address, enterprise_address, key_hash, parse_mnemonic, AccountKeys, WalletError,
    KEY_HASH_SIZE,
};
use crate::network::NetworkId;

/// CBOR byte-string header for a 32-byte payload.
const CBOR_BYTES_32: &str = "5820";

/// CBOR byte-string header for a 128-byte payload.
const CBOR_BYTES_128: &str = "5880";

/// Secret, public key and chain code.
const EXTENDED_KEY_SIZE: usize = 128;

/// `cardano-cli` key envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextEnvelope {
    #[serde(rename = "type")]
    key_type: String,
    cbor_hex: String,
}

/// A key able to witness payment transactions.
pub enum PaymentSigner {
    /// HD payment key plus the stake key hash of its base address.
    Extended {
        payment: XPrv,
        stake_hash: [u8; KEY_HASH_SIZE],
    },
    /// Extended key without a stake part (from an extended `.skey` file).
    ExtendedEnterprise(XPrv),
    /// Plain ed25519 key.
    Ed25519(SigningKey),
}

impl PaymentSigner {
    /// Load from a mnemonic phrase, or from a file when `source` names one.
    pub fn from_mnemonic_source(source: &str) -> Result<Self, WalletError> {
        let path = Path::new(source);
        let phrase = if path.is_file() {
            Zeroizing::new(fs::read_to_string(path).map_err(|e| WalletError::Io {
                path: source.to_string(),
                source: e,
            })?)
        } else {
            Zeroizing::new(source.to_string())
        };

        let mnemonic = parse_mnemonic(&phrase)?;
        let keys = AccountKeys::from_mnemonic(&mnemonic)?;
        let stake_hash = keys.stake_key_hash();

        Ok(PaymentSigner::Extended {
            payment: keys.payment,
            stake_hash,
        })
    }

    /// Load from a `cardano-cli` text envelope file.
    pub fn from_skey_file(path: &Path) -> Result<Self, WalletError> {
        let contents = Zeroizing::new(fs::read_to_string(path).map_err(|e| WalletError::Io {
            path: path.display().to_string(),
            source: e,
        })?);
        let envelope: TextEnvelope = serde_json::from_str(&contents).map_err(|e| {
            WalletError::InvalidSigningKey(format!("{}: not a key envelope: {e}", path.display()))
        })?;

        if !envelope.key_type.contains("SigningKey") {
            return Err(WalletError::InvalidSigningKey(format!(
                "{}: `{}` is not a signing key",
                path.display(),
                envelope.key_type
            )));
        }

        Self::from_skey_hex(&envelope.cbor_hex)
    }

    /// Load from hex: 32-byte seed, CBOR-wrapped seed, or CBOR-wrapped
    /// 128-byte extended key (secret, public key, chain code).
    pub fn from_skey_hex(raw: &str) -> Result<Self, WalletError> {
        let hex_key = raw.trim().trim_start_matches("0x");

        let extended = hex_key
            .strip_prefix(CBOR_BYTES_128)
            .filter(|body| body.len() == 2 * EXTENDED_KEY_SIZE);
        if let Some(extended) = extended {
            let bytes = Zeroizing::new(decode_key_hex(extended, EXTENDED_KEY_SIZE)?);
            let mut xprv = Zeroizing::new([0u8; 96]);
            xprv[..64].copy_from_slice(&bytes[..64]);
            xprv[64..].copy_from_slice(&bytes[96..]);
            let key = XPrv::from_bytes_verified(*xprv)
                .map_err(|e| WalletError::InvalidSigningKey(format!("{e:?}")))?;
            return Ok(PaymentSigner::ExtendedEnterprise(key));
        }

        let seed_hex = match hex_key.len() {
            68 => hex_key.strip_prefix(CBOR_BYTES_32).ok_or_else(|| {
                WalletError::InvalidSigningKey("unexpected CBOR header".to_string())
            })?,
            _ => hex_key,
        };
        let bytes = Zeroizing::new(decode_key_hex(seed_hex, 32)?);
        let mut seed = Zeroizing::new([0u8; 32]);
        seed.copy_from_slice(&bytes);
        Ok(PaymentSigner::Ed25519(SigningKey::from_bytes(&seed)))
    }

    pub fn public_key(&self) -> [u8; 32] {
        match self {
            PaymentSigner::Extended { payment, .. } => payment.public().public_key(),
            PaymentSigner::ExtendedEnterprise(key) => key.public().public_key(),
            PaymentSigner::Ed25519(key) => key.verifying_key().to_bytes(),
        }
    }

    pub fn payment_key_hash(&self) -> [u8; KEY_HASH_SIZE] {
        key_hash(&self.public_key())
    }

    /// Address the signer pays from.
    pub fn sender_address(&self, network: NetworkId) -> Result<String, WalletError> {
        match self {
            PaymentSigner::Extended { stake_hash, .. } => {
                base_address(&self.payment_key_hash(), stake_hash, network)
            }
            _ => enterprise_address(&self.payment_key_hash(), network),
        }
    }

    /// Sign `message` (a transaction body hash).
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        match self {
            PaymentSigner::Extended { payment, .. } => sign_extended(payment, message),
            PaymentSigner::ExtendedEnterprise(key) => sign_extended(key, message),
            PaymentSigner::Ed25519(key) => key.sign(message).to_bytes(),
        }
    }
}

fn sign_extended(key: &XPrv, message: &[u8]) -> [u8; 64] {
    let signature = key.sign::<Vec<u8>>(message);
    *signature.to_bytes()
}

fn decode_key_hex(raw: &str, expected_len: usize) -> Result<Vec<u8>, WalletError> {
    let bytes = hex::decode(raw)
        .map_err(|e| WalletError::InvalidSigningKey(format!("invalid hex: {e}")))?;
    if bytes.len() != expected_len {
        return Err(WalletError::InvalidSigningKey(format!(
            "expected {expected_len} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(bytes)
}
