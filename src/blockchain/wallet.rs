// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HD wallet derivation for Cardano Shelley addresses.
//!
//! Mnemonic handling comes from `tiny-bip39` and child key derivation from
//! `ed25519-bip32`. This module only wires them together:
//!
//! - master key from the mnemonic entropy (Icarus scheme, PBKDF2-HMAC-SHA512)
//! - payment key at `m/1852'/1815'/0'/0/0`, stake key at `m/1852'/1815'/0'/2/0`
//! - key hashes with blake2b-224, addresses in bech32 (CIP-19)

use bech32::{FromBase32, ToBase32, Variant};
use bip39::{Language, Mnemonic, MnemonicType};
use blake2::{digest::consts::U28, Blake2b, Digest};
use ed25519_bip32::{DerivationScheme, XPrv};
use hmac::Hmac;
use sha2::Sha512;
use zeroize::Zeroizing;

use crate::network::NetworkId;

/// Hardened derivation offset.
pub const HARDENED: u32 = 0x8000_0000;

/// CIP-1852 purpose.
pub const PURPOSE: u32 = 1852;

/// ADA coin type (SLIP-44).
pub const COIN_TYPE: u32 = 1815;

/// Role index of external payment keys.
const ROLE_EXTERNAL: u32 = 0;

/// Role index of staking keys.
const ROLE_STAKING: u32 = 2;

const ICARUS_PBKDF2_ROUNDS: u32 = 4096;

/// Extended private key plus chain code.
const XPRV_SIZE: usize = 96;

/// Length of a Cardano key hash.
pub const KEY_HASH_SIZE: usize = 28;

/// Address header: base address, key hash payment + key hash stake.
const HEADER_BASE: u8 = 0b0000_0000;

/// Address header: enterprise address, key hash payment.
const HEADER_ENTERPRISE: u8 = 0b0110_0000;

type Blake2b224 = Blake2b<U28>;

/// Errors from wallet and key handling.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Invalid signing key: {0}")]
    InvalidSigningKey(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Unsupported word count {0}: expected 12, 15 or 24")]
    UnsupportedWordCount(u32),

    #[error("Key derivation failed: {0}")]
    Derivation(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Payment and stake keys of account 0, index 0.
pub struct AccountKeys {
    pub payment: XPrv,
    pub stake: XPrv,
}

impl AccountKeys {
    /// Derive the account keys from a mnemonic (empty passphrase).
    pub fn from_mnemonic(mnemonic: &Mnemonic) -> Result<Self, WalletError> {
        let root = root_key(mnemonic.entropy())?;
        let account = root
            .derive(DerivationScheme::V2, HARDENED | PURPOSE)
            .derive(DerivationScheme::V2, HARDENED | COIN_TYPE)
            .derive(DerivationScheme::V2, HARDENED);

        Ok(Self {
            payment: account
                .derive(DerivationScheme::V2, ROLE_EXTERNAL)
                .derive(DerivationScheme::V2, 0),
            stake: account
                .derive(DerivationScheme::V2, ROLE_STAKING)
                .derive(DerivationScheme::V2, 0),
        })
    }

    pub fn payment_key_hash(&self) -> [u8; KEY_HASH_SIZE] {
        key_hash(&self.payment.public().public_key())
    }

    pub fn stake_key_hash(&self) -> [u8; KEY_HASH_SIZE] {
        key_hash(&self.stake.public().public_key())
    }

    pub fn base_address(&self, network: NetworkId) -> Result<String, WalletError> {
        base_address(&self.payment_key_hash(), &self.stake_key_hash(), network)
    }
}

/// Values written out by wallet generation.
pub struct GeneratedWallet {
    pub mnemonic: Zeroizing<String>,
    pub address: String,
    pub vkey_hash: String,
}

/// Generate a fresh mnemonic and derive its first base address.
pub fn generate_wallet(network: NetworkId, words: u32) -> Result<GeneratedWallet, WalletError> {
    let mnemonic_type = match words {
        12 => MnemonicType::Words12,
        15 => MnemonicType::Words15,
        24 => MnemonicType::Words24,
        other => return Err(WalletError::UnsupportedWordCount(other)),
    };
    let mnemonic = Mnemonic::new(mnemonic_type, Language::English);
    wallet_from_mnemonic(&mnemonic, network)
}

/// Derive address and key hash for an existing mnemonic.
pub fn wallet_from_mnemonic(
    mnemonic: &Mnemonic,
    network: NetworkId,
) -> Result<GeneratedWallet, WalletError> {
    let keys = AccountKeys::from_mnemonic(mnemonic)?;
    Ok(GeneratedWallet {
        mnemonic: Zeroizing::new(mnemonic.phrase().to_string()),
        address: keys.base_address(network)?,
        vkey_hash: hex::encode(keys.payment_key_hash()),
    })
}

/// Parse an English mnemonic, normalising whitespace.
pub fn parse_mnemonic(phrase: &str) -> Result<Mnemonic, WalletError> {
    let normalized = Zeroizing::new(phrase.split_whitespace().collect::<Vec<_>>().join(" "));
    Mnemonic::from_phrase(&normalized, Language::English)
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))
}

/// Icarus master key: PBKDF2-HMAC-SHA512 over the entropy, then clamped.
fn root_key(entropy: &[u8]) -> Result<XPrv, WalletError> {
    let mut seed = Zeroizing::new([0u8; XPRV_SIZE]);
    pbkdf2::pbkdf2::<Hmac<Sha512>>(&[], entropy, ICARUS_PBKDF2_ROUNDS, &mut seed[..])
        .map_err(|e| WalletError::Derivation(e.to_string()))?;
    Ok(XPrv::normalize_bytes_force3rd(*seed))
}

/// blake2b-224 of a public key.
pub fn key_hash(public_key: &[u8]) -> [u8; KEY_HASH_SIZE] {
    let digest = Blake2b224::digest(public_key);
    let mut out = [0u8; KEY_HASH_SIZE];
    out.copy_from_slice(&digest);
    out
}

/// Base address (payment key hash + stake key hash).
pub fn base_address(
    payment_hash: &[u8; KEY_HASH_SIZE],
    stake_hash: &[u8; KEY_HASH_SIZE],
    network: NetworkId,
) -> Result<String, WalletError> {
    let mut bytes = Vec::with_capacity(1 + 2 * KEY_HASH_SIZE);
    bytes.push(HEADER_BASE | network.address_tag());
    bytes.extend_from_slice(payment_hash);
    bytes.extend_from_slice(stake_hash);
    encode_address(&bytes, network)
}

/// Enterprise address (payment key hash only).
pub fn enterprise_address(
    payment_hash: &[u8; KEY_HASH_SIZE],
    network: NetworkId,
) -> Result<String, WalletError> {
    let mut bytes = Vec::with_capacity(1 + KEY_HASH_SIZE);
    bytes.push(HEADER_ENTERPRISE | network.address_tag());
    bytes.extend_from_slice(payment_hash);
    encode_address(&bytes, network)
}

fn address_hrp(network: NetworkId) -> &'static str {
    if network.is_mainnet() {
        "addr"
    } else {
        "addr_test"
    }
}

fn encode_address(bytes: &[u8], network: NetworkId) -> Result<String, WalletError> {
    bech32::encode(address_hrp(network), bytes.to_base32(), Variant::Bech32)
        .map_err(|e| WalletError::InvalidAddress(e.to_string()))
}

/// Decode a bech32 Shelley address and check it belongs to `network`.
pub fn decode_address(address: &str, network: NetworkId) -> Result<Vec<u8>, WalletError> {
    let (hrp, data, variant) = bech32::decode(address.trim())
        .map_err(|e| WalletError::InvalidAddress(format!("{address}: {e}")))?;

    if variant != Variant::Bech32 {
        return Err(WalletError::InvalidAddress(format!("{address}: not bech32")));
    }
    if hrp != address_hrp(network) {
        return Err(WalletError::InvalidAddress(format!(
            "{address}: prefix `{hrp}` does not match network {network}"
        )));
    }

    let bytes = Vec::<u8>::from_base32(&data)
        .map_err(|e| WalletError::InvalidAddress(format!("{address}: {e}")))?;

    match bytes.first() {
        Some(header) if header & 0x0f == network.address_tag() => Ok(bytes),
        Some(_) => Err(WalletError::InvalidAddress(format!(
            "{address}: network tag does not match {network}"
        ))),
        None => Err(WalletError::InvalidAddress(format!("{address}: empty payload"))),
    }
}
