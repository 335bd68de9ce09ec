// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use serde::{Deserialize, Deserializer, Serialize};

use crate::network::NetworkId;

/// Unit name Blockfrost uses for the native currency.
pub const LOVELACE_UNIT: &str = "lovelace";

/// Lovelace per ADA.
pub const LOVELACE_PER_ADA: u64 = 1_000_000;

/// Decimal places of ADA.
pub const ADA_DECIMALS: usize = 6;

/// Cardano network configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Blockfrost API base URL
    pub blockfrost_url: &'static str,
    /// Block explorer URL
    pub explorer_url: &'static str,
}

/// Cardano mainnet configuration.
pub const CARDANO_MAINNET: NetworkConfig = NetworkConfig {
    name: "Cardano Mainnet",
    blockfrost_url: "https://cardano-mainnet.blockfrost.io/api/v0",
    explorer_url: "https://cardanoscan.io",
};

/// Cardano pre-production testnet configuration.
pub const CARDANO_PREPROD: NetworkConfig = NetworkConfig {
    name: "Cardano Preprod",
    blockfrost_url: "https://cardano-preprod.blockfrost.io/api/v0",
    explorer_url: "https://preprod.cardanoscan.io",
};

/// Cardano preview testnet configuration.
pub const CARDANO_PREVIEW: NetworkConfig = NetworkConfig {
    name: "Cardano Preview",
    blockfrost_url: "https://cardano-preview.blockfrost.io/api/v0",
    explorer_url: "https://preview.cardanoscan.io",
};

impl NetworkConfig {
    pub fn for_network(network: NetworkId) -> &'static NetworkConfig {
        match network {
            NetworkId::Mainnet => &CARDANO_MAINNET,
            NetworkId::Preprod => &CARDANO_PREPROD,
            NetworkId::Preview => &CARDANO_PREVIEW,
        }
    }

    pub fn transaction_url(&self, tx_hash: &str) -> String {
        format!("{}/transaction/{tx_hash}", self.explorer_url)
    }
}

/// One entry of a Blockfrost amount list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    /// `lovelace` or policy id + hex asset name
    pub unit: String,
    /// Quantity in the smallest unit, as a decimal string
    pub quantity: String,
}

impl Amount {
    pub fn is_lovelace(&self) -> bool {
        self.unit == LOVELACE_UNIT
    }
}

/// Blockfrost `GET /addresses/{address}` body (fields we use).
#[derive(Debug, Clone, Deserialize)]
pub struct AddressContent {
    pub address: String,
    #[serde(default)]
    pub amount: Vec<Amount>,
}

/// ADA balance plus any other assets held by an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressBalance {
    pub address: String,
    pub lovelace: u64,
    pub assets: Vec<Amount>,
}

impl AddressBalance {
    /// Split an amount list into lovelace and other assets.
    ///
    /// Unparseable lovelace quantities count as zero.
    pub fn from_amounts(address: impl Into<String>, amounts: &[Amount]) -> Self {
        let lovelace = amounts
            .iter()
            .filter(|a| a.is_lovelace())
            .filter_map(|a| a.quantity.parse::<u64>().ok())
            .sum();
        let assets = amounts.iter().filter(|a| !a.is_lovelace()).cloned().collect();

        Self {
            address: address.into(),
            lovelace,
            assets,
        }
    }

    pub fn ada(&self) -> String {
        format_ada(self.lovelace)
    }

    /// `"<quantity> <unit>"` for each non-ADA asset.
    pub fn asset_lines(&self) -> Vec<String> {
        self.assets
            .iter()
            .map(|a| format!("{} {}", a.quantity, a.unit))
            .collect()
    }
}

/// Unspent output as returned by `GET /addresses/{address}/utxos`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Utxo {
    pub tx_hash: String,
    pub output_index: u32,
    pub amount: Vec<Amount>,
}

impl Utxo {
    pub fn lovelace(&self) -> u64 {
        self.amount
            .iter()
            .filter(|a| a.is_lovelace())
            .filter_map(|a| a.quantity.parse::<u64>().ok())
            .sum()
    }

    /// True when the output carries nothing but ADA.
    pub fn is_pure_ada(&self) -> bool {
        self.amount.iter().all(Amount::is_lovelace)
    }
}

/// Blockfrost `GET /blocks/latest` body (fields we use).
#[derive(Debug, Clone, Deserialize)]
pub struct LatestBlock {
    pub hash: String,
    pub slot: Option<u64>,
    pub height: Option<u64>,
}

/// Blockfrost `GET /epochs/latest/parameters` body (fields we use).
#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolParameters {
    pub min_fee_a: u64,
    pub min_fee_b: u64,
    pub max_tx_size: u64,
    /// Lovelace per byte of UTxO storage, sent as a string by Blockfrost.
    #[serde(default, deserialize_with = "string_or_number")]
    pub coins_per_utxo_size: Option<u64>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s.parse().ok(),
        Some(serde_json::Value::Number(n)) => n.as_u64(),
        _ => None,
    })
}

/// Format lovelace as ADA with trailing zeros trimmed and at least one decimal.
pub fn format_ada(lovelace: u64) -> String {
    let whole = lovelace / LOVELACE_PER_ADA;
    let remainder = lovelace % LOVELACE_PER_ADA;

    if remainder == 0 {
        return format!("{whole}.0");
    }

    let decimals = format!("{remainder:0>width$}", width = ADA_DECIMALS);
    format!("{whole}.{}", decimals.trim_end_matches('0'))
}
