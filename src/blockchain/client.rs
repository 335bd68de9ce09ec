// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockfrost client for Cardano chain queries and transaction submission.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::types::*;
use crate::{
    config::{Config, BLOCKFROST_BASE_URL_ENV},
    network::{Credential, NetworkId},
};

/// Header carrying the Blockfrost project id.
const PROJECT_ID_HEADER: &str = "project_id";

/// Blockfrost page size for paged endpoints.
const PAGE_SIZE: usize = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Blockfrost API client bound to one network.
#[derive(Debug, Clone)]
pub struct BlockfrostClient {
    network: NetworkId,
    base_url: String,
    project_id: Credential,
    http: Client,
}

impl BlockfrostClient {
    /// Create a client for the public Blockfrost endpoint of `network`.
    pub fn new(network: NetworkId, project_id: Credential) -> Result<Self, BlockfrostError> {
        Self::with_base_url(
            network,
            project_id,
            NetworkConfig::for_network(network).blockfrost_url,
        )
    }

    /// Create a client against an explicit base URL.
    pub fn with_base_url(
        network: NetworkId,
        project_id: Credential,
        base_url: &str,
    ) -> Result<Self, BlockfrostError> {
        url::Url::parse(base_url)
            .map_err(|e| BlockfrostError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BlockfrostError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            network,
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id,
            http,
        })
    }

    /// Create a client honouring `BLOCKFROST_BASE_URL` when configured.
    pub fn from_config(
        config: &Config,
        network: NetworkId,
        project_id: Credential,
    ) -> Result<Self, BlockfrostError> {
        match config.get(BLOCKFROST_BASE_URL_ENV) {
            Some(base_url) => Self::with_base_url(network, project_id, base_url),
            None => Self::new(network, project_id),
        }
    }

    /// Get the network this client queries.
    pub fn network(&self) -> NetworkId {
        self.network
    }

    /// Amount list of an address. Addresses Blockfrost has never seen
    /// come back as an empty list.
    pub async fn address_amounts(&self, address: &str) -> Result<Vec<Amount>, BlockfrostError> {
        let address = address_segment(address)?;
        let content: Option<AddressContent> =
            self.get_json(&format!("/addresses/{address}")).await?;
        Ok(content.map(|c| c.amount).unwrap_or_default())
    }

    /// ADA and asset balance of an address.
    pub async fn address_balance(&self, address: &str) -> Result<AddressBalance, BlockfrostError> {
        let amounts = self.address_amounts(address).await?;
        Ok(AddressBalance::from_amounts(address, &amounts))
    }

    /// All unspent outputs at an address, following pagination.
    pub async fn address_utxos(&self, address: &str) -> Result<Vec<Utxo>, BlockfrostError> {
        let address = address_segment(address)?;
        let mut utxos = Vec::new();
        let mut page = 1;

        loop {
            let batch: Vec<Utxo> = self
                .get_json(&format!("/addresses/{address}/utxos?page={page}"))
                .await?
                .unwrap_or_default();
            let done = batch.len() < PAGE_SIZE;
            utxos.extend(batch);
            if done {
                break;
            }
            page += 1;
        }

        debug!(address = %address, count = utxos.len(), "Fetched UTxOs");
        Ok(utxos)
    }

    /// Latest block on chain.
    pub async fn latest_block(&self) -> Result<LatestBlock, BlockfrostError> {
        self.get_json("/blocks/latest")
            .await?
            .ok_or_else(|| BlockfrostError::InvalidResponse("latest block not found".to_string()))
    }

    /// Protocol parameters of the current epoch.
    pub async fn protocol_parameters(&self) -> Result<ProtocolParameters, BlockfrostError> {
        self.get_json("/epochs/latest/parameters")
            .await?
            .ok_or_else(|| {
                BlockfrostError::InvalidResponse("protocol parameters not found".to_string())
            })
    }

    /// Submit a signed transaction; returns the transaction hash.
    pub async fn submit_transaction(&self, cbor: &[u8]) -> Result<String, BlockfrostError> {
        let path = "/tx/submit";
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .header(PROJECT_ID_HEADER, self.project_id.expose())
            .header("Content-Type", "application/cbor")
            .body(cbor.to_vec())
            .send()
            .await
            .map_err(|e| BlockfrostError::Request(format!("POST {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BlockfrostError::Api { status, body });
        }

        let tx_hash: String = response.json().await.map_err(|e| {
            BlockfrostError::InvalidResponse(format!("POST {path} invalid JSON: {e}"))
        })?;

        info!(tx_hash = %tx_hash, network = %self.network, "Transaction submitted");
        Ok(tx_hash)
    }

    /// GET a JSON document. `Ok(None)` on 404.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, BlockfrostError> {
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .header(PROJECT_ID_HEADER, self.project_id.expose())
            .send()
            .await
            .map_err(|e| BlockfrostError::Request(format!("GET {path} failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(path = %path, "Blockfrost returned 404");
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BlockfrostError::Api { status, body });
        }

        response
            .json()
            .await
            .map(Some)
            .map_err(|e| BlockfrostError::InvalidResponse(format!("GET {path} invalid JSON: {e}")))
    }
}

/// Addresses are placed in the request path, so only bech32 characters
/// and the HRP underscore are accepted.
fn address_segment(address: &str) -> Result<&str, BlockfrostError> {
    let valid = !address.is_empty()
        && address
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(address)
    } else {
        Err(BlockfrostError::InvalidAddress(address.to_string()))
    }
}

/// Errors that can occur while talking to Blockfrost.
#[derive(Debug, thiserror::Error)]
pub enum BlockfrostError {
    #[error("Invalid Blockfrost base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Blockfrost request failed: {0}")]
    Request(String),

    #[error("Blockfrost returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Blockfrost response was invalid: {0}")]
    InvalidResponse(String),

    #[error("Not a Cardano address: {0:?}")]
    InvalidAddress(String),
}
