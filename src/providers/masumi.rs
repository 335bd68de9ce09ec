// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Masumi payment service integration for escrow payments and purchases.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use uuid::Uuid;

use crate::network::{Credential, NetworkId};

/// Payment type for Cardano escrow payments.
pub const PAYMENT_TYPE: &str = "Web3CardanoV1";

const TOKEN_HEADER: &str = "token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PURCHASER_IDENTIFIER_LEN: usize = 20;
const PAY_BY_WINDOW_HOURS: i64 = 1;
const SUBMIT_RESULT_WINDOW_HOURS: i64 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Confirmed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Confirmed => "confirmed",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `POST /payment/` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub agent_identifier: String,
    pub network: String,
    pub input_hash: String,
    pub identifier_from_purchaser: String,
    pub payment_type: String,
    pub pay_by_time: String,
    pub submit_result_time: String,
}

impl CreatePaymentRequest {
    /// Build a request with deadlines relative to `now`.
    pub fn new(
        agent_identifier: &str,
        network: &str,
        input: &Value,
        identifier_from_purchaser: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            agent_identifier: agent_identifier.to_string(),
            network: network.to_string(),
            input_hash: input_hash(input),
            identifier_from_purchaser: identifier_from_purchaser.to_string(),
            payment_type: PAYMENT_TYPE.to_string(),
            pay_by_time: iso_timestamp(now + chrono::Duration::hours(PAY_BY_WINDOW_HOURS)),
            submit_result_time: iso_timestamp(
                now + chrono::Duration::hours(SUBMIT_RESULT_WINDOW_HOURS),
            ),
        }
    }
}

/// `POST /purchase/` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchaseRequest {
    pub blockchain_identifier: String,
    pub network: String,
    pub seller_vkey: String,
    pub agent_identifier: String,
    pub payment_type: String,
    pub identifier_from_purchaser: String,
    pub input_hash: String,
    pub pay_by_time: String,
    pub submit_result_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlock_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_dispute_unlock_time: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum MasumiError {
    #[error("Invalid payment service URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Payment service request failed: {0}")]
    Request(String),

    #[error("Payment service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Payment service response was invalid: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone)]
pub struct MasumiClient {
    base_url: String,
    api_key: Credential,
    http: Client,
}

impl MasumiClient {
    /// `base_url` already carries the API prefix (e.g. `.../api/v1`).
    pub fn new(base_url: &str, api_key: Credential) -> Result<Self, MasumiError> {
        url::Url::parse(base_url)
            .map_err(|e| MasumiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MasumiError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn create_payment(
        &self,
        request: &CreatePaymentRequest,
    ) -> Result<Value, MasumiError> {
        info!(
            agent_identifier = %request.agent_identifier,
            network = %request.network,
            "Creating payment request"
        );
        self.post_json("/payment/", request).await
    }

    /// Raw payment listing for one blockchain identifier.
    pub async fn fetch_payment(
        &self,
        blockchain_identifier: &str,
        network: &str,
    ) -> Result<Value, MasumiError> {
        let path = "/payment/";
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .query(&[
                ("blockchainIdentifier", blockchain_identifier),
                ("network", network),
            ])
            .header(TOKEN_HEADER, self.api_key.expose())
            .send()
            .await
            .map_err(|e| MasumiError::Request(format!("GET {path} failed: {e}")))?;

        read_json(response, "GET", path).await
    }

    pub async fn create_purchase(
        &self,
        request: &CreatePurchaseRequest,
    ) -> Result<Value, MasumiError> {
        info!(
            blockchain_identifier = %request.blockchain_identifier,
            network = %request.network,
            "Creating purchase request"
        );
        self.post_json("/purchase/", request).await
    }

    async fn post_json<T: Serialize>(&self, path: &str, payload: &T) -> Result<Value, MasumiError> {
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .header(TOKEN_HEADER, self.api_key.expose())
            .json(payload)
            .send()
            .await
            .map_err(|e| MasumiError::Request(format!("POST {path} failed: {e}")))?;

        read_json(response, "POST", path).await
    }
}

async fn read_json(
    response: reqwest::Response,
    method: &str,
    path: &str,
) -> Result<Value, MasumiError> {
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(MasumiError::Api { status, body });
    }

    let value: Value = response
        .json()
        .await
        .map_err(|e| MasumiError::InvalidResponse(format!("{method} {path} invalid JSON: {e}")))?;
    debug!(method = %method, path = %path, response = %value, "Payment service response");
    Ok(value)
}

/// Payment service network name. The service runs on mainnet and preprod only.
pub fn service_network_name(network: NetworkId) -> Option<&'static str> {
    match network {
        NetworkId::Mainnet => Some("Mainnet"),
        NetworkId::Preprod => Some("Preprod"),
        NetworkId::Preview => None,
    }
}

/// sha256 hex of the compact JSON encoding of `input`.
pub fn input_hash(input: &Value) -> String {
    hex::encode(Sha256::digest(input.to_string().as_bytes()))
}

/// Random purchaser identifier: 20 hex characters.
pub fn generate_purchaser_identifier() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(PURCHASER_IDENTIFIER_LEN);
    id
}

pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Map an on-chain state to a status. Unknown or missing states are pending.
pub fn classify_on_chain_state(state: Option<&str>) -> PaymentStatus {
    match state {
        Some("FundsLocked" | "ResultSubmitted" | "Withdrawn") => PaymentStatus::Confirmed,
        Some(
            "RefundRequested" | "Disputed" | "RefundWithdrawn" | "DisputedWithdrawn"
            | "FundsOrDatumInvalid",
        ) => PaymentStatus::Failed,
        _ => PaymentStatus::Pending,
    }
}

pub fn on_chain_state(record: &Value) -> Option<&str> {
    record.get("onChainState").and_then(Value::as_str)
}

/// Find the payment record in a listing response.
///
/// Accepted shapes: `data.payments[]`, `data.Payments[]`, `data` as the
/// record, top-level `payments[]`, or a top-level array. Within a list the
/// record with a matching `blockchainIdentifier` wins, else a sole record.
pub fn extract_payment_record<'a>(
    response: &'a Value,
    blockchain_identifier: &str,
) -> Option<&'a Value> {
    let list = response
        .pointer("/data/payments")
        .and_then(Value::as_array)
        .or_else(|| response.pointer("/data/Payments").and_then(Value::as_array))
        .or_else(|| response.get("payments").and_then(Value::as_array))
        .or_else(|| response.as_array());

    if let Some(records) = list {
        return records
            .iter()
            .find(|r| record_identifier(r) == Some(blockchain_identifier))
            .or_else(|| match records.as_slice() {
                [only] => Some(only),
                _ => None,
            });
    }

    response
        .get("data")
        .filter(|d| d.is_object())
        .filter(|d| record_identifier(d).map_or(true, |id| id == blockchain_identifier))
}

/// `blockchainIdentifier` of a create-payment or create-purchase response.
pub fn extract_blockchain_identifier(response: &Value) -> Option<&str> {
    response
        .pointer("/data/blockchainIdentifier")
        .and_then(Value::as_str)
        .or_else(|| response.get("blockchainIdentifier").and_then(Value::as_str))
}

/// Field of a create response, under `data` or at the top level.
pub fn response_field<'a>(response: &'a Value, field: &str) -> Option<&'a str> {
    response
        .get("data")
        .and_then(|d| d.get(field))
        .or_else(|| response.get(field))
        .and_then(Value::as_str)
}

fn record_identifier(record: &Value) -> Option<&str> {
    record.get("blockchainIdentifier").and_then(Value::as_str)
}
