// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Payment-output bundle shared by the payment and purchase tools.
//!
//! ```text
//! {
//!   "config":      { paymentServiceUrl, agentIdentifier, sellerVkey, network },
//!   "paymentData": request body that was sent,
//!   "response":    raw service response,
//!   "createdAt":   ISO-8601 UTC
//! }
//! ```
//!
//! The API key is never part of the bundle.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::files::{read_json, write_json, StorageResult};

/// Resolved configuration recorded with a payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_vkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBundle {
    #[serde(default)]
    pub config: BundleConfig,
    #[serde(default)]
    pub payment_data: Value,
    #[serde(default)]
    pub response: Value,
    #[serde(default)]
    pub created_at: String,
}

impl PaymentBundle {
    pub fn new(
        config: BundleConfig,
        payment_data: Value,
        response: Value,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            config,
            payment_data,
            response,
            created_at: created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> StorageResult<Self> {
        read_json(path)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> StorageResult<()> {
        write_json(path, self)
    }

    /// Look up a payment field: the service response (under `data` or at the
    /// top level) first, then the request that was sent. Numbers are
    /// returned in decimal form.
    pub fn field(&self, name: &str) -> Option<String> {
        [
            self.response.get("data").and_then(|d| d.get(name)),
            self.response.get(name),
            self.payment_data.get(name),
        ]
        .into_iter()
        .flatten()
        .find_map(scalar_string)
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
