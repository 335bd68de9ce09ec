// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use crate::{
    blockchain::{BlockfrostError, TransactionError, WalletError},
    config::ConfigError,
    providers::masumi::MasumiError,
    storage::StorageError,
};

const HINT_ALREADY_SPENT: &str =
    "inputs were already spent; wait for the previous transaction to settle and retry";
const HINT_BLOCKFROST_KEY: &str =
    "check that the Blockfrost API key belongs to the selected network";
const HINT_INSUFFICIENT_FUNDS: &str = "fund the sender address or lower --amount";
const HINT_PAYMENT_AUTH: &str = "check --api-key or PAYMENT_API_KEY";
const HINT_PAYMENT_UNREACHABLE: &str =
    "check that the payment service is running at --payment-service-url";
const HINT_MISSING_CREDENTIAL: &str = "add it to .env or export it in the environment";

/// Failure of one tool invocation. Every variant exits with status 1.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{message}")]
    Usage {
        message: String,
        usage: &'static str,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Blockfrost(#[from] BlockfrostError),

    #[error(transparent)]
    Masumi(#[from] MasumiError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ToolError {
    pub fn usage(message: impl Into<String>, usage: &'static str) -> Self {
        Self::Usage {
            message: message.into(),
            usage,
        }
    }

    /// Usage error listing every missing flag in order.
    pub fn missing_flags(missing: &[&str], usage: &'static str) -> Self {
        let flags = missing
            .iter()
            .map(|name| format!("--{name}"))
            .collect::<Vec<_>>()
            .join(", ");
        Self::usage(format!("Missing required flag(s): {flags}"), usage)
    }

    /// Usage text to print after the error, for usage errors.
    pub fn usage_text(&self) -> Option<&'static str> {
        match self {
            ToolError::Usage { usage, .. } => Some(*usage),
            _ => None,
        }
    }

    /// Short suggestion for recognised failure patterns.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ToolError::Blockfrost(BlockfrostError::Api { body, .. })
                if body.contains("already spent") || body.contains("BadInputsUTxO") =>
            {
                Some(HINT_ALREADY_SPENT)
            }
            ToolError::Blockfrost(BlockfrostError::Api { status: 403, .. }) => {
                Some(HINT_BLOCKFROST_KEY)
            }
            ToolError::Transaction(TransactionError::InsufficientFunds { .. }) => {
                Some(HINT_INSUFFICIENT_FUNDS)
            }
            ToolError::Masumi(MasumiError::Api {
                status: 401 | 403, ..
            }) => Some(HINT_PAYMENT_AUTH),
            ToolError::Masumi(MasumiError::Request(_)) => Some(HINT_PAYMENT_UNREACHABLE),
            ToolError::Config(ConfigError::MissingCredential { .. }) => {
                Some(HINT_MISSING_CREDENTIAL)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USAGE: &str = "Usage: tool --a <x>";

    #[test]
    fn missing_flags_lists_all_in_order() {
        let err = ToolError::missing_flags(&["recipient", "amount"], USAGE);
        assert_eq!(
            err.to_string(),
            "Missing required flag(s): --recipient, --amount"
        );
        assert_eq!(err.usage_text(), Some(USAGE));
    }

    #[test]
    fn spent_inputs_get_retry_hint() {
        let err = ToolError::from(BlockfrostError::Api {
            status: 400,
            body: r#"{"message":"ConwayUtxowFailure (BadInputsUTxO ...)"}"#.to_string(),
        });
        assert_eq!(err.hint(), Some(HINT_ALREADY_SPENT));
        assert_eq!(err.usage_text(), None);
    }

    #[test]
    fn known_patterns_map_to_hints() {
        let forbidden = ToolError::from(BlockfrostError::Api {
            status: 403,
            body: "Invalid project token.".to_string(),
        });
        assert_eq!(forbidden.hint(), Some(HINT_BLOCKFROST_KEY));

        let unauthorized = ToolError::from(MasumiError::Api {
            status: 401,
            body: "Unauthorized".to_string(),
        });
        assert_eq!(unauthorized.hint(), Some(HINT_PAYMENT_AUTH));

        let funds = ToolError::from(TransactionError::InsufficientFunds {
            required: 2,
            available: 1,
        });
        assert_eq!(funds.hint(), Some(HINT_INSUFFICIENT_FUNDS));

        let missing = ToolError::from(ConfigError::MissingCredential {
            variable: "BLOCKFROST_API_KEY_PREPROD".to_string(),
        });
        assert_eq!(missing.hint(), Some(HINT_MISSING_CREDENTIAL));
        assert!(missing.to_string().contains("BLOCKFROST_API_KEY_PREPROD"));
    }

    #[test]
    fn other_errors_have_no_hint() {
        let err = ToolError::from(BlockfrostError::Api {
            status: 500,
            body: "boom".to_string(),
        });
        assert_eq!(err.hint(), None);
    }
}
