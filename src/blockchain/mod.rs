// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cardano integration.
//!
//! This module provides functionality for:
//! - Querying address balances and UTxOs through Blockfrost
//! - Deriving HD wallets and Shelley addresses
//! - Building, signing and submitting ADA transfers

pub mod client;
pub mod signing;
pub mod transactions;
pub mod types;
pub mod wallet;

pub use client::{BlockfrostClient, BlockfrostError};
pub use signing::PaymentSigner;
pub use transactions::TransactionError;
pub use types::*;
pub use wallet::WalletError;
