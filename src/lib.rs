// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Masumi Cardano Tools - command-line utilities for Cardano and Masumi
//!
//! Library behind the `check-balance`, `create-wallet`, `send-ada`,
//! `create-payment`, `check-payment` and `create-purchase` binaries.
//!
//! ## Modules
//!
//! - `blockchain` - Blockfrost client, HD wallets, transaction building
//! - `cli` - Flag parsing shared by every tool
//! - `config` - `.env` and process environment loading
//! - `network` - Network selection and credential lookup
//! - `providers` - Masumi payment service client
//! - `storage` - Wallet artifacts and payment bundle files
//! - `tools` - One driver per binary

pub mod blockchain;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod network;
pub mod providers;
pub mod storage;
pub mod tools;
