// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Artifact Storage Module
//!
//! Local files written and read by the tools.
//!
//! ## Layout
//!
//! ```text
//! <output-dir>/
//!   <name>_<timestamp>.mnemonic   # BIP39 phrase (mode 0600, never overwritten)
//!   <name>_<timestamp>.addr       # bech32 base address
//!   <name>_<timestamp>.vkey       # payment verification key hash (hex)
//!
//! <output-file>                   # payment-output bundle (pretty JSON)
//! ```

pub mod bundle;
pub mod files;
pub mod paths;
pub mod wallet;

pub use bundle::{BundleConfig, PaymentBundle};
pub use files::{StorageError, StorageResult};
pub use paths::ArtifactPaths;
pub use wallet::WalletArtifacts;
