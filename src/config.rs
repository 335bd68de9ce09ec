// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and the [`Config`] object
//! every tool reads them from. Configuration is assembled once at process
//! start from a `.env` file and the process environment, then passed by
//! reference to whatever needs it. Nothing below `main` reads ambient
//! environment state.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `NETWORK` | Default network (`mainnet`, `preprod`, `preview`) | `preprod` |
//! | `BLOCKFROST_API_KEY_<NETWORK>` | Blockfrost project id per network | Required for chain calls |
//! | `BLOCKFROST_BASE_URL` | Override for the Blockfrost API base URL | Per-network public URL |
//! | `PAYMENT_SERVICE_URL` | Masumi payment service base URL (with `/api/v1`) | Required for payment tools |
//! | `PAYMENT_API_KEY` | Masumi payment service API token | Required for payment tools |
//! | `AGENT_IDENTIFIER` | Registered agent identifier | Required for payment create |
//! | `SELLER_VKEY` | Seller verification key hash | Required for payment create |
//! | `TOOLS_PREFERENCES_FILE` | JSON host preference file (`{"network": ...}`) | Unset |
//! | `DOTENV_PATH` | Path of the `.env` file to load | `.env` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `warn` |

use std::{collections::HashMap, path::Path};

use tracing::debug;

/// Default `.env` file, resolved relative to the working directory.
pub const DOTENV_FILE: &str = ".env";

/// Environment variable that points at an alternative `.env` file.
///
/// Only this variable is read from the real process environment before the
/// configuration object exists.
pub const DOTENV_PATH_ENV: &str = "DOTENV_PATH";

/// Environment variable holding the default network name.
pub const NETWORK_ENV: &str = "NETWORK";

/// Prefix of the per-network Blockfrost credential variable.
///
/// The full name is the prefix followed by the upper-cased network, e.g.
/// `BLOCKFROST_API_KEY_PREPROD`.
pub const BLOCKFROST_API_KEY_PREFIX: &str = "BLOCKFROST_API_KEY_";

/// Override for the Blockfrost API base URL.
pub const BLOCKFROST_BASE_URL_ENV: &str = "BLOCKFROST_BASE_URL";

/// Masumi payment service URL.
pub const PAYMENT_SERVICE_URL_ENV: &str = "PAYMENT_SERVICE_URL";

/// Masumi payment service API token.
pub const PAYMENT_API_KEY_ENV: &str = "PAYMENT_API_KEY";

/// Agent identifier registered with the payment service.
pub const AGENT_IDENTIFIER_ENV: &str = "AGENT_IDENTIFIER";

/// Seller verification key hash.
pub const SELLER_VKEY_ENV: &str = "SELLER_VKEY";

/// Host preference file consulted before `NETWORK`.
pub const PREFERENCES_FILE_ENV: &str = "TOOLS_PREFERENCES_FILE";

/// Logging format selector.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Log level filter.
pub const RUST_LOG_ENV: &str = "RUST_LOG";

/// Errors raised while assembling or reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing credential: set {variable} in the environment or .env file")]
    MissingCredential { variable: String },

    #[error("Missing configuration: {0}")]
    MissingVariable(String),

    #[error("Invalid network `{0}`: expected mainnet, preprod or preview")]
    InvalidNetwork(String),

    #[error("Failed to load configuration: {0}")]
    Load(String),
}

/// Key/value configuration merged from `.env` and the process environment.
///
/// Process environment entries win over `.env` entries, matching the usual
/// dotenv rule that an already-set variable is never overridden.
#[derive(Debug, Clone, Default)]
pub struct Config {
    values: HashMap<String, String>,
}

impl Config {
    /// Load configuration for the current process.
    ///
    /// A missing `.env` file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        let dotenv_path =
            std::env::var(DOTENV_PATH_ENV).unwrap_or_else(|_| DOTENV_FILE.to_string());
        let dotenv = read_dotenv(Path::new(&dotenv_path))?;

        let process = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)));

        Ok(Self::from_sources(dotenv, process))
    }

    /// Merge two sources; entries from `process` override entries from `dotenv`.
    pub fn from_sources<D, P>(dotenv: D, process: P) -> Self
    where
        D: IntoIterator<Item = (String, String)>,
        P: IntoIterator<Item = (String, String)>,
    {
        let mut values: HashMap<String, String> = dotenv.into_iter().collect();
        let dotenv_count = values.len();
        values.extend(process);
        debug!(dotenv_entries = dotenv_count, total = values.len(), "Configuration loaded");
        Self { values }
    }

    /// Build a configuration from literal pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Trimmed, non-empty value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Like [`Config::get`], but a missing value is an error naming the variable.
    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
    }
}

fn read_dotenv(path: &Path) -> Result<Vec<(String, String)>, ConfigError> {
    match dotenvy::from_path_iter(path) {
        Ok(iter) => iter
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display()))),
        Err(e) if e.not_found() => Ok(Vec::new()),
        Err(e) => Err(ConfigError::Load(format!("{}: {e}", path.display()))),
    }
}
