// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Network selection and credential lookup.
//!
//! Every tool resolves exactly one [`NetworkId`] before any external call:
//!
//! 1. a host preference, when one is present;
//! 2. the `NETWORK` configuration value, when it names a known network;
//! 3. `preprod`.
//!
//! This is a precedence chain, not a merge. A `--network` flag is applied by
//! the tool drivers on top of it via [`resolve_with_override`].

use std::{fmt, fs, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{Config, ConfigError, BLOCKFROST_API_KEY_PREFIX, NETWORK_ENV, PREFERENCES_FILE_ENV};

/// Cardano network a tool talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    Mainnet,
    Preprod,
    Preview,
}

impl NetworkId {
    /// All canonical networks.
    pub const ALL: [NetworkId; 3] = [NetworkId::Mainnet, NetworkId::Preprod, NetworkId::Preview];

    /// Fallback when nothing else selects a network.
    pub const DEFAULT: NetworkId = NetworkId::Preprod;

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkId::Mainnet => "mainnet",
            NetworkId::Preprod => "preprod",
            NetworkId::Preview => "preview",
        }
    }

    /// Parse one of the three canonical names, case-insensitively.
    pub fn parse_canonical(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Some(NetworkId::Mainnet),
            "preprod" => Some(NetworkId::Preprod),
            "preview" => Some(NetworkId::Preview),
            _ => None,
        }
    }

    /// Like [`NetworkId::parse_canonical`], but also accepts `testnet`.
    ///
    /// Test networks share the same address tag, so wallet generation treats
    /// `testnet` as `preprod`.
    pub fn parse_with_testnet_alias(raw: &str) -> Option<Self> {
        if raw.trim().eq_ignore_ascii_case("testnet") {
            return Some(NetworkId::Preprod);
        }
        Self::parse_canonical(raw)
    }

    pub fn is_mainnet(&self) -> bool {
        matches!(self, NetworkId::Mainnet)
    }

    /// Network tag carried in the address header (CIP-19).
    pub fn address_tag(&self) -> u8 {
        if self.is_mainnet() {
            1
        } else {
            0
        }
    }

    /// Name of the configuration variable holding this network's credential.
    pub fn credential_variable(&self) -> String {
        format!(
            "{BLOCKFROST_API_KEY_PREFIX}{}",
            self.as_str().to_ascii_uppercase()
        )
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_canonical(s).ok_or_else(|| ConfigError::InvalidNetwork(s.to_string()))
    }
}

/// Network preference supplied by a hosting environment.
///
/// Tools running standalone see [`HostPreference::Absent`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HostPreference {
    #[default]
    Absent,
    Present(String),
}

impl HostPreference {
    /// Read the preference file named by `TOOLS_PREFERENCES_FILE`, if any.
    ///
    /// Anything short of a readable JSON object with a non-empty string
    /// `network` field yields `Absent`.
    pub fn from_config(config: &Config) -> Self {
        let Some(path) = config.get(PREFERENCES_FILE_ENV) else {
            return HostPreference::Absent;
        };

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!(path = %path, error = %e, "Host preference file not readable");
                return HostPreference::Absent;
            }
        };

        serde_json::from_str::<Value>(&contents)
            .ok()
            .and_then(|v| v.get("network").and_then(Value::as_str).map(str::to_string))
            .filter(|v| !v.trim().is_empty())
            .map(HostPreference::Present)
            .unwrap_or_default()
    }

    /// The preferred network name, when present and non-empty.
    pub fn network(&self) -> Option<&str> {
        match self {
            HostPreference::Present(value) if !value.trim().is_empty() => Some(value.as_str()),
            _ => None,
        }
    }
}

/// Resolve the network for this invocation.
///
/// An unrecognised `NETWORK` value falls through to the default instead of
/// failing.
pub fn resolve_network(config: &Config, host: &HostPreference) -> NetworkId {
    if let Some(preferred) = host.network() {
        match NetworkId::parse_canonical(preferred) {
            Some(network) => return network,
            None => warn!(value = %preferred, "Ignoring unrecognised host network preference"),
        }
    }

    if let Some(raw) = config.get(NETWORK_ENV) {
        match NetworkId::parse_canonical(raw) {
            Some(network) => return network,
            None => debug!(value = %raw, "Unrecognised NETWORK value, using default"),
        }
    }

    NetworkId::DEFAULT
}

/// Apply a `--network` flag on top of [`resolve_network`].
///
/// A flag that is present but not canonical is an error; the caller reports
/// it as a usage problem.
pub fn resolve_with_override(
    flag: Option<&str>,
    config: &Config,
    host: &HostPreference,
) -> Result<NetworkId, ConfigError> {
    match flag {
        Some(raw) => raw.parse(),
        None => Ok(resolve_network(config, host)),
    }
}

/// Opaque API credential. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Look up the Blockfrost credential for `network`.
pub fn lookup_credential(config: &Config, network: NetworkId) -> Result<Credential, ConfigError> {
    let variable = network.credential_variable();
    config
        .get(&variable)
        .map(Credential::new)
        .ok_or(ConfigError::MissingCredential { variable })
}
