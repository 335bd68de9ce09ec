// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `create-wallet`: new mnemonic, base address and key hash, saved to disk.

use chrono::Utc;
use tracing::info;

use super::{Report, ToolContext};
use crate::{
    blockchain::wallet::generate_wallet,
    cli::ParsedArgs,
    error::ToolError,
    network::NetworkId,
    storage::{paths::DEFAULT_OUTPUT_DIR, ArtifactPaths, WalletArtifacts},
};

pub const DEFAULT_WALLET_NAME: &str = "wallet";
pub const DEFAULT_WORD_COUNT: u32 = 24;
const SUPPORTED_WORD_COUNTS: [u32; 3] = [12, 15, 24];

pub const USAGE: &str = "\
Usage: create-wallet [--name <prefix>] [--network mainnet|preprod|preview|testnet]
                     [--output-dir <dir>] [--words 12|15|24]

Writes <prefix>_<timestamp>.mnemonic, .addr and .vkey to the output directory.
Existing files are never overwritten.";

pub async fn run(ctx: &ToolContext, args: &ParsedArgs) -> Result<Report, ToolError> {
    if args.help_requested() {
        return Ok(Report::usage(USAGE));
    }

    let name = args.get("name").unwrap_or(DEFAULT_WALLET_NAME);
    if name.contains(['/', '\\']) {
        return Err(ToolError::usage(
            format!("Invalid --name `{name}`: must not contain path separators"),
            USAGE,
        ));
    }

    let network = match args.get("network") {
        Some(raw) => NetworkId::parse_with_testnet_alias(raw).ok_or_else(|| {
            ToolError::usage(
                format!("Invalid network `{raw}`: expected mainnet, preprod, preview or testnet"),
                USAGE,
            )
        })?,
        None => ctx.resolve_network_with(None, USAGE)?,
    };

    let words = match args.get("words") {
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|w| SUPPORTED_WORD_COUNTS.contains(w))
            .ok_or_else(|| {
                ToolError::usage(format!("Invalid --words `{raw}`: expected 12, 15 or 24"), USAGE)
            })?,
        None => DEFAULT_WORD_COUNT,
    };

    let paths = ArtifactPaths::new(args.get("output-dir").unwrap_or(DEFAULT_OUTPUT_DIR));

    let wallet = generate_wallet(network, words)?;
    let artifacts = WalletArtifacts::save(&paths, name, &wallet, Utc::now())?;
    info!(network = %network, words, "Wallet created");

    let mut report = Report::new();
    report
        .field("Network", network)
        .field("Address", &wallet.address)
        .field("Verification key hash", &wallet.vkey_hash)
        .field("Mnemonic file", artifacts.mnemonic.display())
        .field("Address file", artifacts.address.display())
        .field("Key hash file", artifacts.vkey.display())
        .line("Keep the mnemonic file private: it controls the funds at this address.");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::network::HostPreference;
    use std::fs;

    fn args_in(dir: &std::path::Path, extra: &[&str]) -> ParsedArgs {
        let mut all = vec!["--output-dir".to_string(), dir.display().to_string()];
        all.extend(extra.iter().map(|s| s.to_string()));
        ParsedArgs::parse(all)
    }

    #[tokio::test]
    async fn creates_wallet_files_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let report = run(&ToolContext::default(), &args_in(dir.path(), &[]))
            .await
            .unwrap();

        assert!(report.contains("Network: preprod"));
        assert!(report.contains("Address: addr_test1"));

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names.len(), 3);
        assert!(names.iter().all(|n| n.starts_with("wallet_")));

        let mnemonic_file = names.iter().find(|n| n.ends_with(".mnemonic")).unwrap();
        let phrase = fs::read_to_string(dir.path().join(mnemonic_file)).unwrap();
        assert_eq!(phrase.split_whitespace().count(), 24);
    }

    #[tokio::test]
    async fn testnet_alias_and_word_count() {
        let dir = tempfile::tempdir().unwrap();
        let args = args_in(
            dir.path(),
            &["--network", "testnet", "--words", "12", "--name", "buyer"],
        );
        let report = run(&ToolContext::default(), &args).await.unwrap();

        assert!(report.contains("Network: preprod"));
        assert!(report.contains("buyer_"));
    }

    #[tokio::test]
    async fn mainnet_from_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ToolContext::new(
            Config::from_pairs([("NETWORK", "mainnet")]),
            HostPreference::Absent,
        );
        let report = run(&ctx, &args_in(dir.path(), &[])).await.unwrap();
        assert!(report.contains("Address: addr1"));
    }

    #[tokio::test]
    async fn invalid_inputs_are_usage_errors() {
        let dir = tempfile::tempdir().unwrap();
        for extra in [
            vec!["--words", "13"],
            vec!["--network", "devnet"],
            vec!["--name", "../escape"],
        ] {
            let err = run(&ToolContext::default(), &args_in(dir.path(), &extra))
                .await
                .unwrap_err();
            assert_eq!(err.usage_text(), Some(USAGE), "{extra:?}");
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
