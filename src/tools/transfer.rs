// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `send-ada`: build, sign and submit an ADA payment.

use std::path::Path;

use tracing::{debug, info};

use super::{Report, ToolContext};
use crate::{
    blockchain::{
        transactions::{build_payment, parse_ada_amount, PaymentPlan, DEFAULT_TTL_SLOTS},
        types::{format_ada, NetworkConfig},
        wallet::decode_address,
        BlockfrostClient, BlockfrostError, PaymentSigner, TransactionError,
    },
    cli::ParsedArgs,
    error::ToolError,
    network::lookup_credential,
};

/// Value-less switches understood by this tool.
pub const SWITCHES: &[&str] = &["dry-run"];

pub const USAGE: &str = "\
Usage: send-ada --recipient <addr> --amount <ada>
                (--mnemonic <phrase-or-file> | --skey-file <path> | --skey <hex>)
                [--network mainnet|preprod|preview] [--dry-run]

When several signing methods are given, --mnemonic wins over --skey-file,
which wins over --skey.";

/// How the signing key is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningMethod<'a> {
    Mnemonic(&'a str),
    SkeyFile(&'a str),
    Skey(&'a str),
}

impl SigningMethod<'_> {
    pub fn flag(&self) -> &'static str {
        match self {
            SigningMethod::Mnemonic(_) => "--mnemonic",
            SigningMethod::SkeyFile(_) => "--skey-file",
            SigningMethod::Skey(_) => "--skey",
        }
    }

    pub fn load(&self) -> Result<PaymentSigner, ToolError> {
        let signer = match self {
            SigningMethod::Mnemonic(source) => PaymentSigner::from_mnemonic_source(source)?,
            SigningMethod::SkeyFile(path) => PaymentSigner::from_skey_file(Path::new(path))?,
            SigningMethod::Skey(hex) => PaymentSigner::from_skey_hex(hex)?,
        };
        Ok(signer)
    }
}

/// All signing methods present on the command line, highest precedence first.
pub fn signing_methods(args: &ParsedArgs) -> Vec<SigningMethod<'_>> {
    [
        args.get("mnemonic").map(SigningMethod::Mnemonic),
        args.get("skey-file").map(SigningMethod::SkeyFile),
        args.get("skey").map(SigningMethod::Skey),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Warning naming the signing method used and the ones ignored, when
/// more than one was given.
pub fn precedence_warning(methods: &[SigningMethod<'_>]) -> Option<String> {
    let (used, ignored) = methods.split_first()?;
    if ignored.is_empty() {
        return None;
    }
    let ignored: Vec<&str> = ignored.iter().map(|m| m.flag()).collect();
    Some(format!(
        "Warning: using {} and ignoring {}",
        used.flag(),
        ignored.join(", ")
    ))
}

pub async fn run(ctx: &ToolContext, args: &ParsedArgs) -> Result<Report, ToolError> {
    if args.help_requested() {
        return Ok(Report::usage(USAGE));
    }

    let methods = signing_methods(args);
    let mut missing: Vec<String> = args
        .missing(&["recipient", "amount"])
        .into_iter()
        .map(|name| format!("--{name}"))
        .collect();
    if methods.is_empty() {
        missing.push("one of --mnemonic, --skey-file, --skey".to_string());
    }
    if !missing.is_empty() {
        return Err(ToolError::usage(
            format!("Missing required flag(s): {}", missing.join(", ")),
            USAGE,
        ));
    }

    let (Some(recipient), Some(raw_amount), Some(method)) =
        (args.get("recipient"), args.get("amount"), methods.first())
    else {
        return Err(ToolError::missing_flags(&["recipient", "amount"], USAGE));
    };

    let amount = parse_ada_amount(raw_amount).map_err(|e| ToolError::usage(e.to_string(), USAGE))?;
    let network = ctx.resolve_network(args, USAGE)?;
    let recipient_bytes = decode_address(recipient, network)?;

    let warning = precedence_warning(&methods);
    if let Some(warning) = &warning {
        debug!(warning = %warning, "Several signing methods given");
    }
    let signer = method.load()?;
    let sender = signer.sender_address(network)?;
    let sender_bytes = decode_address(&sender, network)?;

    let credential = lookup_credential(&ctx.config, network)?;
    let client = BlockfrostClient::from_config(&ctx.config, network, credential)?;

    let utxos = client.address_utxos(&sender).await?;
    if utxos.is_empty() {
        return Err(TransactionError::InsufficientFunds {
            required: amount,
            available: 0,
        }
        .into());
    }

    let slot = client
        .latest_block()
        .await?
        .slot
        .ok_or_else(|| BlockfrostError::InvalidResponse("latest block has no slot".to_string()))?;
    let params = client.protocol_parameters().await?;

    let plan = PaymentPlan {
        recipient: &recipient_bytes,
        change_address: &sender_bytes,
        amount,
        ttl: slot + DEFAULT_TTL_SLOTS,
    };
    let tx = build_payment(&utxos, &plan, &params, &signer)?;

    let mut report = Report::new();
    if let Some(warning) = warning {
        report.line(warning);
    }
    report
        .field("Network", network)
        .field("From", &sender)
        .field("To", recipient)
        .field("Amount", format!("{} ADA", format_ada(amount)))
        .field("Fee", format!("{} ADA", format_ada(tx.fee)));

    if args.switch("dry-run") {
        report
            .field("Transaction hash", &tx.tx_hash)
            .field("Size", format!("{} bytes", tx.cbor.len()))
            .line("Dry run: transaction not submitted.");
        return Ok(report);
    }

    let tx_hash = client.submit_transaction(&tx.cbor).await?;
    info!(tx_hash = %tx_hash, amount, fee = tx.fee, "ADA sent");

    report
        .field("Transaction hash", &tx_hash)
        .field(
            "Explorer",
            NetworkConfig::for_network(network).transaction_url(&tx_hash),
        );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::wallet::enterprise_address;
    use crate::config::{Config, BLOCKFROST_BASE_URL_ENV};
    use crate::network::{HostPreference, NetworkId};
    use mockito::{Matcher, Server};

    const SEED_HEX: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
    const PHRASE: &str = "test walk nut penalty hip pave soap entry language right filter choice";

    fn recipient() -> String {
        enterprise_address(&[7u8; 28], NetworkId::Preprod).unwrap()
    }

    fn sender() -> String {
        PaymentSigner::from_skey_hex(SEED_HEX)
            .unwrap()
            .sender_address(NetworkId::Preprod)
            .unwrap()
    }

    fn context(server: &Server) -> ToolContext {
        ToolContext::new(
            Config::from_pairs([
                ("BLOCKFROST_API_KEY_PREPROD", "preprodKey".to_string()),
                (BLOCKFROST_BASE_URL_ENV, server.url()),
            ]),
            HostPreference::Absent,
        )
    }

    async fn mock_chain(server: &mut Server, sender: &str) -> Vec<mockito::Mock> {
        let utxos = format!(
            r#"[{{"tx_hash":"{}","output_index":0,"amount":[{{"unit":"lovelace","quantity":"20000000"}}]}}]"#,
            "ab".repeat(32)
        );
        vec![
            server
                .mock("GET", format!("/addresses/{sender}/utxos").as_str())
                .match_query(Matcher::Any)
                .with_status(200)
                .with_body(utxos)
                .create_async()
                .await,
            server
                .mock("GET", "/blocks/latest")
                .with_status(200)
                .with_body(r#"{"hash":"h","slot":1000,"height":5}"#)
                .create_async()
                .await,
            server
                .mock("GET", "/epochs/latest/parameters")
                .with_status(200)
                .with_body(
                    r#"{"min_fee_a":44,"min_fee_b":155381,"max_tx_size":16384,"coins_per_utxo_size":"4310"}"#,
                )
                .create_async()
                .await,
        ]
    }

    #[test]
    fn signing_precedence_is_mnemonic_then_file_then_hex() {
        let args = ParsedArgs::parse(["--skey", "aa", "--skey-file", "k.skey", "--mnemonic", "m"]);
        let methods = signing_methods(&args);
        assert_eq!(
            methods,
            vec![
                SigningMethod::Mnemonic("m"),
                SigningMethod::SkeyFile("k.skey"),
                SigningMethod::Skey("aa"),
            ]
        );
    }

    #[test]
    fn single_signing_method_has_no_warning() {
        let args = ParsedArgs::parse(["--skey", "aa"]);
        assert_eq!(precedence_warning(&signing_methods(&args)), None);
        assert_eq!(precedence_warning(&[]), None);
    }

    #[tokio::test]
    async fn mnemonic_and_skey_file_warn_about_precedence() {
        let mut server = Server::new_async().await;
        let sender = PaymentSigner::from_mnemonic_source(PHRASE)
            .unwrap()
            .sender_address(NetworkId::Preprod)
            .unwrap();
        let _chain = mock_chain(&mut server, &sender).await;

        let recipient = recipient();
        let args = ParsedArgs::parse_with_switches(
            [
                "--recipient",
                recipient.as_str(),
                "--amount",
                "1",
                "--mnemonic",
                PHRASE,
                "--skey-file",
                "unused.skey",
                "--dry-run",
            ],
            SWITCHES,
        );
        let report = run(&context(&server), &args).await.unwrap();

        assert!(report.contains("Warning: using --mnemonic and ignoring --skey-file"));
        assert!(report.contains(&format!("From: {sender}")));
    }

    #[tokio::test]
    async fn reports_every_missing_flag() {
        let err = run(&ToolContext::default(), &ParsedArgs::parse(["--amount", "1"]))
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("--recipient"));
        assert!(message.contains("--mnemonic"));
        assert!(!message.contains("--amount"));
    }

    #[tokio::test]
    async fn invalid_amount_is_rejected_before_any_call() {
        let args = ParsedArgs::parse(["--recipient", "addr_test1", "--amount", "0", "--skey", SEED_HEX]);
        let err = run(&ToolContext::default(), &args).await.unwrap_err();
        assert_eq!(err.usage_text(), Some(USAGE));
    }

    #[tokio::test]
    async fn recipient_on_wrong_network_is_rejected() {
        let mainnet = enterprise_address(&[7u8; 28], NetworkId::Mainnet).unwrap();
        let args = ParsedArgs::parse([
            "--recipient",
            mainnet.as_str(),
            "--amount",
            "1",
            "--skey",
            SEED_HEX,
        ]);
        let err = run(&ToolContext::default(), &args).await.unwrap_err();
        assert!(matches!(err, ToolError::Wallet(_)));
    }

    #[tokio::test]
    async fn submits_signed_transaction() {
        let mut server = Server::new_async().await;
        let _chain = mock_chain(&mut server, &sender()).await;
        let submit = server
            .mock("POST", "/tx/submit")
            .match_header("project_id", "preprodKey")
            .match_header("content-type", "application/cbor")
            .with_status(200)
            .with_body(r#""deadbeef""#)
            .create_async()
            .await;

        let recipient = recipient();
        let args = ParsedArgs::parse_with_switches(
            ["--recipient", recipient.as_str(), "--amount", "5", "--skey", SEED_HEX],
            SWITCHES,
        );
        let report = run(&context(&server), &args).await.unwrap();

        submit.assert_async().await;
        assert!(report.contains("Transaction hash: deadbeef"));
        assert!(report.contains("Amount: 5.0 ADA"));
        assert!(report.contains("preprod.cardanoscan.io/transaction/deadbeef"));
    }

    #[tokio::test]
    async fn dry_run_does_not_submit() {
        let mut server = Server::new_async().await;
        let _chain = mock_chain(&mut server, &sender()).await;
        let submit = server
            .mock("POST", "/tx/submit")
            .expect(0)
            .create_async()
            .await;

        let recipient = recipient();
        let args = ParsedArgs::parse_with_switches(
            [
                "--recipient",
                recipient.as_str(),
                "--amount",
                "2.5",
                "--skey",
                SEED_HEX,
                "--dry-run",
            ],
            SWITCHES,
        );
        let report = run(&context(&server), &args).await.unwrap();

        submit.assert_async().await;
        assert!(report.contains("Dry run"));
    }

    #[tokio::test]
    async fn empty_wallet_is_insufficient_funds() {
        let mut server = Server::new_async().await;
        let signer = PaymentSigner::from_mnemonic_source(PHRASE).unwrap();
        let sender = signer.sender_address(NetworkId::Preprod).unwrap();
        let _utxos = server
            .mock("GET", format!("/addresses/{sender}/utxos").as_str())
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let recipient = recipient();
        let args = ParsedArgs::parse([
            "--recipient",
            recipient.as_str(),
            "--amount",
            "1",
            "--mnemonic",
            PHRASE,
            "--skey",
            SEED_HEX,
        ]);
        let err = run(&context(&server), &args).await.unwrap_err();
        assert!(matches!(
            err,
            ToolError::Transaction(TransactionError::InsufficientFunds { available: 0, .. })
        ));
        assert!(err.hint().is_some());
    }
}
