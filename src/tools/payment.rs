// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `create-payment` and `check-payment` against a Masumi payment service.

use std::path::Path;

use chrono::Utc;
use serde_json::Value;
use tracing::info;

use super::{missing_values, Report, Sources, ToolContext};
use crate::{
    cli::ParsedArgs,
    config::{AGENT_IDENTIFIER_ENV, PAYMENT_API_KEY_ENV, PAYMENT_SERVICE_URL_ENV, SELLER_VKEY_ENV},
    error::ToolError,
    network::{Credential, NetworkId},
    providers::masumi::{
        classify_on_chain_state, extract_blockchain_identifier, extract_payment_record,
        generate_purchaser_identifier, on_chain_state, service_network_name,
        CreatePaymentRequest, MasumiClient,
    },
    storage::{files::write_json, BundleConfig, PaymentBundle, StorageError},
};

pub const CREATE_USAGE: &str = "\
Usage: create-payment --payment-service-url <url> --api-key <key>
                      --agent-identifier <id> --seller-vkey <vkey>
                      [--network mainnet|preprod] [--input-data <json>]
                      [--identifier <purchaser-id>] [--output-file <path>]

Environment fallbacks: PAYMENT_SERVICE_URL, PAYMENT_API_KEY, AGENT_IDENTIFIER,
SELLER_VKEY.";

pub const CHECK_USAGE: &str = "\
Usage: check-payment --file <payment.json> [--api-key <key>] [--output-file <path>]
       check-payment --payment-service-url <url> --api-key <key>
                     --blockchain-identifier <id> [--network mainnet|preprod]
                     [--output-file <path>]

Flags override values loaded from --file. Environment fallbacks:
PAYMENT_SERVICE_URL, PAYMENT_API_KEY.";

pub async fn create(ctx: &ToolContext, args: &ParsedArgs) -> Result<Report, ToolError> {
    if args.help_requested() {
        return Ok(Report::usage(CREATE_USAGE));
    }

    let sources = Sources::new(args, None, &ctx.config);
    let none = |_: &PaymentBundle| None;
    let url = sources.value("payment-service-url", none, Some(PAYMENT_SERVICE_URL_ENV));
    let api_key = sources.value("api-key", none, Some(PAYMENT_API_KEY_ENV));
    let agent = sources.value("agent-identifier", none, Some(AGENT_IDENTIFIER_ENV));
    let seller_vkey = sources.value("seller-vkey", none, Some(SELLER_VKEY_ENV));

    let missing = missing_values(&[
        ("payment-service-url", &url),
        ("api-key", &api_key),
        ("agent-identifier", &agent),
        ("seller-vkey", &seller_vkey),
    ]);
    let (Some(url), Some(api_key), Some(agent), Some(seller_vkey)) = (url, api_key, agent, seller_vkey)
    else {
        return Err(ToolError::missing_flags(&missing, CREATE_USAGE));
    };

    let network = ctx.resolve_network(args, CREATE_USAGE)?;
    let service_name = service_network(network, CREATE_USAGE)?;

    let input: Value = serde_json::from_str(args.get("input-data").unwrap_or("{}"))
        .map_err(|e| ToolError::usage(format!("Invalid --input-data JSON: {e}"), CREATE_USAGE))?;
    let identifier = args
        .get("identifier")
        .map(str::to_string)
        .unwrap_or_else(generate_purchaser_identifier);

    let request = CreatePaymentRequest::new(&agent, service_name, &input, &identifier, Utc::now());
    let client = MasumiClient::new(&url, Credential::new(api_key))?;
    let response = client.create_payment(&request).await?;

    let blockchain_identifier = extract_blockchain_identifier(&response);
    info!(
        blockchain_identifier = blockchain_identifier.unwrap_or("-"),
        "Payment created"
    );

    let mut report = Report::new();
    report
        .line("Payment request created")
        .field("Network", service_name)
        .field("Blockchain identifier", blockchain_identifier.unwrap_or("(not returned)"))
        .field("Purchaser identifier", &request.identifier_from_purchaser)
        .field("Input hash", &request.input_hash)
        .field("Pay by", &request.pay_by_time)
        .field("Submit result by", &request.submit_result_time);

    if let Some(output) = args.get("output-file") {
        let config = BundleConfig {
            payment_service_url: Some(client.base_url().to_string()),
            agent_identifier: Some(agent),
            seller_vkey: Some(seller_vkey),
            network: Some(network.as_str().to_string()),
        };
        let payment_data = to_json(&request, Path::new(output))?;
        PaymentBundle::new(config, payment_data, response, Utc::now()).save(output)?;
        report.field("Saved", output);
    }

    Ok(report)
}

pub async fn check(ctx: &ToolContext, args: &ParsedArgs) -> Result<Report, ToolError> {
    if args.help_requested() {
        return Ok(Report::usage(CHECK_USAGE));
    }

    let bundle = args.get("file").map(PaymentBundle::load).transpose()?;
    let sources = Sources::new(args, bundle.as_ref(), &ctx.config);

    let url = sources.value(
        "payment-service-url",
        |b| b.config.payment_service_url.clone(),
        Some(PAYMENT_SERVICE_URL_ENV),
    );
    // The API key is never stored in a bundle.
    let api_key = sources.value("api-key", |_| None, Some(PAYMENT_API_KEY_ENV));
    let blockchain_identifier = sources.value(
        "blockchain-identifier",
        |b| b.field("blockchainIdentifier"),
        None,
    );

    let missing = missing_values(&[
        ("payment-service-url", &url),
        ("api-key", &api_key),
        ("blockchain-identifier", &blockchain_identifier),
    ]);
    let (Some(url), Some(api_key), Some(blockchain_identifier)) = (url, api_key, blockchain_identifier)
    else {
        return Err(ToolError::missing_flags(&missing, CHECK_USAGE));
    };

    let network = bundle_network(ctx, &sources, CHECK_USAGE)?;
    let service_name = service_network(network, CHECK_USAGE)?;

    let client = MasumiClient::new(&url, Credential::new(api_key))?;
    let response = client
        .fetch_payment(&blockchain_identifier, service_name)
        .await?;

    let record = extract_payment_record(&response, &blockchain_identifier);
    let state = record.and_then(on_chain_state);
    let status = classify_on_chain_state(state);
    info!(
        blockchain_identifier = %blockchain_identifier,
        state = state.unwrap_or("-"),
        status = %status,
        "Payment checked"
    );

    let mut report = Report::new();
    report
        .field("Blockchain identifier", &blockchain_identifier)
        .field("Network", service_name)
        .field("On-chain state", state.unwrap_or("(none)"))
        .field("Status", status);
    if record.is_none() {
        report.line("No payment record returned for this identifier yet.");
    }

    if let Some(output) = args.get("output-file") {
        write_json(output, record.unwrap_or(&response))?;
        report.field("Saved", output);
    }

    Ok(report)
}

/// Network from `--network`, else the bundle's recorded network, else the
/// resolver chain.
pub(crate) fn bundle_network(
    ctx: &ToolContext,
    sources: &Sources<'_>,
    usage: &'static str,
) -> Result<NetworkId, ToolError> {
    let preferred = sources.value("network", |b| b.config.network.clone(), None);
    ctx.resolve_network_with(preferred.as_deref(), usage)
}

pub(crate) fn service_network(
    network: NetworkId,
    usage: &'static str,
) -> Result<&'static str, ToolError> {
    service_network_name(network).ok_or_else(|| {
        ToolError::usage(
            format!("Network {network} is not supported by the payment service; use mainnet or preprod"),
            usage,
        )
    })
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T, path: &Path) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|source| {
        StorageError::Json {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::network::HostPreference;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn context(pairs: Vec<(&str, String)>) -> ToolContext {
        ToolContext::new(Config::from_pairs(pairs), HostPreference::Absent)
    }

    #[tokio::test]
    async fn create_lists_all_missing_flags() {
        let err = create(&ToolContext::default(), &ParsedArgs::parse(["--api-key", "k"]))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required flag(s): --payment-service-url, --agent-identifier, --seller-vkey"
        );
    }

    #[tokio::test]
    async fn create_rejects_invalid_input_json() {
        let ctx = context(vec![
            ("PAYMENT_SERVICE_URL", "http://localhost:3001/api/v1".to_string()),
            ("PAYMENT_API_KEY", "k".to_string()),
            ("AGENT_IDENTIFIER", "agent".to_string()),
            ("SELLER_VKEY", "vkey".to_string()),
        ]);
        let err = create(&ctx, &ParsedArgs::parse(["--input-data", "{not json"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--input-data"));
        assert_eq!(err.usage_text(), Some(CREATE_USAGE));
    }

    #[tokio::test]
    async fn create_rejects_preview() {
        let ctx = context(vec![
            ("PAYMENT_SERVICE_URL", "http://localhost:3001/api/v1".to_string()),
            ("PAYMENT_API_KEY", "k".to_string()),
            ("AGENT_IDENTIFIER", "agent".to_string()),
            ("SELLER_VKEY", "vkey".to_string()),
        ]);
        let err = create(&ctx, &ParsedArgs::parse(["--network", "preview"]))
            .await
            .unwrap_err();
        assert_eq!(err.usage_text(), Some(CREATE_USAGE));
    }

    #[tokio::test]
    async fn create_posts_and_saves_bundle() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/payment/")
            .match_header("token", "svc-key")
            .match_body(Matcher::PartialJson(json!({
                "agentIdentifier": "agent-1",
                "network": "Preprod",
                "identifierFromPurchaser": "abc123",
                "inputHash": crate::providers::masumi::input_hash(&json!({"q": "hi"}))
            })))
            .with_status(200)
            .with_body(r#"{"status":"success","data":{"blockchainIdentifier":"bc-42","payByTime":"1735693200000"}}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("payment.json");
        let output_arg = output.display().to_string();
        let ctx = context(vec![
            ("PAYMENT_SERVICE_URL", format!("{}/api/v1", server.url())),
            ("PAYMENT_API_KEY", "svc-key".to_string()),
        ]);
        let args = ParsedArgs::parse([
            "--agent-identifier",
            "agent-1",
            "--seller-vkey",
            "vkey-1",
            "--identifier",
            "abc123",
            "--input-data",
            r#"{"q":"hi"}"#,
            "--output-file",
            output_arg.as_str(),
        ]);

        let report = create(&ctx, &args).await.unwrap();

        mock.assert_async().await;
        assert!(report.contains("Blockchain identifier: bc-42"));

        let bundle = PaymentBundle::load(&output).unwrap();
        assert_eq!(bundle.config.seller_vkey.as_deref(), Some("vkey-1"));
        assert_eq!(bundle.config.network.as_deref(), Some("preprod"));
        assert_eq!(bundle.field("blockchainIdentifier").as_deref(), Some("bc-42"));
        let raw = std::fs::read_to_string(&output).unwrap();
        assert!(!raw.contains("svc-key"));
    }

    #[tokio::test]
    async fn check_reads_bundle_and_classifies() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/payment/")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("blockchainIdentifier".into(), "bc-42".into()),
                Matcher::UrlEncoded("network".into(), "Mainnet".into()),
            ]))
            .match_header("token", "svc-key")
            .with_status(200)
            .with_body(r#"{"data":{"payments":[{"blockchainIdentifier":"bc-42","onChainState":"RefundRequested"}]}}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("payment.json");
        PaymentBundle::new(
            BundleConfig {
                payment_service_url: Some(format!("{}/api/v1", server.url())),
                network: Some("mainnet".to_string()),
                ..BundleConfig::default()
            },
            json!({}),
            json!({ "data": { "blockchainIdentifier": "bc-42" } }),
            Utc::now(),
        )
        .save(&file)
        .unwrap();

        let record_file = dir.path().join("record.json");
        let file_arg = file.display().to_string();
        let record_arg = record_file.display().to_string();
        let ctx = context(vec![("PAYMENT_API_KEY", "svc-key".to_string())]);
        let args = ParsedArgs::parse([
            "--file",
            file_arg.as_str(),
            "--output-file",
            record_arg.as_str(),
        ]);

        let report = check(&ctx, &args).await.unwrap();

        mock.assert_async().await;
        assert!(report.contains("On-chain state: RefundRequested"));
        assert!(report.contains("Status: failed"));
        let saved: Value = serde_json::from_str(&std::fs::read_to_string(&record_file).unwrap()).unwrap();
        assert_eq!(saved["onChainState"], "RefundRequested");
    }

    #[tokio::test]
    async fn check_without_record_is_pending() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/payment/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data":{"payments":[]}}"#)
            .create_async()
            .await;

        let ctx = context(vec![
            ("PAYMENT_SERVICE_URL", format!("{}/api/v1", server.url())),
            ("PAYMENT_API_KEY", "svc-key".to_string()),
        ]);
        let args = ParsedArgs::parse(["--blockchain-identifier", "bc-1"]);
        let report = check(&ctx, &args).await.unwrap();

        assert!(report.contains("Status: pending"));
        assert!(report.contains("Network: Preprod"));
    }

    #[tokio::test]
    async fn check_requires_identifier() {
        let ctx = context(vec![
            ("PAYMENT_SERVICE_URL", "http://localhost:3001".to_string()),
            ("PAYMENT_API_KEY", "k".to_string()),
        ]);
        let err = check(&ctx, &ParsedArgs::default()).await.unwrap_err();
        assert!(err.to_string().contains("--blockchain-identifier"));
    }
}
