// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `create-purchase`: lock funds for a payment request.

use std::path::Path;

use chrono::Utc;
use tracing::info;

use super::payment::{bundle_network, service_network, to_json};
use super::{missing_values, Report, Sources, ToolContext};
use crate::{
    cli::ParsedArgs,
    config::{AGENT_IDENTIFIER_ENV, PAYMENT_API_KEY_ENV, PAYMENT_SERVICE_URL_ENV, SELLER_VKEY_ENV},
    error::ToolError,
    network::Credential,
    providers::masumi::{
        classify_on_chain_state, extract_blockchain_identifier, response_field,
        CreatePurchaseRequest, MasumiClient, PAYMENT_TYPE,
    },
    storage::{BundleConfig, PaymentBundle},
};

pub const USAGE: &str = "\
Usage: create-purchase --file <payment.json> [--api-key <key>] [--output-file <path>]
       create-purchase --payment-service-url <url> --api-key <key>
                       --blockchain-identifier <id> --agent-identifier <id>
                       --seller-vkey <vkey> --pay-by-time <time>
                       --submit-result-time <time> --input-hash <hash>
                       --identifier <purchaser-id> [--unlock-time <time>]
                       [--external-dispute-unlock-time <time>]
                       [--network mainnet|preprod] [--output-file <path>]

Flags override values loaded from --file. Environment fallbacks:
PAYMENT_SERVICE_URL, PAYMENT_API_KEY, AGENT_IDENTIFIER, SELLER_VKEY.";

pub async fn run(ctx: &ToolContext, args: &ParsedArgs) -> Result<Report, ToolError> {
    if args.help_requested() {
        return Ok(Report::usage(USAGE));
    }

    let bundle = args.get("file").map(PaymentBundle::load).transpose()?;
    let sources = Sources::new(args, bundle.as_ref(), &ctx.config);

    let url = sources.value(
        "payment-service-url",
        |b| b.config.payment_service_url.clone(),
        Some(PAYMENT_SERVICE_URL_ENV),
    );
    let api_key = sources.value("api-key", |_| None, Some(PAYMENT_API_KEY_ENV));
    let blockchain_identifier = sources.value(
        "blockchain-identifier",
        |b| b.field("blockchainIdentifier"),
        None,
    );
    let agent = sources.value(
        "agent-identifier",
        |b| {
            b.config
                .agent_identifier
                .clone()
                .or_else(|| b.field("agentIdentifier"))
        },
        Some(AGENT_IDENTIFIER_ENV),
    );
    let seller_vkey = sources.value(
        "seller-vkey",
        |b| b.config.seller_vkey.clone(),
        Some(SELLER_VKEY_ENV),
    );
    let pay_by_time = sources.value("pay-by-time", |b| b.field("payByTime"), None);
    let submit_result_time =
        sources.value("submit-result-time", |b| b.field("submitResultTime"), None);
    let input_hash = sources.value("input-hash", |b| b.field("inputHash"), None);
    let identifier = sources.value(
        "identifier",
        |b| b.field("identifierFromPurchaser"),
        None,
    );

    let missing = missing_values(&[
        ("payment-service-url", &url),
        ("api-key", &api_key),
        ("blockchain-identifier", &blockchain_identifier),
        ("agent-identifier", &agent),
        ("seller-vkey", &seller_vkey),
        ("pay-by-time", &pay_by_time),
        ("submit-result-time", &submit_result_time),
        ("input-hash", &input_hash),
        ("identifier", &identifier),
    ]);
    let (
        Some(url),
        Some(api_key),
        Some(blockchain_identifier),
        Some(agent),
        Some(seller_vkey),
        Some(pay_by_time),
        Some(submit_result_time),
        Some(input_hash),
        Some(identifier),
    ) = (
        url,
        api_key,
        blockchain_identifier,
        agent,
        seller_vkey,
        pay_by_time,
        submit_result_time,
        input_hash,
        identifier,
    )
    else {
        return Err(ToolError::missing_flags(&missing, USAGE));
    };

    let network = bundle_network(ctx, &sources, USAGE)?;
    let service_name = service_network(network, USAGE)?;

    let request = CreatePurchaseRequest {
        blockchain_identifier,
        network: service_name.to_string(),
        seller_vkey,
        agent_identifier: agent,
        payment_type: PAYMENT_TYPE.to_string(),
        identifier_from_purchaser: identifier,
        input_hash,
        pay_by_time,
        submit_result_time,
        unlock_time: sources.value("unlock-time", |b| b.field("unlockTime"), None),
        external_dispute_unlock_time: sources.value(
            "external-dispute-unlock-time",
            |b| b.field("externalDisputeUnlockTime"),
            None,
        ),
    };

    let client = MasumiClient::new(&url, Credential::new(api_key))?;
    let response = client.create_purchase(&request).await?;

    let purchase_id = response_field(&response, "id");
    let state = response_field(&response, "onChainState");
    info!(
        purchase_id = purchase_id.unwrap_or("-"),
        blockchain_identifier = %request.blockchain_identifier,
        "Purchase created"
    );

    let mut report = Report::new();
    report
        .line("Purchase created")
        .field("Network", service_name)
        .field("Purchase id", purchase_id.unwrap_or("(not returned)"))
        .field(
            "Blockchain identifier",
            extract_blockchain_identifier(&response)
                .unwrap_or(request.blockchain_identifier.as_str()),
        )
        .field("On-chain state", state.unwrap_or("(none)"))
        .field("Status", classify_on_chain_state(state));

    if let Some(output) = args.get("output-file") {
        let config = BundleConfig {
            payment_service_url: Some(client.base_url().to_string()),
            agent_identifier: Some(request.agent_identifier.clone()),
            seller_vkey: Some(request.seller_vkey.clone()),
            network: Some(network.as_str().to_string()),
        };
        let payment_data = to_json(&request, Path::new(output))?;
        PaymentBundle::new(config, payment_data, response, Utc::now()).save(output)?;
        report.field("Saved", output);
    }

    Ok(report)
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

    fn payment_bundle(server_url: &str) -> PaymentBundle {
        PaymentBundle::new(
            BundleConfig {
                payment_service_url: Some(format!("{server_url}/api/v1")),
                agent_identifier: Some("agent-1".to_string()),
                seller_vkey: Some("vkey-1".to_string()),
                network: Some("preprod".to_string()),
            },
            json!({
                "agentIdentifier": "agent-1",
                "inputHash": "hash-1",
                "identifierFromPurchaser": "abc123",
                "payByTime": "2025-01-01T01:00:00.000Z",
                "submitResultTime": "2025-01-01T12:00:00.000Z"
            }),
            json!({ "status": "success", "data": {
                "blockchainIdentifier": "bc-42",
                "payByTime": "1735693200000",
                "submitResultTime": "1735732800000",
                "unlockTime": "1735754400000",
                "externalDisputeUnlockTime": "1735776000000"
            } }),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn purchase_from_bundle() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/purchase/")
            .match_header("token", "buyer-key")
            .match_body(Matcher::PartialJson(json!({
                "blockchainIdentifier": "bc-42",
                "network": "Preprod",
                "sellerVkey": "vkey-1",
                "agentIdentifier": "agent-1",
                "paymentType": "Web3CardanoV1",
                "identifierFromPurchaser": "abc123",
                "inputHash": "hash-1",
                "payByTime": "1735693200000",
                "unlockTime": "1735754400000",
                "externalDisputeUnlockTime": "1735776000000"
            })))
            .with_status(200)
            .with_body(r#"{"status":"success","data":{"id":"purchase-7","blockchainIdentifier":"bc-42","onChainState":null}}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("payment.json");
        payment_bundle(&server.url()).save(&file).unwrap();
        let file_arg = file.display().to_string();

        let ctx = context(vec![("PAYMENT_API_KEY", "buyer-key".to_string())]);
        let report = run(&ctx, &ParsedArgs::parse(["--file", file_arg.as_str()]))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(report.contains("Purchase id: purchase-7"));
        assert!(report.contains("Status: pending"));
    }

    #[tokio::test]
    async fn flags_override_bundle_values() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/purchase/")
            .match_body(Matcher::PartialJson(json!({
                "blockchainIdentifier": "bc-override",
                "sellerVkey": "vkey-1"
            })))
            .with_status(200)
            .with_body(r#"{"data":{"id":"p-1","onChainState":"FundsLocked"}}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("payment.json");
        payment_bundle(&server.url()).save(&file).unwrap();
        let file_arg = file.display().to_string();

        let ctx = context(vec![("PAYMENT_API_KEY", "buyer-key".to_string())]);
        let args = ParsedArgs::parse([
            "--file",
            file_arg.as_str(),
            "--blockchain-identifier",
            "bc-override",
        ]);
        let report = run(&ctx, &args).await.unwrap();

        mock.assert_async().await;
        assert!(report.contains("Status: confirmed"));
        assert!(report.contains("Blockchain identifier: bc-override"));
    }

    #[tokio::test]
    async fn missing_inputs_are_listed() {
        let ctx = context(vec![("PAYMENT_API_KEY", "k".to_string())]);
        let err = run(&ctx, &ParsedArgs::parse(["--blockchain-identifier", "bc-1"]))
            .await
            .unwrap_err();
        let message = err.to_string();
        for flag in [
            "--payment-service-url",
            "--agent-identifier",
            "--seller-vkey",
            "--pay-by-time",
            "--submit-result-time",
            "--input-hash",
            "--identifier",
        ] {
            assert!(message.contains(flag), "{flag} missing from {message}");
        }
        assert!(!message.contains("--api-key"));
    }

    #[tokio::test]
    async fn unreadable_bundle_is_an_error() {
        let err = run(
            &ToolContext::default(),
            &ParsedArgs::parse(["--file", "/nonexistent/payment.json"]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ToolError::Storage(_)));
    }
}
