// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `check-balance`: ADA and asset balance of an address.

use tracing::info;

use super::{Report, ToolContext};
use crate::{
    blockchain::{AddressBalance, BlockfrostClient},
    cli::ParsedArgs,
    error::ToolError,
    network::{lookup_credential, NetworkId},
};

pub const USAGE: &str = "\
Usage: check-balance --address <addr> [--network mainnet|preprod|preview]
       check-balance <addr>

Environment:
  BLOCKFROST_API_KEY_<NETWORK>  Blockfrost project id for the selected network
  NETWORK                       Default network (preprod when unset)";

pub async fn run(ctx: &ToolContext, args: &ParsedArgs) -> Result<Report, ToolError> {
    if args.help_requested() {
        return Ok(Report::usage(USAGE));
    }

    let address = args
        .get("address")
        .or_else(|| args.first_positional())
        .ok_or_else(|| ToolError::missing_flags(&["address"], USAGE))?;

    let network = ctx.resolve_network(args, USAGE)?;
    let credential = lookup_credential(&ctx.config, network)?;
    let client = BlockfrostClient::from_config(&ctx.config, network, credential)?;

    info!(address = %address, network = %network, "Checking balance");
    let balance = client.address_balance(address).await?;

    Ok(balance_report(network, &balance))
}

pub fn balance_report(network: NetworkId, balance: &AddressBalance) -> Report {
    let mut report = Report::new();
    report
        .field("Network", network)
        .field("Address", &balance.address)
        .field("ADA balance", balance.ada())
        .field("Lovelace", balance.lovelace);

    let assets = balance.asset_lines();
    if !assets.is_empty() {
        report.line("Other assets:");
        for asset in assets {
            report.line(format!("  {asset}"));
        }
    }
    report
}
