// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tool drivers.
//!
//! Every driver follows the same shape: `--help` short-circuit, required-flag
//! validation, network and credential resolution, one external call (or a
//! short fixed sequence), and a [`Report`] for stdout. Drivers never exit the
//! process themselves; binaries hand the result to [`finish`].

use std::fmt;
use std::process::ExitCode;

use tracing::debug;

use crate::{
    cli::ParsedArgs,
    config::Config,
    error::ToolError,
    logging,
    network::{resolve_with_override, HostPreference, NetworkId},
    storage::PaymentBundle,
};

pub mod balance;
pub mod payment;
pub mod purchase;
pub mod transfer;
pub mod wallet;

/// Process-wide inputs of a tool run.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    pub config: Config,
    pub host: HostPreference,
}

impl ToolContext {
    pub fn new(config: Config, host: HostPreference) -> Self {
        Self { config, host }
    }

    /// `--network` flag over the resolver chain. A bad flag is a usage error.
    pub fn resolve_network(
        &self,
        args: &ParsedArgs,
        usage: &'static str,
    ) -> Result<NetworkId, ToolError> {
        self.resolve_network_with(args.get("network"), usage)
    }

    /// Like [`ToolContext::resolve_network`] for an already chosen override.
    pub fn resolve_network_with(
        &self,
        preferred: Option<&str>,
        usage: &'static str,
    ) -> Result<NetworkId, ToolError> {
        resolve_with_override(preferred, &self.config, &self.host)
            .map_err(|e| ToolError::usage(e.to_string(), usage))
    }
}

/// Lines printed on stdout when a tool succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    lines: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// A report holding only a usage text (`--help`).
    pub fn usage(usage: &str) -> Self {
        let mut report = Self::new();
        report.line(usage);
        report
    }

    pub fn line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    /// `label: value`
    pub fn field(&mut self, label: &str, value: impl fmt::Display) -> &mut Self {
        self.line(format!("{label}: {value}"))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// True when some line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join("\n"))
    }
}

/// Value lookup across a flag, a saved payment bundle and configuration,
/// in that order.
pub(crate) struct Sources<'a> {
    pub args: &'a ParsedArgs,
    pub bundle: Option<&'a PaymentBundle>,
    pub config: &'a Config,
}

impl<'a> Sources<'a> {
    pub fn new(args: &'a ParsedArgs, bundle: Option<&'a PaymentBundle>, config: &'a Config) -> Self {
        Self {
            args,
            bundle,
            config,
        }
    }

    pub fn value(
        &self,
        flag: &str,
        from_bundle: impl FnOnce(&PaymentBundle) -> Option<String>,
        config_var: Option<&str>,
    ) -> Option<String> {
        self.args
            .get(flag)
            .map(str::to_string)
            .or_else(|| self.bundle.and_then(from_bundle))
            .or_else(|| config_var.and_then(|var| self.config.get(var)).map(str::to_string))
    }
}

/// Flags whose value is `None`, in order.
pub(crate) fn missing_values<'n>(required: &[(&'n str, &Option<String>)]) -> Vec<&'n str> {
    required
        .iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| *name)
        .collect()
}

/// Load configuration, install logging and parse the process arguments.
pub fn bootstrap(switches: &[&str]) -> Result<(ToolContext, ParsedArgs), ToolError> {
    let config = Config::load()?;
    logging::init(&config);

    let host = HostPreference::from_config(&config);
    let args = ParsedArgs::parse_with_switches(std::env::args().skip(1), switches);
    Ok((ToolContext::new(config, host), args))
}

/// Print the outcome and map it to the process exit status.
pub fn finish(result: Result<Report, ToolError>) -> ExitCode {
    match result {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            debug!(error = ?e, "Tool failed");
            eprintln!("{}", failure_text(&e));
            ExitCode::FAILURE
        }
    }
}

/// Stderr text for a failed run: the error, then any hint and usage.
pub fn failure_text(e: &ToolError) -> String {
    let mut text = format!("Error: {e}");
    if let Some(hint) = e.hint() {
        text.push_str(&format!("\nHint: {hint}"));
    }
    if let Some(usage) = e.usage_text() {
        text.push_str(&format!("\n\n{usage}"));
    }
    text
}
