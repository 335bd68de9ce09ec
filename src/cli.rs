// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `--flag value` argument extraction shared by every tool.
//!
//! Scanning is linear. A `--flag` followed by another token takes that token
//! as its value and both are skipped; a trailing `--flag` is dropped without
//! error. Unknown flags are kept. Required-flag validation is left to the
//! tool drivers.

use std::collections::{HashMap, HashSet};

use crate::config::Config;

/// Switches every tool understands. They never take a value.
pub const HELP_SWITCHES: [&str; 2] = ["--help", "-h"];

/// Parsed command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    flags: HashMap<String, String>,
    switches: HashSet<String>,
    positionals: Vec<String>,
}

impl ParsedArgs {
    /// Parse with only the help switches treated as value-less.
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::parse_with_switches(args, &[])
    }

    /// Parse, treating each name in `switches` (without `--`) as a boolean
    /// switch that does not consume the next token.
    pub fn parse_with_switches<I, S>(args: I, switches: &[&str]) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = args.into_iter().map(Into::into).collect();
        let mut parsed = ParsedArgs::default();
        let mut i = 0;

        while i < tokens.len() {
            let token = &tokens[i];

            if HELP_SWITCHES.contains(&token.as_str()) {
                parsed.switches.insert("help".to_string());
                i += 1;
                continue;
            }

            match token.strip_prefix("--") {
                Some(name) if switches.contains(&name) => {
                    parsed.switches.insert(name.to_string());
                    i += 1;
                }
                Some(name) => {
                    if let Some(value) = tokens.get(i + 1) {
                        parsed.flags.insert(name.to_string(), value.clone());
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
                None => {
                    parsed.positionals.push(token.clone());
                    i += 1;
                }
            }
        }

        parsed
    }

    /// All recorded `--flag value` pairs, keyed without the leading dashes.
    pub fn flags(&self) -> &HashMap<String, String> {
        &self.flags
    }

    /// Trimmed, non-empty value of `--name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.flags
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Value of `--name`, falling back to configuration variable `var`.
    pub fn get_or_config<'a>(&'a self, name: &str, config: &'a Config, var: &str) -> Option<&'a str> {
        self.get(name).or_else(|| config.get(var))
    }

    pub fn switch(&self, name: &str) -> bool {
        self.switches.contains(name)
    }

    pub fn help_requested(&self) -> bool {
        self.switch("help")
    }

    pub fn positionals(&self) -> &[String] {
        &self.positionals
    }

    /// First bare token, used by the legacy balance-check form.
    pub fn first_positional(&self) -> Option<&str> {
        self.positionals.first().map(String::as_str)
    }

    /// Required flags that have no value, in the order given.
    pub fn missing<'r>(&self, required: &[&'r str]) -> Vec<&'r str> {
        required
            .iter()
            .copied()
            .filter(|name| self.get(name).is_none())
            .collect()
    }
}
