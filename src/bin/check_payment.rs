// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use masumi_tools::tools::{self, payment};

#[tokio::main]
async fn main() -> ExitCode {
    let (ctx, args) = match tools::bootstrap(&[]) {
        Ok(parts) => parts,
        Err(e) => return tools::finish(Err(e)),
    };
    tools::finish(payment::check(&ctx, &args).await)
}
