/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::process::ExitCode;

use anyhow::Context;

use stek_client::opts::ProcArgs;
use stek_client::{ResumptionStats, StekClient};

fn main() -> anyhow::Result<ExitCode> {
    let args = stek_client::opts::command().get_matches();
    let proc_args = stek_client::opts::parse_clap(&args)?;

    let _log_guard = stek_stdlog::setup_process_logger(proc_args.verbose_level)
        .context("failed to setup logger")?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    rt.block_on(run(proc_args))
}

async fn run(proc_args: ProcArgs) -> anyhow::Result<ExitCode> {
    let client = StekClient::new(&proc_args.client)?;
    let mut stats = ResumptionStats::default();

    for i in 0..proc_args.requests {
        if i > 0 && !proc_args.interval.is_zero() {
            tokio::time::sleep(proc_args.interval).await;
        }

        match client.get().await {
            Ok(outcome) => {
                println!("Response from server: {}", outcome.body_text());
                println!(
                    "  status: {}, session reused: {}, protocol: {}, cipher suite: {}",
                    outcome.status, outcome.session_reused, outcome.protocol, outcome.cipher_suite
                );
                stats.add_outcome(&outcome);
            }
            Err(e) => {
                eprintln!("Request {} failed: {e:?}", i + 1);
                stats.add_failed();
            }
        }
    }

    stats.summary();
    if stats.failed > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
