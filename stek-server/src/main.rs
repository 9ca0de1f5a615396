/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use anyhow::Context;
use log::{info, warn};

use stek_server::StekServer;
use stek_server::opts::ProcArgs;

fn main() -> anyhow::Result<()> {
    let args = stek_server::opts::command().get_matches();
    let proc_args = stek_server::opts::parse_clap(&args)?;

    let _log_guard = stek_stdlog::setup_process_logger(proc_args.verbose_level)
        .context("failed to setup logger")?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    rt.block_on(run(proc_args))
}

async fn run(proc_args: ProcArgs) -> anyhow::Result<()> {
    let server = StekServer::bind(&proc_args.server).await?;
    if let Some(ticketer) = server.ticketer() {
        info!(
            "session ticket enabled with {} keys",
            ticketer.decrypt_key_count()
        );
    }
    println!("Starting server on https://{}", server.local_addr());

    let stats = server.stats().clone();
    server
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for ctrl-c: {e}");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    let s = stats.snapshot();
    info!(
        "accepted {} connections ({} accept errors), {} full handshakes, {} resumed, \
         {} failed, {} requests",
        s.accepted, s.accept_failed, s.full_handshake, s.resumed, s.handshake_failed, s.requests
    );
    Ok(())
}
