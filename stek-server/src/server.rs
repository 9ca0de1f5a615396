/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use log::{debug, info, warn};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_rustls::TlsAcceptor;

use stek_types::net::{ALPN_HTTP_1_1, RustlsTicketer, TicketKeyMaterial, TicketKeyName};

use crate::serve::ServeContext;
use crate::{ServerStats, StekServerConfig};

/// Handle to change the ticket keys of a running server.
#[derive(Clone)]
pub struct StekServerHandle {
    ticketer: Option<Arc<RustlsTicketer>>,
    ticket_lifetime: u32,
    stats: Arc<ServerStats>,
}

impl StekServerHandle {
    pub fn ticketer(&self) -> Option<&Arc<RustlsTicketer>> {
        self.ticketer.as_ref()
    }

    pub fn stats(&self) -> &Arc<ServerStats> {
        &self.stats
    }

    fn get_ticketer(&self) -> anyhow::Result<&RustlsTicketer> {
        self.ticketer
            .as_deref()
            .ok_or_else(|| anyhow!("session ticket is disabled"))
    }

    /// Set a new random encrypt key. Old keys are still accepted for
    /// decryption, as long as at most `max_keys` keys are kept.
    pub fn rotate_ticket_keys(&self, max_keys: usize) -> anyhow::Result<TicketKeyName> {
        let ticketer = self.get_ticketer()?;
        let name = crate::ticket::rotate_ticket_key(ticketer, self.ticket_lifetime, max_keys)?;
        info!("ticket key rotated, new encrypt key {name}");
        Ok(name)
    }

    /// Replace all ticket keys, tickets encrypted by other keys will be rejected.
    pub fn replace_ticket_keys(&self, keys: &[TicketKeyMaterial]) -> anyhow::Result<()> {
        let ticketer = self.get_ticketer()?;
        ticketer
            .replace_materials(keys, self.ticket_lifetime)
            .context("failed to replace ticket keys")?;
        info!("ticket keys replaced, {} keys in use", keys.len());
        Ok(())
    }
}

const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

pub struct StekServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    ctx: Arc<ServeContext>,
    handle: StekServerHandle,
    _quit_sender: watch::Sender<()>,
}

impl StekServer {
    pub async fn bind(config: &StekServerConfig) -> anyhow::Result<Self> {
        config.check()?;

        // background tasks quit when the server is dropped
        let (quit_sender, quit_receiver) = watch::channel(());

        let mut tls_builder = config.tls.clone();
        let ticketer = match &config.ticket {
            Some(ticket_config) => {
                let ticketer = ticket_config.build_and_spawn_rotate(quit_receiver)?;
                tls_builder.set_ticketer(ticketer.clone());
                Some(ticketer)
            }
            None => {
                tls_builder.set_no_session_ticket();
                None
            }
        };
        tls_builder.push_alpn_protocol(ALPN_HTTP_1_1);
        let tls_config = tls_builder
            .build()
            .context("failed to build tls server config")?;

        let listener = TcpListener::bind(config.listen)
            .await
            .context(format!("failed to listen on {}", config.listen))?;
        let local_addr = listener
            .local_addr()
            .context("failed to get listen address")?;

        let stats = Arc::new(ServerStats::default());
        let ctx = ServeContext {
            tls_acceptor: TlsAcceptor::from(tls_config.driver),
            accept_timeout: tls_config.accept_timeout,
            response_body: config.response_body.clone(),
            max_header_size: config.max_header_size,
            max_body_size: config.max_body_size,
            request_timeout: config.request_timeout,
            stats: stats.clone(),
        };

        let handle = StekServerHandle {
            ticketer,
            ticket_lifetime: config.ticket.as_ref().map(|c| c.lifetime()).unwrap_or(0),
            stats,
        };

        Ok(StekServer {
            listener,
            local_addr,
            ctx: Arc::new(ctx),
            handle,
            _quit_sender: quit_sender,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn handle(&self) -> StekServerHandle {
        self.handle.clone()
    }

    pub fn ticketer(&self) -> Option<&Arc<RustlsTicketer>> {
        self.handle.ticketer()
    }

    pub fn stats(&self) -> &Arc<ServerStats> {
        self.handle.stats()
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Connections already accepted are left to finish on their own tasks.
    pub async fn run<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut shutdown = std::pin::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("shutdown requested, stop listening on {}", self.local_addr);
                    break;
                }
                r = self.listener.accept() => {
                    match r {
                        Ok((stream, peer_addr)) => {
                            self.ctx.stats.add_accepted();
                            debug!("new connection from {peer_addr}");
                            let ctx = self.ctx.clone();
                            tokio::spawn(async move {
                                ctx.serve(stream, peer_addr).await;
                            });
                        }
                        Err(e) => self.handle_accept_error(e).await,
                    }
                }
            }
        }
        Ok(())
    }

    async fn handle_accept_error(&self, e: io::Error) {
        self.ctx.stats.add_accept_failed();
        warn!("failed to accept new connection: {e}");
        // mostly out of fd, wait for some connections to close
        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
    }
}
