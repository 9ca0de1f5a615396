/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use rustls::ServerConfig;
use rustls::server::ProducesTickets;

use super::{RustlsCertificatePair, RustlsServerConfigExt};

const DEFAULT_SEND_TLS13_TICKETS: usize = 2;

#[derive(Clone)]
pub struct RustlsServerConfig {
    pub driver: Arc<ServerConfig>,
    pub accept_timeout: Duration,
}

/// TLS 1.3 only server config.
#[derive(Clone)]
pub struct RustlsServerConfigBuilder {
    cert_pair: Option<RustlsCertificatePair>,
    ticketer: Option<Arc<dyn ProducesTickets>>,
    session_cache_size: usize,
    send_tls13_tickets: usize,
    alpn_protocols: Vec<Vec<u8>>,
    accept_timeout: Duration,
}

impl Default for RustlsServerConfigBuilder {
    fn default() -> Self {
        RustlsServerConfigBuilder::empty()
    }
}

impl RustlsServerConfigBuilder {
    pub fn empty() -> Self {
        RustlsServerConfigBuilder {
            cert_pair: None,
            ticketer: None,
            session_cache_size: 0,
            send_tls13_tickets: DEFAULT_SEND_TLS13_TICKETS,
            alpn_protocols: Vec::new(),
            accept_timeout: Duration::from_secs(10),
        }
    }

    pub fn check(&self) -> anyhow::Result<()> {
        if self.cert_pair.is_none() {
            return Err(anyhow!("no cert pair is set"));
        }

        Ok(())
    }

    pub fn set_cert_pair(&mut self, cert_pair: RustlsCertificatePair) {
        self.cert_pair = Some(cert_pair);
    }

    pub fn set_ticketer(&mut self, ticketer: Arc<dyn ProducesTickets>) {
        self.ticketer = Some(ticketer);
    }

    pub fn set_no_session_ticket(&mut self) {
        self.ticketer = None;
    }

    pub fn set_session_cache_size(&mut self, size: usize) {
        self.session_cache_size = size;
    }

    pub fn set_send_tls13_tickets(&mut self, count: usize) {
        self.send_tls13_tickets = count;
    }

    pub fn push_alpn_protocol(&mut self, protocol: &[u8]) {
        self.alpn_protocols.push(protocol.to_vec());
    }

    pub fn set_accept_timeout(&mut self, timeout: Duration) {
        self.accept_timeout = timeout;
    }

    fn resumption_enabled(&self) -> bool {
        let ticket_enabled = self.ticketer.as_ref().map(|t| t.enabled()).unwrap_or(false);
        ticket_enabled || self.session_cache_size > 0
    }

    pub fn build(&self) -> anyhow::Result<RustlsServerConfig> {
        let Some(cert_pair) = &self.cert_pair else {
            return Err(anyhow!("no cert pair set"));
        };

        let config_builder = ServerConfig::builder_with_provider(super::ring_provider())
            .with_protocol_versions(&[&rustls::version::TLS13])
            .map_err(|e| anyhow!("failed to set tls protocol versions: {e}"))?
            .with_no_client_auth();

        let (certs, key) = cert_pair.clone().into_inner();
        let mut config = config_builder
            .with_single_cert(certs, key)
            .map_err(|e| anyhow!("failed to set server cert pair: {e}"))?;

        config.set_session_cache(self.session_cache_size);
        config.set_session_ticketer(self.ticketer.clone());
        config.send_tls13_tickets = if self.resumption_enabled() {
            self.send_tls13_tickets
        } else {
            0
        };
        config.max_early_data_size = 0;
        config.alpn_protocols = self.alpn_protocols.clone();

        Ok(RustlsServerConfig {
            driver: Arc::new(config),
            accept_timeout: self.accept_timeout,
        })
    }
}
