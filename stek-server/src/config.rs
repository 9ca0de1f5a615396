/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use tokio::sync::watch;

use stek_types::net::{
    RustlsCertificatePair, RustlsServerConfigBuilder, RustlsTicketer, TicketKeyMaterial,
};

use crate::ticket::TicketKeyRotate;

pub const DEFAULT_RESPONSE_BODY: &str = "Hello, secure world with custom session ticket keys!";

const DEFAULT_TICKET_KEY_COUNT: usize = 2;
const DEFAULT_TICKET_LIFETIME: u32 = 2 * 60 * 60; // 2h
const DEFAULT_MAX_TICKET_KEYS: usize = 3;
const DEFAULT_MAX_HEADER_SIZE: usize = 16 * 1024;
const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct TicketKeyConfig {
    pub(crate) keys: Vec<TicketKeyMaterial>,
    pub(crate) lifetime: u32,
    pub(crate) rotate_interval: Option<Duration>,
    pub(crate) max_keys: usize,
}

impl Default for TicketKeyConfig {
    fn default() -> Self {
        TicketKeyConfig {
            keys: Vec::new(),
            lifetime: DEFAULT_TICKET_LIFETIME,
            rotate_interval: None,
            max_keys: DEFAULT_MAX_TICKET_KEYS,
        }
    }
}

impl TicketKeyConfig {
    /// Use these keys, the first one encrypts new tickets.
    pub fn set_keys(&mut self, keys: Vec<TicketKeyMaterial>) {
        self.keys = keys;
    }

    pub fn set_random_keys(&mut self, count: usize) -> anyhow::Result<()> {
        if count == 0 {
            return Err(anyhow!("at least 1 ticket key should be generated"));
        }
        let keys = (0..count)
            .map(|_| TicketKeyMaterial::random())
            .collect::<anyhow::Result<Vec<_>>>()
            .context("failed to generate random ticket keys")?;
        self.keys = keys;
        Ok(())
    }

    pub fn set_lifetime(&mut self, lifetime: u32) {
        self.lifetime = lifetime;
    }

    pub fn set_rotate_interval(&mut self, interval: Duration) {
        self.rotate_interval = Some(interval);
    }

    pub fn set_max_keys(&mut self, max: usize) {
        self.max_keys = max;
    }

    pub fn lifetime(&self) -> u32 {
        self.lifetime
    }

    pub fn check(&self) -> anyhow::Result<()> {
        if self.lifetime == 0 {
            return Err(anyhow!("ticket lifetime should not be 0"));
        }
        if self.max_keys == 0 {
            return Err(anyhow!("max ticket keys should not be 0"));
        }
        if let Some(interval) = self.rotate_interval {
            if interval.is_zero() {
                return Err(anyhow!("ticket key rotate interval should not be 0"));
            }
        }
        Ok(())
    }

    /// Build the ticketer, and spawn the rotate task if needed.
    ///
    /// This should be called inside a tokio runtime. The rotate task quits
    /// when the sender of `quit` is dropped.
    pub(crate) fn build_and_spawn_rotate(
        &self,
        quit: watch::Receiver<()>,
    ) -> anyhow::Result<Arc<RustlsTicketer>> {
        let keys = if self.keys.is_empty() {
            let mut keys = Vec::with_capacity(DEFAULT_TICKET_KEY_COUNT);
            for _ in 0..DEFAULT_TICKET_KEY_COUNT {
                keys.push(TicketKeyMaterial::random()?);
            }
            keys
        } else {
            self.keys.clone()
        };
        let ticketer = RustlsTicketer::from_materials(&keys, self.lifetime)
            .context("failed to build session ticketer")?;
        let ticketer = Arc::new(ticketer);

        if let Some(interval) = self.rotate_interval {
            TicketKeyRotate::new(
                ticketer.clone(),
                self.lifetime,
                interval,
                self.max_keys,
                quit,
            )
            .spawn_run();
        }
        Ok(ticketer)
    }
}

pub struct StekServerConfig {
    pub(crate) listen: SocketAddr,
    pub(crate) tls: RustlsServerConfigBuilder,
    pub(crate) ticket: Option<TicketKeyConfig>,
    pub(crate) response_body: String,
    pub(crate) max_header_size: usize,
    pub(crate) max_body_size: usize,
    pub(crate) request_timeout: Duration,
}

impl StekServerConfig {
    pub fn new(listen: SocketAddr, cert_pair: RustlsCertificatePair) -> Self {
        let mut tls = RustlsServerConfigBuilder::empty();
        tls.set_cert_pair(cert_pair);
        StekServerConfig {
            listen,
            tls,
            ticket: Some(TicketKeyConfig::default()),
            response_body: DEFAULT_RESPONSE_BODY.to_string(),
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn listen(&self) -> SocketAddr {
        self.listen
    }

    pub fn tls_mut(&mut self) -> &mut RustlsServerConfigBuilder {
        &mut self.tls
    }

    pub fn set_ticket(&mut self, ticket: TicketKeyConfig) {
        self.ticket = Some(ticket);
    }

    /// Disable stateless session tickets.
    pub fn set_no_ticket(&mut self) {
        self.ticket = None;
    }

    pub fn set_response_body(&mut self, body: String) {
        self.response_body = body;
    }

    pub fn set_max_body_size(&mut self, size: usize) {
        self.max_body_size = size;
    }

    /// Max time to wait for the next request header on an established connection.
    pub fn set_request_timeout(&mut self, timeout: Duration) {
        self.request_timeout = timeout;
    }

    pub fn check(&self) -> anyhow::Result<()> {
        self.tls.check()?;
        if self.request_timeout.is_zero() {
            return Err(anyhow!("request timeout should not be 0"));
        }
        if let Some(ticket) = &self.ticket {
            ticket.check().context("invalid ticket key config")?;
        }
        Ok(())
    }
}
