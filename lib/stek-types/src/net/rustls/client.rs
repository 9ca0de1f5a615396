/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use rustls::ClientConfig;
use rustls::client::Resumption;
use rustls_pki_types::CertificateDer;

use super::ca_certs::build_root_store;

const DEFAULT_SESSION_CACHE_SIZE: usize = 256;

#[derive(Clone)]
pub struct RustlsClientConfig {
    pub driver: Arc<ClientConfig>,
    pub handshake_timeout: Duration,
}

/// TLS 1.3 only client config.
///
/// The in-memory session store lives inside the built [`ClientConfig`], so
/// every connection made with the same built config shares resumption state.
#[derive(Clone, Debug)]
pub struct RustlsClientConfigBuilder {
    ca_certs: Vec<CertificateDer<'static>>,
    session_cache_size: usize,
    disable_sni: bool,
    alpn_protocols: Vec<Vec<u8>>,
    handshake_timeout: Duration,
}

impl Default for RustlsClientConfigBuilder {
    fn default() -> Self {
        RustlsClientConfigBuilder {
            ca_certs: Vec::new(),
            session_cache_size: DEFAULT_SESSION_CACHE_SIZE,
            disable_sni: false,
            alpn_protocols: Vec::new(),
            handshake_timeout: Duration::from_secs(10),
        }
    }
}

impl RustlsClientConfigBuilder {
    pub fn check(&self) -> anyhow::Result<()> {
        if self.ca_certs.is_empty() {
            return Err(anyhow!("no ca certificate is set"));
        }
        Ok(())
    }

    pub fn set_ca_certificates(&mut self, certs: Vec<CertificateDer<'static>>) {
        self.ca_certs = certs;
    }

    pub fn set_no_session_cache(&mut self) {
        self.session_cache_size = 0;
    }

    pub fn set_session_cache_size(&mut self, size: usize) {
        self.session_cache_size = size;
    }

    pub fn set_disable_sni(&mut self) {
        self.disable_sni = true;
    }

    pub fn push_alpn_protocol(&mut self, protocol: &[u8]) {
        self.alpn_protocols.push(protocol.to_vec());
    }

    pub fn set_handshake_timeout(&mut self, timeout: Duration) {
        self.handshake_timeout = timeout;
    }

    pub fn build(&self) -> anyhow::Result<RustlsClientConfig> {
        let root_store = build_root_store(&self.ca_certs).context("invalid ca certificates")?;

        let mut config = ClientConfig::builder_with_provider(super::ring_provider())
            .with_protocol_versions(&[&rustls::version::TLS13])
            .map_err(|e| anyhow!("failed to set tls protocol versions: {e}"))?
            .with_root_certificates(root_store)
            .with_no_client_auth();

        config.resumption = if self.session_cache_size == 0 {
            Resumption::disabled()
        } else {
            Resumption::in_memory_sessions(self.session_cache_size)
        };
        config.enable_sni = !self.disable_sni;
        config.enable_early_data = false;
        config.alpn_protocols = self.alpn_protocols.clone();

        Ok(RustlsClientConfig {
            driver: Arc::new(config),
            handshake_timeout: self.handshake_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_ca_cert() {
        let builder = RustlsClientConfigBuilder::default();
        assert!(builder.check().is_err());
        assert!(builder.build().is_err());
    }

    #[test]
    fn build() {
        let generated = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let mut builder = RustlsClientConfigBuilder::default();
        builder.set_ca_certificates(vec![generated.cert.der().clone()]);
        builder.push_alpn_protocol(b"http/1.1");
        builder.check().unwrap();

        let config = builder.build().unwrap();
        assert!(config.driver.enable_sni);
        assert!(!config.driver.enable_early_data);
        assert_eq!(config.handshake_timeout, Duration::from_secs(10));
    }

    #[test]
    fn invalid_ca_cert() {
        let mut builder = RustlsClientConfigBuilder::default();
        builder.set_ca_certificates(vec![CertificateDer::from(vec![0u8; 16])]);
        assert!(builder.build().is_err());
    }
}
