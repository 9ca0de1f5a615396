/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::IpAddr;
use std::time::Duration;

use anyhow::anyhow;
use url::Url;

use stek_types::net::RustlsClientConfigBuilder;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_HEADER_SIZE: usize = 16 * 1024;
const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

pub struct StekClientConfig {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) path: String,
    pub(crate) tls_name: Option<String>,
    pub(crate) tls: RustlsClientConfigBuilder,
    pub(crate) timeout: Duration,
    pub(crate) resolve: Option<IpAddr>,
    pub(crate) max_header_size: usize,
    pub(crate) max_body_size: usize,
}

impl StekClientConfig {
    pub fn new(url: &Url) -> anyhow::Result<Self> {
        if url.scheme() != "https" {
            return Err(anyhow!("unsupported url scheme {}", url.scheme()));
        }
        let host = url
            .host_str()
            .ok_or_else(|| anyhow!("no host found in url {url}"))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| anyhow!("no port found in url {url}"))?;

        let mut path = url.path().to_string();
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }

        Ok(StekClientConfig {
            host: host.to_string(),
            port,
            path,
            tls_name: None,
            tls: RustlsClientConfigBuilder::default(),
            timeout: DEFAULT_TIMEOUT,
            resolve: None,
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn tls_mut(&mut self) -> &mut RustlsClientConfigBuilder {
        &mut self.tls
    }

    /// Verify the server certificate with this name instead of the url host.
    pub fn set_tls_name(&mut self, name: String) {
        self.tls_name = Some(name);
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Connect to this address instead of resolving the url host.
    pub fn set_resolve(&mut self, ip: IpAddr) {
        self.resolve = Some(ip);
    }

    pub(crate) fn tls_name(&self) -> &str {
        self.tls_name.as_deref().unwrap_or_else(|| {
            // ipv6 host in url is enclosed in brackets
            self.host.trim_start_matches('[').trim_end_matches(']')
        })
    }

    pub(crate) fn host_header(&self) -> String {
        if self.port == 443 {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_url() {
        let url = Url::parse("https://localhost:8443").unwrap();
        let config = StekClientConfig::new(&url).unwrap();
        assert_eq!(config.host(), "localhost");
        assert_eq!(config.port(), 8443);
        assert_eq!(config.path, "/");
        assert_eq!(config.tls_name(), "localhost");
        assert_eq!(config.host_header(), "localhost:8443");

        let url = Url::parse("https://example.net/hello?a=b").unwrap();
        let config = StekClientConfig::new(&url).unwrap();
        assert_eq!(config.port(), 443);
        assert_eq!(config.path, "/hello?a=b");
        assert_eq!(config.host_header(), "example.net");
    }

    #[test]
    fn ipv6_host() {
        let url = Url::parse("https://[::1]:8443/").unwrap();
        let mut config = StekClientConfig::new(&url).unwrap();
        assert_eq!(config.tls_name(), "::1");
        assert_eq!(config.host_header(), "[::1]:8443");

        config.set_tls_name("localhost".to_string());
        assert_eq!(config.tls_name(), "localhost");
    }

    #[test]
    fn invalid_url() {
        let url = Url::parse("http://localhost:8443").unwrap();
        assert!(StekClientConfig::new(&url).is_err());
    }
}
