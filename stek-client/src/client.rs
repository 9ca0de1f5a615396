/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use http::Method;
use log::debug;
use rustls_pki_types::ServerName;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use stek_http::{HttpRequestHead, HttpResponseHead};
use stek_types::net::{ALPN_HTTP_1_1, RustlsConnectionExt};

use crate::StekClientConfig;

const HEADER_SESSION_REUSED: &str = "x-session-reused";

#[derive(Debug)]
pub struct RequestOutcome {
    pub status: u16,
    pub body: Vec<u8>,
    /// the tls handshake of this request resumed a previous session
    pub session_reused: bool,
    pub protocol: String,
    pub cipher_suite: String,
    /// the value of the X-Session-Reused response header, if present
    pub server_reports_reused: Option<bool>,
}

impl RequestOutcome {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

/// HTTPS client that opens a new connection for every request.
///
/// All connections share the same session store, so a later connection
/// may resume the session of an earlier one.
pub struct StekClient {
    host: String,
    port: u16,
    path: String,
    host_header: String,
    resolve: Option<SocketAddr>,
    tls_name: ServerName<'static>,
    tls_connector: TlsConnector,
    handshake_timeout: Duration,
    timeout: Duration,
    max_header_size: usize,
    max_body_size: usize,
}

impl StekClient {
    pub fn new(config: &StekClientConfig) -> anyhow::Result<Self> {
        let mut tls_builder = config.tls.clone();
        tls_builder.push_alpn_protocol(ALPN_HTTP_1_1);
        tls_builder.check().context("invalid tls config")?;
        let tls_config = tls_builder
            .build()
            .context("failed to build tls client config")?;

        let tls_name = ServerName::try_from(config.tls_name().to_string())
            .map_err(|e| anyhow!("invalid tls name {}: {e}", config.tls_name()))?;

        Ok(StekClient {
            host: config.host.clone(),
            port: config.port,
            path: config.path.clone(),
            host_header: config.host_header(),
            resolve: config.resolve.map(|ip| SocketAddr::new(ip, config.port)),
            tls_name,
            tls_connector: TlsConnector::from(tls_config.driver),
            handshake_timeout: tls_config.handshake_timeout,
            timeout: config.timeout,
            max_header_size: config.max_header_size,
            max_body_size: config.max_body_size,
        })
    }

    async fn resolve(&self) -> anyhow::Result<SocketAddr> {
        if let Some(addr) = self.resolve {
            return Ok(addr);
        }
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        let mut addrs = tokio::net::lookup_host((host, self.port))
            .await
            .map_err(|e| anyhow!("failed to resolve address for {}: {e:?}", self.host))?;
        addrs
            .next()
            .ok_or_else(|| anyhow!("no resolved address for {}", self.host))
    }

    /// Send a GET request over a new TLS connection.
    pub async fn get(&self) -> anyhow::Result<RequestOutcome> {
        let peer = self.resolve().await?;
        self.get_from(peer).await
    }

    /// Send a GET request over a new TLS connection to `peer`, which may be
    /// any server instance serving the same url.
    pub async fn get_from(&self, peer: SocketAddr) -> anyhow::Result<RequestOutcome> {
        match tokio::time::timeout(self.timeout, self.do_get(peer)).await {
            Ok(r) => r,
            Err(_) => Err(anyhow!("timeout to get response from {peer}")),
        }
    }

    async fn do_get(&self, peer: SocketAddr) -> anyhow::Result<RequestOutcome> {
        let tcp_stream = TcpStream::connect(peer)
            .await
            .context(format!("failed to connect to {peer}"))?;

        let tls_stream = match tokio::time::timeout(
            self.handshake_timeout,
            self.tls_connector.connect(self.tls_name.clone(), tcp_stream),
        )
        .await
        {
            Ok(Ok(s)) => s,
            Ok(Err(e)) => return Err(anyhow!("tls handshake with {peer} failed: {e}")),
            Err(_) => return Err(anyhow!("tls handshake with {peer} timed out")),
        };

        let (_, conn) = tls_stream.get_ref();
        let session_reused = conn.session_reused();
        let protocol = conn.protocol_name();
        let cipher_suite = conn.cipher_suite_name();
        debug!(
            "{} handshake with {peer}, protocol: {protocol}, cipher suite: {cipher_suite}",
            if session_reused { "resumed" } else { "full" }
        );

        let mut stream = BufReader::new(tls_stream);

        let mut req = HttpRequestHead::new_outgoing(Method::GET, &self.path, &self.host_header);
        req.set_no_keep_alive();
        stream
            .write_all(&req.serialize())
            .await
            .context("failed to send request")?;
        stream.flush().await.context("failed to send request")?;

        let rsp = HttpResponseHead::parse(&mut stream, &Method::GET, self.max_header_size)
            .await
            .context("failed to read response header")?;
        let body = match rsp.body_type(&Method::GET) {
            Some(body_type) => stek_http::read_body(&mut stream, body_type, self.max_body_size)
                .await
                .context("failed to read response body")?,
            None => Vec::new(),
        };

        let server_reports_reused = rsp
            .header_str(HEADER_SESSION_REUSED)
            .map(|v| v.eq_ignore_ascii_case("true"));

        // send close_notify, so the connection ends cleanly on the server side
        if let Err(e) = stream.shutdown().await {
            debug!("failed to shutdown connection to {peer}: {e}");
        }

        Ok(RequestOutcome {
            status: rsp.code,
            body,
            session_reused,
            protocol,
            cipher_suite,
            server_reports_reused,
        })
    }
}
