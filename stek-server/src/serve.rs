/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http::{HeaderName, HeaderValue, Method, StatusCode, header};
use log::{debug, info, warn};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use stek_http::{HttpRequestHead, HttpRequestParseError, HttpResponseHead};
use stek_types::net::RustlsConnectionExt;

use crate::ServerStats;

pub const HEADER_SESSION_REUSED: HeaderName = HeaderName::from_static("x-session-reused");

pub(crate) struct ServeContext {
    pub(crate) tls_acceptor: tokio_rustls::TlsAcceptor,
    pub(crate) accept_timeout: Duration,
    pub(crate) response_body: String,
    pub(crate) max_header_size: usize,
    pub(crate) max_body_size: usize,
    pub(crate) request_timeout: Duration,
    pub(crate) stats: Arc<ServerStats>,
}

impl ServeContext {
    pub(crate) async fn serve(self: Arc<Self>, stream: TcpStream, peer_addr: SocketAddr) {
        let tls_stream = match tokio::time::timeout(
            self.accept_timeout,
            self.tls_acceptor.accept(stream),
        )
        .await
        {
            Ok(Ok(s)) => s,
            Ok(Err(e)) => {
                self.stats.add_handshake_failed();
                warn!("tls handshake with {peer_addr} failed: {e}");
                return;
            }
            Err(_) => {
                self.stats.add_handshake_failed();
                warn!("tls handshake with {peer_addr} timed out");
                return;
            }
        };

        let (_, conn) = tls_stream.get_ref();
        let session_reused = conn.session_reused();
        self.stats.add_handshake(session_reused);
        info!(
            "{} handshake with {peer_addr}, protocol: {}, cipher suite: {}",
            if session_reused { "resumed" } else { "full" },
            conn.protocol_name(),
            conn.cipher_suite_name(),
        );

        if let Err(e) = self.serve_http(tls_stream, session_reused).await {
            debug!("connection from {peer_addr} closed with error: {e:?}");
        }
    }

    async fn serve_http<S>(&self, stream: S, session_reused: bool) -> anyhow::Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut stream = BufReader::new(stream);

        loop {
            let parse = HttpRequestHead::parse(&mut stream, self.max_header_size);
            let req = match tokio::time::timeout(self.request_timeout, parse).await {
                Ok(Ok(req)) => req,
                Ok(Err(HttpRequestParseError::ClientClosed)) => break,
                Ok(Err(e)) => {
                    if let Some(status) = e.status_code() {
                        send_error_response(&mut stream, status).await?;
                    }
                    return Err(e.into());
                }
                Err(_) => {
                    debug!("no request received in {:?}", self.request_timeout);
                    break;
                }
            };
            self.stats.add_request();
            debug!("{} {}", req.method, req.uri);

            if let Some(body_type) = req.body_type() {
                if let Err(e) =
                    stek_http::read_body(&mut stream, body_type, self.max_body_size).await
                {
                    if let Some(status) = e.status_code() {
                        send_error_response(&mut stream, status).await?;
                    }
                    return Err(e.into());
                }
            }

            let keep_alive = req.keep_alive();
            let rsp = self.build_response(session_reused, keep_alive);
            stream.write_all(&rsp.serialize()).await?;
            if req.method != Method::HEAD {
                stream.write_all(self.response_body.as_bytes()).await?;
            }
            stream.flush().await?;

            if !keep_alive {
                break;
            }
        }

        stream.shutdown().await?;
        Ok(())
    }

    fn build_response(&self, session_reused: bool, keep_alive: bool) -> HttpResponseHead {
        let mut rsp = HttpResponseHead::new_outgoing(
            StatusCode::OK,
            self.response_body.len() as u64,
            keep_alive,
        );
        rsp.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        let reused = if session_reused { "true" } else { "false" };
        rsp.headers
            .insert(HEADER_SESSION_REUSED, HeaderValue::from_static(reused));
        rsp
    }
}

async fn send_error_response<S>(stream: &mut S, status: StatusCode) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    let rsp = HttpResponseHead::new_outgoing(status, 0, false);
    stream.write_all(&rsp.serialize()).await?;
    stream.shutdown().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustls::pki_types::PrivateKeyDer;
    use stek_types::net::{RustlsCertificatePairBuilder, RustlsServerConfigBuilder};
    use tokio::io::AsyncReadExt;

    fn new_context() -> ServeContext {
        let generated =
            rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let key = PrivateKeyDer::try_from(generated.key_pair.serialize_der()).unwrap();
        let mut builder = RustlsCertificatePairBuilder::default();
        builder.set_certs(vec![generated.cert.der().clone()]);
        builder.set_key(key);
        let mut tls = RustlsServerConfigBuilder::empty();
        tls.set_cert_pair(builder.build().unwrap());
        let tls = tls.build().unwrap();

        ServeContext {
            tls_acceptor: tokio_rustls::TlsAcceptor::from(tls.driver),
            accept_timeout: tls.accept_timeout,
            response_body: "hello".to_string(),
            max_header_size: 1024,
            max_body_size: 1024,
            request_timeout: Duration::from_secs(5),
            stats: Arc::new(ServerStats::default()),
        }
    }

    #[tokio::test]
    async fn keep_alive_requests() {
        let ctx = new_context();
        let (client, server) = tokio::io::duplex(4096);
        let server_task = tokio::spawn(async move { ctx.serve_http(server, true).await });

        let (mut r, mut w) = tokio::io::split(client);
        w.write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        w.write_all(
            b"POST / HTTP/1.1\r\nHost: localhost\r\n\
              Content-Length: 3\r\nConnection: close\r\n\r\nabc",
        )
        .await
        .unwrap();

        let mut buf = Vec::new();
        r.read_to_end(&mut buf).await.unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.matches("HTTP/1.1 200 OK\r\n").count(), 2);
        assert_eq!(text.matches("x-session-reused: true\r\n").count(), 2);
        assert!(text.contains("Connection: keep-alive\r\n"));
        assert!(text.ends_with("Connection: close\r\n\r\nhello"));

        server_task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn bad_request() {
        let ctx = new_context();
        let (client, server) = tokio::io::duplex(4096);
        let server_task = tokio::spawn(async move { ctx.serve_http(server, false).await });

        let (mut r, mut w) = tokio::io::split(client);
        w.write_all(b"BREW / HTTP/1.1\r\n\r\n").await.unwrap();

        let mut buf = Vec::new();
        r.read_to_end(&mut buf).await.unwrap();
        assert!(buf.starts_with(b"HTTP/1.1 501 Not Implemented\r\n"));
        assert!(server_task.await.unwrap().is_err());
    }

    #[tokio::test]
    async fn too_large_body() {
        let ctx = new_context();
        let (client, server) = tokio::io::duplex(4096);
        let server_task = tokio::spawn(async move { ctx.serve_http(server, false).await });

        let (mut r, mut w) = tokio::io::split(client);
        w.write_all(b"POST / HTTP/1.1\r\nHost: localhost\r\nContent-Length: 2048\r\n\r\n")
            .await
            .unwrap();

        let mut buf = Vec::new();
        r.read_to_end(&mut buf).await.unwrap();
        assert!(buf.starts_with(b"HTTP/1.1 413 Payload Too Large\r\n"));
        assert!(server_task.await.unwrap().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_connection_closed() {
        let ctx = new_context();
        let (client, server) = tokio::io::duplex(4096);
        let server_task = tokio::spawn(async move { ctx.serve_http(server, false).await });

        let (mut r, mut w) = tokio::io::split(client);
        w.write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();

        // one response, then the idle keep-alive connection is closed
        let mut buf = Vec::new();
        r.read_to_end(&mut buf).await.unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.matches("HTTP/1.1 200 OK\r\n").count(), 1);
        assert!(text.ends_with("hello"));

        server_task.await.unwrap().unwrap();
    }

    #[test]
    fn response_head() {
        let ctx = new_context();
        let rsp = ctx.build_response(false, true);
        assert_eq!(rsp.header_str("x-session-reused"), Some("false"));
        assert!(rsp.keep_alive());
    }
}
