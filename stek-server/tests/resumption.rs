/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio::sync::oneshot;
use url::Url;

use stek_client::{StekClient, StekClientConfig};
use stek_server::{
    DEFAULT_RESPONSE_BODY, StekServer, StekServerConfig, StekServerHandle, TicketKeyConfig,
};
use stek_types::net::{
    RollingTicketKey, RustlsCertificatePair, RustlsCertificatePairBuilder, TicketKeyMaterial,
    load_ticket_keys,
};

struct TestCert {
    ca: CertificateDer<'static>,
    key: PrivateKeyDer<'static>,
}

impl TestCert {
    fn cert_pair(&self) -> RustlsCertificatePair {
        let mut builder = RustlsCertificatePairBuilder::default();
        builder.set_certs(vec![self.ca.clone()]);
        builder.set_key(self.key.clone_key());
        builder.build().unwrap()
    }
}

fn generate_cert() -> TestCert {
    let generated = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let key = PrivateKeyDer::try_from(generated.key_pair.serialize_der()).unwrap();
    TestCert {
        ca: generated.cert.der().clone(),
        key,
    }
}

fn server_config(cert: &TestCert) -> StekServerConfig {
    let listen = SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 0);
    StekServerConfig::new(listen, cert.cert_pair())
}

struct RunningServer {
    addr: SocketAddr,
    handle: StekServerHandle,
    _shutdown: oneshot::Sender<()>,
}

async fn start_server(config: StekServerConfig) -> RunningServer {
    let server = StekServer::bind(&config).await.unwrap();
    let addr = server.local_addr();
    let handle = server.handle();
    let (shutdown, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(server.run(async move {
        let _ = shutdown_rx.await;
    }));
    RunningServer {
        addr,
        handle,
        _shutdown: shutdown,
    }
}

fn new_client(port: u16, cert: &TestCert, session_cache: bool) -> StekClient {
    let url = Url::parse(&format!("https://localhost:{port}/")).unwrap();
    let mut config = StekClientConfig::new(&url).unwrap();
    config.tls_mut().set_ca_certificates(vec![cert.ca.clone()]);
    if !session_cache {
        config.tls_mut().set_no_session_cache();
    }
    config.set_resolve(IpAddr::from([127, 0, 0, 1]));
    StekClient::new(&config).unwrap()
}

#[tokio::test]
async fn first_connection() {
    let cert = generate_cert();
    let server = start_server(server_config(&cert)).await;
    let client = new_client(server.addr.port(), &cert, true);

    let outcome = client.get().await.unwrap();
    assert_eq!(outcome.status, 200);
    assert_eq!(outcome.body_text(), DEFAULT_RESPONSE_BODY);
    assert!(!outcome.session_reused);
    assert_eq!(outcome.server_reports_reused, Some(false));
    assert_eq!(outcome.protocol, "TLSv1_3");

    let stats = server.handle.stats().snapshot();
    assert_eq!(stats.full_handshake, 1);
    assert_eq!(stats.resumed, 0);
    assert_eq!(stats.requests, 1);
}

#[tokio::test]
async fn resume_after_delay() {
    let cert = generate_cert();
    let server = start_server(server_config(&cert)).await;
    let client = new_client(server.addr.port(), &cert, true);

    let first = client.get().await.unwrap();
    assert!(!first.session_reused);

    tokio::time::sleep(Duration::from_secs(2)).await;

    let second = client.get().await.unwrap();
    assert_eq!(second.body_text(), DEFAULT_RESPONSE_BODY);
    assert!(second.session_reused);
    assert_eq!(second.server_reports_reused, Some(true));

    let stats = server.handle.stats().snapshot();
    assert_eq!(stats.full_handshake, 1);
    assert_eq!(stats.resumed, 1);
}

#[tokio::test]
async fn replaced_keys_force_full_handshake() {
    let cert = generate_cert();
    let server = start_server(server_config(&cert)).await;
    let client = new_client(server.addr.port(), &cert, true);

    let first = client.get().await.unwrap();
    assert!(!first.session_reused);

    let new_key = TicketKeyMaterial::random().unwrap();
    server.handle.replace_ticket_keys(&[new_key]).unwrap();

    let second = client.get().await.unwrap();
    assert_eq!(second.status, 200);
    assert_eq!(second.body_text(), DEFAULT_RESPONSE_BODY);
    assert!(!second.session_reused);
    assert_eq!(second.server_reports_reused, Some(false));

    // tickets issued under the new key are accepted
    let third = client.get().await.unwrap();
    assert!(third.session_reused);
}

#[tokio::test]
async fn rotated_keys_still_resume() {
    let cert = generate_cert();
    let server = start_server(server_config(&cert)).await;
    let client = new_client(server.addr.port(), &cert, true);

    let first = client.get().await.unwrap();
    assert!(!first.session_reused);

    let ticketer = server.handle.ticketer().unwrap();
    let old_name = ticketer.encrypt_key().name();
    let new_name = server.handle.rotate_ticket_keys(3).unwrap();
    assert_ne!(old_name, new_name);
    assert_eq!(ticketer.decrypt_key_count(), 3);

    let second = client.get().await.unwrap();
    assert!(second.session_reused);
}

#[tokio::test]
async fn no_client_session_cache() {
    let cert = generate_cert();
    let server = start_server(server_config(&cert)).await;
    let client = new_client(server.addr.port(), &cert, false);

    for _ in 0..3 {
        let outcome = client.get().await.unwrap();
        assert_eq!(outcome.body_text(), DEFAULT_RESPONSE_BODY);
        assert!(!outcome.session_reused);
    }
    assert_eq!(server.handle.stats().snapshot().resumed, 0);
}

#[tokio::test]
async fn shared_key_file() {
    let cert = generate_cert();

    let key_file = std::env::temp_dir().join(format!(
        "stek-shared-ticket-keys-{}.txt",
        std::process::id()
    ));
    write_key_file(&key_file);
    let keys = load_ticket_keys(&key_file).unwrap();
    let _ = std::fs::remove_file(&key_file);
    assert_eq!(keys.len(), 2);

    let mut servers = Vec::new();
    for _ in 0..2 {
        let mut ticket = TicketKeyConfig::default();
        ticket.set_keys(keys.clone());
        let mut config = server_config(&cert);
        config.set_ticket(ticket);
        servers.push(start_server(config).await);
    }

    let client = new_client(servers[0].addr.port(), &cert, true);

    let first = client.get_from(servers[0].addr).await.unwrap();
    assert!(!first.session_reused);

    let second = client.get_from(servers[1].addr).await.unwrap();
    assert!(second.session_reused);
    assert_eq!(second.server_reports_reused, Some(true));
    assert_eq!(servers[1].handle.stats().snapshot().resumed, 1);
}

#[tokio::test]
async fn different_keys_not_shared() {
    let cert = generate_cert();
    let server_a = start_server(server_config(&cert)).await;
    let server_b = start_server(server_config(&cert)).await;

    let client = new_client(server_a.addr.port(), &cert, true);

    let first = client.get_from(server_a.addr).await.unwrap();
    assert!(!first.session_reused);

    let second = client.get_from(server_b.addr).await.unwrap();
    assert!(!second.session_reused);
}

#[tokio::test]
async fn stateful_session_cache() {
    let cert = generate_cert();
    let mut config = server_config(&cert);
    config.set_no_ticket();
    config.tls_mut().set_session_cache_size(64);
    let server = start_server(config).await;
    assert!(server.handle.ticketer().is_none());
    let client = new_client(server.addr.port(), &cert, true);

    let first = client.get().await.unwrap();
    assert!(!first.session_reused);

    let second = client.get().await.unwrap();
    assert!(second.session_reused);
}

#[tokio::test]
async fn resumption_disabled() {
    let cert = generate_cert();
    let mut config = server_config(&cert);
    config.set_no_ticket();
    let server = start_server(config).await;
    let client = new_client(server.addr.port(), &cert, true);

    for _ in 0..2 {
        let outcome = client.get().await.unwrap();
        assert!(!outcome.session_reused);
    }
    assert!(server.handle.rotate_ticket_keys(2).is_err());
}

fn write_key_file(path: &Path) {
    let mut content = String::from("# shared session ticket keys\n");
    for _ in 0..2 {
        content.push_str(&TicketKeyMaterial::random().unwrap().to_hex());
        content.push('\n');
    }
    std::fs::write(path, content).unwrap();
}
