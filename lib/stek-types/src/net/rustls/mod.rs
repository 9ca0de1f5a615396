/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod cert_pair;
pub use cert_pair::{
    RustlsCertificatePair, RustlsCertificatePairBuilder, load_certs, load_private_key,
};

mod ca_certs;
pub use ca_certs::load_ca_certs;

mod ticket_key;
pub use ticket_key::RustlsTicketKey;

mod ticketer;
pub use ticketer::{RustlsNoSessionTicketer, RustlsTicketer};

mod ext;
pub use ext::{RustlsConnectionExt, RustlsServerConfigExt};

mod server;
pub use server::{RustlsServerConfig, RustlsServerConfigBuilder};

mod client;
pub use client::{RustlsClientConfig, RustlsClientConfigBuilder};

pub const ALPN_HTTP_1_1: &[u8] = b"http/1.1";

fn ring_provider() -> std::sync::Arc<rustls::crypto::CryptoProvider> {
    std::sync::Arc::new(rustls::crypto::ring::default_provider())
}
