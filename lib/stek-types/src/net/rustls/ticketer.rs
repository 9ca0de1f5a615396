/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;

use log::debug;
use rustls::server::ProducesTickets;

use super::RustlsTicketKey;
use crate::net::{RollingTicketKey, RollingTicketer, TicketKeyMaterial, TicketKeyName};

pub type RustlsTicketer = RollingTicketer<RustlsTicketKey>;

#[derive(Debug)]
pub struct RustlsNoSessionTicketer {}

impl ProducesTickets for RustlsNoSessionTicketer {
    fn enabled(&self) -> bool {
        false
    }

    fn lifetime(&self) -> u32 {
        0
    }

    fn encrypt(&self, _plain: &[u8]) -> Option<Vec<u8>> {
        None
    }

    fn decrypt(&self, _cipher: &[u8]) -> Option<Vec<u8>> {
        None
    }
}

impl RollingTicketer<RustlsTicketKey> {
    /// Build from raw key material, the first key encrypts.
    pub fn from_materials(materials: &[TicketKeyMaterial], lifetime: u32) -> anyhow::Result<Self> {
        let keys = materials
            .iter()
            .map(|m| RustlsTicketKey::new(m, lifetime))
            .collect::<anyhow::Result<Vec<_>>>()?;
        RollingTicketer::with_keys(keys)
    }

    pub fn replace_materials(
        &self,
        materials: &[TicketKeyMaterial],
        lifetime: u32,
    ) -> anyhow::Result<()> {
        let keys = materials
            .iter()
            .map(|m| RustlsTicketKey::new(m, lifetime))
            .collect::<anyhow::Result<Vec<_>>>()?;
        self.replace_keys(keys)
    }
}

impl ProducesTickets for RollingTicketer<RustlsTicketKey> {
    fn enabled(&self) -> bool {
        true
    }

    fn lifetime(&self) -> u32 {
        self.enc_key.load().lifetime()
    }

    fn encrypt(&self, plain: &[u8]) -> Option<Vec<u8>> {
        self.enc_key.load().encrypt(plain)
    }

    fn decrypt(&self, cipher: &[u8]) -> Option<Vec<u8>> {
        match self.get_decrypt_key(cipher) {
            Some(key) => key.decrypt(cipher),
            None => {
                if let Some(name) = TicketKeyName::from_ticket(cipher) {
                    debug!("no ticket key found for name {name}, fallback to full handshake");
                }
                None
            }
        }
    }
}

impl fmt::Debug for RollingTicketer<RustlsTicketKey> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RollingTicketer")
            .field("encrypt_key", &self.enc_key.load().name())
            .field("decrypt_keys", &self.decrypt_key_count())
            .finish()
    }
}
