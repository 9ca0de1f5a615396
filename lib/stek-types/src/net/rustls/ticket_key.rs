/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;

use anyhow::anyhow;
use ring::aead;
use ring::digest;
use ring::rand::{SecureRandom, SystemRandom};

use crate::net::{RollingTicketKey, TICKET_KEY_NAME_LENGTH, TicketKeyMaterial, TicketKeyName};

const TICKET_AEAD_KEY_LENGTH: usize = 32;

pub struct RustlsTicketKey {
    name: TicketKeyName,
    lifetime: u32,
    aead_key: aead::LessSafeKey,
}

impl RustlsTicketKey {
    /// Derive the ticket key from the 32 bytes key material.
    ///
    /// The first 16 bytes of SHA-512(material) is the key name and the
    /// following 32 bytes is the AES-256-GCM key, so the same material always
    /// yields the same key.
    pub fn new(material: &TicketKeyMaterial, lifetime: u32) -> anyhow::Result<Self> {
        let hashed = digest::digest(&digest::SHA512, material.as_bytes());
        let hashed = hashed.as_ref();

        let mut key_name = [0u8; TICKET_KEY_NAME_LENGTH];
        key_name.copy_from_slice(&hashed[..TICKET_KEY_NAME_LENGTH]);

        let aes_key =
            &hashed[TICKET_KEY_NAME_LENGTH..TICKET_KEY_NAME_LENGTH + TICKET_AEAD_KEY_LENGTH];
        let key = aead::UnboundKey::new(&aead::AES_256_GCM, aes_key)
            .map_err(|_| anyhow!("invalid ticket AES key"))?;

        Ok(RustlsTicketKey {
            name: key_name.into(),
            lifetime,
            aead_key: aead::LessSafeKey::new(key),
        })
    }

    /// Encrypt `message` and return the ciphertext.
    pub(super) fn encrypt(&self, message: &[u8]) -> Option<Vec<u8>> {
        // Random nonce, because a counter is a privacy leak.
        let mut nonce_buf = [0u8; aead::NONCE_LEN];
        SystemRandom::new().fill(&mut nonce_buf).ok()?;
        let nonce = aead::Nonce::assume_unique_for_key(nonce_buf);
        let aad = aead::Aad::from(self.name.as_ref());

        // ciphertext structure is:
        // key_name: [u8; 16]
        // nonce: [u8; 12]
        // message: [u8, _]
        // tag: [u8; 16]

        let mut ciphertext = Vec::with_capacity(
            TICKET_KEY_NAME_LENGTH
                + nonce_buf.len()
                + message.len()
                + self.aead_key.algorithm().tag_len(),
        );
        ciphertext.extend_from_slice(self.name.as_ref());
        ciphertext.extend_from_slice(&nonce_buf);
        ciphertext.extend_from_slice(message);
        self.aead_key
            .seal_in_place_separate_tag(
                nonce,
                aad,
                &mut ciphertext[TICKET_KEY_NAME_LENGTH + nonce_buf.len()..],
            )
            .map(|tag| {
                ciphertext.extend_from_slice(tag.as_ref());
                ciphertext
            })
            .ok()
    }

    /// Decrypt `ciphertext` and recover the original message.
    pub(super) fn decrypt(&self, ciphertext: &[u8]) -> Option<Vec<u8>> {
        let (alleged_key_name, ciphertext) =
            ciphertext.split_at_checked(TICKET_KEY_NAME_LENGTH)?;
        if !self.name.constant_time_eq(alleged_key_name) {
            return None;
        }
        let (nonce, ciphertext) = ciphertext.split_at_checked(aead::NONCE_LEN)?;
        if ciphertext.len() < self.aead_key.algorithm().tag_len() {
            return None;
        }

        // This won't fail since `nonce` has the required length.
        let nonce = aead::Nonce::try_assume_unique_for_key(nonce).ok()?;

        let mut out = Vec::from(ciphertext);

        let plain_len = self
            .aead_key
            .open_in_place(nonce, aead::Aad::from(alleged_key_name), &mut out)
            .ok()?
            .len();
        out.truncate(plain_len);

        Some(out)
    }
}

impl RollingTicketKey for RustlsTicketKey {
    fn new_random(lifetime: u32) -> anyhow::Result<Self> {
        let material = TicketKeyMaterial::random()?;
        RustlsTicketKey::new(&material, lifetime)
    }

    #[inline]
    fn name(&self) -> TicketKeyName {
        self.name
    }

    #[inline]
    fn lifetime(&self) -> u32 {
        self.lifetime
    }
}

impl fmt::Debug for RustlsTicketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RustlsTicketKey")
            .field("name", &self.name)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}
