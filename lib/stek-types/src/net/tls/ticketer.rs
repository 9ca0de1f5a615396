/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::{Arc, RwLock};

use ahash::AHashMap;
use anyhow::anyhow;
use arc_swap::ArcSwap;

use super::TicketKeyName;

pub trait RollingTicketKey: Sized {
    fn new_random(lifetime: u32) -> anyhow::Result<Self>;
    fn name(&self) -> TicketKeyName;
    fn lifetime(&self) -> u32;
}

struct DecryptKeySet<K> {
    keys: AHashMap<TicketKeyName, Arc<K>>,
    /// insertion order, oldest first
    order: Vec<TicketKeyName>,
}

impl<K: RollingTicketKey> DecryptKeySet<K> {
    fn with_key(key: Arc<K>) -> Self {
        let mut set = DecryptKeySet {
            keys: AHashMap::new(),
            order: Vec::new(),
        };
        set.insert(key);
        set
    }

    fn insert(&mut self, key: Arc<K>) {
        let name = key.name();
        if self.keys.insert(name, key).is_some() {
            self.order.retain(|v| *v != name);
        }
        self.order.push(name);
    }

    fn remove(&mut self, name: &TicketKeyName) {
        if self.keys.remove(name).is_some() {
            self.order.retain(|v| v != name);
        }
    }

    // the encrypt key should be treated as the newest one
    fn promote(&mut self, name: TicketKeyName) {
        self.order.retain(|v| *v != name);
        self.order.push(name);
    }
}

/// Session ticket keys shared by every connection of a server.
///
/// One key encrypts new tickets, while every key in the decrypt set is
/// accepted for incoming tickets. The encrypt key is always part of the
/// decrypt set.
pub struct RollingTicketer<K: RollingTicketKey> {
    dec_keys: RwLock<DecryptKeySet<K>>,
    pub(crate) enc_key: ArcSwap<K>,
}

impl<K: RollingTicketKey> RollingTicketer<K> {
    pub fn new(initial_key: K) -> Self {
        let key = Arc::new(initial_key);
        RollingTicketer {
            dec_keys: RwLock::new(DecryptKeySet::with_key(key.clone())),
            enc_key: ArcSwap::new(key),
        }
    }

    /// Build from a list of keys, the first one is used for encryption.
    pub fn with_keys(keys: Vec<K>) -> anyhow::Result<Self> {
        let mut iter = keys.into_iter();
        let Some(first) = iter.next() else {
            return Err(anyhow!("no ticket key set"));
        };
        let enc_key = Arc::new(first);
        let mut dec_keys = DecryptKeySet::with_key(enc_key.clone());
        for key in iter {
            dec_keys.insert(Arc::new(key));
        }
        dec_keys.promote(enc_key.name());

        Ok(RollingTicketer {
            dec_keys: RwLock::new(dec_keys),
            enc_key: ArcSwap::new(enc_key),
        })
    }

    pub fn encrypt_key(&self) -> Arc<K> {
        self.enc_key.load_full()
    }

    /// Find the decrypt key by the key name at the head of the ticket.
    pub fn get_decrypt_key(&self, ticket: &[u8]) -> Option<Arc<K>> {
        let key_name = TicketKeyName::from_ticket(ticket)?;
        self.dec_keys.read().unwrap().keys.get(&key_name).cloned()
    }

    pub fn add_decrypt_key(&self, key: Arc<K>) {
        self.dec_keys.write().unwrap().insert(key);
    }

    /// Remove a decrypt only key, the current encrypt key will be kept.
    pub fn del_decrypt_key(&self, name: TicketKeyName) {
        let mut dec_keys = self.dec_keys.write().unwrap();
        if self.enc_key.load().name() == name {
            return;
        }
        dec_keys.remove(&name);
    }

    pub fn set_encrypt_key(&self, key: Arc<K>) {
        let mut dec_keys = self.dec_keys.write().unwrap();
        dec_keys.insert(key.clone());
        self.enc_key.store(key);
    }

    /// Replace all keys. The first key will be used for encryption and all
    /// keys will be accepted for decryption.
    pub fn replace_keys(&self, keys: Vec<K>) -> anyhow::Result<()> {
        let mut iter = keys.into_iter().map(Arc::new);
        let Some(enc_key) = iter.next() else {
            return Err(anyhow!("no ticket key set"));
        };

        let mut new_set = DecryptKeySet::with_key(enc_key.clone());
        for key in iter {
            new_set.insert(key);
        }
        new_set.promote(enc_key.name());

        let mut dec_keys = self.dec_keys.write().unwrap();
        *dec_keys = new_set;
        self.enc_key.store(enc_key);
        Ok(())
    }

    /// Drop the oldest decrypt only keys so that at most `max` keys remain.
    pub fn retain_decrypt_keys(&self, max: usize) {
        let max = max.max(1);

        // the encrypt key only changes with the write lock held
        let mut dec_keys = self.dec_keys.write().unwrap();
        let enc_name = self.enc_key.load().name();
        let mut to_remove = dec_keys.order.len().saturating_sub(max);
        let mut removed = Vec::with_capacity(to_remove);
        for name in &dec_keys.order {
            if to_remove == 0 {
                break;
            }
            if *name != enc_name {
                removed.push(*name);
                to_remove -= 1;
            }
        }
        for name in &removed {
            dec_keys.remove(name);
        }
    }

    /// Names of all decrypt keys, newest first.
    pub fn decrypt_key_names(&self) -> Vec<TicketKeyName> {
        let dec_keys = self.dec_keys.read().unwrap();
        dec_keys.order.iter().rev().copied().collect()
    }

    pub fn decrypt_key_count(&self) -> usize {
        self.dec_keys.read().unwrap().keys.len()
    }
}
