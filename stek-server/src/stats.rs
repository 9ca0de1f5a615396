/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default, Debug, Eq, PartialEq)]
pub struct ServerStatsSnapshot {
    pub accepted: u64,
    pub accept_failed: u64,
    pub handshake_failed: u64,
    pub full_handshake: u64,
    pub resumed: u64,
    pub requests: u64,
}

#[derive(Default)]
pub struct ServerStats {
    accepted: AtomicU64,
    accept_failed: AtomicU64,
    handshake_failed: AtomicU64,
    full_handshake: AtomicU64,
    resumed: AtomicU64,
    requests: AtomicU64,
}

impl ServerStats {
    pub fn snapshot(&self) -> ServerStatsSnapshot {
        ServerStatsSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            accept_failed: self.accept_failed.load(Ordering::Relaxed),
            handshake_failed: self.handshake_failed.load(Ordering::Relaxed),
            full_handshake: self.full_handshake.load(Ordering::Relaxed),
            resumed: self.resumed.load(Ordering::Relaxed),
            requests: self.requests.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn add_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_accept_failed(&self) {
        self.accept_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_handshake_failed(&self) {
        self.handshake_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_handshake(&self, resumed: bool) {
        if resumed {
            self.resumed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.full_handshake.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn add_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }
}
