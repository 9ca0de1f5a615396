/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use rustls::server::{NoServerSessionStorage, ProducesTickets, ServerSessionMemoryCache};
use rustls::{CommonState, HandshakeKind, ServerConfig};

use super::RustlsNoSessionTicketer;

pub trait RustlsConnectionExt {
    fn session_reused(&self) -> bool;
    fn protocol_name(&self) -> String;
    fn cipher_suite_name(&self) -> String;
}

impl RustlsConnectionExt for CommonState {
    fn session_reused(&self) -> bool {
        matches!(self.handshake_kind(), Some(HandshakeKind::Resumed))
    }

    fn protocol_name(&self) -> String {
        match self.protocol_version() {
            Some(v) => format!("{v:?}"),
            None => "unknown".to_string(),
        }
    }

    fn cipher_suite_name(&self) -> String {
        match self.negotiated_cipher_suite() {
            Some(s) => format!("{:?}", s.suite()),
            None => "unknown".to_string(),
        }
    }
}

pub trait RustlsServerConfigExt {
    fn set_session_cache(&mut self, cache_size: usize);
    fn set_session_ticketer(&mut self, ticketer: Option<Arc<dyn ProducesTickets>>);
}

impl RustlsServerConfigExt for ServerConfig {
    fn set_session_cache(&mut self, cache_size: usize) {
        if cache_size == 0 {
            self.session_storage = Arc::new(NoServerSessionStorage {});
        } else {
            self.session_storage = ServerSessionMemoryCache::new(cache_size);
        }
    }

    fn set_session_ticketer(&mut self, ticketer: Option<Arc<dyn ProducesTickets>>) {
        match ticketer {
            Some(ticketer) if ticketer.enabled() => {
                self.ticketer = ticketer;
            }
            _ => {
                self.ticketer = Arc::new(RustlsNoSessionTicketer {});
            }
        }
    }
}
