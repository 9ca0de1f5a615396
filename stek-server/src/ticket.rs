/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use stek_types::net::{RollingTicketKey, RustlsTicketKey, RustlsTicketer, TicketKeyName};

/// Set a fresh random key as the encrypt key, and keep at most `max_keys` keys.
pub(crate) fn rotate_ticket_key(
    ticketer: &RustlsTicketer,
    lifetime: u32,
    max_keys: usize,
) -> anyhow::Result<TicketKeyName> {
    let key = RustlsTicketKey::new_random(lifetime)?;
    let name = key.name();
    ticketer.set_encrypt_key(Arc::new(key));
    ticketer.retain_decrypt_keys(max_keys);
    Ok(name)
}

pub(crate) struct TicketKeyRotate {
    ticketer: Arc<RustlsTicketer>,
    lifetime: u32,
    interval: Duration,
    max_keys: usize,
    quit: watch::Receiver<()>,
}

impl TicketKeyRotate {
    /// The task stops once the sender side of `quit` is dropped.
    pub(crate) fn new(
        ticketer: Arc<RustlsTicketer>,
        lifetime: u32,
        interval: Duration,
        max_keys: usize,
        quit: watch::Receiver<()>,
    ) -> Self {
        TicketKeyRotate {
            ticketer,
            lifetime,
            interval,
            max_keys,
            quit,
        }
    }

    pub(crate) fn spawn_run(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        let mut rotate_interval =
            tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        rotate_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = self.quit.changed() => break,
                _ = rotate_interval.tick() => {
                    match rotate_ticket_key(&self.ticketer, self.lifetime, self.max_keys) {
                        Ok(name) => info!(
                            "ticket key rotated, new encrypt key {name}, {} keys in use",
                            self.ticketer.decrypt_key_count()
                        ),
                        Err(e) => warn!("failed to rotate ticket key: {e:?}"),
                    }
                }
            }
        }
        debug!("ticket key rotate task stopped");
    }
}
