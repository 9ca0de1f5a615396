/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use flume::Sender;
use slog::{Drain, OwnedKVList, Record};

use super::LogLine;

/// Hand formatted lines over to the writer thread without blocking.
pub(crate) struct ChannelDrain {
    sender: Sender<LogLine>,
    with_location: bool,
    dropped: Arc<AtomicU64>,
}

impl ChannelDrain {
    pub(crate) fn new(
        sender: Sender<LogLine>,
        with_location: bool,
        dropped: Arc<AtomicU64>,
    ) -> Self {
        ChannelDrain {
            sender,
            with_location,
            dropped,
        }
    }
}

impl Drain for ChannelDrain {
    type Ok = ();
    type Err = slog::Error;

    fn log(&self, record: &Record, logger_values: &OwnedKVList) -> Result<(), slog::Error> {
        let line = LogLine::new(record, logger_values, self.with_location)?;
        if self.sender.try_send(line).is_err() {
            // full or the writer is gone
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }
}
