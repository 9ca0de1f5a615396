/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use flume::Receiver;

use super::LogLine;

pub(crate) struct LineWriter {
    receiver: Receiver<LogLine>,
    dropped: Arc<AtomicU64>,
    reported_dropped: u64,
    styled: bool,
    buf: Vec<u8>,
}

impl LineWriter {
    pub(crate) fn new(receiver: Receiver<LogLine>, dropped: Arc<AtomicU64>, styled: bool) -> Self {
        LineWriter {
            receiver,
            dropped,
            reported_dropped: 0,
            styled,
            buf: Vec::with_capacity(1024),
        }
    }

    /// Write lines until all senders are gone, flushing once the channel is drained.
    pub(crate) fn run<W: Write>(mut self, mut out: W) {
        while let Ok(line) = self.receiver.recv() {
            self.write_line(&mut out, &line);
            while let Ok(line) = self.receiver.try_recv() {
                self.write_line(&mut out, &line);
            }
            self.report_dropped(&mut out);
            let _ = out.flush();
        }
    }

    fn report_dropped<W: Write>(&mut self, out: &mut W) {
        let dropped = self.dropped.load(Ordering::Relaxed);
        if dropped > self.reported_dropped {
            let notice = LogLine::dropped_notice(dropped - self.reported_dropped);
            self.reported_dropped = dropped;
            self.write_line(out, &notice);
        }
    }

    fn write_line<W: Write>(&mut self, out: &mut W, line: &LogLine) {
        self.buf.clear();
        let r = if self.styled {
            line.write_styled(&mut self.buf)
        } else {
            line.write_plain(&mut self.buf)
        };
        if r.is_ok() && out.write_all(&self.buf).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}
