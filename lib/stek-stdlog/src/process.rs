/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use slog::{Drain, o};
use slog_scope::GlobalLoggerGuard;

use super::{ChannelDrain, LineWriter};

const WRITER_THREAD_NAME: &str = "log-stderr";
const CHANNEL_CAPACITY: usize = 1024;

fn log_level(verbose_level: u8) -> log::Level {
    match verbose_level {
        0 => log::Level::Warn,
        1 => log::Level::Info,
        2 => log::Level::Debug,
        _ => log::Level::Trace,
    }
}

/// Route `log` records of the whole process to stderr.
///
/// Source locations are appended from debug level on.
/// The returned guard must be kept alive until the process exits.
pub fn setup_process_logger(verbose_level: u8) -> Result<GlobalLoggerGuard, log::SetLoggerError> {
    let (sender, receiver) = flume::bounded(CHANNEL_CAPACITY);
    let dropped = Arc::new(AtomicU64::new(0));

    let stderr = io::stderr();
    let writer = LineWriter::new(receiver, dropped.clone(), stderr.is_terminal());
    // records are counted as dropped if the thread can not be spawned
    let _detached_thread = std::thread::Builder::new()
        .name(WRITER_THREAD_NAME.to_string())
        .spawn(move || writer.run(stderr));

    let drain = ChannelDrain::new(sender, verbose_level > 1, dropped);
    let logger = slog::Logger::root(drain.fuse(), o!());
    let scope_guard = slog_scope::set_global_logger(logger);

    slog_stdlog::init_with_level(log_level(verbose_level))?;
    Ok(scope_guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_level() {
        assert_eq!(log_level(0), log::Level::Warn);
        assert_eq!(log_level(1), log::Level::Info);
        assert_eq!(log_level(2), log::Level::Debug);
        assert_eq!(log_level(3), log::Level::Trace);
        assert_eq!(log_level(9), log::Level::Trace);
    }
}
