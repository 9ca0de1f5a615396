/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Process logger for the stek binaries.
//!
//! Records from the `log` facade are formatted on the calling thread and
//! handed over a bounded channel to a dedicated thread writing to stderr.

mod line;
use line::LogLine;

mod drain;
use drain::ChannelDrain;

mod writer;
use writer::LineWriter;

mod process;
pub use process::setup_process_logger;
