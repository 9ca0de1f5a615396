/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

pub mod opts;

mod config;
pub use config::{DEFAULT_RESPONSE_BODY, StekServerConfig, TicketKeyConfig};

mod stats;
pub use stats::{ServerStats, ServerStatsSnapshot};

mod ticket;

mod serve;
pub use serve::HEADER_SESSION_REUSED;

mod server;
pub use server::{StekServer, StekServerHandle};
