/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

pub mod opts;

mod config;
pub use config::StekClientConfig;

mod client;
pub use client::{RequestOutcome, StekClient};

mod stats;
pub use stats::ResumptionStats;
