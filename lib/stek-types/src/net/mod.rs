/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod tls;
pub use tls::*;

mod rustls;
pub use self::rustls::*;
