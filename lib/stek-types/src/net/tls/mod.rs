/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod ticket_name;
pub use ticket_name::{TICKET_KEY_NAME_LENGTH, TicketKeyName};

mod ticketer;
pub use ticketer::{RollingTicketKey, RollingTicketer};

mod key_material;
pub use key_material::{
    TICKET_KEY_MATERIAL_LENGTH, TicketKeyMaterial, load_ticket_keys, parse_ticket_keys,
};
