/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::hash::{Hash, Hasher};

pub const TICKET_KEY_NAME_LENGTH: usize = 16;

/// The 16 bytes placed in front of every issued ticket, used to select the
/// decrypt key when the ticket comes back.
#[derive(Clone, Copy)]
pub struct TicketKeyName([u8; TICKET_KEY_NAME_LENGTH]);

impl From<[u8; TICKET_KEY_NAME_LENGTH]> for TicketKeyName {
    fn from(value: [u8; TICKET_KEY_NAME_LENGTH]) -> Self {
        TicketKeyName(value)
    }
}

impl AsRef<[u8]> for TicketKeyName {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for TicketKeyName {
    type Error = ();

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let v: [u8; TICKET_KEY_NAME_LENGTH] = value.try_into().map_err(|_| ())?;
        Ok(TicketKeyName(v))
    }
}

impl Hash for TicketKeyName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl PartialEq for TicketKeyName {
    fn eq(&self, other: &Self) -> bool {
        self.constant_time_eq(&other.0)
    }
}

impl Eq for TicketKeyName {}

impl fmt::Debug for TicketKeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TicketKeyName({})", hex::encode(self.0))
    }
}

impl fmt::Display for TicketKeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl TicketKeyName {
    /// Read the key name from the head of a ticket.
    pub fn from_ticket(ticket: &[u8]) -> Option<Self> {
        let name = ticket.get(..TICKET_KEY_NAME_LENGTH)?;
        TicketKeyName::try_from(name).ok()
    }

    /// Compare against the head of `buf` without early exit.
    pub fn constant_time_eq(&self, buf: &[u8]) -> bool {
        let Some(head) = buf.get(..TICKET_KEY_NAME_LENGTH) else {
            return false;
        };

        let xor_sum = self
            .0
            .iter()
            .zip(head)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));
        xor_sum == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eq_checks_every_byte() {
        let a = TicketKeyName::from([1u8; TICKET_KEY_NAME_LENGTH]);
        let mut raw = [1u8; TICKET_KEY_NAME_LENGTH];
        assert_eq!(a, TicketKeyName::from(raw));

        raw[TICKET_KEY_NAME_LENGTH - 1] = 2;
        assert_ne!(a, TicketKeyName::from(raw));
    }

    #[test]
    fn from_ticket() {
        let mut ticket = vec![7u8; TICKET_KEY_NAME_LENGTH];
        ticket.extend_from_slice(b"payload");
        let name = TicketKeyName::from_ticket(&ticket).unwrap();
        assert_eq!(name.as_ref(), &[7u8; TICKET_KEY_NAME_LENGTH]);

        assert!(TicketKeyName::from_ticket(&ticket[..4]).is_none());
    }

    #[test]
    fn constant_time_eq_short_buf() {
        let a = TicketKeyName::from([3u8; TICKET_KEY_NAME_LENGTH]);
        assert!(!a.constant_time_eq(&[3u8; 8]));
        assert!(a.constant_time_eq(&[3u8; 32]));
    }

    #[test]
    fn display_hex() {
        let a = TicketKeyName::from([0xabu8; TICKET_KEY_NAME_LENGTH]);
        assert_eq!(a.to_string(), "ab".repeat(TICKET_KEY_NAME_LENGTH));
    }
}
