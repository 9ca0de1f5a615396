/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use ring::rand::{SecureRandom, SystemRandom};

pub const TICKET_KEY_MATERIAL_LENGTH: usize = 32;

/// The raw 32 bytes session ticket key, from which the key name and the
/// AEAD key are derived.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TicketKeyMaterial([u8; TICKET_KEY_MATERIAL_LENGTH]);

impl TicketKeyMaterial {
    pub fn random() -> anyhow::Result<Self> {
        let mut key = [0u8; TICKET_KEY_MATERIAL_LENGTH];
        SystemRandom::new()
            .fill(&mut key)
            .map_err(|_| anyhow!("failed to generate random ticket key"))?;
        Ok(TicketKeyMaterial(key))
    }

    pub fn as_bytes(&self) -> &[u8; TICKET_KEY_MATERIAL_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; TICKET_KEY_MATERIAL_LENGTH]> for TicketKeyMaterial {
    fn from(value: [u8; TICKET_KEY_MATERIAL_LENGTH]) -> Self {
        TicketKeyMaterial(value)
    }
}

impl FromStr for TicketKeyMaterial {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != TICKET_KEY_MATERIAL_LENGTH * 2 {
            return Err(anyhow!(
                "ticket key should be {} hex chars, got {}",
                TICKET_KEY_MATERIAL_LENGTH * 2,
                s.len()
            ));
        }
        let mut key = [0u8; TICKET_KEY_MATERIAL_LENGTH];
        hex::decode_to_slice(s, &mut key).map_err(|e| anyhow!("invalid hex string: {e}"))?;
        Ok(TicketKeyMaterial(key))
    }
}

impl fmt::Debug for TicketKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TicketKeyMaterial(..)")
    }
}

/// Parse ticket keys, one hex encoded key per line.
///
/// Empty lines and lines starting with `#` are skipped.
pub fn parse_ticket_keys(content: &str) -> anyhow::Result<Vec<TicketKeyMaterial>> {
    let mut keys = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let key = TicketKeyMaterial::from_str(line)
            .context(format!("invalid ticket key at line {}", i + 1))?;
        keys.push(key);
    }
    if keys.is_empty() {
        Err(anyhow!("no ticket key found"))
    } else {
        Ok(keys)
    }
}

pub fn load_ticket_keys(path: &Path) -> anyhow::Result<Vec<TicketKeyMaterial>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("unable to read file {}: {e}", path.display()))?;
    parse_ticket_keys(&content).context(format!(
        "failed to load ticket keys from file {}",
        path.display()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_1: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
    const KEY_2: &str = "ffeeddccbbaa99887766554433221100ffeeddccbbaa99887766554433221100";

    #[test]
    fn parse_hex() {
        let key = TicketKeyMaterial::from_str(KEY_1).unwrap();
        assert_eq!(key.as_bytes()[0], 0);
        assert_eq!(key.as_bytes()[31], 0x1f);
        assert_eq!(key.to_hex(), KEY_1);

        assert!(TicketKeyMaterial::from_str("0011").is_err());
        assert!(TicketKeyMaterial::from_str(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn parse_key_list() {
        let content = format!("# primary\n{KEY_1}\n\n  {KEY_2}  \n");
        let keys = parse_ticket_keys(&content).unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].to_hex(), KEY_1);
        assert_eq!(keys[1].to_hex(), KEY_2);

        assert!(parse_ticket_keys("# nothing\n\n").is_err());
        assert!(parse_ticket_keys("abcd\n").is_err());
    }

    #[test]
    fn random_keys_differ() {
        let a = TicketKeyMaterial::random().unwrap();
        let b = TicketKeyMaterial::random().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn debug_hides_key() {
        let key = TicketKeyMaterial::from_str(KEY_1).unwrap();
        assert!(!format!("{key:?}").contains("0001"));
    }
}
