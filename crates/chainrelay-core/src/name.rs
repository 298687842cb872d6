//! Compact base-32 account/action names.
//!
//! A name packs up to 13 characters from the alphabet `.12345a-z` into a
//! single `u64`: twelve 5-bit characters from the high bits down, plus a
//! 4-bit thirteenth character in the low nibble. Account names, action
//! names, and permission names all share this encoding; the account name
//! doubles as the ABI cache key.

use crate::error::NameError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Character set in 5-bit value order. The 13th character may only use the
/// first 16 entries.
const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// A 64-bit compact name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Name(pub u64);

/// Account that owns a contract; the key schema lookups are made under.
pub type AccountName = Name;
/// Name of an action within a contract.
pub type ActionName = Name;
/// Name of an authorization permission.
pub type PermissionName = Name;

impl Name {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

fn char_value(c: u8) -> Option<u64> {
    match c {
        b'.' => Some(0),
        b'1'..=b'5' => Some((c - b'1') as u64 + 1),
        b'a'..=b'z' => Some((c - b'a') as u64 + 6),
        _ => None,
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() > 13 {
            return Err(NameError::TooLong { name: s.to_string() });
        }
        let mut value: u64 = 0;
        for (i, &c) in bytes.iter().enumerate() {
            let v = char_value(c).ok_or_else(|| NameError::InvalidChar {
                name: s.to_string(),
                ch: c as char,
            })?;
            if i < 12 {
                value |= (v & 0x1f) << (64 - 5 * (i + 1));
            } else {
                // Only 4 bits remain for the 13th character.
                if v > 0x0f {
                    return Err(NameError::ThirteenthOutOfRange {
                        name: s.to_string(),
                        ch: c as char,
                    });
                }
                value |= v;
            }
        }
        Ok(Name(value))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chars = [b'.'; 13];
        let mut v = self.0;
        for i in (0..13).rev() {
            let idx = if i == 12 { (v & 0x0f) as usize } else { (v & 0x1f) as usize };
            chars[i] = CHARMAP[idx];
            v >>= if i == 12 { 4 } else { 5 };
        }
        let end = chars.iter().rposition(|&c| c != b'.').map_or(0, |p| p + 1);
        // CHARMAP is ASCII, so the slice is always valid UTF-8.
        f.write_str(std::str::from_utf8(&chars[..end]).unwrap_or(""))
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_encodings() {
        assert_eq!("eosio".parse::<Name>().unwrap().as_u64(), 0x5530EA0000000000);
        assert_eq!(
            "eosio.token".parse::<Name>().unwrap().as_u64(),
            0x5530EA033482A600
        );
        assert_eq!("".parse::<Name>().unwrap().as_u64(), 0);
    }

    #[test]
    fn round_trip() {
        for s in ["a", "eosio", "eosio.token", "alice", "some.name.13a", "zzzzzzzzzzzzj"] {
            let n: Name = s.parse().unwrap();
            assert_eq!(n.to_string(), s, "round trip failed for {s}");
        }
    }

    #[test]
    fn trailing_dots_are_trimmed() {
        let n: Name = "abc..".parse().unwrap();
        assert_eq!(n.to_string(), "abc");
    }

    #[test]
    fn rejects_invalid_input() {
        assert!(matches!(
            "UPPER".parse::<Name>(),
            Err(NameError::InvalidChar { .. })
        ));
        assert!(matches!(
            "waytoolongname".parse::<Name>(),
            Err(NameError::TooLong { .. })
        ));
        assert!(matches!(
            "aaaaaaaaaaaaz".parse::<Name>(),
            Err(NameError::ThirteenthOutOfRange { .. })
        ));
    }

    #[test]
    fn serde_uses_string_form() {
        let n: Name = "eosio.token".parse().unwrap();
        assert_eq!(serde_json::to_string(&n).unwrap(), "\"eosio.token\"");
        let back: Name = serde_json::from_str("\"eosio.token\"").unwrap();
        assert_eq!(back, n);
    }
}
