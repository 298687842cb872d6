//! Token symbols and asset amounts.
//!
//! A symbol packs a decimal precision byte plus up to seven `A-Z`
//! characters into a `u64`; an asset pairs a symbol with a signed 64-bit
//! amount and renders in fixed-point form, e.g. `"1.0000 SYS"`.

use crate::error::SymbolError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Highest decimal precision a symbol may carry.
pub const MAX_PRECISION: u8 = 18;

/// A 64-bit token symbol: low byte precision, then up to 7 code bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(pub u64);

impl Symbol {
    pub fn new(precision: u8, code: &str) -> Result<Self, SymbolError> {
        if precision > MAX_PRECISION {
            return Err(SymbolError::BadAsset {
                input: format!("{precision},{code}"),
                reason: format!("precision exceeds {MAX_PRECISION}"),
            });
        }
        let bytes = code.as_bytes();
        if bytes.is_empty() || bytes.len() > 7 {
            return Err(SymbolError::BadLength { code: code.to_string() });
        }
        let mut value = precision as u64;
        for (i, &c) in bytes.iter().enumerate() {
            if !c.is_ascii_uppercase() {
                return Err(SymbolError::InvalidChar {
                    code: code.to_string(),
                    ch: c as char,
                });
            }
            value |= (c as u64) << (8 * (i + 1));
        }
        Ok(Self(value))
    }

    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    pub const fn precision(self) -> u8 {
        (self.0 & 0xff) as u8
    }

    /// Symbol code with any non `A-Z` tail dropped.
    pub fn code(self) -> String {
        let mut out = String::with_capacity(7);
        let mut v = self.0 >> 8;
        while v > 0 {
            let c = (v & 0xff) as u8;
            if !c.is_ascii_uppercase() {
                break;
            }
            out.push(c as char);
            v >>= 8;
        }
        out
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision(), self.code())
    }
}

/// A token amount: signed quantity in minimal units plus its symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asset {
    pub amount: i64,
    pub symbol: Symbol,
}

impl Asset {
    pub const fn new(amount: i64, symbol: Symbol) -> Self {
        Self { amount, symbol }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Wire symbols may carry any precision byte; clamp before exponentiating.
        let precision = self.symbol.precision().min(MAX_PRECISION);
        let sign = if self.amount < 0 { "-" } else { "" };
        let mag = self.amount.unsigned_abs() as u128;
        let scale = 10u128.pow(precision as u32);
        if precision == 0 {
            write!(f, "{sign}{mag} {}", self.symbol.code())
        } else {
            write!(
                f,
                "{sign}{}.{:0width$} {}",
                mag / scale,
                mag % scale,
                self.symbol.code(),
                width = precision as usize
            )
        }
    }
}

impl FromStr for Asset {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = |reason: &str| SymbolError::BadAsset {
            input: s.to_string(),
            reason: reason.to_string(),
        };
        let (quantity, code) = s
            .split_once(' ')
            .ok_or_else(|| bad("expected '<amount> <CODE>'"))?;
        let (sign, digits) = match quantity.strip_prefix('-') {
            Some(rest) => (-1i64, rest),
            None => (1i64, quantity),
        };
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, f),
            None => (digits, ""),
        };
        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad("invalid integer part"));
        }
        if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad("invalid fractional part"));
        }
        let precision = frac_part.len();
        if precision > MAX_PRECISION as usize {
            return Err(bad("too many decimal places"));
        }
        let mut combined = String::with_capacity(int_part.len() + precision);
        combined.push_str(int_part);
        combined.push_str(frac_part);
        let mag: u64 = combined
            .parse()
            .map_err(|_| SymbolError::AmountOverflow { input: s.to_string() })?;
        let amount = i64::try_from(mag)
            .map_err(|_| SymbolError::AmountOverflow { input: s.to_string() })?
            * sign;
        let symbol = Symbol::new(precision as u8, code)?;
        Ok(Asset::new(amount, symbol))
    }
}

impl Serialize for Asset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_layout() {
        let sym = Symbol::new(4, "SYS").unwrap();
        assert_eq!(sym.precision(), 4);
        assert_eq!(sym.code(), "SYS");
        assert_eq!(sym.to_string(), "4,SYS");
    }

    #[test]
    fn asset_rendering() {
        let sym = Symbol::new(4, "SYS").unwrap();
        assert_eq!(Asset::new(10_000, sym).to_string(), "1.0000 SYS");
        assert_eq!(Asset::new(-5_000, sym).to_string(), "-0.5000 SYS");
        let whole = Symbol::new(0, "WHOLE").unwrap();
        assert_eq!(Asset::new(42, whole).to_string(), "42 WHOLE");
    }

    #[test]
    fn asset_parse_round_trip() {
        for s in ["1.0000 SYS", "-0.5000 SYS", "42 WHOLE", "0.001 MILLI"] {
            let a: Asset = s.parse().unwrap();
            assert_eq!(a.to_string(), s, "round trip failed for {s}");
        }
    }

    #[test]
    fn asset_parse_rejects_garbage() {
        assert!("1.0000".parse::<Asset>().is_err());
        assert!("x.0000 SYS".parse::<Asset>().is_err());
        assert!("1.0000 sys".parse::<Asset>().is_err());
        assert!("99999999999999999999 BIG".parse::<Asset>().is_err());
    }
}
