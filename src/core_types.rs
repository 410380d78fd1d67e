//! Core types used throughout the system
//!
//! Addresses, transaction identifiers and amount helpers shared by the
//! transfer, session and chain modules.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Token amount in the token's smallest unit (e.g. 10 alphaUSD = 10_000_000).
pub type Amount = u128;

/// Parse errors for the core value types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("address must be 0x-prefixed 40 hex characters: {0}")]
    InvalidAddress(String),

    #[error("transaction id must not be empty")]
    EmptyTxId,

    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

/// 20-byte account / token address.
///
/// Parsing is case-insensitive; display is lower-case `0x` hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 20]);

impl Address {
    pub const LEN: usize = 20;

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; 20] = bytes.try_into().ok()?;
        Some(Self(bytes))
    }

    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// `0x1234...abcd` form used in status lines
    pub fn short(&self) -> String {
        short_address(&self.to_string())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| ParseError::InvalidAddress(s.to_string()))?;
        if digits.len() != Self::LEN * 2 {
            return Err(ParseError::InvalidAddress(s.to_string()));
        }
        let mut out = [0u8; 20];
        hex::decode_to_slice(digits, &mut out)
            .map_err(|_| ParseError::InvalidAddress(s.to_string()))?;
        Ok(Self(out))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Transaction identifier returned by the submit call.
///
/// Kept as the transport's own string form; no length is enforced because
/// the transport owns the format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(String);

impl TxId {
    pub fn new(raw: impl Into<String>) -> Result<Self, ParseError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ParseError::EmptyTxId);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 12 leading and 8 trailing characters, as shown next to results
    pub fn short(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 20 {
            return self.0.clone();
        }
        let head: String = chars[..12].iter().collect();
        let tail: String = chars[chars.len() - 8..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TxId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// `0x1234...abcd`; empty input stays empty.
pub fn short_address(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    if chars.len() <= 10 {
        return value.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Convert a human amount ("10", "0.5") into smallest units.
///
/// Rejects negative values and more fractional digits than `decimals`.
pub fn parse_units(text: &str, decimals: u32) -> Result<Amount, ParseError> {
    let value = Decimal::from_str(text.trim())
        .map_err(|e| ParseError::InvalidAmount(format!("{}: {}", text, e)))?;
    if value.is_sign_negative() {
        return Err(ParseError::InvalidAmount(format!("{} is negative", text)));
    }
    if value.normalize().scale() > decimals {
        return Err(ParseError::InvalidAmount(format!(
            "{} has more than {} decimals",
            text, decimals
        )));
    }

    let mantissa = value.normalize().mantissa() as u128;
    let scale = value.normalize().scale();
    10u128
        .checked_pow(decimals - scale)
        .and_then(|factor| mantissa.checked_mul(factor))
        .ok_or_else(|| ParseError::InvalidAmount(format!("{} overflows", text)))
}

/// Inverse of [`parse_units`] for display.
pub fn format_units(amount: Amount, decimals: u32) -> String {
    let factor = 10u128.pow(decimals);
    let whole = amount / factor;
    let frac = amount % factor;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}
