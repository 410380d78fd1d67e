//! Token Registry
//!
//! Fixed symbol -> address mapping supplied by configuration. Tokens are
//! never discovered from the network.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core_types::Address;
use crate::transfer::error::InvalidRequest;
use crate::transfer::types::TransferRequest;

/// One registered token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub symbol: String,
    pub address: Address,
}

/// Ordered symbol -> address registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRegistry {
    tokens: Vec<TokenInfo>,
}

impl TokenRegistry {
    pub fn new(tokens: Vec<TokenInfo>) -> Self {
        Self { tokens }
    }

    /// The Moderato testnet stablecoins
    pub fn moderato() -> Self {
        let tokens = [
            ("pathUSD", [0x20, 0xc0, 0x00]),
            ("alphaUSD", [0x20, 0xc0, 0x01]),
            ("betaUSD", [0x20, 0xc0, 0x02]),
            ("thetaUSD", [0x20, 0xc0, 0x03]),
        ]
        .into_iter()
        .map(|(symbol, [hi, lo, last])| {
            let mut bytes = [0u8; 20];
            bytes[0] = hi;
            bytes[1] = lo;
            bytes[19] = last;
            TokenInfo {
                symbol: symbol.to_string(),
                address: Address::new(bytes),
            }
        })
        .collect();
        Self { tokens }
    }

    /// Address for a symbol (exact match first, then case-insensitive)
    pub fn resolve(&self, symbol: &str) -> Option<Address> {
        self.tokens
            .iter()
            .find(|t| t.symbol == symbol)
            .or_else(|| {
                self.tokens
                    .iter()
                    .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
            })
            .map(|t| t.address)
    }

    pub fn symbol_of(&self, address: &Address) -> Option<&str> {
        self.tokens
            .iter()
            .find(|t| &t.address == address)
            .map(|t| t.symbol.as_str())
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.symbol_of(address).is_some()
    }

    pub fn tokens(&self) -> &[TokenInfo] {
        &self.tokens
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|t| t.symbol.as_str())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Local request validation; runs before any network call.
    pub fn validate(&self, request: &TransferRequest) -> Result<(), InvalidRequest> {
        if request.amount == 0 {
            return Err(InvalidRequest::ZeroAmount);
        }
        if !self.contains(&request.token) {
            return Err(InvalidRequest::UnknownToken(request.token));
        }
        if let Some(fee_token) = request.fee_token
            && !self.contains(&fee_token)
        {
            return Err(InvalidRequest::UnknownFeeToken(fee_token));
        }
        Ok(())
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::moderato()
    }
}

/// Fee payment selection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FeeMode {
    /// No fee token: the fee is paid in the transfer token
    #[default]
    Native,
    /// Pay fees in the named token
    Token(String),
}

impl FeeMode {
    /// Fee token address, `Ok(None)` for native.
    pub fn resolve(&self, registry: &TokenRegistry) -> Result<Option<Address>, String> {
        match self {
            FeeMode::Native => Ok(None),
            FeeMode::Token(symbol) => registry
                .resolve(symbol)
                .map(Some)
                .ok_or_else(|| symbol.clone()),
        }
    }
}

impl fmt::Display for FeeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeeMode::Native => f.write_str("not specified"),
            FeeMode::Token(symbol) => f.write_str(symbol),
        }
    }
}

impl FromStr for FeeMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("native") {
            Ok(FeeMode::Native)
        } else {
            Ok(FeeMode::Token(s.to_string()))
        }
    }
}
