//! Transfer request types

use serde::Serialize;
use thiserror::Error;

use crate::chain::TransferCall;
use crate::core_types::{Address, Amount};
use crate::tokens::{FeeMode, TokenRegistry};

/// Failure to turn user selections into a request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Unknown token symbol: {0}")]
    UnknownToken(String),

    #[error("Unknown fee token symbol: {0}")]
    UnknownFeeToken(String),
}

/// A transfer the user intends to submit. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub to: Address,
    pub token: Address,
    /// Smallest token units
    pub amount: Amount,
    /// `None` pays the fee in the transfer token
    pub fee_token: Option<Address>,
}

impl TransferRequest {
    pub fn new(to: Address, token: Address, amount: Amount, fee_token: Option<Address>) -> Self {
        Self {
            to,
            token,
            amount,
            fee_token,
        }
    }

    /// Resolve symbols against the registry
    pub fn build(
        registry: &TokenRegistry,
        recipient: Address,
        token_symbol: &str,
        amount: Amount,
        fee_mode: &FeeMode,
    ) -> Result<Self, BuildError> {
        let token = registry
            .resolve(token_symbol)
            .ok_or_else(|| BuildError::UnknownToken(token_symbol.to_string()))?;
        let fee_token = fee_mode
            .resolve(registry)
            .map_err(BuildError::UnknownFeeToken)?;

        Ok(Self::new(recipient, token, amount, fee_token))
    }

    pub fn call(&self) -> TransferCall {
        TransferCall {
            to: self.to,
            token: self.token,
            amount: self.amount,
            fee_token: self.fee_token,
        }
    }
}

/// Preview of what will be sent, shown before submitting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TransferPayload {
    Ready {
        to: Address,
        token: Address,
        /// Decimal string of smallest units
        amount: String,
        #[serde(rename = "feeToken", skip_serializing_if = "Option::is_none")]
        fee_token: Option<Address>,
    },
    AwaitingInput {
        status: &'static str,
    },
}

impl TransferPayload {
    /// No active account yet
    pub fn awaiting_input() -> Self {
        TransferPayload::AwaitingInput {
            status: "awaiting_input",
        }
    }

    pub fn preview(request: Option<&TransferRequest>) -> Self {
        match request {
            Some(request) => TransferPayload::Ready {
                to: request.to,
                token: request.token,
                amount: request.amount.to_string(),
                fee_token: request.fee_token,
            },
            None => Self::awaiting_input(),
        }
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
