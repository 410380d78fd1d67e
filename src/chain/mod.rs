//! Chain Collaborators
//!
//! The transfer core talks to the network only through the traits in this
//! module. The wire format belongs entirely to the implementation:
//!
//! - [`rpc::JsonRpcClient`] - HTTP JSON-RPC against a Tempo node
//! - [`mock::MockChain`] - in-process simulated chain for offline runs and tests
//!
//! Failures carry free-text messages only; the transfer module classifies
//! them by message content.

pub mod mock;
pub mod rpc;

pub use mock::MockChain;
pub use rpc::JsonRpcClient;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core_types::{Address, Amount, TxId};
use crate::session::Account;

/// Transport failure.
///
/// `short_message` mirrors the concise summary some transports attach;
/// `message` is the full text. Either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainError {
    pub short_message: Option<String>,
    pub message: Option<String>,
}

impl ChainError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            short_message: None,
            message: Some(message.into()),
        }
    }

    pub fn with_short(short_message: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            short_message: Some(short_message.into()),
            message: Some(message.into()),
        }
    }

    /// Transport-level timeout
    pub fn timed_out(context: &str) -> Self {
        Self::new(format!("{}: request timed out", context))
    }

    /// Best available text: short message, then message
    pub fn text(&self) -> &str {
        self.short_message
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.message.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or("Unknown error")
    }
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl std::error::Error for ChainError {}

/// Parameters of a token transfer call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferCall {
    pub to: Address,
    pub token: Address,
    pub amount: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_token: Option<Address>,
}

/// Inclusion record for a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_id: TxId,
    pub block_number: Option<u64>,
    /// Execution status reported by the node; a reverted transaction still
    /// has a receipt.
    pub success: bool,
}

impl Receipt {
    pub fn new(tx_id: TxId, block_number: Option<u64>) -> Self {
        Self {
            tx_id,
            block_number,
            success: true,
        }
    }
}

/// Submits a token transfer on behalf of an account
#[async_trait]
pub trait TransferGateway: Send + Sync {
    /// Adapter name for logging
    fn name(&self) -> &'static str;

    /// Send the transfer without waiting for inclusion.
    async fn submit_transfer(
        &self,
        account: &Account,
        call: &TransferCall,
    ) -> Result<TxId, ChainError>;
}

/// Looks up transaction receipts
#[async_trait]
pub trait ReceiptSource: Send + Sync {
    /// `Ok(None)` while the transaction is still pending.
    ///
    /// Implementations own their per-call timeout and backoff.
    async fn get_receipt(&self, tx_id: &TxId) -> Result<Option<Receipt>, ChainError>;
}

/// Test-network faucet used after sign-up
#[async_trait]
pub trait Faucet: Send + Sync {
    async fn fund(&self, address: &Address) -> Result<(), ChainError>;
}
