//! Transfer Error Types

use std::time::Duration;

use thiserror::Error;

use super::classify::ClassifiedError;
use crate::core_types::{Address, TxId};

/// Local validation failures; never reach the network
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidRequest {
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Token is not in the registry: {0}")]
    UnknownToken(Address),

    #[error("Fee token is not in the registry: {0}")]
    UnknownFeeToken(Address),
}

/// Transfer error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    // === Preconditions (rejected before any side effect) ===
    #[error("No active account - sign in first")]
    NotAuthenticated,

    #[error("Invalid transfer request: {0}")]
    InvalidRequest(#[from] InvalidRequest),

    // === Submission ===
    #[error("Transfer submission failed: {0}")]
    SubmissionFailed(ClassifiedError),

    // === Confirmation ===
    #[error("No receipt for {tx_id} after {}ms", .elapsed.as_millis())]
    ConfirmationTimeout { tx_id: TxId, elapsed: Duration },

    #[error("Receipt lookup for {tx_id} failed: {reason}")]
    ConfirmationLookupFailed { tx_id: TxId, reason: String },

    #[error("Stopped waiting for {tx_id}: a newer transfer started")]
    ConfirmationAbandoned { tx_id: TxId },
}

impl TransferError {
    /// Get the error code for logs and API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::NotAuthenticated => "NOT_AUTHENTICATED",
            TransferError::InvalidRequest(_) => "INVALID_REQUEST",
            TransferError::SubmissionFailed(_) => "SUBMISSION_FAILED",
            TransferError::ConfirmationTimeout { .. } => "CONFIRMATION_TIMEOUT",
            TransferError::ConfirmationLookupFailed { .. } => "CONFIRMATION_LOOKUP_FAILED",
            TransferError::ConfirmationAbandoned { .. } => "CONFIRMATION_ABANDONED",
        }
    }

    /// Rejected before any state transition or network call
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            TransferError::NotAuthenticated | TransferError::InvalidRequest(_)
        )
    }

    /// Failure after the transfer was accepted by the network
    pub fn is_confirmation_stage(&self) -> bool {
        matches!(
            self,
            TransferError::ConfirmationTimeout { .. }
                | TransferError::ConfirmationLookupFailed { .. }
                | TransferError::ConfirmationAbandoned { .. }
        )
    }
}
