//! Transfer Outcome Definitions
//!
//! `TransferOutcome` is the single source of truth for what the user sees.
//! Exactly one variant is live at a time; `TransferSnapshot` pairs it with
//! the cycle that produced it.

use std::fmt;

use serde::Serialize;

use super::classify::{ClassifiedError, UserMessage};
use crate::core_types::TxId;

/// Monotonic tag for one submit cycle
pub type CycleId = u64;

/// Why a submitted transfer ended without a receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnconfirmedReason {
    /// The confirmation deadline elapsed
    Timeout,
    /// Receipt lookup failed for any other reason
    Unknown,
}

impl UnconfirmedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnconfirmedReason::Timeout => "timeout",
            UnconfirmedReason::Unknown => "unknown",
        }
    }
}

impl fmt::Display for UnconfirmedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transfer outcome
///
/// ```text
/// Idle → Submitting → PendingConfirmation → Confirmed
///             ↓                ↓
///           Failed     SubmittedUnconfirmed
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransferOutcome {
    Idle,
    Submitting,
    PendingConfirmation {
        tx_id: TxId,
    },
    Confirmed {
        tx_id: TxId,
    },
    /// The network accepted the transfer but no receipt was observed
    SubmittedUnconfirmed {
        tx_id: TxId,
        reason: UnconfirmedReason,
    },
    /// Submission failed; no funds moved
    Failed {
        user_message: UserMessage,
        technical_detail: String,
    },
}

impl TransferOutcome {
    pub fn failed(error: &ClassifiedError) -> Self {
        TransferOutcome::Failed {
            user_message: error.user_message(),
            technical_detail: error.technical_detail().to_string(),
        }
    }

    /// No further transitions in this cycle
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferOutcome::Confirmed { .. }
                | TransferOutcome::SubmittedUnconfirmed { .. }
                | TransferOutcome::Failed { .. }
        )
    }

    /// A submit cycle is running
    #[inline]
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            TransferOutcome::Submitting | TransferOutcome::PendingConfirmation { .. }
        )
    }

    pub fn tx_id(&self) -> Option<&TxId> {
        match self {
            TransferOutcome::PendingConfirmation { tx_id }
            | TransferOutcome::Confirmed { tx_id }
            | TransferOutcome::SubmittedUnconfirmed { tx_id, .. } => Some(tx_id),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferOutcome::Idle => "IDLE",
            TransferOutcome::Submitting => "SUBMITTING",
            TransferOutcome::PendingConfirmation { .. } => "PENDING_CONFIRMATION",
            TransferOutcome::Confirmed { .. } => "CONFIRMED",
            TransferOutcome::SubmittedUnconfirmed { .. } => "SUBMITTED_UNCONFIRMED",
            TransferOutcome::Failed { .. } => "FAILED",
        }
    }

    /// Status text shown to the user
    pub fn status_line(&self) -> &'static str {
        match self {
            TransferOutcome::Idle => "Ready.",
            TransferOutcome::Submitting => "Submitting transfer...",
            TransferOutcome::PendingConfirmation { .. } => {
                "Transaction sent. Waiting for confirmation..."
            }
            TransferOutcome::Confirmed { .. } => "Transaction confirmed.",
            TransferOutcome::SubmittedUnconfirmed {
                reason: UnconfirmedReason::Timeout,
                ..
            } => "Transaction submitted. Confirmation is taking longer than expected.",
            TransferOutcome::SubmittedUnconfirmed {
                reason: UnconfirmedReason::Unknown,
                ..
            } => "Transaction submitted. Could not confirm yet, check explorer with tx hash.",
            TransferOutcome::Failed { user_message, .. } => user_message.as_str(),
        }
    }

    /// Explorer link for any outcome carrying a transaction id
    pub fn explorer_url(&self, explorer_tx_base: &str) -> Option<String> {
        self.tx_id()
            .map(|tx_id| format!("{}{}", explorer_tx_base, tx_id))
    }
}

impl Default for TransferOutcome {
    fn default() -> Self {
        TransferOutcome::Idle
    }
}

impl fmt::Display for TransferOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tx_id() {
            Some(tx_id) => write!(f, "{}({})", self.as_str(), tx_id),
            None => f.write_str(self.as_str()),
        }
    }
}

/// Published state: the live outcome and the cycle it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TransferSnapshot {
    pub cycle: CycleId,
    pub outcome: TransferOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx() -> TxId {
        TxId::new("0xabc").unwrap()
    }

    #[test]
    fn test_terminal_states() {
        assert!(TransferOutcome::Confirmed { tx_id: tx() }.is_terminal());
        assert!(
            TransferOutcome::SubmittedUnconfirmed {
                tx_id: tx(),
                reason: UnconfirmedReason::Timeout
            }
            .is_terminal()
        );
        assert!(
            TransferOutcome::Failed {
                user_message: UserMessage::Generic,
                technical_detail: "x".to_string()
            }
            .is_terminal()
        );

        assert!(!TransferOutcome::Idle.is_terminal());
        assert!(!TransferOutcome::Submitting.is_terminal());
        assert!(!TransferOutcome::PendingConfirmation { tx_id: tx() }.is_terminal());
    }

    #[test]
    fn test_busy_states() {
        assert!(TransferOutcome::Submitting.is_busy());
        assert!(TransferOutcome::PendingConfirmation { tx_id: tx() }.is_busy());
        assert!(!TransferOutcome::Idle.is_busy());
        assert!(!TransferOutcome::Confirmed { tx_id: tx() }.is_busy());
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(
            TransferOutcome::SubmittedUnconfirmed {
                tx_id: tx(),
                reason: UnconfirmedReason::Timeout
            }
            .status_line(),
            "Transaction submitted. Confirmation is taking longer than expected."
        );
        assert_eq!(
            TransferOutcome::SubmittedUnconfirmed {
                tx_id: tx(),
                reason: UnconfirmedReason::Unknown
            }
            .status_line(),
            "Transaction submitted. Could not confirm yet, check explorer with tx hash."
        );
        assert_eq!(
            TransferOutcome::Failed {
                user_message: UserMessage::InsufficientBalance,
                technical_detail: "insufficient funds".to_string()
            }
            .status_line(),
            "Insufficient balance for transfer or fees."
        );
    }

    #[test]
    fn test_explorer_url() {
        let base = "https://explore.tempo.xyz/tx/";
        assert_eq!(
            TransferOutcome::Confirmed { tx_id: tx() }.explorer_url(base),
            Some("https://explore.tempo.xyz/tx/0xabc".to_string())
        );
        assert_eq!(TransferOutcome::Submitting.explorer_url(base), None);
    }

    #[test]
    fn test_serialize_tagged() {
        let json = serde_json::to_value(TransferOutcome::SubmittedUnconfirmed {
            tx_id: tx(),
            reason: UnconfirmedReason::Timeout,
        })
        .unwrap();
        assert_eq!(json["status"], "submitted_unconfirmed");
        assert_eq!(json["tx_id"], "0xabc");
        assert_eq!(json["reason"], "timeout");

        let idle = serde_json::to_value(TransferOutcome::Idle).unwrap();
        assert_eq!(idle["status"], "idle");
    }

    #[test]
    fn test_display() {
        assert_eq!(TransferOutcome::Idle.to_string(), "IDLE");
        assert_eq!(
            TransferOutcome::Confirmed { tx_id: tx() }.to_string(),
            "CONFIRMED(0xabc)"
        );
    }
}
