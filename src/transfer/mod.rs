//! Transfer FSM
//!
//! Submits a stablecoin transfer, waits for its receipt and maps every
//! failure onto a user-facing outcome.
//!
//! # Architecture
//!
//! - **Orchestrator** owns the observable outcome and runs one cycle per
//!   submit.
//! - **Confirmation Waiter** polls the receipt source until a receipt
//!   appears or the deadline passes.
//! - **Classifier** turns raw transport failures into a fixed set of user
//!   messages with a bounded technical detail.
//!
//! # State Machine
//!
//! ```text
//! IDLE → SUBMITTING → PENDING_CONFIRMATION → CONFIRMED
//!             ↓                 ↓
//!          FAILED      SUBMITTED_UNCONFIRMED (timeout | unknown)
//! ```
//!
//! # Invariants
//!
//! 1. **Gate first**: no session or an invalid request is rejected before
//!    any transition or network call
//! 2. **Latest cycle wins**: a completion from a superseded cycle never
//!    overwrites newer state
//! 3. **No false failure**: once the network accepted the transfer, the
//!    outcome is never `FAILED`
//! 4. **Confirmed carries the submitted tx id**

pub mod classify;
pub mod confirmation;
pub mod error;
pub mod orchestrator;
pub mod state;
pub mod types;


// Re-exports for convenience
pub use classify::{
    ClassifiedError, ErrorClassifier, RawError, SubstringClassifier, UserMessage, classify,
};
pub use confirmation::{ConfirmationWaiter, WaitConfig};
pub use error::{InvalidRequest, TransferError};
pub use orchestrator::TransferOrchestrator;
pub use state::{CycleId, TransferOutcome, TransferSnapshot, UnconfirmedReason};
pub use types::{BuildError, TransferPayload, TransferRequest};
