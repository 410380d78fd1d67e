//! Tempo Fees - stablecoin transfers with a selectable fee token
//!
//! Submits a TIP-20 transfer on Tempo Moderato, waits for its receipt and
//! reports a single observable outcome.
//!
//! # Modules
//!
//! - [`core_types`] - Address, TxId, amount parsing
//! - [`tokens`] - Token registry and fee mode
//! - [`chain`] - Network collaborators (JSON-RPC client, simulated chain)
//! - [`transfer`] - Transfer FSM: orchestrator, confirmation waiter, classifier
//! - [`session`] - Passkey account and persisted session
//! - [`server`] - Static asset server for the web client
//! - [`config`] - YAML configuration
//! - [`logging`] - tracing setup

// Core types - must be first!
pub mod core_types;

pub mod chain;
pub mod config;
pub mod logging;
pub mod server;
pub mod session;
pub mod tokens;
pub mod transfer;

// Convenient re-exports at crate root
pub use chain::{ChainError, Faucet, JsonRpcClient, MockChain, ReceiptSource, TransferGateway};
pub use config::AppConfig;
pub use core_types::{Address, Amount, TxId};
pub use session::{Account, AccountManager, Credential, SessionError};
pub use tokens::{FeeMode, TokenRegistry};
pub use transfer::{
    TransferError, TransferOrchestrator, TransferOutcome, TransferPayload, TransferRequest,
    UnconfirmedReason, WaitConfig,
};
