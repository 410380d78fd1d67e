//! Session / Account Management
//!
//! Derives or restores the authenticated identity the transfer flow is
//! gated on, and persists the minimal session marker.
//!
//! # Flow
//!
//! ```text
//! sign_up:  create passkey → persist credential + session → faucet fund
//! sign_in:  stored credential → assert → persist session
//! restore:  session == "active" && credential parses → Account
//! sign_out: remove session (credential kept)
//! ```

pub mod account;
pub mod authenticator;
pub mod error;
pub mod manager;
pub mod store;

pub use account::{Account, Credential, derive_address};
pub use authenticator::{LocalAuthenticator, PasskeyAuthenticator};
pub use error::{SessionError, StoreError};
pub use manager::{AccountManager, CREDENTIAL_KEY, SESSION_KEY};
pub use store::{FileStore, KeyValueStore, MemoryStore};
