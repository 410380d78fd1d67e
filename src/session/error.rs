//! Session Error Types

use std::path::PathBuf;

use thiserror::Error;

use crate::chain::ChainError;
use crate::core_types::Address;

/// Durable store failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store file {path} is not a JSON object: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode store contents: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Io { .. } => "STORE_IO",
            StoreError::Corrupt { .. } => "STORE_CORRUPT",
            StoreError::Encode(_) => "STORE_ENCODE",
        }
    }
}

/// Session / account errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No saved passkey account found. Sign up first.")]
    NoStoredCredential,

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Authenticator failed: {0}")]
    Authenticator(String),

    #[error("Faucet funding for {address} failed: {source}")]
    Faucet {
        address: Address,
        #[source]
        source: ChainError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SessionError {
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::NoStoredCredential => "NO_STORED_CREDENTIAL",
            SessionError::InvalidCredential(_) => "INVALID_CREDENTIAL",
            SessionError::Authenticator(_) => "AUTHENTICATOR_FAILED",
            SessionError::Faucet { .. } => "FAUCET_FAILED",
            SessionError::Store(e) => e.code(),
        }
    }
}
