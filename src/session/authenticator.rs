//! Passkey authenticators
//!
//! The session manager only needs two ceremonies: create a credential and
//! assert an existing one. `LocalAuthenticator` performs both in software
//! with Ed25519 key material, for headless runs.

use async_trait::async_trait;
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use tracing::debug;

use super::account::Credential;
use super::error::SessionError;

#[async_trait]
pub trait PasskeyAuthenticator: Send + Sync {
    /// Create a new credential bound to `rp_id`
    async fn create_credential(&self, label: &str, rp_id: &str)
    -> Result<Credential, SessionError>;

    /// Assert a stored credential; returns the (possibly refreshed) record
    async fn get_credential(
        &self,
        stored: &Credential,
        rp_id: &str,
    ) -> Result<Credential, SessionError>;
}

/// Software authenticator. The signing half is dropped after creation; only
/// the public key is ever persisted.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalAuthenticator;

impl LocalAuthenticator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PasskeyAuthenticator for LocalAuthenticator {
    async fn create_credential(
        &self,
        label: &str,
        rp_id: &str,
    ) -> Result<Credential, SessionError> {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();

        let id = uuid::Uuid::new_v4().simple().to_string();
        debug!(label, rp_id, credential_id = %id, "Passkey created");
        Ok(Credential::new(id, verifying_key.as_bytes()))
    }

    async fn get_credential(
        &self,
        stored: &Credential,
        rp_id: &str,
    ) -> Result<Credential, SessionError> {
        let bytes = stored.public_key_bytes()?;
        let key: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            SessionError::Authenticator(format!(
                "expected a 32-byte Ed25519 key, got {} bytes",
                bytes.len()
            ))
        })?;
        VerifyingKey::from_bytes(&key)
            .map_err(|e| SessionError::Authenticator(format!("rejected public key: {}", e)))?;

        debug!(rp_id, credential_id = %stored.id, "Passkey asserted");
        Ok(stored.clone())
    }
}
