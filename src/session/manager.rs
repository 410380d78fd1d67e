//! Account Manager
//!
//! Owns the two persisted records:
//! - `tempo_demo_credential`: JSON `{ "id", "publicKey" }`
//! - `tempo_demo_session`: the string `active` while signed in
//!
//! Restoring fails closed: anything missing or unreadable means no account.

use std::sync::Arc;

use tracing::{info, warn};

use super::account::{Account, Credential};
use super::authenticator::PasskeyAuthenticator;
use super::error::SessionError;
use super::store::KeyValueStore;
use crate::chain::Faucet;

pub const CREDENTIAL_KEY: &str = "tempo_demo_credential";
pub const SESSION_KEY: &str = "tempo_demo_session";
pub const SESSION_ACTIVE: &str = "active";

/// Sign-up label prefix; the unix millis are appended
pub const LABEL_PREFIX: &str = "tempo-fees";

pub struct AccountManager {
    store: Arc<dyn KeyValueStore>,
    authenticator: Arc<dyn PasskeyAuthenticator>,
    faucet: Arc<dyn Faucet>,
    rp_id: String,
}

impl AccountManager {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        authenticator: Arc<dyn PasskeyAuthenticator>,
        faucet: Arc<dyn Faucet>,
        rp_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            authenticator,
            faucet,
            rp_id: rp_id.into(),
        }
    }

    /// Active account from the persisted records, or `None`.
    pub fn restore(&self) -> Option<Account> {
        let session = match self.store.get(SESSION_KEY) {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Session record unreadable");
                return None;
            }
        };
        if session.as_deref() != Some(SESSION_ACTIVE) {
            return None;
        }

        let credential = self.stored_credential()?;
        match Account::from_credential(credential) {
            Ok(account) => {
                info!(address = %account.address, "Restored session: {}", account.address.short());
                Some(account)
            }
            Err(e) => {
                warn!(error = %e, "Stored credential rejected");
                None
            }
        }
    }

    /// Persisted credential; unreadable records count as absent.
    pub fn stored_credential(&self) -> Option<Credential> {
        let raw = match self.store.get(CREDENTIAL_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Credential record unreadable");
                return None;
            }
        };
        match Credential::from_json(&raw) {
            Ok(credential) => Some(credential),
            Err(e) => {
                warn!(error = %e, "Corrupt credential record");
                None
            }
        }
    }

    /// Adopt a freshly created passkey credential and start a session.
    pub fn create_account(&self, credential: Credential) -> Result<Account, SessionError> {
        let account = Account::from_credential(credential)?;
        self.persist(&account.credential)?;
        info!(address = %account.address, credential_id = %account.credential.id, "Account created");
        Ok(account)
    }

    /// Create a passkey, adopt it, then fund the account from the faucet.
    ///
    /// A faucet failure is reported after the account is persisted; the
    /// session stays active.
    pub async fn sign_up(&self) -> Result<Account, SessionError> {
        let label = sign_up_label();
        let credential = self
            .authenticator
            .create_credential(&label, &self.rp_id)
            .await?;
        let account = self.create_account(credential)?;

        self.faucet
            .fund(&account.address)
            .await
            .map_err(|source| SessionError::Faucet {
                address: account.address,
                source,
            })?;

        info!(address = %account.address, "Signed up + funded: {}", account.address.short());
        Ok(account)
    }

    /// Assert the stored credential and start a session.
    pub async fn sign_in(&self) -> Result<Account, SessionError> {
        let stored = self
            .stored_credential()
            .ok_or(SessionError::NoStoredCredential)?;

        let credential = self
            .authenticator
            .get_credential(&stored, &self.rp_id)
            .await?;
        let account = Account::from_credential(credential)?;
        self.persist(&account.credential)?;

        info!(address = %account.address, "Logged in: {}", account.address.short());
        Ok(account)
    }

    /// End the session; the credential stays for the next sign-in.
    pub fn sign_out(&self) -> Result<(), SessionError> {
        self.store.remove(SESSION_KEY)?;
        info!("Logged out");
        Ok(())
    }

    fn persist(&self, credential: &Credential) -> Result<(), SessionError> {
        self.store.set(CREDENTIAL_KEY, &credential.to_json()?)?;
        self.store.set(SESSION_KEY, SESSION_ACTIVE)?;
        Ok(())
    }
}

fn sign_up_label() -> String {
    format!("{}-{}", LABEL_PREFIX, chrono::Utc::now().timestamp_millis())
}
