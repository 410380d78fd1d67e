//! Passkey credential and the account derived from it

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use super::error::SessionError;
use crate::core_types::Address;

/// Uncompressed point marker stripped before hashing
const UNCOMPRESSED_PREFIX: u8 = 0x04;
const UNCOMPRESSED_LEN: usize = 65;

/// Persisted passkey record: `{ "id", "publicKey" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub id: String,
    /// 0x-prefixed hex
    pub public_key: String,
}

impl Credential {
    pub fn new(id: impl Into<String>, public_key: &[u8]) -> Self {
        Self {
            id: id.into(),
            public_key: format!("0x{}", hex::encode(public_key)),
        }
    }

    pub fn public_key_bytes(&self) -> Result<Vec<u8>, SessionError> {
        let raw = self.public_key.trim();
        let raw = raw.strip_prefix("0x").unwrap_or(raw);
        let bytes = hex::decode(raw)
            .map_err(|e| SessionError::InvalidCredential(format!("public key is not hex: {}", e)))?;
        if bytes.is_empty() {
            return Err(SessionError::InvalidCredential(
                "public key is empty".to_string(),
            ));
        }
        Ok(bytes)
    }

    pub fn to_json(&self) -> Result<String, SessionError> {
        serde_json::to_string(self)
            .map_err(|e| SessionError::InvalidCredential(e.to_string()))
    }

    pub fn from_json(raw: &str) -> Result<Self, SessionError> {
        let credential: Credential = serde_json::from_str(raw)
            .map_err(|e| SessionError::InvalidCredential(e.to_string()))?;
        if credential.id.is_empty() {
            return Err(SessionError::InvalidCredential(
                "credential id is empty".to_string(),
            ));
        }
        Ok(credential)
    }
}

/// Authenticated identity; the address is a pure function of the public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub address: Address,
    pub credential: Credential,
}

impl Account {
    pub fn from_credential(credential: Credential) -> Result<Self, SessionError> {
        let public_key = credential.public_key_bytes()?;
        Ok(Self {
            address: derive_address(&public_key),
            credential,
        })
    }
}

/// Last 20 bytes of Keccak-256 over the key coordinates
pub fn derive_address(public_key: &[u8]) -> Address {
    let coordinates = match public_key.split_first() {
        Some((&UNCOMPRESSED_PREFIX, rest)) if public_key.len() == UNCOMPRESSED_LEN => rest,
        _ => public_key,
    };

    let digest = Keccak256::digest(coordinates);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[12..]);
    Address::new(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_ignores_uncompressed_prefix() {
        let coordinates = [0x11u8; 64];
        let mut uncompressed = vec![UNCOMPRESSED_PREFIX];
        uncompressed.extend_from_slice(&coordinates);

        assert_eq!(derive_address(&uncompressed), derive_address(&coordinates));
    }

    #[test]
    fn test_address_is_keccak_tail() {
        // keccak256 of the empty string
        let expected = "0xdcc703c0e500b653ca82273b7bfad8045d85a470";
        assert_eq!(derive_address(&[]).to_string(), expected);
    }

    #[test]
    fn test_account_from_credential() {
        let credential = Credential {
            id: "cred-1".to_string(),
            public_key: format!("0x04{}", "11".repeat(64)),
        };
        let account = Account::from_credential(credential.clone()).unwrap();
        assert_eq!(account.address, derive_address(&[0x11; 64]));
        assert_eq!(account.credential, credential);

        // deterministic
        assert_eq!(
            Account::from_credential(credential).unwrap().address,
            account.address
        );
    }

    #[test]
    fn test_invalid_public_key() {
        let bad = Credential {
            id: "x".to_string(),
            public_key: "0xzz".to_string(),
        };
        assert_eq!(
            Account::from_credential(bad).unwrap_err().code(),
            "INVALID_CREDENTIAL"
        );

        let empty = Credential {
            id: "x".to_string(),
            public_key: "0x".to_string(),
        };
        assert!(Account::from_credential(empty).is_err());
    }

    #[test]
    fn test_credential_json_shape() {
        let credential = Credential::new("abc", &[1, 2, 3]);
        let json = credential.to_json().unwrap();
        assert_eq!(json, r#"{"id":"abc","publicKey":"0x010203"}"#);
        assert_eq!(Credential::from_json(&json).unwrap(), credential);

        assert!(Credential::from_json("{not json").is_err());
        assert!(Credential::from_json(r#"{"id":"","publicKey":"0x01"}"#).is_err());
    }
}
