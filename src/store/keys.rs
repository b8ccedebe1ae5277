//! Conversation key derivation
//!
//! The deployment decides where conversation keys come from: the server can
//! mint opaque tokens, or the client can identify itself by network address.
//! Both variants share the same store; only this policy differs.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Key-derivation policy for new conversations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySource {
    /// The server mints an opaque token when the caller supplies no key
    Generated,
    /// The caller must identify the conversation by its network address
    ClientAddress,
}

impl KeySource {
    /// Resolve the key to store under from the request fields.
    ///
    /// # Returns
    /// * `Ok(Some(key))` - the caller supplied a usable key or address
    /// * `Ok(None)` - generation is left to the store (Generated policy)
    /// * `Err(AppError::Validation)` - the policy requires an address and none was given
    pub fn resolve(
        &self,
        key: Option<String>,
        address: Option<String>,
    ) -> Result<Option<String>, AppError> {
        let key = key.filter(|k| !k.trim().is_empty());
        let address = address.filter(|a| !a.trim().is_empty());

        match self {
            KeySource::Generated => Ok(key.or(address)),
            KeySource::ClientAddress => address.or(key).map(Some).ok_or_else(|| {
                AppError::Validation(
                    "Client address is required to start a conversation".to_string(),
                )
            }),
        }
    }
}

impl From<&str> for KeySource {
    fn from(s: &str) -> Self {
        match s {
            "client" | "address" => KeySource::ClientAddress,
            _ => KeySource::Generated,
        }
    }
}

/// Mint a new opaque conversation key
pub fn generate_key() -> String {
    Uuid::new_v4().to_string()
}
