//! Conversation data models
//!
//! Defines structures for conversations and messages.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored conversation record
///
/// At most one row exists per key; the key is either a generated opaque
/// token or a caller-supplied network address.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Conversation {
    /// Unique key the message sequence is stored under
    pub key: String,
    /// JSON-encoded [`LocationHints`], when the client supplied any
    pub location: Option<String>,
    /// When the conversation was created (Unix timestamp)
    pub created_at: i64,
}

impl Conversation {
    /// Decode the stored location hints, if any
    #[allow(dead_code)]
    pub fn location_hints(&self) -> Option<LocationHints> {
        self.location
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}

/// A single message as persisted in a conversation
///
/// Immutable once stored; no update or delete operation exists.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StoredMessage {
    /// Store-assigned append sequence number
    pub seq: i64,
    /// Key of the conversation this message belongs to
    pub conversation_key: String,
    /// Free-text label of the message origin
    pub sender: String,
    /// Free-text message content
    pub body: String,
    /// Moment of the message (Unix timestamp)
    pub timestamp: i64,
}

/// A message as submitted by the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    /// Free-text label of the message origin
    pub sender: String,
    /// Free-text message content
    pub body: String,
    /// Moment of the message; defaults to insertion time when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl NewMessage {
    /// Create a message that will be stamped at insertion time
    pub fn new(sender: String, body: String) -> Self {
        Self {
            sender,
            body,
            timestamp: None,
        }
    }
}

/// Optional geographic hints supplied by address-keyed clients
///
/// Inert metadata: stored verbatim, never read by any logic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationHints {
    /// Country name or code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Region or state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// City
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}
