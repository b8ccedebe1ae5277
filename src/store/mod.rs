//! Conversation store
//!
//! Durable, key-addressed, append-only message log backed by SQLite.

pub mod db;
pub mod keys;
pub mod models;

pub use db::{ConversationDb, CreateOutcome};
pub use keys::KeySource;
pub use models::{Conversation, LocationHints, NewMessage, StoredMessage};
