//! API utility functions
//!
//! Contains the shared router state and request validation helpers used by
//! the conversation handlers.

use crate::error::AppError;
use crate::store::{ConversationDb, KeySource};
use std::sync::Arc;

/// State threaded through every route handler
pub type RouterState = (Arc<ConversationDb>, KeySource);

/// Validate that a conversation key is present and non-blank
///
/// # Arguments
/// * `key` - Key field as it arrived in the request, if at all
///
/// # Returns
/// * `Ok(String)` - The key to operate on
/// * `Err(AppError)` - Key was missing or blank
pub fn require_key(key: Option<String>) -> Result<String, AppError> {
    match key {
        Some(k) if !k.trim().is_empty() => Ok(k),
        Some(_) => Err(AppError::Validation(
            "Conversation key cannot be empty".to_string(),
        )),
        None => Err(AppError::Validation(
            "Conversation key is required".to_string(),
        )),
    }
}
