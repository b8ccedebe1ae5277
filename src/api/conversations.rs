//! Conversation API endpoints
//!
//! Handles HTTP requests for starting conversations, appending messages,
//! and reading stored history.

use crate::api::utils::{require_key, RouterState};
use crate::error::AppError;
use crate::store::{LocationHints, NewMessage};
use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

/// Request to start a new conversation
#[derive(Debug, Default, Deserialize)]
pub struct StartConversationRequest {
    /// Explicit conversation key, when the client already has one
    #[serde(default)]
    pub key: Option<String>,
    /// Caller network address (address-keyed deployments)
    #[serde(default)]
    pub address: Option<String>,
    /// Optional geographic hints, stored as inert metadata
    #[serde(default)]
    pub location: Option<LocationHints>,
}

/// Response to a start request
#[derive(Debug, Serialize)]
pub struct StartConversationResponse {
    /// The key the conversation is stored under
    pub key: String,
    /// Present when the conversation already existed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Request to append messages to a conversation
#[derive(Debug, Deserialize)]
pub struct SaveConversationRequest {
    /// Conversation key
    #[serde(default)]
    pub key: Option<String>,
    /// Messages to append, in order
    #[serde(default)]
    pub messages: Vec<NewMessage>,
}

/// Acknowledgment returned by a save request
#[derive(Debug, Serialize)]
pub struct SaveConversationResponse {
    /// Human-readable acknowledgment
    pub message: String,
}

/// Query parameters for a history request
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    /// Conversation key
    #[serde(default)]
    pub key: Option<String>,
}

/// Message as returned to the client
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Store-assigned append sequence number
    pub seq: i64,
    /// Label of the message origin
    pub sender: String,
    /// Message content
    pub body: String,
    /// Unix timestamp of the message
    pub timestamp: i64,
}

/// POST /api/conversations/start - Start a conversation
///
/// Returns the key in use. Starting a conversation that already exists is
/// not an error; the response carries an explanatory message instead.
pub async fn start_conversation(
    State((db, key_source)): State<RouterState>,
    Json(request): Json<StartConversationRequest>,
) -> Result<Json<StartConversationResponse>, AppError> {
    let key = key_source.resolve(request.key, request.address)?;
    let outcome = db.create_conversation(key, request.location.as_ref()).await?;

    let message = if outcome.created {
        None
    } else {
        Some("Conversation already exists".to_string())
    };

    Ok(Json(StartConversationResponse {
        key: outcome.key,
        message,
    }))
}

/// POST /api/conversations/save - Append messages to a conversation
///
/// Creates the conversation on first save. The batch is all-or-nothing.
pub async fn save_conversation(
    State((db, _)): State<RouterState>,
    Json(request): Json<SaveConversationRequest>,
) -> Result<Json<SaveConversationResponse>, AppError> {
    let key = require_key(request.key)?;
    db.append_messages(&key, &request.messages).await?;

    Ok(Json(SaveConversationResponse {
        message: "Conversation saved".to_string(),
    }))
}

/// GET /api/conversations/history?key=K - Read stored history
///
/// Returns the full message sequence in append order; an unknown key is a
/// 404, never an empty success result.
pub async fn conversation_history(
    State((db, _)): State<RouterState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    let key = require_key(params.key)?;
    let messages = db.history(&key).await?;

    let responses: Vec<MessageResponse> = messages
        .into_iter()
        .map(|m| MessageResponse {
            seq: m.seq,
            sender: m.sender,
            body: m.body,
            timestamp: m.timestamp,
        })
        .collect();

    Ok(Json(responses))
}
