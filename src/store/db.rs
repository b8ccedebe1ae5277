//! Conversation database operations
//!
//! Owns the SQLite connection pool and the key-addressed, append-only
//! message log. Messages are stored as individual rows with a store-assigned
//! sequence number, so an append is a plain insert: concurrent appends to
//! the same conversation interleave instead of overwriting each other.

use crate::error::AppError;
use crate::store::keys;
use crate::store::models::{Conversation, LocationHints, NewMessage, StoredMessage};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

/// Result of a create call
#[derive(Debug, Clone)]
pub struct CreateOutcome {
    /// The key the conversation is stored under (supplied or generated)
    pub key: String,
    /// Whether a new record was written; `false` on a benign key collision
    pub created: bool,
}

/// Database connection pool for conversation storage
pub struct ConversationDb {
    pool: SqlitePool,
}

impl ConversationDb {
    /// Initialize database connection pool
    ///
    /// # Arguments
    /// * `database_url` - Path to the SQLite database file, with or without
    ///   the `sqlite:` scheme prefix
    ///
    /// # Returns
    /// * `Ok(ConversationDb)` if successful
    /// * `Err(AppError)` if connection failed
    pub async fn new(database_url: &str) -> Result<Self, AppError> {
        let db_path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

        // Ensure parent directory exists
        if db_path != ":memory:" {
            if let Some(parent) = PathBuf::from(db_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        AppError::Internal(anyhow::anyhow!("Failed to create db directory: {}", e))
                    })?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path))
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid database path: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to connect to database: {}", e)))?;

        info!("Connected to SQLite database at: {}", db_path);

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Apply the bootstrap schema
    async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations...");

        let migration_sql = include_str!("../../migrations/001_create_conversations.sql");

        // Remove comments (lines starting with --) and normalize whitespace
        let mut cleaned_sql = String::new();
        for line in migration_sql.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with("--") {
                continue;
            }
            let without_comments = if let Some(comment_pos) = trimmed.find("--") {
                &trimmed[..comment_pos]
            } else {
                trimmed
            };
            cleaned_sql.push_str(without_comments.trim());
            cleaned_sql.push(' ');
        }

        let statements: Vec<&str> = cleaned_sql
            .split(';')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::Storage(format!(
                        "Migration failed: {} - Statement: {}",
                        e,
                        statement.chars().take(100).collect::<String>()
                    ))
                })?;
        }

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Create a conversation, generating a key when none is supplied
    ///
    /// An existing key is a benign collision, not an error: stored messages
    /// are left untouched and the outcome reports `created: false`.
    pub async fn create_conversation(
        &self,
        key: Option<String>,
        location: Option<&LocationHints>,
    ) -> Result<CreateOutcome, AppError> {
        let key = key.unwrap_or_else(keys::generate_key);

        let location_json = match location {
            Some(hints) => Some(serde_json::to_string(hints).map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to encode location hints: {}", e))
            })?),
            None => None,
        };

        let result = sqlx::query(
            "INSERT INTO conversations (key, location, created_at) VALUES (?, ?, ?) \
             ON CONFLICT(key) DO NOTHING",
        )
        .bind(&key)
        .bind(&location_json)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to create conversation: {}", e)))?;

        let created = result.rows_affected() > 0;
        if created {
            debug!("Created conversation: {}", key);
        } else {
            debug!("Conversation already exists: {}", key);
        }

        Ok(CreateOutcome { key, created })
    }

    /// Append a batch of messages, creating the conversation if absent
    ///
    /// The whole batch lands in a single transaction: it succeeds or fails
    /// as one unit, and prior messages keep their order. An empty batch
    /// still creates the conversation row but stores nothing.
    pub async fn append_messages(
        &self,
        key: &str,
        messages: &[NewMessage],
    ) -> Result<(), AppError> {
        if key.trim().is_empty() {
            return Err(AppError::Validation(
                "Conversation key is required".to_string(),
            ));
        }

        let now = Utc::now().timestamp();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to begin transaction: {}", e)))?;

        sqlx::query(
            "INSERT INTO conversations (key, location, created_at) VALUES (?, NULL, ?) \
             ON CONFLICT(key) DO NOTHING",
        )
        .bind(key)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to upsert conversation: {}", e)))?;

        for message in messages {
            sqlx::query(
                "INSERT INTO messages (conversation_key, sender, body, timestamp) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(key)
            .bind(&message.sender)
            .bind(&message.body)
            .bind(message.timestamp.unwrap_or(now))
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to append message: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to commit append: {}", e)))?;

        debug!(
            "Appended {} message(s) to conversation {}",
            messages.len(),
            key
        );
        Ok(())
    }

    /// Get a conversation record by key
    pub async fn get_conversation(&self, key: &str) -> Result<Option<Conversation>, AppError> {
        let conversation = sqlx::query_as::<_, Conversation>(
            "SELECT key, location, created_at FROM conversations WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to fetch conversation: {}", e)))?;

        Ok(conversation)
    }

    /// Full message sequence for a conversation, in append order
    ///
    /// An unknown key is a `NotFound` error, never an empty success result.
    pub async fn history(&self, key: &str) -> Result<Vec<StoredMessage>, AppError> {
        if self.get_conversation(key).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "No conversation stored under key: {}",
                key
            )));
        }

        let messages = sqlx::query_as::<_, StoredMessage>(
            "SELECT seq, conversation_key, sender, body, timestamp FROM messages \
             WHERE conversation_key = ? ORDER BY seq ASC",
        )
        .bind(key)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to fetch messages: {}", e)))?;

        Ok(messages)
    }

    /// Close the connection pool; called during shutdown
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Get the database pool (for advanced operations if needed)
    #[allow(dead_code)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
