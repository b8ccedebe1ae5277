//! Integration tests for the conversation store
//!
//! Exercises the store operations end to end against a throwaway SQLite file.

use chatlog_backend::error::AppError;
use chatlog_backend::store::{ConversationDb, LocationHints, NewMessage};
use tempfile::TempDir;

async fn create_test_db() -> (ConversationDb, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = ConversationDb::new(db_path.to_str().unwrap())
        .await
        .expect("Failed to create test database");
    (db, temp_dir)
}

fn message(sender: &str, body: &str) -> NewMessage {
    NewMessage::new(sender.to_string(), body.to_string())
}

#[tokio::test]
async fn test_create_then_history_is_empty() {
    let (db, _temp_dir) = create_test_db().await;

    let outcome = db
        .create_conversation(Some("k".to_string()), None)
        .await
        .unwrap();
    assert!(outcome.created);
    assert_eq!(outcome.key, "k");

    let history = db.history("k").await.unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_create_generates_key_when_none_supplied() {
    let (db, _temp_dir) = create_test_db().await;

    let outcome = db.create_conversation(None, None).await.unwrap();
    assert!(outcome.created);
    assert!(!outcome.key.is_empty());

    // The generated key addresses a real, empty conversation
    let history = db.history(&outcome.key).await.unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_append_batches_concatenate_in_order() {
    let (db, _temp_dir) = create_test_db().await;

    db.append_messages("k", &[message("user", "hello"), message("bot", "hi")])
        .await
        .unwrap();
    db.append_messages("k", &[message("user", "how are you?")])
        .await
        .unwrap();

    let history = db.history("k").await.unwrap();
    let bodies: Vec<&str> = history.iter().map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, vec!["hello", "hi", "how are you?"]);

    // Sequence numbers grow with append order
    assert!(history[0].seq < history[1].seq);
    assert!(history[1].seq < history[2].seq);
    assert!(history.iter().all(|m| m.conversation_key == "k"));
}

#[tokio::test]
async fn test_append_creates_conversation_when_absent() {
    let (db, _temp_dir) = create_test_db().await;

    assert!(db.get_conversation("fresh").await.unwrap().is_none());
    db.append_messages("fresh", &[message("user", "first")])
        .await
        .unwrap();
    assert!(db.get_conversation("fresh").await.unwrap().is_some());
}

#[tokio::test]
async fn test_append_empty_batch_is_noop_and_does_not_fail() {
    let (db, _temp_dir) = create_test_db().await;

    db.append_messages("k", &[message("user", "hello")])
        .await
        .unwrap();
    db.append_messages("k", &[]).await.unwrap();

    let history = db.history("k").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].body, "hello");
}

#[tokio::test]
async fn test_append_empty_batch_still_creates_conversation() {
    let (db, _temp_dir) = create_test_db().await;

    db.append_messages("k", &[]).await.unwrap();

    let history = db.history("k").await.unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_append_blank_key_fails_without_writing() {
    let (db, _temp_dir) = create_test_db().await;

    for key in ["", "   "] {
        let result = db.append_messages(key, &[message("user", "hello")]).await;
        match result.unwrap_err() {
            AppError::Validation(_) => {}
            other => panic!("Expected Validation error, got: {:?}", other),
        }
        assert!(db.get_conversation(key).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_create_existing_key_is_benign_and_preserves_messages() {
    let (db, _temp_dir) = create_test_db().await;

    db.create_conversation(Some("k".to_string()), None)
        .await
        .unwrap();
    db.append_messages("k", &[message("u", "hi")]).await.unwrap();

    let outcome = db
        .create_conversation(Some("k".to_string()), None)
        .await
        .unwrap();
    assert!(!outcome.created);
    assert_eq!(outcome.key, "k");

    let history = db.history("k").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].sender, "u");
    assert_eq!(history[0].body, "hi");
}

#[tokio::test]
async fn test_history_unknown_key_is_not_found() {
    let (db, _temp_dir) = create_test_db().await;

    let result = db.history("nonexistent").await;
    match result.unwrap_err() {
        AppError::NotFound(_) => {}
        other => panic!("Expected NotFound error, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_history_is_idempotent_between_writes() {
    let (db, _temp_dir) = create_test_db().await;

    db.append_messages("k", &[message("user", "hello"), message("bot", "hi")])
        .await
        .unwrap();

    let first = db.history("k").await.unwrap();
    let second = db.history("k").await.unwrap();

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.seq, b.seq);
        assert_eq!(a.sender, b.sender);
        assert_eq!(a.body, b.body);
        assert_eq!(a.timestamp, b.timestamp);
    }
}

#[tokio::test]
async fn test_message_timestamp_defaults_to_insertion_time() {
    let (db, _temp_dir) = create_test_db().await;

    let before = chrono::Utc::now().timestamp();
    db.append_messages("k", &[message("user", "hello")])
        .await
        .unwrap();
    let after = chrono::Utc::now().timestamp();

    let history = db.history("k").await.unwrap();
    assert!(history[0].timestamp >= before);
    assert!(history[0].timestamp <= after);
}

#[tokio::test]
async fn test_message_timestamp_is_kept_when_supplied() {
    let (db, _temp_dir) = create_test_db().await;

    let mut msg = message("user", "hello");
    msg.timestamp = Some(1_600_000_000);
    db.append_messages("k", &[msg]).await.unwrap();

    let history = db.history("k").await.unwrap();
    assert_eq!(history[0].timestamp, 1_600_000_000);
}

#[tokio::test]
async fn test_location_hints_round_trip() {
    let (db, _temp_dir) = create_test_db().await;

    let hints = LocationHints {
        country: Some("BR".to_string()),
        region: Some("SP".to_string()),
        city: Some("São Paulo".to_string()),
    };
    db.create_conversation(Some("203.0.113.7".to_string()), Some(&hints))
        .await
        .unwrap();

    let conversation = db.get_conversation("203.0.113.7").await.unwrap().unwrap();
    assert_eq!(conversation.location_hints(), Some(hints));
}

#[tokio::test]
async fn test_conversations_are_isolated_by_key() {
    let (db, _temp_dir) = create_test_db().await;

    db.append_messages("a", &[message("user", "for a")])
        .await
        .unwrap();
    db.append_messages("b", &[message("user", "for b")])
        .await
        .unwrap();

    let history_a = db.history("a").await.unwrap();
    let history_b = db.history("b").await.unwrap();
    assert_eq!(history_a.len(), 1);
    assert_eq!(history_b.len(), 1);
    assert_eq!(history_a[0].body, "for a");
    assert_eq!(history_b[0].body, "for b");
}
