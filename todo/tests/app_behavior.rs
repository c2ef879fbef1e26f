//! End-to-end behavior of the todo store over an in-memory durable store.
//!
//! Timers run on tokio's paused clock, so debounce and expiry are exact.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;
use tasklist_core::environment::Clock;
use tasklist_testing::{test_clock, InMemoryStorage, SequentialIdGenerator};
use todo::app::STORAGE_RESET_TEXT;
use todo::error::STORAGE_FAILURE_TEXT;
use todo::persistence::{decode, DEFAULT_STORAGE_KEY};
use todo::reducer::TODO_CREATED;
use todo::{MessageKind, PersistenceGateway, TodoApp, TodoEnvironment, TodoError, TodoId};

fn open_app(storage: &InMemoryStorage) -> TodoApp {
    let env = TodoEnvironment::new(
        Arc::new(test_clock()),
        Arc::new(SequentialIdGenerator::new("id")),
        PersistenceGateway::new(Arc::new(storage.clone())),
    );
    TodoApp::open(env)
}

fn stored_titles(storage: &InMemoryStorage) -> Vec<String> {
    storage
        .raw(DEFAULT_STORAGE_KEY)
        .and_then(|raw| decode(&raw))
        .unwrap_or_default()
        .into_iter()
        .map(|todo| todo.title)
        .collect()
}

#[tokio::test(start_paused = true)]
async fn burst_of_adds_produces_one_write_of_final_state() {
    let storage = InMemoryStorage::new();
    let app = open_app(&storage);

    for title in ["First", "Second", "Third"] {
        app.add_todo(title).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(storage.write_count(), 0);

    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(storage.write_count(), 1);
    assert_eq!(stored_titles(&storage), vec!["Third", "Second", "First"]);
}

#[tokio::test(start_paused = true)]
async fn success_message_expires_error_message_stays() {
    let storage = InMemoryStorage::new();
    let app = open_app(&storage);

    app.add_todo("Buy milk").await;
    app.finish_todo(&TodoId::new("missing")).await;

    let messages = app.messages().await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].kind, MessageKind::Success);
    assert_eq!(messages[0].text, TODO_CREATED);
    assert_eq!(messages[1].kind, MessageKind::Error);

    tokio::time::sleep(Duration::from_millis(2900)).await;
    assert_eq!(app.messages().await.len(), 2);

    tokio::time::sleep(Duration::from_millis(200)).await;
    let messages = app.messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind, MessageKind::Error);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(app.messages().await.len(), 1);

    app.clear_messages().await;
    assert!(app.messages().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn each_success_message_expires_on_its_own_schedule() {
    let storage = InMemoryStorage::new();
    let app = open_app(&storage);

    app.add_todo("First").await;
    tokio::time::sleep(Duration::from_millis(2000)).await;
    app.add_todo("Second").await;

    tokio::time::sleep(Duration::from_millis(1500)).await;
    let messages = app.messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, TODO_CREATED);

    tokio::time::sleep(Duration::from_millis(2000)).await;
    assert!(app.messages().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn clear_messages_disarms_expiry_timers() {
    let storage = InMemoryStorage::new();
    let app = open_app(&storage);

    app.add_todo("First").await;
    app.clear_messages().await;
    assert!(app.messages().await.is_empty());

    // Only the pending write remains registered
    assert_eq!(app.store().registered_cancellables(), 1);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(app.store().registered_cancellables(), 0);
}

#[tokio::test(start_paused = true)]
async fn sixth_unfinished_todo_is_rejected() {
    let storage = InMemoryStorage::new();
    let app = open_app(&storage);

    for n in 1..=5 {
        app.add_todo(format!("Task {n}")).await;
    }
    app.clear_messages().await;

    app.add_todo("Task 6").await;

    assert_eq!(app.todos().await.len(), 5);
    let messages = app.messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind, MessageKind::Error);
    assert_eq!(messages[0].text, "You can have at most 5 unfinished TODOs.");

    // Finishing one frees a slot
    let oldest = app.todos().await.last().map(|todo| todo.id.clone()).unwrap();
    app.finish_todo(&oldest).await;
    app.add_todo("Task 6").await;
    assert_eq!(app.todos().await.len(), 6);
}

#[tokio::test(start_paused = true)]
async fn finish_and_delete_round_trip_through_storage() {
    let storage = InMemoryStorage::new();
    let app = open_app(&storage);

    app.add_todo("Keep").await;
    app.add_todo("Discard").await;
    let todos = app.todos().await;
    assert_eq!(todos.len(), 2);
    let (discard_id, keep_id) = (todos[0].id.clone(), todos[1].id.clone());

    app.finish_todo(&keep_id).await;
    app.finish_todo(&keep_id).await;
    app.delete_todo(&discard_id).await;
    app.delete_todo(&discard_id).await;
    app.flush().await;

    let errors: Vec<String> = app
        .messages()
        .await
        .into_iter()
        .filter(|m| m.kind == MessageKind::Error)
        .map(|m| m.text)
        .collect();
    assert_eq!(
        errors,
        vec![
            TodoError::already_finished().user_message(),
            TodoError::not_found().user_message(),
        ]
    );

    let reopened = open_app(&storage);
    let todos = reopened.todos().await;
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].id, keep_id);
    assert_eq!(todos[0].title, "Keep");
    assert!(todos[0].finished);
    assert_eq!(todos[0].created_at, test_clock().now());
    assert!(reopened.messages().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn flush_writes_immediately_and_replaces_pending_debounce() {
    let storage = InMemoryStorage::new();
    let app = open_app(&storage);

    app.add_todo("Now").await;
    app.flush().await;
    assert_eq!(storage.write_count(), 1);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(storage.write_count(), 1);
    assert_eq!(stored_titles(&storage), vec!["Now"]);
}

#[tokio::test(start_paused = true)]
async fn write_failure_surfaces_generic_message() {
    let storage = InMemoryStorage::new();
    storage.fail_writes(true);
    let app = open_app(&storage);

    app.add_todo("Unsaved").await;
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(app.todos().await.len(), 1);
    let errors: Vec<_> = app
        .messages()
        .await
        .into_iter()
        .filter(|m| m.kind == MessageKind::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].text, STORAGE_FAILURE_TEXT);
}

#[tokio::test]
async fn corrupted_storage_is_cleared_with_warning() {
    for corrupt in [r#"{"todoId":"a"}"#, "not json at all"] {
        let storage = InMemoryStorage::new();
        storage.seed(DEFAULT_STORAGE_KEY, corrupt);

        let app = open_app(&storage);

        assert!(app.todos().await.is_empty());
        assert!(!storage.contains_key(DEFAULT_STORAGE_KEY));
        let messages = app.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, MessageKind::Warning);
        assert_eq!(messages[0].text, STORAGE_RESET_TEXT);
    }
}

#[tokio::test]
async fn unreadable_storage_keeps_saved_collection() {
    let storage = InMemoryStorage::new();
    storage.seed(
        DEFAULT_STORAGE_KEY,
        r#"[{"todoId":"kept","todoTitle":"Saved","finished":false,"createdAt":"2025-01-01T00:00:00.000Z"}]"#,
    );
    storage.fail_reads(true);

    let app = open_app(&storage);

    assert!(app.todos().await.is_empty());
    let messages = app.messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind, MessageKind::Error);
    assert_eq!(messages[0].text, STORAGE_FAILURE_TEXT);
    assert!(storage.contains_key(DEFAULT_STORAGE_KEY));

    storage.fail_reads(false);
    let reopened = open_app(&storage);
    let todos = reopened.todos().await;
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].id, TodoId::new("kept"));
    assert!(reopened.messages().await.is_empty());
}

#[tokio::test]
async fn failed_clear_of_corrupted_storage_is_reported() {
    let storage = InMemoryStorage::new();
    storage.seed(DEFAULT_STORAGE_KEY, "not json at all");
    storage.fail_writes(true);

    let app = open_app(&storage);

    assert!(app.todos().await.is_empty());
    let messages: Vec<_> = app
        .messages()
        .await
        .into_iter()
        .map(|m| (m.kind, m.text))
        .collect();
    assert_eq!(
        messages,
        vec![
            (MessageKind::Error, STORAGE_FAILURE_TEXT.to_string()),
            (MessageKind::Warning, STORAGE_RESET_TEXT.to_string()),
        ]
    );
}

#[tokio::test]
async fn malformed_item_is_dropped_on_open() {
    let storage = InMemoryStorage::new();
    storage.seed(
        DEFAULT_STORAGE_KEY,
        r#"[
            {"todoId":"good","todoTitle":"Fine","finished":false,"createdAt":"2025-01-01T00:00:00.000Z"},
            {"todoId":"bad","todoTitle":"Broken","finished":false,"createdAt":"not a date"}
        ]"#,
    );

    let app = open_app(&storage);

    let todos = app.todos().await;
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].id, TodoId::new("good"));
    assert!(app.messages().await.is_empty());
    assert!(storage.contains_key(DEFAULT_STORAGE_KEY));
}

#[tokio::test]
async fn missing_key_starts_empty_without_warning() {
    let storage = InMemoryStorage::new();
    let app = open_app(&storage);

    assert!(app.todos().await.is_empty());
    assert!(app.messages().await.is_empty());
}
