//! Debounced persistence of the todo collection.
//!
//! The collection lives under one key of a [`KeyValueStore`] as a JSON array
//! of [`StoredTodo`]. Reads validate every element on its own and drop the
//! ones that fail. Writes are described as effects: [`PersistenceGateway::save`]
//! arms a cancellable timer under [`PERSIST_EFFECT_ID`], so each save
//! replaces the one still waiting and a burst of mutations produces a single
//! write of the last snapshot.

use crate::error::TodoError;
use crate::types::{Todo, TodoAction, TodoId, PERSIST_DEBOUNCE};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tasklist_core::effect::{Effect, EffectId};
use tasklist_core::environment::{KeyValueStore, StorageError};

/// Default durable key
pub const DEFAULT_STORAGE_KEY: &str = "todo-app-todos";

/// Cancellation key shared by every pending write
pub const PERSIST_EFFECT_ID: &str = "persist-todos";

/// Durable form of a [`Todo`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTodo {
    /// Todo id
    pub todo_id: String,
    /// Sanitized title
    pub todo_title: String,
    /// Completion flag
    pub finished: bool,
    /// ISO-8601 creation time
    pub created_at: String,
}

impl From<&Todo> for StoredTodo {
    fn from(todo: &Todo) -> Self {
        Self {
            todo_id: todo.id.as_str().to_string(),
            todo_title: todo.title.clone(),
            finished: todo.finished,
            created_at: todo.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

impl TryFrom<StoredTodo> for Todo {
    type Error = String;

    fn try_from(stored: StoredTodo) -> Result<Self, Self::Error> {
        let created_at = parse_timestamp(&stored.created_at)
            .ok_or_else(|| format!("unparseable createdAt `{}`", stored.created_at))?;
        Ok(Self {
            id: TodoId::new(stored.todo_id),
            title: stored.todo_title,
            finished: stored.finished,
            created_at,
        })
    }
}

/// Parse a stored timestamp
///
/// Accepts RFC 3339, a naive date-time taken as UTC, or a bare date taken as
/// midnight UTC.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

/// Serialize the collection to its durable form
///
/// # Errors
///
/// Returns the serializer error; the types involved never produce one in
/// practice.
pub fn encode(todos: &[Todo]) -> Result<String, serde_json::Error> {
    let stored: Vec<StoredTodo> = todos.iter().map(StoredTodo::from).collect();
    serde_json::to_string(&stored)
}

/// Parse a durable value
///
/// Returns `None` (the corruption sentinel) when the value is not JSON or
/// not an array. Elements that fail validation are dropped, as are elements
/// repeating an id already seen.
#[must_use]
pub fn decode(raw: &str) -> Option<Vec<Todo>> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(%error, "Stored todos are not valid JSON");
            return None;
        },
    };

    let Value::Array(items) = value else {
        tracing::warn!("Stored todos are not an array");
        return None;
    };

    let total = items.len();
    let mut seen = HashSet::new();
    let todos: Vec<Todo> = items
        .into_iter()
        .filter_map(|item| {
            let stored: StoredTodo = serde_json::from_value(item).ok()?;
            Todo::try_from(stored).ok()
        })
        .filter(|todo| seen.insert(todo.id.clone()))
        .collect();

    if todos.len() < total {
        tracing::warn!(
            dropped = total - todos.len(),
            kept = todos.len(),
            "Dropped malformed stored todos"
        );
    }

    Some(todos)
}

/// Write `payload` unless a newer snapshot already landed
///
/// Returns whether the write happened.
fn write_snapshot(
    storage: &dyn KeyValueStore,
    key: &str,
    payload: &str,
    sequence: u64,
    last_written: &Mutex<u64>,
) -> Result<bool, StorageError> {
    let mut last = last_written.lock().unwrap_or_else(PoisonError::into_inner);
    if sequence <= *last {
        tracing::debug!(sequence, last_written = *last, "Skipped stale todo snapshot");
        return Ok(false);
    }
    storage.set(key, payload)?;
    *last = sequence;
    Ok(true)
}

/// Reads and writes the collection in a [`KeyValueStore`]
#[derive(Clone)]
pub struct PersistenceGateway {
    storage: Arc<dyn KeyValueStore>,
    key: String,
    debounce: Duration,
    next_sequence: Arc<AtomicU64>,
    last_written: Arc<Mutex<u64>>,
}

impl std::fmt::Debug for PersistenceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceGateway")
            .field("key", &self.key)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl PersistenceGateway {
    /// Gateway over `storage` using the default key and debounce window
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            key: DEFAULT_STORAGE_KEY.to_string(),
            debounce: PERSIST_DEBOUNCE,
            next_sequence: Arc::new(AtomicU64::new(0)),
            last_written: Arc::new(Mutex::new(0)),
        }
    }

    /// Use a different durable key
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Use a different debounce window
    #[must_use]
    pub const fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// The durable key
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the collection
    ///
    /// A missing (or empty) value is an empty collection. `Ok(None)` means the
    /// stored value is unreadable and should be cleared with
    /// [`clear_corrupted`](Self::clear_corrupted).
    ///
    /// # Errors
    ///
    /// Returns the store's error when the value could not be read at all; the
    /// stored value is then left untouched.
    pub fn load(&self) -> Result<Option<Vec<Todo>>, StorageError> {
        match self.storage.get(&self.key) {
            Ok(Some(raw)) if !raw.is_empty() => Ok(decode(&raw)),
            Ok(_) => Ok(Some(Vec::new())),
            Err(error) => {
                tracing::error!(key = %self.key, %error, "Failed to read stored todos");
                Err(error)
            },
        }
    }

    /// Remove the durable key
    ///
    /// # Errors
    ///
    /// Returns the store's error when the key could not be removed.
    pub fn clear_corrupted(&self) -> Result<(), StorageError> {
        self.storage.remove(&self.key).inspect_err(|error| {
            tracing::error!(key = %self.key, %error, "Failed to clear corrupted todo storage");
        })?;
        tracing::info!(key = %self.key, "Cleared corrupted todo storage");
        Ok(())
    }

    /// Debounced write of `todos`
    ///
    /// Re-arming replaces the pending write, so only the latest snapshot
    /// within a window is written.
    #[must_use]
    pub fn save(&self, todos: &[Todo]) -> Effect<TodoAction> {
        self.write_effect(todos, self.debounce)
    }

    /// Immediate write of `todos`, replacing any pending debounce
    #[must_use]
    pub fn flush(&self, todos: &[Todo]) -> Effect<TodoAction> {
        self.write_effect(todos, Duration::ZERO)
    }

    fn write_effect(&self, todos: &[Todo], delay: Duration) -> Effect<TodoAction> {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let payload = match encode(todos) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::error!(%error, "Failed to serialize todos");
                let error = TodoError::Unknown(error.to_string());
                return Effect::Future(Box::pin(async move {
                    Some(TodoAction::PersistFailed { error })
                }));
            },
        };

        let storage = Arc::clone(&self.storage);
        let key = self.key.clone();
        let last_written = Arc::clone(&self.last_written);

        Effect::Future(Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let written = tokio::task::spawn_blocking(move || {
                write_snapshot(storage.as_ref(), &key, &payload, sequence, &last_written)
            })
            .await;

            match written {
                Ok(Ok(true)) => {
                    tracing::debug!(sequence, "Persisted todos");
                    None
                },
                Ok(Ok(false)) => None,
                Ok(Err(source)) => {
                    tracing::error!(sequence, error = %source, "Failed to persist todos");
                    Some(TodoAction::PersistFailed {
                        error: TodoError::Storage {
                            operation: "save",
                            source,
                        },
                    })
                },
                Err(error) => {
                    tracing::error!(sequence, %error, "Todo write task failed");
                    Some(TodoAction::PersistFailed {
                        error: TodoError::Unknown(error.to_string()),
                    })
                },
            }
        }))
        .cancellable(EffectId::from(PERSIST_EFFECT_ID))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasklist_core::environment::Clock;
    use tasklist_testing::{test_clock, InMemoryStorage};

    fn sample() -> Vec<Todo> {
        let now = test_clock().now();
        let mut finished = Todo::new(TodoId::new("b"), "Walk the dog".to_string(), now);
        finished.finished = true;
        vec![Todo::new(TodoId::new("a"), "Buy milk".to_string(), now), finished]
    }

    #[test]
    fn round_trip_preserves_collection() {
        let todos = sample();
        let encoded = encode(&todos).unwrap_or_default();
        assert_eq!(decode(&encoded), Some(todos));
    }

    #[test]
    fn wire_format_uses_camel_case_fields() {
        let encoded = encode(&sample()[..1]).unwrap_or_default();
        assert_eq!(
            encoded,
            r#"[{"todoId":"a","todoTitle":"Buy milk","finished":false,"createdAt":"2025-01-01T00:00:00.000Z"}]"#
        );
    }

    #[test]
    fn non_array_and_invalid_json_are_corrupt() {
        assert_eq!(decode(r#"{"todoId":"a"}"#), None);
        assert_eq!(decode("42"), None);
        assert_eq!(decode("not json"), None);
        assert_eq!(decode("[]"), Some(Vec::new()));
    }

    #[test]
    fn malformed_items_are_dropped() {
        let raw = r#"[
            {"todoId":"a","todoTitle":"ok","finished":false,"createdAt":"2025-01-01T00:00:00.000Z"},
            {"todoId":"b","todoTitle":"bad date","finished":false,"createdAt":"yesterday"},
            {"todoId":"c","todoTitle":"bad flag","finished":"no","createdAt":"2025-01-01T00:00:00Z"},
            {"todoId":7,"todoTitle":"bad id","finished":true,"createdAt":"2025-01-01T00:00:00Z"},
            null,
            {"todoId":"a","todoTitle":"duplicate","finished":true,"createdAt":"2025-01-01T00:00:00Z"}
        ]"#;

        let todos = decode(raw).unwrap_or_default();

        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].id, TodoId::new("a"));
        assert_eq!(todos[0].title, "ok");
    }

    #[test]
    fn lenient_timestamps() {
        let midnight = test_clock().now();
        assert_eq!(parse_timestamp("2025-01-01T00:00:00Z"), Some(midnight));
        assert_eq!(parse_timestamp("2025-01-01T09:00:00+09:00"), Some(midnight));
        assert_eq!(parse_timestamp("2025-01-01T00:00:00"), Some(midnight));
        assert_eq!(parse_timestamp("2025-01-01T00:00:00.000"), Some(midnight));
        assert_eq!(parse_timestamp("2025-01-01"), Some(midnight));
        assert_eq!(parse_timestamp("2025-13-01"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn load_distinguishes_missing_from_corrupt() {
        let storage = InMemoryStorage::new();
        let gateway = PersistenceGateway::new(Arc::new(storage.clone()));

        assert_eq!(gateway.load(), Ok(Some(Vec::new())));

        storage.seed(DEFAULT_STORAGE_KEY, r#"{"not":"an array"}"#);
        assert_eq!(gateway.load(), Ok(None));

        assert_eq!(gateway.clear_corrupted(), Ok(()));
        assert!(!storage.contains_key(DEFAULT_STORAGE_KEY));
    }

    #[test]
    fn read_failure_is_an_error_not_corruption() {
        let storage = InMemoryStorage::new();
        storage.seed(DEFAULT_STORAGE_KEY, &encode(&sample()).unwrap_or_default());
        let gateway = PersistenceGateway::new(Arc::new(storage.clone()));

        storage.fail_reads(true);
        assert!(matches!(gateway.load(), Err(StorageError::Io { .. })));

        storage.fail_reads(false);
        assert_eq!(gateway.load(), Ok(Some(sample())));
    }

    #[test]
    fn stale_snapshot_never_overwrites_newer() {
        let storage = InMemoryStorage::new();
        let last_written = Mutex::new(0);

        assert_eq!(write_snapshot(&storage, "k", "second", 2, &last_written), Ok(true));
        assert_eq!(write_snapshot(&storage, "k", "first", 1, &last_written), Ok(false));

        assert_eq!(storage.raw("k").as_deref(), Some("second"));
        assert_eq!(storage.write_count(), 1);
    }

    #[test]
    fn save_and_flush_share_one_cancellation_key() {
        let gateway = PersistenceGateway::new(Arc::new(InMemoryStorage::new()));
        let id = EffectId::from(PERSIST_EFFECT_ID);

        assert_eq!(gateway.save(&sample()).cancellation_id(), Some(&id));
        assert_eq!(gateway.flush(&sample()).cancellation_id(), Some(&id));
    }

    #[tokio::test]
    async fn failed_write_reports_storage_error() {
        let storage = InMemoryStorage::with_quota(8);
        let gateway = PersistenceGateway::new(Arc::new(storage.clone()));

        let Effect::Cancellable { effect, .. } = gateway.flush(&sample()) else {
            unreachable!("writes are always cancellable");
        };
        let Effect::Future(write) = *effect else {
            unreachable!("writes run as futures");
        };

        let outcome = write.await;

        assert!(matches!(
            outcome,
            Some(TodoAction::PersistFailed {
                error: TodoError::Storage {
                    source: StorageError::QuotaExceeded { .. },
                    ..
                }
            })
        ));
        assert_eq!(storage.write_count(), 0);
    }
}
