//! Domain types for the todo collection.
//!
//! The live collection is ordered newest-first. Titles stored here are
//! always the sanitized form produced by [`crate::sanitizer`].

use crate::error::TodoError;
use crate::notifications::NotificationQueue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maximum number of unfinished todos the collection accepts
pub const MAX_UNFINISHED_TODOS: usize = 5;

/// Minimum title length, in characters, after sanitization
pub const MIN_TITLE_LENGTH: usize = 1;

/// Maximum title length, in characters, after sanitization
pub const MAX_TITLE_LENGTH: usize = 30;

/// How long a success message stays queued
pub const SUCCESS_MESSAGE_TTL: Duration = Duration::from_millis(3000);

/// Trailing window that collapses bursts of saves into one write
pub const PERSIST_DEBOUNCE: Duration = Duration::from_millis(500);

/// Opaque unique identifier of a todo
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    /// Wraps an identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TodoId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identity of a queued message, independent of its text
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Wraps an identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single todo item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Unique identifier within the live collection
    pub id: TodoId,
    /// Sanitized title, 1 to 30 characters
    pub title: String,
    /// Whether the todo is finished; never reverts to `false`
    pub finished: bool,
    /// Creation time, immutable once set
    pub created_at: DateTime<Utc>,
}

impl Todo {
    /// Creates an unfinished todo
    #[must_use]
    pub const fn new(id: TodoId, title: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title,
            finished: false,
            created_at,
        }
    }
}

/// Severity of a queued message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Operation succeeded; expires on its own
    Success,
    /// Operation was rejected or failed
    Error,
    /// Something needs the user's attention
    Warning,
    /// Neutral information
    Info,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        };
        f.write_str(label)
    }
}

/// A user-facing outcome record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultMessage {
    /// Identity used for expiry
    pub id: MessageId,
    /// Severity
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Text shown to the user
    pub text: String,
}

impl ResultMessage {
    /// Creates a message
    #[must_use]
    pub fn new(id: MessageId, kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            text: text.into(),
        }
    }

    /// Whether this message removes itself after [`SUCCESS_MESSAGE_TTL`]
    #[must_use]
    pub fn expires(&self) -> bool {
        self.kind == MessageKind::Success
    }
}

/// State owned by the todo store
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TodoState {
    /// Live collection, newest first
    pub todos: Vec<Todo>,
    /// Queued messages in insertion order
    pub messages: NotificationQueue,
}

impl TodoState {
    /// Creates an empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state holding an already loaded collection
    #[must_use]
    pub fn with_todos(todos: Vec<Todo>) -> Self {
        Self {
            todos,
            messages: NotificationQueue::default(),
        }
    }

    /// Number of todos
    #[must_use]
    pub fn count(&self) -> usize {
        self.todos.len()
    }

    /// Number of todos not yet finished
    #[must_use]
    pub fn unfinished_count(&self) -> usize {
        self.todos.iter().filter(|todo| !todo.finished).count()
    }

    /// Returns a todo by id
    #[must_use]
    pub fn get(&self, id: &TodoId) -> Option<&Todo> {
        self.todos.iter().find(|todo| &todo.id == id)
    }

    /// Checks if a todo exists
    #[must_use]
    pub fn exists(&self, id: &TodoId) -> bool {
        self.get(id).is_some()
    }
}

/// Inputs to the todo reducer: user intents and effect feedback
#[derive(Clone, Debug, PartialEq)]
pub enum TodoAction {
    /// Validate a raw title and prepend a new todo
    AddTodo {
        /// Raw, unsanitized title
        title: String,
    },

    /// Mark a todo as finished
    FinishTodo {
        /// Todo to finish
        id: TodoId,
    },

    /// Remove a todo from the collection
    DeleteTodo {
        /// Todo to delete
        id: TodoId,
    },

    /// Empty the message queue
    ClearMessages,

    /// A success message reached the end of its lifetime
    MessageExpired {
        /// Message to remove
        id: MessageId,
    },

    /// Write the current collection now, replacing any pending debounce
    FlushNow,

    /// A durable write failed
    PersistFailed {
        /// What went wrong
        error: TodoError,
    },
}
