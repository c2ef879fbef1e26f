//! The todo store as seen by a UI layer.
//!
//! [`TodoApp`] is constructed once per application instance and shared by
//! reference. Operations never fail: problems are reported as queued
//! messages.

use crate::error::{classify, TodoError};
use crate::reducer::{TodoEnvironment, TodoReducer};
use crate::types::{
    MessageId, MessageKind, ResultMessage, Todo, TodoAction, TodoId, TodoState,
};
use tasklist_runtime::Store;

/// Shown when the stored collection could not be read and was reset
pub const STORAGE_RESET_TEXT: &str =
    "Saved TODOs could not be read and have been reset.";

/// Store driving the todo reducer
pub type TodoStore = Store<TodoState, TodoAction, TodoEnvironment, TodoReducer>;

/// Entry point for reading and mutating the todo collection
#[derive(Clone)]
pub struct TodoApp {
    store: TodoStore,
}

impl TodoApp {
    /// Load the stored collection and start a store over it
    ///
    /// An unreadable stored value is cleared; the app then starts empty with
    /// a warning queued. When the store itself cannot be read, the app starts
    /// empty with a storage error queued and the stored value is left alone.
    #[must_use]
    pub fn open(env: TodoEnvironment) -> Self {
        let state = match env.persistence.load() {
            Ok(Some(todos)) => {
                tracing::info!(count = todos.len(), key = env.persistence.key(), "Loaded todos");
                TodoState::with_todos(todos)
            },
            Ok(None) => {
                let mut state = TodoState::new();
                if let Err(source) = env.persistence.clear_corrupted() {
                    let error = TodoError::Storage {
                        operation: "clear",
                        source,
                    };
                    state.messages.push(classify(&error, next_message_id(&env)));
                }
                state.messages.push(ResultMessage::new(
                    next_message_id(&env),
                    MessageKind::Warning,
                    STORAGE_RESET_TEXT,
                ));
                state
            },
            Err(source) => {
                let error = TodoError::Storage {
                    operation: "load",
                    source,
                };
                let mut state = TodoState::new();
                state.messages.push(classify(&error, next_message_id(&env)));
                state
            },
        };

        Self {
            store: Store::new(state, TodoReducer::new(), env),
        }
    }

    /// Validate `title` and prepend a new todo
    pub async fn add_todo(&self, title: impl Into<String>) {
        self.dispatch(TodoAction::AddTodo {
            title: title.into(),
        })
        .await;
    }

    /// Mark the todo `id` as finished
    pub async fn finish_todo(&self, id: &TodoId) {
        self.dispatch(TodoAction::FinishTodo { id: id.clone() }).await;
    }

    /// Remove the todo `id`
    pub async fn delete_todo(&self, id: &TodoId) {
        self.dispatch(TodoAction::DeleteTodo { id: id.clone() }).await;
    }

    /// Empty the message queue
    pub async fn clear_messages(&self) {
        self.dispatch(TodoAction::ClearMessages).await;
    }

    /// Write the collection now and wait for the write to finish
    pub async fn flush(&self) {
        match self.store.send(TodoAction::FlushNow).await {
            Ok(mut handle) => handle.wait().await,
            Err(error) => tracing::warn!(%error, "Flush skipped"),
        }
    }

    /// Snapshot of the collection, newest first
    pub async fn todos(&self) -> Vec<Todo> {
        self.store.state(|state| state.todos.clone()).await
    }

    /// Snapshot of the queued messages, in insertion order
    pub async fn messages(&self) -> Vec<ResultMessage> {
        self.store
            .state(|state| state.messages.as_slice().to_vec())
            .await
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &TodoStore {
        &self.store
    }

    async fn dispatch(&self, action: TodoAction) {
        if let Err(error) = self.store.send(action).await {
            tracing::warn!(%error, "Ignored todo operation");
        }
    }
}

fn next_message_id(env: &TodoEnvironment) -> MessageId {
    MessageId::new(env.ids.next_id())
}
