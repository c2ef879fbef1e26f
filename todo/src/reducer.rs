//! Reducer for the todo collection.
//!
//! Every operation resolves inside the reducer: rejected input and broken
//! rules become `error` messages through [`classify`], accepted mutations
//! become a `success` message plus a debounced write. Success messages arm
//! their own expiry timer, keyed by message id.

use crate::error::{classify, TodoError};
use crate::persistence::PersistenceGateway;
use crate::sanitizer::validate_title;
use crate::types::{
    MessageId, MessageKind, ResultMessage, Todo, TodoAction, TodoId, TodoState,
    MAX_UNFINISHED_TODOS, SUCCESS_MESSAGE_TTL,
};
use std::sync::Arc;
use std::time::Duration;
use tasklist_core::{
    effect::{Effect, EffectId},
    environment::{Clock, IdGenerator},
    reducer::Reducer,
    smallvec, SmallVec,
};

/// Shown after a todo is created
pub const TODO_CREATED: &str = "TODO created.";
/// Shown after a todo is finished
pub const TODO_FINISHED: &str = "TODO finished.";
/// Shown after a todo is deleted
pub const TODO_DELETED: &str = "TODO deleted.";

/// Cancellation key of a success message's expiry timer
#[must_use]
pub fn expiry_id(id: &MessageId) -> EffectId {
    EffectId::from(format!("message-expiry:{id}"))
}

/// Environment dependencies for the todo reducer
#[derive(Clone)]
pub struct TodoEnvironment {
    /// Clock for creation timestamps
    pub clock: Arc<dyn Clock>,
    /// Source of todo and message ids
    pub ids: Arc<dyn IdGenerator>,
    /// Durable storage of the collection
    pub persistence: PersistenceGateway,
    /// Capacity bound on unfinished todos
    pub max_unfinished: usize,
    /// Lifetime of success messages
    pub message_ttl: Duration,
}

impl TodoEnvironment {
    /// Creates an environment with the default capacity and message lifetime
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        persistence: PersistenceGateway,
    ) -> Self {
        Self {
            clock,
            ids,
            persistence,
            max_unfinished: MAX_UNFINISHED_TODOS,
            message_ttl: SUCCESS_MESSAGE_TTL,
        }
    }

    /// Override the capacity bound
    #[must_use]
    pub const fn with_max_unfinished(mut self, max_unfinished: usize) -> Self {
        self.max_unfinished = max_unfinished;
        self
    }

    /// Override the success message lifetime
    #[must_use]
    pub const fn with_message_ttl(mut self, message_ttl: Duration) -> Self {
        self.message_ttl = message_ttl;
        self
    }

    fn next_message_id(&self) -> MessageId {
        MessageId::new(self.ids.next_id())
    }
}

type Effects = SmallVec<[Effect<TodoAction>; 4]>;

/// Reducer for the todo collection
#[derive(Clone, Debug, Default)]
pub struct TodoReducer;

impl TodoReducer {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Queue a success message and arm its expiry
    fn succeed(
        state: &mut TodoState,
        env: &TodoEnvironment,
        text: &str,
        effects: &mut Effects,
    ) {
        let id = env.next_message_id();
        effects.push(Effect::debounce(
            expiry_id(&id),
            env.message_ttl,
            TodoAction::MessageExpired { id: id.clone() },
        ));
        state
            .messages
            .push(ResultMessage::new(id, MessageKind::Success, text));
    }

    /// Queue the classified form of `error`
    fn reject(state: &mut TodoState, env: &TodoEnvironment, error: &TodoError) {
        let message = classify(error, env.next_message_id());
        state.messages.push(message);
    }

    fn add_todo(state: &mut TodoState, env: &TodoEnvironment, title: &str) -> Effects {
        let validation = validate_title(title);
        if !validation.is_valid {
            for message in validation.errors {
                Self::reject(state, env, &TodoError::validation(message));
            }
            return SmallVec::new();
        }

        if state.unfinished_count() >= env.max_unfinished {
            Self::reject(state, env, &TodoError::max_unfinished(env.max_unfinished));
            return SmallVec::new();
        }

        let todo = Todo::new(
            TodoId::new(env.ids.next_id()),
            validation.sanitized_title,
            env.clock.now(),
        );
        tracing::info!(todo_id = %todo.id, "Todo created");
        state.todos.insert(0, todo);

        let mut effects = Effects::new();
        Self::succeed(state, env, TODO_CREATED, &mut effects);
        effects.push(env.persistence.save(&state.todos));
        effects
    }

    fn finish_todo(state: &mut TodoState, env: &TodoEnvironment, id: &TodoId) -> Effects {
        let Some(todo) = state.todos.iter_mut().find(|todo| &todo.id == id) else {
            Self::reject(state, env, &TodoError::not_found());
            return SmallVec::new();
        };

        if todo.finished {
            Self::reject(state, env, &TodoError::already_finished());
            return SmallVec::new();
        }

        todo.finished = true;
        tracing::info!(todo_id = %id, "Todo finished");

        let mut effects = Effects::new();
        Self::succeed(state, env, TODO_FINISHED, &mut effects);
        effects.push(env.persistence.save(&state.todos));
        effects
    }

    fn delete_todo(state: &mut TodoState, env: &TodoEnvironment, id: &TodoId) -> Effects {
        let Some(index) = state.todos.iter().position(|todo| &todo.id == id) else {
            Self::reject(state, env, &TodoError::not_found());
            return SmallVec::new();
        };

        state.todos.remove(index);
        tracing::info!(todo_id = %id, "Todo deleted");

        let mut effects = Effects::new();
        Self::succeed(state, env, TODO_DELETED, &mut effects);
        effects.push(env.persistence.save(&state.todos));
        effects
    }
}

impl Reducer for TodoReducer {
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TodoAction::AddTodo { title } => Self::add_todo(state, env, &title),
            TodoAction::FinishTodo { id } => Self::finish_todo(state, env, &id),
            TodoAction::DeleteTodo { id } => Self::delete_todo(state, env, &id),

            TodoAction::ClearMessages => state
                .messages
                .clear()
                .into_iter()
                .filter(ResultMessage::expires)
                .map(|message| Effect::Cancel(expiry_id(&message.id)))
                .collect(),

            TodoAction::MessageExpired { id } => {
                state.messages.remove(&id);
                SmallVec::new()
            },

            TodoAction::FlushNow => smallvec![env.persistence.flush(&state.todos)],

            TodoAction::PersistFailed { error } => {
                Self::reject(state, env, &error);
                SmallVec::new()
            },
        }
    }
}
