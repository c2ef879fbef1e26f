//! # Tasklist Core
//!
//! Core traits and types for the Tasklist reducer architecture.
//!
//! Business logic lives in reducers: pure functions that mutate owned state
//! and describe (but never perform) side effects. The runtime crate executes
//! those descriptions.
//!
//! ## Core Concepts
//!
//! - **State**: Domain state owned by a single store
//! - **Action**: All inputs to a reducer (user intents and effect feedback)
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions, optionally keyed for cancellation
//! - **Environment**: Injected dependencies (clock, id source, durable storage)
//!
//! ## Example
//!
//! ```
//! use tasklist_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//! use std::time::Duration;
//!
//! #[derive(Clone, Debug, Default)]
//! struct DraftState {
//!     text: String,
//!     saved: bool,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum DraftAction {
//!     Edit(String),
//!     Save,
//! }
//!
//! struct DraftReducer;
//!
//! impl Reducer for DraftReducer {
//!     type State = DraftState;
//!     type Action = DraftAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut DraftState,
//!         action: DraftAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<DraftAction>; 4]> {
//!         match action {
//!             DraftAction::Edit(text) => {
//!                 state.text = text;
//!                 state.saved = false;
//!                 smallvec![Effect::debounce(
//!                     "draft-save",
//!                     Duration::from_millis(500),
//!                     DraftAction::Save,
//!                 )]
//!             }
//!             DraftAction::Save => {
//!                 state.saved = true;
//!                 SmallVec::new()
//!             }
//!         }
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use smallvec::{smallvec, SmallVec};

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all business logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution) and are composable and cancellable.
pub mod effect {
    use std::borrow::Cow;
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Identifier for a cancellable effect
    ///
    /// At most one effect runs per id: registering a new cancellable effect
    /// under an id aborts the one already registered there.
    #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct EffectId(Cow<'static, str>);

    impl EffectId {
        /// Creates an id from a static name or an owned string
        #[must_use]
        pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
            Self(id.into())
        }

        /// Returns the id as a string slice
        #[must_use]
        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl std::fmt::Display for EffectId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<&'static str> for EffectId {
        fn from(id: &'static str) -> Self {
            Self(Cow::Borrowed(id))
        }
    }

    impl From<String> for EffectId {
        fn from(id: String) -> Self {
            Self(Cow::Owned(id))
        }
    }

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),

        /// Run effects sequentially
        Sequential(Vec<Effect<Action>>),

        /// Delayed action (timeouts, expiry, debounce)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),

        /// Run `effect` under `id`, replacing any effect already running under it
        Cancellable {
            /// Cancellation key
            id: EffectId,
            /// The effect to run
            effect: Box<Effect<Action>>,
        },

        /// Abort the effect registered under the id, if any
        Cancel(EffectId),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::Cancellable { id, effect } => f
                    .debug_struct("Effect::Cancellable")
                    .field("id", id)
                    .field("effect", effect)
                    .finish(),
                Effect::Cancel(id) => f.debug_tuple("Effect::Cancel").field(id).finish(),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Make this effect cancellable under `id`
        #[must_use]
        pub fn cancellable(self, id: impl Into<EffectId>) -> Effect<Action> {
            Effect::Cancellable {
                id: id.into(),
                effect: Box::new(self),
            }
        }

        /// Dispatch `action` once `window` passes without the same id being re-armed
        ///
        /// ```
        /// use tasklist_core::effect::{Effect, EffectId};
        /// use std::time::Duration;
        ///
        /// let effect = Effect::debounce("save", Duration::from_millis(500), "flush");
        /// assert_eq!(effect.cancellation_id(), Some(&EffectId::from("save")));
        /// ```
        #[must_use]
        pub fn debounce(id: impl Into<EffectId>, window: Duration, action: Action) -> Effect<Action> {
            Effect::Delay {
                duration: window,
                action: Box::new(action),
            }
            .cancellable(id)
        }

        /// The cancellation key of this effect, if it is `Cancellable` or `Cancel`
        #[must_use]
        pub const fn cancellation_id(&self) -> Option<&EffectId> {
            match self {
                Effect::Cancellable { id, .. } | Effect::Cancel(id) => Some(id),
                _ => None,
            }
        }

        /// Whether this effect does nothing
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};
    use thiserror::Error;

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Source of opaque unique identifiers
    pub trait IdGenerator: Send + Sync {
        /// Produce an id never returned before by this generator
        fn next_id(&self) -> String;
    }

    /// Random v4 UUIDs
    #[derive(Debug, Clone, Copy, Default)]
    pub struct UuidGenerator;

    impl IdGenerator for UuidGenerator {
        fn next_id(&self) -> String {
            uuid::Uuid::new_v4().to_string()
        }
    }

    /// Errors raised by a [`KeyValueStore`]
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StorageError {
        /// The backing medium failed
        #[error("storage I/O failed for key `{key}`: {message}")]
        Io {
            /// Key being accessed
            key: String,
            /// Underlying failure
            message: String,
        },

        /// The store refused a write because it is full
        #[error("storage quota exceeded while writing key `{key}`")]
        QuotaExceeded {
            /// Key being written
            key: String,
        },
    }

    /// Durable string key-value storage
    ///
    /// Calls are synchronous and may block; the runtime moves writes onto
    /// the blocking pool.
    pub trait KeyValueStore: Send + Sync {
        /// Read the value stored under `key`, `None` when absent
        ///
        /// # Errors
        ///
        /// Returns [`StorageError`] when the medium cannot be read.
        fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

        /// Replace the value stored under `key`
        ///
        /// # Errors
        ///
        /// Returns [`StorageError`] when the write is rejected or fails.
        fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

        /// Delete `key`; deleting an absent key succeeds
        ///
        /// # Errors
        ///
        /// Returns [`StorageError`] when the medium cannot be modified.
        fn remove(&self, key: &str) -> Result<(), StorageError>;
    }
}
