//! Error taxonomy and the classifier that turns errors into messages.
//!
//! Nothing in the todo store propagates an error to its caller. Every
//! failure ends up in [`classify`], which logs the full error and returns an
//! `error` message whose text is safe to show.

use crate::types::{MessageId, MessageKind, ResultMessage};
use tasklist_core::environment::StorageError;
use thiserror::Error;

/// Shown for storage failures instead of the underlying error
pub const STORAGE_FAILURE_TEXT: &str =
    "An error occurred while saving your data. Please try again later.";

/// Shown for unexpected failures instead of the underlying error
pub const UNKNOWN_FAILURE_TEXT: &str = "An unexpected error occurred. Please try again later.";

/// Business rule codes
pub mod codes {
    /// Too many unfinished todos
    pub const MAX_UNFINISHED: &str = "E001";
    /// Todo is already finished
    pub const ALREADY_FINISHED: &str = "E002";
    /// No todo with the requested id
    pub const NOT_FOUND: &str = "E404";
    /// Input failed validation
    pub const VALIDATION: &str = "VALIDATION_ERROR";
    /// Durable store failure
    pub const STORAGE: &str = "STORAGE_ERROR";
    /// Anything else
    pub const UNKNOWN: &str = "UNKNOWN";
}

/// Category of a [`TodoError`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// User-correctable input problem
    Validation,
    /// A collection rule was violated
    BusinessLogic,
    /// The durable store failed
    Storage,
    /// Anything else
    Unknown,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Validation => "VALIDATION",
            Self::BusinessLogic => "BUSINESS_LOGIC",
            Self::Storage => "STORAGE",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

/// Errors raised inside the todo store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TodoError {
    /// Input failed validation; the message is user-facing
    #[error("{message}")]
    Validation {
        /// User-facing explanation
        message: String,
    },

    /// A collection rule rejected the operation; the message is user-facing
    #[error("{message}")]
    BusinessLogic {
        /// Stable rule code, see [`codes`]
        code: &'static str,
        /// User-facing explanation
        message: String,
    },

    /// Reading or writing the durable store failed
    #[error("storage {operation} failed: {source}")]
    Storage {
        /// What was attempted (`load`, `save`, `clear`)
        operation: &'static str,
        /// Underlying failure
        #[source]
        source: StorageError,
    },

    /// Anything that fits no other category
    #[error("{0}")]
    Unknown(String),
}

impl TodoError {
    /// Validation failure with a user-facing message
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// The capacity rule rejected a new todo
    #[must_use]
    pub fn max_unfinished(limit: usize) -> Self {
        Self::BusinessLogic {
            code: codes::MAX_UNFINISHED,
            message: format!("You can have at most {limit} unfinished TODOs."),
        }
    }

    /// The todo was already finished
    #[must_use]
    pub fn already_finished() -> Self {
        Self::BusinessLogic {
            code: codes::ALREADY_FINISHED,
            message: "This TODO is already finished.".to_string(),
        }
    }

    /// No todo has the requested id
    #[must_use]
    pub fn not_found() -> Self {
        Self::BusinessLogic {
            code: codes::NOT_FOUND,
            message: "TODO not found.".to_string(),
        }
    }

    /// Category of this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::BusinessLogic { .. } => ErrorKind::BusinessLogic,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Stable diagnostic code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => codes::VALIDATION,
            Self::BusinessLogic { code, .. } => *code,
            Self::Storage { .. } => codes::STORAGE,
            Self::Unknown(_) => codes::UNKNOWN,
        }
    }

    /// Text safe to show to the user
    ///
    /// Validation and business messages are already user-facing and pass
    /// through verbatim. Storage and unknown errors never leak their detail.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message } | Self::BusinessLogic { message, .. } => message.clone(),
            Self::Storage { .. } => STORAGE_FAILURE_TEXT.to_string(),
            Self::Unknown(_) => UNKNOWN_FAILURE_TEXT.to_string(),
        }
    }
}

/// Convert an error into an `error` message and log it
///
/// Never fails. The log entry carries the kind, the code, and the full
/// error; the returned message carries only [`TodoError::user_message`].
pub fn classify(error: &TodoError, id: MessageId) -> ResultMessage {
    match error.kind() {
        ErrorKind::Validation | ErrorKind::BusinessLogic => {
            tracing::warn!(
                kind = %error.kind(),
                code = error.code(),
                message_id = %id,
                error = %error,
                "Todo operation rejected"
            );
        },
        ErrorKind::Storage | ErrorKind::Unknown => {
            tracing::error!(
                kind = %error.kind(),
                code = error.code(),
                message_id = %id,
                error = %error,
                error_debug = ?error,
                "Todo operation failed"
            );
        },
    }

    ResultMessage::new(id, MessageKind::Error, error.user_message())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_and_business_text_pass_through() {
        let message = classify(
            &TodoError::validation("TODO title is required."),
            MessageId::new("m-1"),
        );
        assert_eq!(message.kind, MessageKind::Error);
        assert_eq!(message.text, "TODO title is required.");

        let message = classify(&TodoError::max_unfinished(5), MessageId::new("m-2"));
        assert_eq!(message.text, "You can have at most 5 unfinished TODOs.");
        assert_eq!(message.id, MessageId::new("m-2"));
    }

    #[test]
    fn storage_and_unknown_text_is_generic() {
        let storage = TodoError::Storage {
            operation: "save",
            source: StorageError::QuotaExceeded {
                key: "todo-app-todos".to_string(),
            },
        };
        let message = classify(&storage, MessageId::new("m-1"));
        assert_eq!(message.kind, MessageKind::Error);
        assert_eq!(message.text, STORAGE_FAILURE_TEXT);
        assert!(!message.text.contains("quota"));

        let unknown = TodoError::Unknown("task join failed: boom".to_string());
        let message = classify(&unknown, MessageId::new("m-2"));
        assert_eq!(message.text, UNKNOWN_FAILURE_TEXT);
    }

    #[test]
    fn codes_and_kinds() {
        assert_eq!(TodoError::max_unfinished(5).code(), "E001");
        assert_eq!(TodoError::already_finished().code(), "E002");
        assert_eq!(TodoError::not_found().code(), "E404");
        assert_eq!(TodoError::validation("x").code(), "VALIDATION_ERROR");
        assert_eq!(TodoError::Unknown(String::new()).kind(), ErrorKind::Unknown);
        assert_eq!(ErrorKind::BusinessLogic.to_string(), "BUSINESS_LOGIC");
    }

    #[test]
    fn already_finished_and_not_found_differ() {
        assert_ne!(
            TodoError::already_finished().user_message(),
            TodoError::not_found().user_message()
        );
    }
}
