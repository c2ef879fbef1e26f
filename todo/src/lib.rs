//! Todo collection manager built on the Tasklist reducer architecture.
//!
//! - [`sanitizer`]: trims, escapes, and validates titles
//! - [`persistence`]: debounced writes and tolerant reads of the collection
//! - [`notifications`]: ordered queue of result messages
//! - [`error`]: error taxonomy and the classifier turning errors into messages
//! - [`reducer`]: the business rules (capacity, one-way finish, ordering)
//! - [`app`]: [`TodoApp`], the facade a UI talks to
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tasklist_core::environment::{SystemClock, UuidGenerator};
//! use todo::{FileStorage, PersistenceGateway, TodoApp, TodoEnvironment};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = FileStorage::open(".todo")?;
//! let env = TodoEnvironment::new(
//!     Arc::new(SystemClock),
//!     Arc::new(UuidGenerator),
//!     PersistenceGateway::new(Arc::new(storage)),
//! );
//! let app = TodoApp::open(env);
//!
//! app.add_todo("Buy milk").await;
//! for todo in app.todos().await {
//!     println!("{} {}", todo.id, todo.title);
//! }
//! app.flush().await;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod notifications;
pub mod persistence;
pub mod reducer;
pub mod sanitizer;
pub mod storage;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use app::{TodoApp, TodoStore};
pub use config::TodoConfig;
pub use error::{classify, ErrorKind, TodoError};
pub use notifications::NotificationQueue;
pub use persistence::{PersistenceGateway, StoredTodo};
pub use reducer::{TodoEnvironment, TodoReducer};
pub use storage::FileStorage;
pub use types::{MessageId, MessageKind, ResultMessage, Todo, TodoAction, TodoId, TodoState};
