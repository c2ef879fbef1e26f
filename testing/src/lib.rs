//! # Tasklist Testing
//!
//! Testing utilities and helpers for the Tasklist architecture.
//!
//! This crate provides:
//! - Deterministic implementations of the environment traits
//! - An in-memory durable store with write accounting and failure injection
//! - [`ReducerTest`], a one-shot reducer runner, plus effect assertions
//!
//! ## Example
//!
//! ```ignore
//! use tasklist_testing::{test_clock, InMemoryStorage, SequentialIdGenerator};
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_debounced_write() {
//!     let storage = InMemoryStorage::new();
//!     let app = build_app(test_clock(), SequentialIdGenerator::new("id"), storage.clone());
//!
//!     app.add_todo("Buy milk").await;
//!     tokio::time::sleep(Duration::from_millis(600)).await;
//!
//!     assert_eq!(storage.write_count(), 1);
//! }
//! ```

use chrono::{DateTime, Utc};
use tasklist_core::environment::{Clock, IdGenerator, KeyValueStore, StorageError};


/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, IdGenerator, KeyValueStore, StorageError, Utc};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use tasklist_testing::mocks::FixedClock;
    /// use tasklist_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Predictable ids: `{prefix}-1`, `{prefix}-2`, ...
    ///
    /// ```
    /// use tasklist_testing::mocks::SequentialIdGenerator;
    /// use tasklist_core::environment::IdGenerator;
    ///
    /// let ids = SequentialIdGenerator::new("todo");
    /// assert_eq!(ids.next_id(), "todo-1");
    /// assert_eq!(ids.next_id(), "todo-2");
    /// ```
    #[derive(Debug, Clone)]
    pub struct SequentialIdGenerator {
        prefix: String,
        next: Arc<AtomicU64>,
    }

    impl SequentialIdGenerator {
        /// Create a generator whose ids start at `{prefix}-1`
        #[must_use]
        pub fn new(prefix: impl Into<String>) -> Self {
            Self {
                prefix: prefix.into(),
                next: Arc::new(AtomicU64::new(1)),
            }
        }
    }

    impl IdGenerator for SequentialIdGenerator {
        fn next_id(&self) -> String {
            let n = self.next.fetch_add(1, Ordering::SeqCst);
            format!("{}-{n}", self.prefix)
        }
    }

    /// In-memory durable store for fast, deterministic testing.
    ///
    /// Counts successful writes and can be told to fail reads, fail writes,
    /// or enforce a byte quota on stored values.
    ///
    /// ```
    /// use tasklist_testing::mocks::InMemoryStorage;
    /// use tasklist_core::environment::KeyValueStore;
    ///
    /// let storage = InMemoryStorage::with_quota(4);
    /// assert!(storage.set("k", "1234").is_ok());
    /// assert!(storage.set("k", "12345").is_err());
    /// assert_eq!(storage.raw("k").as_deref(), Some("1234"));
    /// ```
    #[derive(Clone, Debug, Default)]
    pub struct InMemoryStorage {
        data: Arc<Mutex<HashMap<String, String>>>,
        writes: Arc<AtomicUsize>,
        quota: Option<usize>,
        fail_writes: Arc<AtomicBool>,
        fail_reads: Arc<AtomicBool>,
    }

    impl InMemoryStorage {
        /// Create a new empty store without a quota
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a store rejecting values longer than `bytes`
        #[must_use]
        pub fn with_quota(bytes: usize) -> Self {
            Self {
                quota: Some(bytes),
                ..Self::default()
            }
        }

        /// Seed a raw value, bypassing write accounting
        pub fn seed(&self, key: &str, value: &str) {
            self.lock().insert(key.to_string(), value.to_string());
        }

        /// The raw value stored under `key`
        #[must_use]
        pub fn raw(&self, key: &str) -> Option<String> {
            self.lock().get(key).cloned()
        }

        /// Whether `key` is present
        #[must_use]
        pub fn contains_key(&self, key: &str) -> bool {
            self.lock().contains_key(key)
        }

        /// Number of successful `set` calls
        #[must_use]
        pub fn write_count(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        /// Make every following `set` and `remove` fail with an I/O error
        pub fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        /// Make every following `get` fail with an I/O error
        pub fn fail_reads(&self, fail: bool) {
            self.fail_reads.store(fail, Ordering::SeqCst);
        }

        fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
            self.data.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl KeyValueStore for InMemoryStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(StorageError::Io {
                    key: key.to_string(),
                    message: "injected read failure".to_string(),
                });
            }
            Ok(self.lock().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::Io {
                    key: key.to_string(),
                    message: "injected write failure".to_string(),
                });
            }
            if self.quota.is_some_and(|quota| value.len() > quota) {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                });
            }
            self.lock().insert(key.to_string(), value.to_string());
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::Io {
                    key: key.to_string(),
                    message: "injected remove failure".to_string(),
                });
            }
            self.lock().remove(key);
            Ok(())
        }
    }
}

// Re-export commonly used items
pub use mocks::{test_clock, FixedClock, InMemoryStorage, SequentialIdGenerator};
pub use reducer_test::{assertions, ReducerTest};
