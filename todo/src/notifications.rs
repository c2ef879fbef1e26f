//! Ordered queue of short-lived result messages.
//!
//! Expiry is driven from outside: the reducer arms one timer per success
//! message and removes it by id when the timer fires, so a later message
//! with the same text is never touched.

use crate::types::{MessageId, ResultMessage};

/// Messages in insertion order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotificationQueue {
    messages: Vec<ResultMessage>,
}

impl NotificationQueue {
    /// Creates an empty queue
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Appends a message
    pub fn push(&mut self, message: ResultMessage) {
        self.messages.push(message);
    }

    /// Removes the message with `id`, if it is still queued
    pub fn remove(&mut self, id: &MessageId) -> Option<ResultMessage> {
        let index = self.messages.iter().position(|message| &message.id == id)?;
        Some(self.messages.remove(index))
    }

    /// Empties the queue, returning what it held
    pub fn clear(&mut self) -> Vec<ResultMessage> {
        std::mem::take(&mut self.messages)
    }

    /// Iterates in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, ResultMessage> {
        self.messages.iter()
    }

    /// Queued messages in insertion order
    #[must_use]
    pub fn as_slice(&self) -> &[ResultMessage] {
        &self.messages
    }

    /// Number of queued messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether nothing is queued
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl<'a> IntoIterator for &'a NotificationQueue {
    type Item = &'a ResultMessage;
    type IntoIter = std::slice::Iter<'a, ResultMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
