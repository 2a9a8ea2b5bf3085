//! In-memory conversation store
//!
//! An append-only, insertion-ordered log of messages for one session, plus
//! the flag telling front ends a reply is pending. Nothing here is persisted.

mod message;

pub use message::{Message, MessageId, Role};

/// Ordered message log for the current session
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    awaiting_response: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the end of the log. No validation, no deduplication.
    pub fn append_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn is_awaiting_response(&self) -> bool {
        self.awaiting_response
    }

    pub fn set_awaiting_response(&mut self, awaiting: bool) {
        self.awaiting_response = awaiting;
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}
