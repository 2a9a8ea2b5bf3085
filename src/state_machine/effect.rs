//! Effects produced by state transitions

use crate::conversation::Role;

/// Effects to be executed after a state transition, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Create a message with a fresh id and timestamp and append it to the store
    AppendMessage { role: Role, content: String },

    /// Tell the front end to empty its composer
    ClearInput,

    /// Invoke the response provider with the full history (spawns as background task)
    RequestReply,

    /// Surface a transient, non-blocking failure notice
    NotifyFailure { message: String },
}

impl Effect {
    pub fn append_user_message(content: impl Into<String>) -> Self {
        Effect::AppendMessage {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn append_assistant_message(content: impl Into<String>) -> Self {
        Effect::AppendMessage {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
