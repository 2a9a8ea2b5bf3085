//! Events that can occur in a session

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User events
    /// Raw composer text; trimming happens in the transition
    UserSubmit { text: String },

    // Provider events
    /// The provider produced the next assistant message
    ProviderReply { content: String },
    /// The provider call failed; `message` is the error text
    ProviderFailed { message: String },
}

impl Event {
    pub fn user_submit(text: impl Into<String>) -> Self {
        Event::UserSubmit { text: text.into() }
    }
}
