//! Submission state types

use serde::{Deserialize, Serialize};

/// Where the session is in its submit/reply cycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubmitState {
    /// Ready for user input, no reply pending
    #[default]
    Idle,

    /// User message appended, provider invocation in flight
    Submitting,
}

impl SubmitState {
    pub fn is_submitting(self) -> bool {
        matches!(self, SubmitState::Submitting)
    }

    pub fn name(self) -> &'static str {
        match self {
            SubmitState::Idle => "idle",
            SubmitState::Submitting => "submitting",
        }
    }
}

/// Immutable configuration for one session
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    /// Model identifier reported by the response provider
    pub model_id: String,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            model_id: model_id.into(),
        }
    }
}
