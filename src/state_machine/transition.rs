//! Pure state transition function
//!
//! One submission is one trip Idle -> Submitting -> Idle. The guard on the
//! first edge is the only protection against overlapping submissions.

use super::{Effect, Event, SessionContext, SubmitState};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SubmitState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SubmitState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Reasons an event is refused.
///
/// None of these reach the user: a refused submission is a silent no-op.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Input is empty after trimming")]
    EmptyInput,
    #[error("A reply is still pending")]
    Busy,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function: same inputs, same outputs, no I/O.
pub fn transition(
    state: &SubmitState,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // User submission
        // ============================================================

        // Submitting + UserSubmit -> reject, regardless of content
        (SubmitState::Submitting, Event::UserSubmit { .. }) => Err(TransitionError::Busy),

        // Idle + UserSubmit -> Submitting, if there is anything to send
        (SubmitState::Idle, Event::UserSubmit { text }) => {
            let content = text.trim();
            if content.is_empty() {
                return Err(TransitionError::EmptyInput);
            }

            Ok(TransitionResult::new(SubmitState::Submitting)
                .with_effect(Effect::append_user_message(content))
                .with_effect(Effect::ClearInput)
                .with_effect(Effect::RequestReply))
        }

        // ============================================================
        // Provider outcome
        // ============================================================

        (SubmitState::Submitting, Event::ProviderReply { content }) => {
            Ok(TransitionResult::new(SubmitState::Idle)
                .with_effect(Effect::append_assistant_message(content)))
        }

        (SubmitState::Submitting, Event::ProviderFailed { message }) => {
            Ok(TransitionResult::new(SubmitState::Idle)
                .with_effect(Effect::NotifyFailure { message }))
        }

        (SubmitState::Idle, event @ Event::ProviderReply { .. })
        | (SubmitState::Idle, event @ Event::ProviderFailed { .. }) => {
            let session_id = &context.session_id;
            Err(TransitionError::InvalidTransition(format!(
                "{event:?} while idle in session {session_id}"
            )))
        }
    }
}
