//! Runtime for executing a chat session
//!
//! One task owns the conversation and the submission state. Front ends talk
//! to it through cloneable [`SessionHandle`]s and watch it through a
//! broadcast of [`SessionEvent`]s plus a snapshot channel.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;

use crate::conversation::{Conversation, Message};
use crate::llm::ResponseProvider;
use crate::state_machine::{SessionContext, SubmitState, TransitionError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// Shown to the user whenever a reply could not be produced
pub const FAILURE_NOTICE: &str = "Failed to send message. Please try again.";

const COMMAND_BUFFER: usize = 32;
const BROADCAST_BUFFER: usize = 128;

/// Events sent to front ends
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A user or assistant message joined the conversation
    MessageAppended { message: Message },
    /// The composer should be emptied
    InputCleared,
    /// Submitting means a reply is pending ("Thinking...")
    StateChange { state: SubmitState },
    /// Failure notice to show without blocking input
    Notification(Notification),
}

/// Transient, non-blocking notice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    /// Underlying provider error text, for logs and verbose front ends
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn failure(detail: impl Into<String>) -> Self {
        Self {
            message: FAILURE_NOTICE.to_string(),
            detail: detail.into(),
            created_at: Utc::now(),
        }
    }
}

/// What happened to a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    /// Silently dropped: empty input, or a reply still pending
    Ignored(TransitionError),
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted)
    }
}

/// Point-in-time view of the store
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub messages: Vec<Message>,
    pub awaiting_response: bool,
}

impl SessionSnapshot {
    fn of(conversation: &Conversation) -> Self {
        Self {
            messages: conversation.messages().to_vec(),
            awaiting_response: conversation.is_awaiting_response(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Session runtime has stopped")]
pub struct SessionClosed;

/// Requests from handles to the runtime
#[derive(Debug)]
pub(crate) enum Command {
    Submit {
        text: String,
        ack: oneshot::Sender<SubmitOutcome>,
    },
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<Command>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Start a runtime for a fresh, empty conversation.
    ///
    /// The runtime stops once every handle is dropped and no reply is
    /// pending; the join handle yields the final conversation.
    pub fn spawn<P>(
        context: SessionContext,
        provider: Arc<P>,
    ) -> (SessionHandle, JoinHandle<Conversation>)
    where
        P: ResponseProvider + ?Sized + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());

        let runtime = SessionRuntime::new(
            context,
            provider,
            command_rx,
            broadcast_tx.clone(),
            snapshot_tx,
        );
        let join = tokio::spawn(runtime.run());

        let handle = SessionHandle {
            command_tx,
            broadcast_tx,
            snapshot_rx,
        };
        (handle, join)
    }

    /// Submit composer text. Resolves once the runtime has applied it, so a
    /// snapshot taken afterwards already contains the user message.
    pub async fn submit(&self, text: impl Into<String>) -> Result<SubmitOutcome, SessionClosed> {
        let (ack, ack_rx) = oneshot::channel();
        self.command_tx
            .send(Command::Submit {
                text: text.into(),
                ack,
            })
            .await
            .map_err(|_| SessionClosed)?;
        ack_rx.await.map_err(|_| SessionClosed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.broadcast_tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Wait until no reply is pending
    pub async fn wait_until_idle(&self) -> Result<SessionSnapshot, SessionClosed> {
        let mut rx = self.snapshot_rx.clone();
        let snapshot = rx
            .wait_for(|s| !s.awaiting_response)
            .await
            .map_err(|_| SessionClosed)?;
        Ok(snapshot.clone())
    }
}
