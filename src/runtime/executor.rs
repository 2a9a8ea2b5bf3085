//! Session runtime executor

use super::{Command, Notification, SessionEvent, SessionSnapshot, SubmitOutcome};

use crate::conversation::{Conversation, Message};
use crate::llm::{format_history, ResponseProvider};
use crate::state_machine::{
    transition, Effect, Event, SessionContext, SubmitState, TransitionError,
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

/// Owns one conversation and drives it through the state machine
pub struct SessionRuntime<P>
where
    P: ResponseProvider + ?Sized + 'static,
{
    context: SessionContext,
    state: SubmitState,
    conversation: Conversation,
    provider: Arc<P>,
    command_rx: mpsc::Receiver<Command>,
    /// Provider outcomes come back on this channel from the background task
    event_tx: mpsc::Sender<Event>,
    event_rx: mpsc::Receiver<Event>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    /// False once every handle is gone
    accepting_commands: bool,
}

impl<P> SessionRuntime<P>
where
    P: ResponseProvider + ?Sized + 'static,
{
    pub(crate) fn new(
        context: SessionContext,
        provider: Arc<P>,
        command_rx: mpsc::Receiver<Command>,
        broadcast_tx: broadcast::Sender<SessionEvent>,
        snapshot_tx: watch::Sender<SessionSnapshot>,
    ) -> Self {
        // At most one reply is ever in flight
        let (event_tx, event_rx) = mpsc::channel(1);
        Self {
            context,
            state: SubmitState::Idle,
            conversation: Conversation::new(),
            provider,
            command_rx,
            event_tx,
            event_rx,
            broadcast_tx,
            snapshot_tx,
            accepting_commands: true,
        }
    }

    pub async fn run(mut self) -> Conversation {
        tracing::info!(
            session_id = %self.context.session_id,
            model = %self.context.model_id,
            "Starting session runtime"
        );

        loop {
            tokio::select! {
                command = self.command_rx.recv(), if self.accepting_commands => {
                    match command {
                        Some(Command::Submit { text, ack }) => {
                            let outcome = self.handle_submit(text);
                            let _ = ack.send(outcome);
                        }
                        None => self.accepting_commands = false,
                    }
                }
                Some(event) = self.event_rx.recv() => {
                    if let Err(e) = self.process_event(event) {
                        tracing::debug!(
                            session_id = %self.context.session_id,
                            error = %e,
                            "Dropping stale provider outcome"
                        );
                    }
                }
                else => break,
            }

            // Finish the in-flight reply before shutting down
            if !self.accepting_commands && !self.state.is_submitting() {
                break;
            }
        }

        tracing::info!(
            session_id = %self.context.session_id,
            messages = self.conversation.len(),
            "Session runtime stopped"
        );
        self.conversation
    }

    fn handle_submit(&mut self, text: String) -> SubmitOutcome {
        match self.process_event(Event::UserSubmit { text }) {
            Ok(()) => SubmitOutcome::Accepted,
            Err(e) => {
                tracing::debug!(
                    session_id = %self.context.session_id,
                    reason = %e,
                    "Submission ignored"
                );
                SubmitOutcome::Ignored(e)
            }
        }
    }

    fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        // Pure state transition
        let result = transition(&self.state, &self.context, event)?;

        let old_state = std::mem::replace(&mut self.state, result.new_state);
        self.conversation
            .set_awaiting_response(self.state.is_submitting());

        for effect in result.effects {
            self.execute_effect(effect);
        }

        if old_state != self.state {
            tracing::debug!(
                session_id = %self.context.session_id,
                from = old_state.name(),
                to = self.state.name(),
                "State change"
            );
            let _ = self
                .broadcast_tx
                .send(SessionEvent::StateChange { state: self.state });
        }

        self.snapshot_tx
            .send_replace(SessionSnapshot::of(&self.conversation));
        Ok(())
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AppendMessage { role, content } => {
                let message = Message::new(role, content);
                self.conversation.append_message(message.clone());
                let _ = self
                    .broadcast_tx
                    .send(SessionEvent::MessageAppended { message });
            }

            Effect::ClearInput => {
                let _ = self.broadcast_tx.send(SessionEvent::InputCleared);
            }

            Effect::RequestReply => {
                // History already includes the user message appended just before
                let history = format_history(self.conversation.messages());
                let provider = Arc::clone(&self.provider);
                let event_tx = self.event_tx.clone();
                let session_id = self.context.session_id.clone();

                tokio::spawn(async move {
                    tracing::info!(
                        session_id = %session_id,
                        history_len = history.len(),
                        "Requesting reply (background)"
                    );

                    // A panicking provider still has to bring the session back to Idle
                    let call = tokio::spawn(async move { provider.reply(&history).await });
                    let event = match call.await {
                        Ok(Ok(content)) => Event::ProviderReply { content },
                        Ok(Err(e)) => Event::ProviderFailed { message: e.message },
                        Err(e) => Event::ProviderFailed {
                            message: format!("Provider task failed: {e}"),
                        },
                    };
                    let _ = event_tx.send(event).await;
                });
            }

            Effect::NotifyFailure { message } => {
                tracing::warn!(
                    session_id = %self.context.session_id,
                    error = %message,
                    "Reply failed"
                );
                let _ = self
                    .broadcast_tx
                    .send(SessionEvent::Notification(Notification::failure(message)));
            }
        }
    }
}
