//! Mock providers for testing
//!
//! These mocks enable runtime testing without real I/O.

use crate::llm::{ChatMessage, ProviderError, ResponseProvider};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

// ============================================================================
// Mock Provider
// ============================================================================

/// Mock provider that returns queued results
pub struct MockProvider {
    responses: Mutex<VecDeque<Result<String, ProviderError>>>,
    /// Record of every history the provider was called with
    pub calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, reply: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(reply.into()));
    }

    /// Queue a failure
    pub fn queue_error(&self, error: ProviderError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseProvider for MockProvider {
    async fn reply(&self, history: &[ChatMessage]) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(history.to_vec());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::network("No mock response queued")))
    }

    fn model_id(&self) -> &'static str {
        "mock"
    }
}

// ============================================================================
// Gated Provider
// ============================================================================

/// Provider that holds every reply until the test releases it
pub struct GatedProvider {
    reply: String,
    gate: Notify,
    calls: AtomicUsize,
}

impl GatedProvider {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            gate: Notify::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Let one pending (or the next) call complete
    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResponseProvider for GatedProvider {
    async fn reply(&self, _history: &[ChatMessage]) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Ok(self.reply.clone())
    }

    fn model_id(&self) -> &'static str {
        "gated"
    }
}

/// Provider that panics mid-call
pub struct PanickingProvider;

#[async_trait]
impl ResponseProvider for PanickingProvider {
    async fn reply(&self, _history: &[ChatMessage]) -> Result<String, ProviderError> {
        panic!("provider blew up");
    }

    fn model_id(&self) -> &'static str {
        "panicking"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use crate::runtime::{SessionEvent, SessionHandle, SubmitOutcome, FAILURE_NOTICE};
    use crate::state_machine::{SessionContext, SubmitState, TransitionError};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::broadcast;

    fn context() -> SessionContext {
        SessionContext::new("test-session", "mock")
    }

    fn contents(messages: &[crate::conversation::Message]) -> Vec<(Role, String)> {
        messages
            .iter()
            .map(|m| (m.role(), m.content().to_string()))
            .collect()
    }

    async fn next_event(rx: &mut broadcast::Receiver<SessionEvent>) -> SessionEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for session event")
            .expect("broadcast closed")
    }

    #[tokio::test]
    async fn test_submit_appends_user_then_reply() {
        let provider = Arc::new(MockProvider::new());
        provider.queue_reply("Hi there");
        let (handle, _join) = SessionHandle::spawn(context(), provider.clone());

        let outcome = handle.submit("Hello").await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Accepted);

        let snapshot = handle.wait_until_idle().await.unwrap();
        assert_eq!(
            contents(&snapshot.messages),
            vec![
                (Role::User, "Hello".to_string()),
                (Role::Assistant, "Hi there".to_string()),
            ]
        );
        assert!(!snapshot.awaiting_response);

        // The provider saw the history including the new user message
        assert_eq!(
            provider.recorded_calls(),
            vec![vec![ChatMessage::user("Hello")]]
        );
    }

    #[tokio::test]
    async fn test_user_message_visible_before_reply() {
        let provider = Arc::new(GatedProvider::new("Hi there"));
        let (handle, _join) = SessionHandle::spawn(context(), provider.clone());

        handle.submit("Hello").await.unwrap();
        let snapshot = handle.snapshot();
        assert_eq!(
            contents(&snapshot.messages),
            vec![(Role::User, "Hello".to_string())]
        );
        assert!(snapshot.awaiting_response);

        provider.release();
        let snapshot = handle.wait_until_idle().await.unwrap();
        assert_eq!(snapshot.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let provider = Arc::new(MockProvider::new());
        let (handle, _join) = SessionHandle::spawn(context(), provider.clone());

        for text in ["", "   ", "\n\t "] {
            let outcome = handle.submit(text).await.unwrap();
            assert_eq!(outcome, SubmitOutcome::Ignored(TransitionError::EmptyInput));
        }

        let snapshot = handle.snapshot();
        assert!(snapshot.messages.is_empty());
        assert!(!snapshot.awaiting_response);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_submit_while_pending_is_ignored() {
        let provider = Arc::new(GatedProvider::new("reply to A"));
        let (handle, _join) = SessionHandle::spawn(context(), provider.clone());

        assert!(handle.submit("A").await.unwrap().is_accepted());
        assert_eq!(
            handle.submit("B").await.unwrap(),
            SubmitOutcome::Ignored(TransitionError::Busy)
        );

        provider.release();
        let snapshot = handle.wait_until_idle().await.unwrap();
        assert_eq!(
            contents(&snapshot.messages),
            vec![
                (Role::User, "A".to_string()),
                (Role::Assistant, "reply to A".to_string()),
            ]
        );
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_input_is_trimmed() {
        let provider = Arc::new(MockProvider::new());
        provider.queue_reply("ok");
        let (handle, _join) = SessionHandle::spawn(context(), provider.clone());

        handle.submit("  padded  ").await.unwrap();
        let snapshot = handle.wait_until_idle().await.unwrap();
        assert_eq!(snapshot.messages[0].content(), "padded");
    }

    #[tokio::test]
    async fn test_failure_notifies_and_returns_to_idle() {
        let provider = Arc::new(MockProvider::new());
        provider.queue_error(ProviderError::from_status(500, None));
        provider.queue_reply("second time lucky");
        let (handle, _join) = SessionHandle::spawn(context(), provider.clone());
        let mut events = handle.subscribe();

        handle.submit("Hello").await.unwrap();

        let mut notification = None;
        loop {
            match next_event(&mut events).await {
                SessionEvent::Notification(n) => notification = Some(n),
                SessionEvent::StateChange {
                    state: SubmitState::Idle,
                } => break,
                _ => {}
            }
        }
        let notification = notification.expect("failure notification");
        assert_eq!(notification.message, FAILURE_NOTICE);
        assert_eq!(notification.detail, "HTTP error! status: 500");

        // No assistant message, user message stays
        let snapshot = handle.wait_until_idle().await.unwrap();
        assert_eq!(
            contents(&snapshot.messages),
            vec![(Role::User, "Hello".to_string())]
        );

        // The session accepts the next submission
        assert!(handle.submit("Again").await.unwrap().is_accepted());
        let snapshot = handle.wait_until_idle().await.unwrap();
        assert_eq!(snapshot.messages.len(), 3);
        assert_eq!(snapshot.messages[2].content(), "second time lucky");
    }

    #[tokio::test]
    async fn test_event_order_for_one_exchange() {
        let provider = Arc::new(MockProvider::new());
        provider.queue_reply("Hi there");
        let (handle, _join) = SessionHandle::spawn(context(), provider);
        let mut events = handle.subscribe();

        handle.submit("Hello").await.unwrap();

        assert!(matches!(
            next_event(&mut events).await,
            SessionEvent::MessageAppended { message } if message.role() == Role::User
        ));
        assert!(matches!(
            next_event(&mut events).await,
            SessionEvent::InputCleared
        ));
        assert!(matches!(
            next_event(&mut events).await,
            SessionEvent::StateChange {
                state: SubmitState::Submitting
            }
        ));
        assert!(matches!(
            next_event(&mut events).await,
            SessionEvent::MessageAppended { message } if message.content() == "Hi there"
        ));
        assert!(matches!(
            next_event(&mut events).await,
            SessionEvent::StateChange {
                state: SubmitState::Idle
            }
        ));
    }

    #[tokio::test]
    async fn test_history_grows_across_exchanges() {
        let provider = Arc::new(MockProvider::new());
        provider.queue_reply("one");
        provider.queue_reply("two");
        let (handle, _join) = SessionHandle::spawn(context(), provider.clone());

        handle.submit("first").await.unwrap();
        handle.wait_until_idle().await.unwrap();
        handle.submit("second").await.unwrap();
        handle.wait_until_idle().await.unwrap();

        let calls = provider.recorded_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[1],
            vec![
                ChatMessage::user("first"),
                ChatMessage::assistant("one"),
                ChatMessage::user("second"),
            ]
        );
    }

    #[tokio::test]
    async fn test_panicking_provider_fails_cleanly() {
        let (handle, _join) = SessionHandle::spawn(context(), Arc::new(PanickingProvider));
        let mut events = handle.subscribe();

        handle.submit("Hello").await.unwrap();
        loop {
            if let SessionEvent::Notification(n) = next_event(&mut events).await {
                assert!(n.detail.starts_with("Provider task failed"));
                break;
            }
        }
        let snapshot = handle.wait_until_idle().await.unwrap();
        assert_eq!(snapshot.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_runtime_drains_pending_reply_on_shutdown() {
        let provider = Arc::new(GatedProvider::new("late reply"));
        let (handle, join) = SessionHandle::spawn(context(), provider.clone());

        handle.submit("Hello").await.unwrap();
        drop(handle);
        provider.release();

        let conversation = join.await.unwrap();
        assert_eq!(conversation.len(), 2);
        assert!(!conversation.is_awaiting_response());
        assert_eq!(conversation.last().map(|m| m.content()), Some("late reply"));
    }

    #[tokio::test]
    async fn test_runtime_stops_when_handles_dropped() {
        let provider = Arc::new(MockProvider::new());
        let (handle, join) = SessionHandle::spawn(context(), provider);
        let clone = handle.clone();
        drop(handle);
        drop(clone);

        let conversation = join.await.unwrap();
        assert!(conversation.is_empty());
    }

    #[tokio::test]
    async fn test_dyn_provider_is_accepted() {
        let provider: Arc<dyn ResponseProvider> = Arc::new(MockProvider::new());
        let (handle, _join) = SessionHandle::spawn(context(), provider);
        handle.submit("Hello").await.unwrap();
        // MockProvider with nothing queued fails; the session must still settle
        let snapshot = handle.wait_until_idle().await.unwrap();
        assert_eq!(snapshot.messages.len(), 1);
    }
}
