//! chatdesk - terminal chat client
//!
//! Reads messages from stdin, submits them, and prints the transcript as
//! messages arrive. A line ending in `\` continues the message on the next
//! line. The next message is only read once the reply (or a failure notice)
//! is in.

use chatdesk::conversation::{Message, Role};
use chatdesk::llm::{build_provider, ProviderConfig};
use chatdesk::runtime::{SessionEvent, SessionHandle};
use chatdesk::state_machine::SessionContext;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const QUIT_COMMAND: &str = "/quit";
/// Trailing marker that continues a message on the next line
const CONTINUATION: &str = "\\";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they never interleave with the transcript
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatdesk=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ProviderConfig::from_env()?;
    let provider = build_provider(&config)?;
    tracing::info!(provider = %config.kind, model = %provider.model_id(), "Provider ready");

    let context = SessionContext::new(uuid::Uuid::new_v4().to_string(), provider.model_id());
    println!(
        "chatdesk ({} via {}). Type a message, end a line with {CONTINUATION} to add \
         another, {QUIT_COMMAND} to exit.",
        provider.model_id(),
        config.kind
    );

    let (handle, join) = SessionHandle::spawn(context, provider);
    let printer = tokio::spawn(print_events(handle.subscribe()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut composer = Composer::default();
    while let Some(line) = lines.next_line().await? {
        if !composer.is_continuing() && line.trim() == QUIT_COMMAND {
            break;
        }
        let Some(text) = composer.push_line(&line) else {
            continue;
        };
        // Blank messages are ignored by the session, nothing to wait for
        if handle.submit(text).await?.is_accepted() {
            handle.wait_until_idle().await?;
        }
    }

    drop(handle);
    let conversation = join.await?;
    printer.await?;
    tracing::info!(messages = conversation.len(), "Session ended");

    Ok(())
}

/// Joins continued input lines into one message
#[derive(Debug, Default)]
struct Composer {
    lines: Vec<String>,
}

impl Composer {
    /// Feed one input line. Returns the whole message once a line does not
    /// continue; a doubled marker stands for one literal backslash.
    fn push_line(&mut self, line: &str) -> Option<String> {
        if let Some(head) = line.strip_suffix("\\\\") {
            self.lines.push(format!("{head}\\"));
        } else if let Some(head) = line.strip_suffix(CONTINUATION) {
            self.lines.push(head.to_string());
            return None;
        } else {
            self.lines.push(line.to_string());
        }
        Some(std::mem::take(&mut self.lines).join("\n"))
    }

    fn is_continuing(&self) -> bool {
        !self.lines.is_empty()
    }
}

async fn print_events(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::MessageAppended { message }) => print_message(&message),
            Ok(SessionEvent::StateChange { state }) if state.is_submitting() => {
                println!("Thinking...");
            }
            Ok(SessionEvent::Notification(notice)) => {
                tracing::debug!(detail = %notice.detail, "Failure notice");
                eprintln!("! {}", notice.message);
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Transcript printer fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_message(message: &Message) {
    let who = match message.role() {
        Role::User => "You",
        Role::Assistant => "Assistant",
    };
    println!("[{}] {who}: {}", message.time_label(), message.content());
}
