use tracing::warn;

use crate::model::{Message, MessageRole};
use crate::transport::ChatTransport;

/// Append-only list of chat turns plus the latest error banner.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    error: Option<String>,
    next_id: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Reason of the last failed send, cleared by the next send.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn push(&mut self, role: MessageRole, body: impl Into<String>) -> &Message {
        self.next_id += 1;
        self.messages.push(Message {
            id: self.next_id.to_string(),
            role,
            body: body.into(),
        });
        &self.messages[self.messages.len() - 1]
    }

    /// Sends `query` and appends the user turn and the reply.
    ///
    /// Blank queries are ignored and return `None`. A failed send appends a
    /// system message and sets the error banner instead of returning an error.
    pub fn send(&mut self, transport: &dyn ChatTransport, query: &str) -> Option<&Message> {
        if query.trim().is_empty() {
            return None;
        }

        self.push(MessageRole::User, query);
        self.error = None;

        match transport.send_chat(query) {
            Ok(response) => Some(self.push(MessageRole::Assistant, response)),
            Err(err) => {
                warn!(error = %err, "chat request failed");
                let reason = err.to_string();
                self.error = Some(reason.clone());
                Some(self.push(MessageRole::System, format!("Error: {reason}")))
            }
        }
    }
}
