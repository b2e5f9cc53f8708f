use serde::Serialize;
use time::OffsetDateTime;

use super::{ChatClientTrait, ChatError};

/// Greeting shown at the top of a new conversation.
pub const WELCOME_MESSAGE: &str = "Hi there 👋\nWelcome to CogniCanvas!\nHow can I help you today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Visual history of a chat session.
///
/// Kept in memory only and never sent upstream; every request carries just
/// the latest user message.
#[derive(Debug, Clone)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
}

impl Default for ChatTranscript {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatTranscript {
    /// Starts a transcript with the welcome message.
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage {
                role: ChatRole::Bot,
                content: WELCOME_MESSAGE.to_string(),
                timestamp: OffsetDateTime::now_utc(),
            }],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    fn push(&mut self, role: ChatRole, content: String) {
        self.messages.push(ChatMessage {
            role,
            content,
            timestamp: OffsetDateTime::now_utc(),
        });
    }

    /// Sends one message and records both sides.
    ///
    /// Input is trimmed; blank input is ignored and returns `None`. A failed
    /// call is recorded as an `Error: ...` bot message and also returned.
    pub fn send(
        &mut self,
        client: &dyn ChatClientTrait,
        input: &str,
    ) -> Option<Result<String, ChatError>> {
        let text = input.trim();
        if text.is_empty() {
            return None;
        }
        self.push(ChatRole::User, text.to_string());

        let result = client.complete(text);
        match &result {
            Ok(reply) => self.push(ChatRole::Bot, reply.clone()),
            Err(err) => self.push(ChatRole::Bot, format!("Error: {err}")),
        }
        Some(result)
    }
}
