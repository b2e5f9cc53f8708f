/// Chat assistant proxy.
///
/// This module provides a synchronous client for an OpenAI-compatible chat
/// completions endpoint, the response-shape fallbacks used to pull text out
/// of a reply, and an in-memory transcript for interactive sessions.
mod client;
mod transcript;

pub use client::{
    ChatClient, ChatClientBuilder, ChatClientTrait, ChatError, DEFAULT_CHAT_MODEL, DEFAULT_CHAT_URL,
    extract_content,
};
pub use transcript::{ChatMessage, ChatRole, ChatTranscript, WELCOME_MESSAGE};
