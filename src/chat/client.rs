/// Chat completions HTTP client.
///
/// Each call is single-turn and stateless: one user message goes up, one
/// reply string comes back. Failures are reported once; there is no retry.
use std::time::Duration;

use serde_json::{Value, json};
use thiserror::Error;

/// Endpoint used when none is configured.
pub const DEFAULT_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Model used when none is configured.
pub const DEFAULT_CHAT_MODEL: &str = "llama-3.3-70b-versatile";

/// Errors that can occur when calling the chat API.
#[derive(Debug, Error)]
pub enum ChatError {
    /// No API key is configured, so chat is disabled.
    #[error("Chat API key is not configured on the server.")]
    MissingApiKey,

    /// The message was empty.
    #[error("Message is required and must be a string.")]
    EmptyMessage,

    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("API error {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body was not JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ChatError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Network(err)
        }
    }
}

/// Builder for constructing `ChatClient` instances.
///
/// # Examples
///
/// ```
/// use cognicanvas::chat::ChatClientBuilder;
///
/// let client = ChatClientBuilder::new()
///     .api_key("secret")
///     .build()
///     .expect("Failed to create client");
/// assert!(client.is_configured());
/// ```
#[derive(Debug, Default)]
pub struct ChatClientBuilder {
    api_key: Option<String>,
    endpoint: Option<String>,
    model: Option<String>,
    timeout: Option<Duration>,
}

impl ChatClientBuilder {
    /// Creates a new `ChatClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bearer token. Blank keys are treated as absent.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.api_key = (!key.trim().is_empty()).then_some(key);
        self
    }

    /// Sets the API key only when one is given.
    pub fn maybe_api_key(self, key: Option<String>) -> Self {
        match key {
            Some(key) => self.api_key(key),
            None => self,
        }
    }

    /// Sets the full chat completions URL.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Sets the model name sent with every request.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the overall request timeout (default 60 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the `ChatClient` with the configured settings.
    ///
    /// A client without an API key can be built; every call on it fails
    /// with [`ChatError::MissingApiKey`].
    ///
    /// Must not be called from inside an async runtime worker, since the
    /// blocking client owns its own runtime.
    pub fn build(self) -> Result<ChatClient, ChatError> {
        let endpoint = self.endpoint.unwrap_or_else(|| DEFAULT_CHAT_URL.to_string());
        let model = self.model.unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());

        reqwest::Url::parse(&endpoint)
            .map_err(|e| ChatError::InvalidUrl(format!("{}: {}", endpoint, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(60)))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(ChatError::Network)?;

        Ok(ChatClient {
            client,
            api_key: self.api_key,
            endpoint,
            model,
        })
    }
}

/// Synchronous client for an OpenAI-compatible chat completions endpoint.
///
/// It should be constructed using `ChatClientBuilder`.
pub struct ChatClient {
    client: reqwest::blocking::Client,
    api_key: Option<String>,
    endpoint: String,
    model: String,
}

/// Trait for chat completion calls.
///
/// This trait enables substituting a fake in tests and in the HTTP server.
pub trait ChatClientTrait: Send + Sync {
    /// Sends one user message and returns the assistant's reply text.
    fn complete(&self, message: &str) -> Result<String, ChatError>;
}

impl ChatClient {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns true if an API key is configured.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn complete_internal(&self, message: &str) -> Result<String, ChatError> {
        let api_key = self.api_key.as_deref().ok_or(ChatError::MissingApiKey)?;
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let request_body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": message }],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .map_err(ChatError::from_reqwest)?;

        let status = response.status();
        let body = response.text().map_err(ChatError::from_reqwest)?;
        if !status.is_success() {
            tracing::error!(status = status.as_u16(), body = %body, "chat API error");
            return Err(ChatError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = serde_json::from_str(&body).map_err(ChatError::Serialization)?;
        Ok(extract_content(&json))
    }
}

impl ChatClientTrait for ChatClient {
    fn complete(&self, message: &str) -> Result<String, ChatError> {
        self.complete_internal(message)
    }
}

/// Pulls the reply text out of a chat response.
///
/// Tried in order: `choices[0].message.content`, then `output` (arrays joined
/// with newlines), then `completions[0].data.text`. When none match, the
/// whole response is returned as compact JSON.
pub fn extract_content(response: &Value) -> String {
    if let Some(content) = response
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        return content.to_string();
    }

    if let Some(output) = response.get("output").filter(|v| truthy(v)) {
        return match output {
            Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join("\n"),
            other => stringify(other),
        };
    }

    if let Some(text) = response
        .pointer("/completions/0/data/text")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        return text.to_string();
    }

    response.to_string()
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
