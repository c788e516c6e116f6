//! Provider-agnostic chat message types.
//!
//! These types decouple the workflow stages from any specific provider
//! SDK; each provider implementation converts them to its native format.

use serde::{Deserialize, Serialize};

/// Role of a message participant in a chat conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions that frame the model's behavior.
    System,
    /// End-user input.
    User,
    /// Model output.
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who produced the message.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Model identifier, e.g. `gpt-4o-mini`.
    pub model: String,
    /// Conversation so far, in order.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Request a JSON-object response format from providers that support it.
    pub json_mode: bool,
}

impl ChatRequest {
    /// Creates a request with the given model and messages and the
    /// default sampling settings.
    #[must_use]
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: 0.3,
            max_tokens: 1000,
            json_mode: false,
        }
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the generation token cap.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Requests a JSON-object response.
    #[must_use]
    pub const fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens generated.
    pub completion_tokens: u32,
    /// Total billed tokens.
    pub total_tokens: u32,
}

/// A completion response.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Generated text.
    pub content: String,
    /// Model that produced the response.
    pub model: String,
    /// Token usage, when the provider reports it.
    pub usage: Option<TokenUsage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let msg = ChatMessage::system("be helpful");
        assert_eq!(msg.role, Role::System);
        assert_eq!(msg.content, "be helpful");

        let msg = ChatMessage::user("hello");
        assert_eq!(msg.role, Role::User);

        let msg = ChatMessage::assistant("hi");
        assert_eq!(msg.role, Role::Assistant);
    }

    #[test]
    fn test_request_builders() {
        let req = ChatRequest::new("gpt-4o-mini", vec![ChatMessage::user("q")])
            .with_temperature(0.0)
            .with_max_tokens(256)
            .with_json_mode(true);
        assert_eq!(req.model, "gpt-4o-mini");
        assert!((req.temperature - 0.0).abs() < f32::EPSILON);
        assert_eq!(req.max_tokens, 256);
        assert!(req.json_mode);
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::Assistant).unwrap_or_else(|_| unreachable!());
        assert_eq!(json, "\"assistant\"");
    }
}
