//! The provider abstraction all LLM backends implement.

use async_trait::async_trait;

use super::message::{ChatRequest, ChatResponse};
use crate::error::ProviderError;

/// A chat-completion backend.
///
/// Implementations wrap a specific API (OpenAI, an OpenAI-compatible
/// local server) behind a uniform single-shot completion call. Tests
/// substitute scripted implementations through this seam.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging and diagnostics.
    fn name(&self) -> &str;

    /// Executes a single chat completion.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the API call fails or the response
    /// carries no usable content.
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError>;
}
