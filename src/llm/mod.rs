//! LLM integration for healthmate-rs.
//!
//! Provides a pluggable provider abstraction backed by OpenAI-compatible
//! APIs, provider-agnostic message types, and the system prompts used by
//! the extraction and synthesis stages. Per the pipeline design, the model
//! is only consulted for free-form generation (query refinement and answer
//! synthesis) — the fetch stages call the tool adapters directly.

pub mod client;
pub mod message;
pub mod prompt;
pub mod provider;
pub mod providers;

use std::time::Duration;

pub use client::create_provider;
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use prompt::PromptSet;
pub use provider::LlmProvider;

use crate::error::ProviderError;

/// Executes a completion with a hard timeout.
///
/// A call that exceeds `timeout` resolves to [`ProviderError::Timeout`]
/// instead of hanging the pipeline.
///
/// # Errors
///
/// Returns [`ProviderError`] on API failures or timeout.
pub async fn complete_with_timeout(
    provider: &dyn LlmProvider,
    request: &ChatRequest,
    timeout: Duration,
) -> Result<ChatResponse, ProviderError> {
    match tokio::time::timeout(timeout, provider.complete(request)).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout {
            seconds: timeout.as_secs(),
        }),
    }
}
