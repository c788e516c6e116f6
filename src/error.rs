//! Error types for healthmate-rs.
//!
//! Two families: [`ProviderError`] for LLM transport/parse failures and
//! [`WorkflowError`] for the fatal configuration conditions that abort a
//! run before its first stage. Everything else in the pipeline is
//! fail-soft and travels as data ([`StageError`](crate::workflow::StageError)
//! entries or [`ToolFailure`](crate::tools::ToolFailure) records), never as
//! a Rust error.

use thiserror::Error;

/// Errors from LLM provider calls.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No API key was configured for the provider.
    #[error("No API key configured. Set OPENAI_API_KEY or HEALTHMATE_API_KEY.")]
    ApiKeyMissing,

    /// The provider API call failed.
    #[error("API request failed: {message}")]
    ApiRequest {
        /// Error message from the provider SDK.
        message: String,
        /// HTTP status code, if one was received.
        status: Option<u16>,
    },

    /// The provider call did not complete within the configured timeout.
    #[error("LLM request timed out after {seconds}s")]
    Timeout {
        /// Timeout that was exceeded, in seconds.
        seconds: u64,
    },

    /// The model response could not be parsed into the expected shape.
    #[error("Failed to parse model response: {message}")]
    ResponseParse {
        /// Description of the parse failure.
        message: String,
        /// The raw response content, for diagnostics.
        content: String,
    },

    /// The configured provider name is not supported.
    #[error("Unsupported provider: {name}")]
    UnsupportedProvider {
        /// The provider name that was requested.
        name: String,
    },
}

/// Fatal workflow configuration errors.
///
/// These are the only conditions permitted to abort a run: everything a
/// workflow needs must be present before its first stage executes.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A required tool adapter is not registered.
    #[error("Required tool '{name}' is not registered; cannot run workflow")]
    MissingTool {
        /// Name the workflow looked up in the registry.
        name: String,
    },

    /// The workflow was configured for model-backed synthesis or
    /// extraction but no provider is available.
    #[error("Workflow requires an LLM provider but none is configured: {reason}")]
    ProviderUnavailable {
        /// Why the provider could not be constructed.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::Timeout { seconds: 30 };
        assert_eq!(err.to_string(), "LLM request timed out after 30s");

        let err = ProviderError::UnsupportedProvider {
            name: "mystery".to_string(),
        };
        assert!(err.to_string().contains("mystery"));
    }

    #[test]
    fn test_workflow_error_display() {
        let err = WorkflowError::MissingTool {
            name: "drug_labels".to_string(),
        };
        assert!(err.to_string().contains("drug_labels"));
    }
}
