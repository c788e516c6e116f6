//! Provider construction.

use std::sync::Arc;

use super::provider::LlmProvider;
use super::providers::openai::OpenAiProvider;
use crate::config::AppConfig;
use crate::error::ProviderError;

/// Creates a provider from the application configuration.
///
/// Currently `openai` (and any OpenAI-compatible endpoint selected via
/// `base_url`) is supported. The provider name is matched
/// case-insensitively.
///
/// # Errors
///
/// Returns [`ProviderError::ApiKeyMissing`] when no key is configured and
/// [`ProviderError::UnsupportedProvider`] for unknown provider names.
pub fn create_provider(config: &AppConfig) -> Result<Arc<dyn LlmProvider>, ProviderError> {
    match config.provider.to_lowercase().as_str() {
        "openai" => {
            let api_key = config
                .api_key
                .clone()
                .ok_or(ProviderError::ApiKeyMissing)?;
            Ok(Arc::new(OpenAiProvider::new(
                api_key,
                config.base_url.clone(),
            )))
        }
        other => Err(ProviderError::UnsupportedProvider {
            name: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_unsupported_provider() {
        let config = AppConfig::builder()
            .provider("mystery")
            .api_key("sk-test")
            .build();
        let result = create_provider(&config);
        assert!(matches!(
            result,
            Err(ProviderError::UnsupportedProvider { .. })
        ));
    }

    #[test]
    fn test_missing_api_key() {
        let config = AppConfig::builder().provider("openai").build();
        let result = create_provider(&config);
        assert!(matches!(result, Err(ProviderError::ApiKeyMissing)));
    }

    #[test]
    fn test_openai_provider_created() {
        let config = AppConfig::builder()
            .provider("OpenAI")
            .api_key("sk-test")
            .build();
        let provider = create_provider(&config).unwrap_or_else(|_| unreachable!());
        assert_eq!(provider.name(), "openai");
    }
}
