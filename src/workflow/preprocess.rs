//! Query preprocessing: entity extraction and search-query refinement.
//!
//! Two strategies run in sequence. The heuristic pass is always available
//! and costs nothing; the model-assisted pass refines its result when a
//! provider is configured. Model failures are non-destructive: a still-
//! valid heuristic entity survives a failed or entity-less model reply.

use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use super::state::{ErrorKind, ErrorLog, Stage};
use crate::config::ExtractionPolicy;
use crate::llm::{
    ChatMessage, ChatRequest, LlmProvider, PromptSet, complete_with_timeout,
    prompt::build_extraction_prompt,
};

/// Outcome of preprocessing a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedQuery {
    /// Refined search query; never empty (falls back to the user query).
    pub search_query: String,
    /// Candidate entity, when one was identified.
    pub entity: Option<String>,
}

/// Strict shape of the model's extraction reply.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExtractionReply {
    search_query: String,
    entity: Option<String>,
}

/// Heuristic entity extraction over a lowercased query.
///
/// Scans for trigger phrases and takes the first token after the match,
/// bounded by the policy's length window and an alphanumeric check. A
/// short all-alphanumeric query is treated as the entity itself.
#[must_use]
pub fn heuristic_entity(query: &str, policy: &ExtractionPolicy) -> Option<String> {
    let query = query.to_lowercase();

    for phrase in &policy.trigger_phrases {
        let Some(idx) = query.find(phrase.as_str()) else {
            continue;
        };
        let after = &query[idx + phrase.len()..];
        let Some(candidate) = after
            .split_whitespace()
            .next()
            .map(|token| token.trim_matches(['?', '.', '!', ',']))
        else {
            continue;
        };

        if (policy.min_entity_len..=policy.max_entity_len).contains(&candidate.len())
            && candidate.chars().all(char::is_alphanumeric)
        {
            return Some(candidate.to_string());
        }
    }

    // Short queries like "metformin" are their own entity.
    let words: Vec<&str> = query.split_whitespace().collect();
    if !words.is_empty()
        && words.len() <= policy.short_query_words
        && words
            .iter()
            .all(|w| w.chars().all(char::is_alphanumeric))
    {
        let joined = words.join(" ");
        if (policy.min_entity_len..=policy.max_entity_len).contains(&joined.len()) {
            return Some(joined);
        }
    }

    None
}

/// Locates the outermost `{` .. `}` span and decodes it strictly.
///
/// Models may wrap the JSON object in prose; anything outside the brace
/// span is discarded before parsing. The decode rejects unknown fields so
/// a drifted reply shape surfaces as a parse error instead of silently
/// losing data.
fn parse_extraction(raw: &str) -> Result<ExtractionReply, String> {
    let re = Regex::new(r"(?s)\{.*\}").map_err(|e| e.to_string())?;
    let span = re
        .find(raw)
        .ok_or("no JSON object in model output")?
        .as_str();
    serde_json::from_str(span).map_err(|e| e.to_string())
}

/// Model-assisted refinement settings, present only when a provider is
/// configured.
struct ModelRefiner {
    provider: Arc<dyn LlmProvider>,
    prompts: PromptSet,
    model: String,
    timeout: Duration,
    max_tokens: u32,
}

/// Query preprocessor combining the heuristic and model strategies.
pub struct QueryPreprocessor {
    policy: ExtractionPolicy,
    refiner: Option<ModelRefiner>,
}

impl std::fmt::Debug for QueryPreprocessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryPreprocessor")
            .field("model", &self.refiner.as_ref().map(|r| r.model.as_str()))
            .field("llm_enabled", &self.refiner.is_some())
            .finish()
    }
}

impl QueryPreprocessor {
    /// Creates a heuristic-only preprocessor.
    #[must_use]
    pub const fn heuristic(policy: ExtractionPolicy) -> Self {
        Self {
            policy,
            refiner: None,
        }
    }

    /// Creates a preprocessor that refines the heuristic result with a model.
    #[must_use]
    pub fn with_model(
        policy: ExtractionPolicy,
        provider: Arc<dyn LlmProvider>,
        prompts: PromptSet,
        model: impl Into<String>,
        timeout: Duration,
        max_tokens: u32,
    ) -> Self {
        Self {
            policy,
            refiner: Some(ModelRefiner {
                provider,
                prompts,
                model: model.into(),
                timeout,
                max_tokens,
            }),
        }
    }

    /// Preprocesses a query.
    ///
    /// The returned search query is never empty. Model failures are
    /// recorded in `errors` and fall back to the heuristic result.
    pub async fn preprocess(&self, user_query: &str, errors: &mut ErrorLog) -> ExtractedQuery {
        let heuristic = heuristic_entity(user_query, &self.policy);
        debug!(?heuristic, "heuristic entity extraction");

        let Some(ref refiner) = self.refiner else {
            return ExtractedQuery {
                search_query: user_query.to_string(),
                entity: heuristic,
            };
        };

        let request = ChatRequest::new(
            refiner.model.clone(),
            vec![
                ChatMessage::system(refiner.prompts.extraction.clone()),
                ChatMessage::user(build_extraction_prompt(user_query)),
            ],
        )
        .with_temperature(0.0)
        .with_max_tokens(refiner.max_tokens)
        .with_json_mode(true);

        let raw = match complete_with_timeout(
            refiner.provider.as_ref(),
            &request,
            refiner.timeout,
        )
        .await
        {
            Ok(response) => response.content,
            Err(e) => {
                warn!(error = %e, "extraction call failed, keeping heuristic result");
                errors.push(
                    Stage::Preprocess,
                    ErrorKind::ExtractionParse,
                    format!("Query refinement failed: {e}"),
                );
                return ExtractedQuery {
                    search_query: user_query.to_string(),
                    entity: heuristic,
                };
            }
        };

        match parse_extraction(&raw) {
            Ok(reply) => {
                let search_query = if reply.search_query.trim().is_empty() {
                    user_query.to_string()
                } else {
                    reply.search_query
                };
                // A model reply without an entity must not erase a valid
                // heuristic hint.
                let entity = reply
                    .entity
                    .filter(|e| !e.trim().is_empty())
                    .map(|e| e.to_lowercase())
                    .or(heuristic);
                ExtractedQuery {
                    search_query,
                    entity,
                }
            }
            Err(message) => {
                warn!(%message, "extraction reply did not parse");
                errors.push(
                    Stage::Preprocess,
                    ErrorKind::ExtractionParse,
                    format!("Could not parse query refinement output: {message}"),
                );
                ExtractedQuery {
                    search_query: user_query.to_string(),
                    entity: heuristic,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use test_case::test_case;

    use crate::error::ProviderError;
    use crate::llm::ChatResponse;

    fn policy() -> ExtractionPolicy {
        ExtractionPolicy::default()
    }

    /// Provider stub that returns one canned reply.
    struct FixedReply(&'static str);

    #[async_trait]
    impl LlmProvider for FixedReply {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
            Ok(ChatResponse {
                content: self.0.to_string(),
                model: "fixed".to_string(),
                usage: None,
            })
        }
    }

    fn with_fixed_reply(reply: &'static str) -> QueryPreprocessor {
        QueryPreprocessor::with_model(
            policy(),
            Arc::new(FixedReply(reply)),
            PromptSet::defaults(),
            "fixed",
            Duration::from_secs(1),
            64,
        )
    }

    #[test_case("Tell me about Metformin side effects", Some("metformin"); "trigger phrase")]
    #[test_case("What is ibuprofen?", Some("ibuprofen"); "question with punctuation")]
    #[test_case("side effects of Lisinopril", Some("lisinopril"); "side effects phrase")]
    #[test_case("metformin", Some("metformin"); "bare short query")]
    #[test_case("How do vaccines work in the human body", None; "no entity")]
    #[test_case("", None; "empty query")]
    fn test_heuristic_entity(query: &str, expected: Option<&str>) {
        assert_eq!(
            heuristic_entity(query, &policy()),
            expected.map(ToString::to_string)
        );
    }

    #[test]
    fn test_heuristic_rejects_short_candidates() {
        // "flu" is below the minimum entity length.
        assert_eq!(heuristic_entity("what is flu", &policy()), None);
    }

    #[test]
    fn test_heuristic_rejects_overlong_candidates() {
        let query = format!("what is {}", "x".repeat(40));
        assert_eq!(heuristic_entity(&query, &policy()), None);
    }

    #[test]
    fn test_parse_extraction_strict() {
        let reply = parse_extraction(r#"{"search_query": "metformin side effects", "entity": "metformin"}"#)
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(reply.search_query, "metformin side effects");
        assert_eq!(reply.entity.as_deref(), Some("metformin"));
    }

    #[test]
    fn test_parse_extraction_unwraps_prose() {
        let raw = "Sure! Here is the JSON:\n{\"search_query\": \"flu prevention\", \"entity\": null}\nHope that helps.";
        let reply = parse_extraction(raw).unwrap_or_else(|_| unreachable!());
        assert_eq!(reply.search_query, "flu prevention");
        assert!(reply.entity.is_none());
    }

    #[test]
    fn test_parse_extraction_rejects_unknown_fields() {
        let raw = r#"{"search_query": "q", "entity": null, "confidence": 0.9}"#;
        assert!(parse_extraction(raw).is_err());
    }

    #[test]
    fn test_parse_extraction_rejects_braceless_output() {
        assert!(parse_extraction("no json here").is_err());
    }

    #[tokio::test]
    async fn test_null_entity_reply_keeps_heuristic_entity() {
        let pre =
            with_fixed_reply(r#"{"search_query": "metformin adverse effects", "entity": null}"#);
        let mut errors = ErrorLog::new();
        let extracted = pre
            .preprocess("Tell me about Metformin side effects", &mut errors)
            .await;

        // The model refined the query but named no entity; the heuristic
        // hit must survive.
        assert_eq!(extracted.search_query, "metformin adverse effects");
        assert_eq!(extracted.entity.as_deref(), Some("metformin"));
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn test_model_entity_overrides_heuristic() {
        let pre = with_fixed_reply(r#"{"search_query": "lisinopril", "entity": "Lisinopril"}"#);
        let mut errors = ErrorLog::new();
        let extracted = pre
            .preprocess("Tell me about Metformin side effects", &mut errors)
            .await;
        assert_eq!(extracted.entity.as_deref(), Some("lisinopril"));
    }

    #[tokio::test]
    async fn test_heuristic_only_preprocess() {
        let pre = QueryPreprocessor::heuristic(policy());
        let mut errors = ErrorLog::new();
        let extracted = pre.preprocess("Tell me about Metformin side effects", &mut errors).await;
        assert_eq!(extracted.search_query, "Tell me about Metformin side effects");
        assert_eq!(extracted.entity.as_deref(), Some("metformin"));
        assert!(errors.is_empty());
    }
}
