//! Health information and claim-vetting workflow.
//!
//! Preprocesses the user question, fans out to the drug-label, literature,
//! and curated-topic sources, assembles the partial results into one
//! context block, and synthesizes an answer. When a claim is supplied, a
//! deterministic vetting verdict is appended.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use super::context::ContextAssembler;
use super::fetch;
use super::note_tool_failure;
use super::preprocess::QueryPreprocessor;
use super::state::{ErrorKind, HealthInfoState, Stage};
use super::synthesis::{GENERAL_DISCLAIMER, Synthesizer, vet_claim};
use crate::config::{AppConfig, VettingPolicy};
use crate::error::WorkflowError;
use crate::llm::{LlmProvider, PromptSet};
use crate::tools::{ToolRegistry, names};

/// Message used when every attempted source came back empty.
const NO_INFORMATION_MESSAGE: &str = "HealthMate could not retrieve specific information for \
     your query using the available tools. Please try rephrasing or be more specific.";

/// Input for a health-info run.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthInfoInput {
    /// The user's question.
    pub user_query: String,
    /// Claim to vet; supplying one switches the run to vetting mode.
    #[serde(default)]
    pub claim_to_check: Option<String>,
}

/// The health information / claim vetting workflow driver.
pub struct HealthInfoWorkflow {
    registry: ToolRegistry,
    preprocessor: QueryPreprocessor,
    synthesizer: Synthesizer,
    vetting: VettingPolicy,
    max_literature_results: usize,
}

impl std::fmt::Debug for HealthInfoWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthInfoWorkflow")
            .field("synthesizer", &self.synthesizer)
            .finish_non_exhaustive()
    }
}

impl HealthInfoWorkflow {
    /// Tools this workflow requires at construction.
    pub const REQUIRED_TOOLS: [&'static str; 3] = [
        names::DRUG_LABEL,
        names::LITERATURE_SEARCH,
        names::HEALTH_TOPIC,
    ];

    /// Creates the workflow.
    ///
    /// A provider enables model-assisted extraction and synthesis; without
    /// one, the heuristic and template paths are used.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::MissingTool`] when a required tool is not
    /// registered.
    pub fn new(
        config: &AppConfig,
        registry: ToolRegistry,
        provider: Option<Arc<dyn LlmProvider>>,
    ) -> Result<Self, WorkflowError> {
        for name in Self::REQUIRED_TOOLS {
            if !registry.contains(name) {
                return Err(WorkflowError::MissingTool {
                    name: name.to_string(),
                });
            }
        }

        let prompts = PromptSet::load(config.prompt_dir.as_deref());
        let (preprocessor, synthesizer) = match provider {
            Some(provider) => (
                QueryPreprocessor::with_model(
                    config.extraction.clone(),
                    Arc::clone(&provider),
                    prompts.clone(),
                    config.model.clone(),
                    config.llm_timeout,
                    config.extraction_max_tokens,
                ),
                Synthesizer::Model {
                    provider,
                    prompts,
                    model: config.model.clone(),
                    timeout: config.llm_timeout,
                    max_tokens: config.synthesis_max_tokens,
                },
            ),
            None => (
                QueryPreprocessor::heuristic(config.extraction.clone()),
                Synthesizer::Template,
            ),
        };

        Ok(Self {
            registry,
            preprocessor,
            synthesizer,
            vetting: config.vetting.clone(),
            max_literature_results: config.max_literature_results,
        })
    }

    /// Runs the workflow to completion.
    ///
    /// Fail-soft: data-source and model failures are recorded in the
    /// state's error log and the run continues; the returned state always
    /// carries a non-empty answer.
    pub async fn run(&self, input: HealthInfoInput) -> HealthInfoState {
        let mut state = HealthInfoState::new(input.user_query, input.claim_to_check);
        info!(claim_check = state.is_claim_check, "running health-info workflow");

        // Preprocess. An empty question is the one input problem that
        // skips the remaining stages.
        if state.user_query.trim().is_empty() {
            state
                .errors
                .push(Stage::Preprocess, ErrorKind::EmptyInput, "User query is empty.");
            state.answer = Some(format!(
                "Could not process your request due to an error: {}",
                state.errors.messages()
            ));
            return state;
        }

        let extracted = self
            .preprocessor
            .preprocess(&state.user_query, &mut state.errors)
            .await;
        debug!(entity = ?extracted.entity, "preprocessing complete");
        state.search_query = extracted.search_query;
        state.extracted_entity = extracted.entity;

        // Fetch. The three sources are independent; each writes only its
        // own slot.
        let literature_query = fetch::literature_query(
            state.is_claim_check,
            state.claim_to_check.as_deref(),
            &state.search_query,
        );
        let topic_query = fetch::topic_query(state.extracted_entity.as_deref(), &state.search_query);

        let (drug_label, literature, health_topic) = tokio::join!(
            async {
                match state.extracted_entity.as_deref() {
                    Some(entity) => Some(self.registry.drug_label(entity).await),
                    None => None,
                }
            },
            self.registry
                .literature(literature_query, self.max_literature_results),
            self.registry.health_topic(topic_query),
        );

        state.drug_label = drug_label;
        state.literature = Some(literature);
        state.health_topic = Some(health_topic);

        note_tool_failure(&mut state.errors, "drug label data", state.drug_label.as_ref());
        note_tool_failure(&mut state.errors, "literature", state.literature.as_ref());
        note_tool_failure(
            &mut state.errors,
            "health topic information",
            state.health_topic.as_ref(),
        );

        // Assemble.
        let mut assembler = ContextAssembler::new();
        assembler.push_drug_label(state.drug_label.as_ref(), state.extracted_entity.as_deref());
        assembler.push_literature(state.literature.as_ref());
        assembler.push_health_topic(state.health_topic.as_ref());
        let context = assembler.finish();
        state.assembled_context = Some(context.text.clone());

        // Synthesize, with the vetting section and disclaimer appended in
        // both composition modes.
        let mut trailer = String::new();
        if state.is_claim_check
            && let Some(ref claim) = state.claim_to_check
        {
            let verdict = vet_claim(claim, &context.haystack, &self.vetting);
            debug!(?verdict, "claim vetted");
            state.vetting_conclusion = Some(verdict.message().to_string());
            trailer.push_str(&format!(
                "--- Vetting Claim: \"{claim}\" ---\n  Conclusion: {}\n\n",
                verdict.message()
            ));
        }
        trailer.push_str(GENERAL_DISCLAIMER);

        let header = format!("HealthMate Information Regarding: \"{}\"", state.user_query);
        let body = if context.text.is_empty() {
            NO_INFORMATION_MESSAGE.to_string()
        } else {
            context.text.clone()
        };
        let template = format!("{header}\n\n{body}\n\n{trailer}");

        state.answer = Some(
            self.synthesizer
                .compose(&state.user_query, &context, template, &trailer, &mut state.errors)
                .await,
        );
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_missing_tool_is_fatal() {
        let config = AppConfig::default();
        let registry = ToolRegistry::new(Duration::from_secs(1));
        let result = HealthInfoWorkflow::new(&config, registry, None);
        assert!(matches!(result, Err(WorkflowError::MissingTool { .. })));
    }

    #[tokio::test]
    async fn test_empty_query_short_circuits() {
        let config = AppConfig::default();
        let registry = ToolRegistry::with_defaults(&config);
        let workflow = HealthInfoWorkflow::new(&config, registry, None)
            .unwrap_or_else(|_| unreachable!());

        let state = workflow
            .run(HealthInfoInput {
                user_query: "   ".to_string(),
                claim_to_check: None,
            })
            .await;

        assert!(state.errors.has_kind(ErrorKind::EmptyInput));
        let answer = state.answer.unwrap_or_default();
        assert!(answer.contains("User query is empty."));
        // No fetch was attempted.
        assert!(state.drug_label.is_none());
        assert!(state.literature.is_none());
        assert!(state.health_topic.is_none());
    }
}
