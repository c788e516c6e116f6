//! Answer synthesis and claim vetting.
//!
//! Synthesis runs in one of two modes. Template mode concatenates the
//! assembled sections deterministically. Model mode asks the provider to
//! compose the answer from the assembled context alone, falling back to
//! the template answer when the call fails or returns nothing — a run
//! never ends with an empty answer either way.
//!
//! The vetting verdict is always computed by the deterministic policy,
//! in both modes; the model narrates but never judges.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::context::AssembledContext;
use super::state::{ErrorKind, ErrorLog, Stage};
use crate::config::VettingPolicy;
use crate::llm::{
    ChatMessage, ChatRequest, LlmProvider, PromptSet, complete_with_timeout,
    prompt::build_synthesis_prompt,
};

/// Closing disclaimer for informational answers.
pub const GENERAL_DISCLAIMER: &str = "Disclaimer: HealthMate provides information from public \
     sources and is not a substitute for professional medical advice. Always consult a \
     healthcare provider for medical concerns.";

/// Closing disclaimer for aftercare answers.
pub const AFTERCARE_DISCLAIMER: &str = "Disclaimer: This information is for general guidance and \
     not a substitute for professional medical advice. Contact your healthcare provider for any \
     specific medical concerns or before making any decisions related to your health or treatment.";

/// Categorical judgment about a vetted claim.
///
/// Never a truth value: the policy is conservative by design and at most
/// reports corroboration, never confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VettingVerdict {
    /// The claim asserts a cure for a serious or chronic condition.
    HeightenedCaution,
    /// Some claim keywords appear in the retrieved context.
    PartiallyCorroborated,
    /// Nothing retrieved speaks to the claim either way.
    Unsubstantiated,
}

impl VettingVerdict {
    /// The user-facing conclusion text for this verdict.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::HeightenedCaution => {
                "The claim of a 'cure' for this condition should be treated with extreme \
                 caution. Reputable sources typically discuss treatment, management, or \
                 remission rather than outright cures for many serious conditions. Always \
                 consult healthcare professionals."
            }
            Self::PartiallyCorroborated => {
                "Some terms from your claim were found in the retrieved information. Please \
                 review the provided details carefully to assess the validity of the claim. \
                 HealthMate cannot confirm or deny the claim's truthfulness but provides \
                 related context."
            }
            Self::Unsubstantiated => {
                "The provided claim could not be directly substantiated or refuted with the \
                 information retrieved by HealthMate. It's recommended to seek information \
                 from trusted medical sources or healthcare professionals regarding this claim."
            }
        }
    }
}

/// Vets a claim against the assembled context haystack.
///
/// A cure claim for a serious condition yields the heightened-caution
/// verdict unconditionally, whatever the context contains.
#[must_use]
pub fn vet_claim(claim: &str, haystack: &str, policy: &VettingPolicy) -> VettingVerdict {
    let claim_lower = claim.to_lowercase();

    let asserts_cure = policy
        .cure_words
        .iter()
        .any(|w| claim_lower.contains(w.as_str()));
    let names_serious_condition = policy
        .serious_conditions
        .iter()
        .any(|c| claim_lower.contains(c.as_str()));

    if asserts_cure && names_serious_condition {
        return VettingVerdict::HeightenedCaution;
    }

    let corroborated = claim_lower
        .split_whitespace()
        .map(|word| word.trim_matches(['?', '.', '!', ',']))
        .filter(|word| word.len() >= policy.min_keyword_len)
        .any(|word| haystack.contains(word));

    if corroborated {
        VettingVerdict::PartiallyCorroborated
    } else {
        VettingVerdict::Unsubstantiated
    }
}

/// Answer composition strategy.
pub enum Synthesizer {
    /// Deterministic template assembly.
    Template,
    /// Model-backed composition over the assembled context.
    Model {
        /// Completion backend.
        provider: Arc<dyn LlmProvider>,
        /// System prompts.
        prompts: PromptSet,
        /// Model identifier.
        model: String,
        /// Per-call timeout.
        timeout: Duration,
        /// Generation token cap.
        max_tokens: u32,
    },
}

impl std::fmt::Debug for Synthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Template => f.write_str("Synthesizer::Template"),
            Self::Model { model, .. } => f
                .debug_struct("Synthesizer::Model")
                .field("model", model)
                .finish_non_exhaustive(),
        }
    }
}

impl Synthesizer {
    /// Composes the final answer.
    ///
    /// `template_answer` is the complete deterministic answer including
    /// any vetting section and the disclaimer; `trailer` is the part that
    /// must also follow a model-composed body (vetting section plus
    /// disclaimer). Model failures are recorded in `errors` and fall back
    /// to the template answer.
    pub async fn compose(
        &self,
        question: &str,
        context: &AssembledContext,
        template_answer: String,
        trailer: &str,
        errors: &mut ErrorLog,
    ) -> String {
        let Self::Model {
            provider,
            prompts,
            model,
            timeout,
            max_tokens,
        } = self
        else {
            return template_answer;
        };

        let request = ChatRequest::new(
            model.clone(),
            vec![
                ChatMessage::system(prompts.synthesis.clone()),
                ChatMessage::user(build_synthesis_prompt(question, &context.text)),
            ],
        )
        .with_max_tokens(*max_tokens);

        match complete_with_timeout(provider.as_ref(), &request, *timeout).await {
            Ok(response) if !response.content.trim().is_empty() => {
                debug!(model, "model synthesis succeeded");
                format!("{}\n\n{trailer}", response.content.trim())
            }
            Ok(_) => {
                warn!(model, "model synthesis returned empty output");
                errors.push(
                    Stage::Synthesize,
                    ErrorKind::SynthesisFailure,
                    "Model synthesis returned empty output.",
                );
                template_answer
            }
            Err(e) => {
                warn!(model, error = %e, "model synthesis failed");
                errors.push(
                    Stage::Synthesize,
                    ErrorKind::SynthesisFailure,
                    format!("Model synthesis failed: {e}"),
                );
                template_answer
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> VettingPolicy {
        VettingPolicy::default()
    }

    #[test]
    fn test_cure_claim_for_serious_condition_is_heightened_caution() {
        let verdict = vet_claim(
            "Garlic cures all types of cancer naturally.",
            "",
            &policy(),
        );
        assert_eq!(verdict, VettingVerdict::HeightenedCaution);

        // The verdict holds even when the context mentions cures.
        let verdict = vet_claim(
            "Garlic cures all types of cancer naturally.",
            "studies of garlic compounds and cancer cure rates",
            &policy(),
        );
        assert_eq!(verdict, VettingVerdict::HeightenedCaution);
    }

    #[test]
    fn test_keyword_overlap_is_partially_corroborated() {
        let verdict = vet_claim(
            "Vitamin C shortens colds.",
            "research on vitamin intake and the common cold",
            &policy(),
        );
        assert_eq!(verdict, VettingVerdict::PartiallyCorroborated);
    }

    #[test]
    fn test_no_overlap_is_unsubstantiated() {
        let verdict = vet_claim(
            "Magnets realign your aura.",
            "influenza vaccination guidance",
            &policy(),
        );
        assert_eq!(verdict, VettingVerdict::Unsubstantiated);
    }

    #[test]
    fn test_short_words_do_not_corroborate() {
        // Every claim word under the keyword length bound is ignored.
        let verdict = vet_claim("it is so too", "it is so too and more", &policy());
        assert_eq!(verdict, VettingVerdict::Unsubstantiated);
    }

    #[tokio::test]
    async fn test_template_mode_returns_template() {
        let context = AssembledContext {
            text: String::new(),
            haystack: String::new(),
            data_sections: 0,
        };
        let mut errors = ErrorLog::new();
        let answer = Synthesizer::Template
            .compose("q", &context, "the template".to_string(), "", &mut errors)
            .await;
        assert_eq!(answer, "the template");
        assert!(errors.is_empty());
    }
}
