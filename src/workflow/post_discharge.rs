//! Post-discharge support workflow.
//!
//! Answers aftercare questions using whatever condition and medication
//! context the user supplies: condition guidance comes from the curated
//! topics, medication details from the drug-label source, and the label
//! snippet shown is chosen by what the question asks about. When neither
//! source yields anything, keyword-matched general advice fills the gap.

use serde::Deserialize;
use tracing::{debug, info};

use super::fetch;
use super::note_tool_failure;
use super::state::{ErrorKind, PostDischargeState, Stage};
use super::synthesis::AFTERCARE_DISCLAIMER;
use crate::config::AppConfig;
use crate::error::WorkflowError;
use crate::tools::{DrugLabel, FetchOutcome, ToolRegistry, names};

/// Character cap for label snippets in the response.
const SNIPPET_CAP: usize = 250;

/// Input for a post-discharge run.
#[derive(Debug, Clone, Deserialize)]
pub struct PostDischargeInput {
    /// Condition the user is recovering from.
    #[serde(default)]
    pub condition: Option<String>,
    /// Medication the user asks about.
    #[serde(default)]
    pub medication: Option<String>,
    /// The aftercare question.
    pub question: String,
}

/// The post-discharge support workflow driver.
#[derive(Debug)]
pub struct PostDischargeWorkflow {
    registry: ToolRegistry,
}

impl PostDischargeWorkflow {
    /// Tools this workflow requires at construction.
    pub const REQUIRED_TOOLS: [&'static str; 2] = [names::HEALTH_TOPIC, names::DRUG_LABEL];

    /// Creates the workflow.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::MissingTool`] when a required tool is not
    /// registered.
    pub fn new(registry: ToolRegistry) -> Result<Self, WorkflowError> {
        for name in Self::REQUIRED_TOOLS {
            if !registry.contains(name) {
                return Err(WorkflowError::MissingTool {
                    name: name.to_string(),
                });
            }
        }
        Ok(Self { registry })
    }

    /// Creates the workflow from configuration (registry built separately).
    ///
    /// # Errors
    ///
    /// Same as [`PostDischargeWorkflow::new`]; `config` is accepted for
    /// signature parity with the other workflows.
    pub fn from_config(_config: &AppConfig, registry: ToolRegistry) -> Result<Self, WorkflowError> {
        Self::new(registry)
    }

    /// Runs the workflow to completion. The returned state always carries
    /// a non-empty answer.
    pub async fn run(&self, input: PostDischargeInput) -> PostDischargeState {
        let mut state = PostDischargeState::new(input.condition, input.medication, input.question);
        info!(
            has_condition = state.condition.is_some(),
            has_medication = state.medication.is_some(),
            "running post-discharge workflow"
        );

        if state.question.trim().is_empty() {
            state.errors.push(
                Stage::Preprocess,
                ErrorKind::EmptyInput,
                "User question is empty for post-discharge support.",
            );
            state.answer = Some(format!(
                "Could not process your request: {}",
                state.errors.messages()
            ));
            return state;
        }

        // Fetch whatever context was supplied; the two lookups are
        // independent.
        let (condition_info, medication_info) = tokio::join!(
            async {
                match state.condition.as_deref() {
                    Some(condition) => {
                        let query = fetch::condition_query(condition);
                        Some(self.registry.health_topic(&query).await)
                    }
                    None => None,
                }
            },
            async {
                match state.medication.as_deref() {
                    Some(medication) => Some(self.registry.drug_label(medication).await),
                    None => None,
                }
            },
        );

        state.condition_info = condition_info;
        state.medication_info = medication_info;
        note_tool_failure(
            &mut state.errors,
            "condition guidance",
            state.condition_info.as_ref(),
        );
        note_tool_failure(
            &mut state.errors,
            "medication information",
            state.medication_info.as_ref(),
        );

        state.answer = Some(self.render_response(&state));
        state
    }

    /// Renders the aftercare response from the final state.
    fn render_response(&self, state: &PostDischargeState) -> String {
        let question_lower = state.question.to_lowercase();
        let mut parts = vec![format!(
            "HealthMate Post-Discharge Information for your question: \"{}\"",
            state.question
        )];
        let mut informative_sections = 0_usize;

        if let Some(ref condition) = state.condition {
            parts.push(format!("\n--- Regarding your condition: {condition} ---"));
            match state.condition_info.as_ref().and_then(FetchOutcome::data) {
                Some(topic) => {
                    parts.push(format!("  Topic ({}): {}", topic.source, topic.topic));
                    parts.push(format!("  Summary: {}", topic.summary));
                    informative_sections += 1;
                }
                None => parts.push(
                    "  No specific information found for this condition.".to_string(),
                ),
            }
        }

        if let Some(ref medication) = state.medication {
            parts.push(format!("\n--- Regarding your medication: {medication} ---"));
            match state.medication_info.as_ref().and_then(FetchOutcome::data) {
                Some(label) => {
                    parts.push(format!("  Brand Name(s): {}", join_or_na(&label.brand_name)));
                    parts.push(format!(
                        "  Generic Name(s): {}",
                        join_or_na(&label.generic_name)
                    ));
                    parts.push(label_snippet(&question_lower, label));
                    informative_sections += 1;
                }
                None => parts.push(format!(
                    "  No specific label information found for {medication} or an issue occurred."
                )),
            }
        }

        if informative_sections == 0 {
            if let Some(advice) = general_advice(
                &question_lower,
                state.condition.is_some() || state.medication.is_some(),
            ) {
                parts.push(format!("\n{advice}"));
            }
        }

        if parts.len() == 1 {
            parts.push(
                "\nHealthMate could not find specific information based on your input. Please \
                 provide more details about your condition, medication, or question."
                    .to_string(),
            );
        }

        debug!(informative_sections, "aftercare response rendered");
        parts.push(format!("\n\n{AFTERCARE_DISCLAIMER}"));
        parts.join("\n")
    }
}

/// Picks the label snippet the question asks about: side effects, usage
/// instructions, or (by default) indications.
fn label_snippet(question_lower: &str, label: &DrugLabel) -> String {
    let snippet = |text: &str| -> String {
        if text.chars().count() > SNIPPET_CAP {
            let cut: String = text.chars().take(SNIPPET_CAP).collect();
            format!("{cut}...")
        } else {
            text.to_string()
        }
    };

    if question_lower.contains("side effect") {
        format!(
            "  Common Adverse Reactions: {}",
            snippet(&label.adverse_reactions)
        )
    } else if question_lower.contains("how to take") || question_lower.contains("dosage") {
        let text = if label.dosage_and_administration == "N/A" {
            &label.indications_and_usage
        } else {
            &label.dosage_and_administration
        };
        format!("  Usage/Administration Info: {}", snippet(text))
    } else {
        format!("  Indications: {}", snippet(&label.indications_and_usage))
    }
}

/// Keyword-matched general advice for questions the sources did not
/// answer. Returns `None` when nothing applies.
fn general_advice(question_lower: &str, has_context: bool) -> Option<String> {
    if question_lower.contains("exercise") {
        Some(
            "General Advice: Regarding exercise after discharge, it's crucial to follow your \
             doctor's specific instructions. Typically, start slowly and gradually increase \
             activity as tolerated and advised. If you experience pain or discomfort, stop and \
             consult your healthcare provider."
                .to_string(),
        )
    } else if question_lower.contains("warning signs") {
        Some(
            "General Advice: For any condition or after any procedure, common warning signs \
             that warrant contacting your doctor include: worsening pain, fever, chills, \
             unusual redness or swelling, discharge (e.g., from a wound), shortness of breath, \
             or any new or unexpected symptoms. This list is not exhaustive."
                .to_string(),
        )
    } else if question_lower.contains("diet") || question_lower.contains("food") {
        Some(
            "General Advice: Follow any dietary instructions given by your doctor. Generally, \
             a balanced diet rich in fruits, vegetables, and lean protein supports recovery. \
             Stay hydrated by drinking plenty of fluids, especially water, unless advised \
             otherwise."
                .to_string(),
        )
    } else if !has_context {
        Some(
            "To provide more specific information, please mention the condition you are \
             recovering from or any specific medications you have questions about."
                .to_string(),
        )
    } else {
        None
    }
}

/// Joins a string list for display, substituting `N/A` when empty.
fn join_or_na(items: &[String]) -> String {
    if items.is_empty() {
        "N/A".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sample_label() -> DrugLabel {
        DrugLabel {
            drug_name_queried: "Ibuprofen".to_string(),
            brand_name: vec!["Advil".to_string(), "Motrin".to_string()],
            generic_name: vec!["Ibuprofen".to_string()],
            indications_and_usage: "Relieves pain from various conditions.".to_string(),
            adverse_reactions: "Upset stomach, mild heartburn, nausea.".to_string(),
            warnings_and_precautions: "Increased risk of cardiovascular events.".to_string(),
            dosage_and_administration: "Take with food every 6 hours as needed.".to_string(),
            source: "openFDA".to_string(),
        }
    }

    #[test]
    fn test_missing_tool_is_fatal() {
        let registry = ToolRegistry::new(Duration::from_secs(1));
        let result = PostDischargeWorkflow::new(registry);
        assert!(matches!(result, Err(WorkflowError::MissingTool { .. })));
    }

    #[test]
    fn test_snippet_follows_question() {
        let label = sample_label();
        let snippet = label_snippet("what side effects should i watch for", &label);
        assert!(snippet.contains("Adverse Reactions"));
        assert!(snippet.contains("Upset stomach"));

        let snippet = label_snippet("what is the dosage", &label);
        assert!(snippet.contains("Usage/Administration"));
        assert!(snippet.contains("every 6 hours"));

        let snippet = label_snippet("is this right for me", &label);
        assert!(snippet.contains("Indications"));
    }

    #[test]
    fn test_dosage_falls_back_to_indications() {
        let mut label = sample_label();
        label.dosage_and_administration = "N/A".to_string();
        let snippet = label_snippet("how to take this", &label);
        assert!(snippet.contains("Relieves pain"));
    }

    #[test]
    fn test_general_advice_keywords() {
        assert!(
            general_advice("when can i exercise", true)
                .is_some_and(|a| a.contains("start slowly"))
        );
        assert!(
            general_advice("what are the warning signs", true)
                .is_some_and(|a| a.contains("worsening pain"))
        );
        assert!(
            general_advice("what should i eat, any food tips", true)
                .is_some_and(|a| a.contains("balanced diet"))
        );
        assert!(
            general_advice("anything else", false)
                .is_some_and(|a| a.contains("please mention the condition"))
        );
        assert!(general_advice("anything else", true).is_none());
    }

    #[tokio::test]
    async fn test_empty_question_short_circuits() {
        let config = AppConfig::default();
        let registry = ToolRegistry::with_defaults(&config);
        let workflow = PostDischargeWorkflow::new(registry).unwrap_or_else(|_| unreachable!());

        let state = workflow
            .run(PostDischargeInput {
                condition: Some("flu".to_string()),
                medication: None,
                question: String::new(),
            })
            .await;

        assert!(state.errors.has_kind(ErrorKind::EmptyInput));
        let answer = state.answer.unwrap_or_default();
        assert!(answer.contains("User question is empty for post-discharge support."));
        assert!(state.condition_info.is_none());
    }
}
