//! Outbreak early-warning workflow.
//!
//! Scans a free-text report for symptom signals, researches them against
//! the literature and curated topics, assesses an alert tier from what
//! came back, and synthesizes a monitoring report.

use serde::Deserialize;
use tracing::{debug, info};

use super::fetch;
use super::note_tool_failure;
use super::state::{AlertLevel, ErrorKind, OutbreakState, Stage};
use crate::config::{AlertPolicy, AppConfig};
use crate::error::WorkflowError;
use crate::tools::{Article, FetchOutcome, ToolRegistry, names};

/// Character cap for the echoed input excerpt in the report.
const INPUT_EXCERPT_CAP: usize = 150;
/// Character cap for article summaries in the report.
const REPORT_SUMMARY_CAP: usize = 200;

/// Input for an outbreak-analysis run.
#[derive(Debug, Clone, Deserialize)]
pub struct OutbreakInput {
    /// Free-text report to analyze (field observations, local reports).
    pub report_text: String,
}

/// The outbreak early-warning workflow driver.
#[derive(Debug)]
pub struct OutbreakWorkflow {
    registry: ToolRegistry,
    alerts: AlertPolicy,
    max_literature_results: usize,
}

impl OutbreakWorkflow {
    /// Tools this workflow requires at construction.
    pub const REQUIRED_TOOLS: [&'static str; 3] = [
        names::SYMPTOM_SCAN,
        names::LITERATURE_SEARCH,
        names::HEALTH_TOPIC,
    ];

    /// Creates the workflow.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::MissingTool`] when a required tool is not
    /// registered.
    pub fn new(config: &AppConfig, registry: ToolRegistry) -> Result<Self, WorkflowError> {
        for name in Self::REQUIRED_TOOLS {
            if !registry.contains(name) {
                return Err(WorkflowError::MissingTool {
                    name: name.to_string(),
                });
            }
        }
        Ok(Self {
            registry,
            alerts: config.alerts.clone(),
            max_literature_results: config.max_literature_results,
        })
    }

    /// Runs the workflow to completion. The returned state always carries
    /// a non-empty report.
    pub async fn run(&self, input: OutbreakInput) -> OutbreakState {
        let mut state = OutbreakState::new(input.report_text);
        info!("running outbreak workflow");

        // Analyze input.
        if state.report_text.trim().is_empty() {
            state.errors.push(
                Stage::Preprocess,
                ErrorKind::EmptyInput,
                "No input text provided for outbreak analysis.",
            );
            state.report = Some(format!(
                "Report generation failed due to error: {}",
                state.errors.messages()
            ));
            return state;
        }

        let symptoms = self.registry.symptom_scan(&state.report_text).await;
        note_tool_failure(&mut state.errors, "symptom analysis", Some(&symptoms));
        state.symptoms = Some(symptoms);

        let detected: Vec<String> = state
            .symptoms
            .as_ref()
            .and_then(|s| s.data())
            .map(|scan| scan.symptoms_detected.clone())
            .unwrap_or_default();
        debug!(?detected, "symptom scan complete");

        // Research. Skipped entirely when the scan found nothing at all.
        // A lone general-concern signal still triggers a broad literature
        // search, but no topic lookup (a standing-alert topic hit would
        // otherwise escalate every vague report).
        let has_specific = !fetch::significant_symptoms(&detected).is_empty();
        if has_specific {
            let literature_query = fetch::outbreak_literature_query(&detected);
            let topic_query = fetch::outbreak_topic_query(&detected);

            let (literature, health_topic) = tokio::join!(
                self.registry
                    .literature(&literature_query, self.max_literature_results),
                self.registry.health_topic(&topic_query),
            );

            note_tool_failure(&mut state.errors, "literature", Some(&literature));
            note_tool_failure(&mut state.errors, "health topic information", Some(&health_topic));
            state.literature = Some(literature);
            state.health_topic = Some(health_topic);
        } else if !detected.is_empty() {
            let literature = self
                .registry
                .literature(fetch::GENERAL_CONCERN_QUERY, 1)
                .await;
            note_tool_failure(&mut state.errors, "literature", Some(&literature));
            state.literature = Some(literature);
        }

        // Assess.
        let (alert_level, rationale) = self.assess(&detected, &state);
        debug!(%alert_level, "alert level assessed");
        state.alert_level = alert_level;
        state.alert_rationale = rationale;

        // Synthesize report.
        state.report = Some(self.render_report(&state));
        state
    }

    /// Assesses the alert tier from detected symptoms and research results.
    fn assess(&self, detected: &[String], state: &OutbreakState) -> (AlertLevel, String) {
        let specific = fetch::significant_symptoms(detected);
        let general_concern_only = !detected.is_empty() && specific.is_empty();

        let articles: Option<&Vec<Article>> =
            state.literature.as_ref().and_then(FetchOutcome::data);

        let (mut level, mut rationale) = if specific.len() >= self.alerts.medium_symptom_count
            && articles.is_some_and(|a| !a.is_empty())
        {
            if self.has_concerning_literature(&specific, articles) {
                (
                    AlertLevel::High,
                    "Multiple symptoms with highly relevant or concerning literature.".to_string(),
                )
            } else {
                (
                    AlertLevel::Medium,
                    "Multiple symptoms with related literature.".to_string(),
                )
            }
        } else if !specific.is_empty() && articles.is_some_and(|a| !a.is_empty()) {
            (
                AlertLevel::LowMedium,
                "Symptoms detected with some literature.".to_string(),
            )
        } else if !specific.is_empty() {
            (
                AlertLevel::Low,
                "Symptoms detected, no corroborating literature found via basic search."
                    .to_string(),
            )
        } else if general_concern_only {
            (
                AlertLevel::Low,
                "General concern signal, monitoring advised.".to_string(),
            )
        } else {
            (AlertLevel::Low, "Monitoring.".to_string())
        };

        // A standing public-health alert topic escalates one tier.
        let standing_alert = state
            .health_topic
            .as_ref()
            .and_then(FetchOutcome::data)
            .is_some_and(|topic| topic.topic.to_lowercase().contains("alert"));
        if standing_alert {
            match level {
                AlertLevel::None | AlertLevel::Low | AlertLevel::LowMedium => {
                    level = AlertLevel::Medium;
                    rationale = "Existing health alert may be relevant.".to_string();
                }
                AlertLevel::Medium => {
                    level = AlertLevel::High;
                    rationale = "Existing health alert likely relevant to findings.".to_string();
                }
                AlertLevel::High => {}
            }
        }

        (level, rationale)
    }

    /// Checks whether any article escalates the assessment: an escalation
    /// keyword in its text, or all leading specific symptoms mentioned
    /// together.
    fn has_concerning_literature(
        &self,
        specific: &[&str],
        articles: Option<&Vec<Article>>,
    ) -> bool {
        let Some(articles) = articles else {
            return false;
        };
        let leading = &specific[..specific.len().min(2)];

        articles.iter().any(|article| {
            let text = format!("{}{}", article.title, article.summary).to_lowercase();
            self.alerts
                .escalation_keywords
                .iter()
                .any(|kw| text.contains(kw.as_str()))
                || (!leading.is_empty() && leading.iter().all(|sym| text.contains(sym)))
        })
    }

    /// Renders the monitoring report from the final state.
    fn render_report(&self, state: &OutbreakState) -> String {
        let excerpt: String = if state.report_text.chars().count() > INPUT_EXCERPT_CAP {
            let cut: String = state.report_text.chars().take(INPUT_EXCERPT_CAP).collect();
            format!("{cut}...")
        } else {
            state.report_text.clone()
        };

        let mut parts = vec![
            "--- HealthMate Outbreak Monitoring Report ---".to_string(),
            format!("Input Analyzed: \"{excerpt}\""),
            format!(
                "Potential Alert Level: {} ({})",
                state.alert_level, state.alert_rationale
            ),
        ];

        match state.symptoms.as_ref().and_then(FetchOutcome::data) {
            Some(scan) if !scan.symptoms_detected.is_empty() => {
                parts.push(format!(
                    "Detected Symptoms/Signals: {}",
                    scan.symptoms_detected.join(", ")
                ));
            }
            _ => parts.push("Detected Symptoms/Signals: None or not specific.".to_string()),
        }

        match state.literature.as_ref().and_then(FetchOutcome::data) {
            Some(articles) if !articles.is_empty() => {
                parts.push("\nLiterature Highlights:".to_string());
                for (i, article) in articles.iter().enumerate() {
                    parts.push(format!("  [{}] Title: {}", i + 1, article.title));
                    let summary: String = if article.summary.chars().count() > REPORT_SUMMARY_CAP {
                        let cut: String =
                            article.summary.chars().take(REPORT_SUMMARY_CAP).collect();
                        format!("{cut}...")
                    } else {
                        article.summary.clone()
                    };
                    parts.push(format!("      Summary: {summary}"));
                }
            }
            _ => parts.push(
                "\nLiterature Highlights: No significant articles found or error in retrieval."
                    .to_string(),
            ),
        }

        match state.health_topic.as_ref().and_then(FetchOutcome::data) {
            Some(topic) => {
                parts.push(format!("\nHealth Topic Information ({}):", topic.source));
                parts.push(format!("  Topic: {}", topic.topic));
                parts.push(format!("  Summary: {}", topic.summary));
            }
            None => parts.push(
                "\nHealth Topic Information: No specific topic found or error in retrieval."
                    .to_string(),
            ),
        }

        parts.push("\n--- End of Report ---".to_string());
        parts.join("\n")
    }
}
