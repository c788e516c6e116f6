//! Workflow state records and the structured error log.
//!
//! Each workflow variant owns one state struct for the lifetime of a run:
//! input fields are set once at initialization, intermediate and result
//! fields are written by exactly one stage, and the error log accumulates
//! structured entries instead of overwriting a single message. States are
//! serializable so the dispatch boundary can return them for diagnostics.

use serde::{Deserialize, Serialize};

use crate::tools::{Article, DrugLabel, FetchOutcome, HealthTopic, SymptomScan};

/// Pipeline stage that detected a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Input validation and entity extraction.
    Preprocess,
    /// Data-source fetches.
    Fetch,
    /// Answer synthesis and claim vetting.
    Synthesize,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Preprocess => "preprocess",
            Self::Fetch => "fetch",
            Self::Synthesize => "synthesize",
        };
        f.write_str(name)
    }
}

/// Category of a recoverable pipeline error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A required input field was empty or malformed.
    EmptyInput,
    /// A data-source call failed.
    ToolFailure,
    /// Model extraction output failed to parse.
    ExtractionParse,
    /// Model synthesis failed or produced no text.
    SynthesisFailure,
}

/// One recoverable error recorded during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageError {
    /// Stage that detected the problem.
    pub stage: Stage,
    /// Error category.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Ordered accumulation of recoverable errors.
///
/// Stages append, never overwrite; downstream code inspects entries by
/// kind instead of substring-matching a concatenated string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLog(Vec<StageError>);

impl ErrorLog {
    /// Creates an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Records an error.
    pub fn push(&mut self, stage: Stage, kind: ErrorKind, message: impl Into<String>) {
        self.0.push(StageError {
            stage,
            kind,
            message: message.into(),
        });
    }

    /// Returns `true` when no errors were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recorded errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if any entry has the given kind.
    #[must_use]
    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.0.iter().any(|e| e.kind == kind)
    }

    /// Iterates over recorded errors in order.
    pub fn iter(&self) -> impl Iterator<Item = &StageError> {
        self.0.iter()
    }

    /// Joins all messages into one human-readable string.
    #[must_use]
    pub fn messages(&self) -> String {
        self.0
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<'a> IntoIterator for &'a ErrorLog {
    type Item = &'a StageError;
    type IntoIter = std::slice::Iter<'a, StageError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// State for the health information / claim vetting workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthInfoState {
    /// Original user question.
    pub user_query: String,
    /// Whether this run vets a claim.
    pub is_claim_check: bool,
    /// The claim being vetted, in vetting mode.
    pub claim_to_check: Option<String>,

    /// Refined search query (defaults to the user query).
    pub search_query: String,
    /// Extracted drug/condition entity, when one was identified.
    pub extracted_entity: Option<String>,

    /// Drug-label slot. `None` means the lookup was never attempted.
    pub drug_label: Option<FetchOutcome<DrugLabel>>,
    /// Literature slot.
    pub literature: Option<FetchOutcome<Vec<Article>>>,
    /// Curated-topic slot.
    pub health_topic: Option<FetchOutcome<HealthTopic>>,

    /// Assembled, source-attributed context block.
    pub assembled_context: Option<String>,
    /// Final answer text. Always non-empty after a run.
    pub answer: Option<String>,
    /// Vetting conclusion, in vetting mode.
    pub vetting_conclusion: Option<String>,
    /// Recoverable errors accumulated across stages.
    pub errors: ErrorLog,
}

impl HealthInfoState {
    /// Creates the initial state for a run. A blank claim is dropped, so
    /// the run stays a plain question instead of vetting nothing.
    #[must_use]
    pub fn new(user_query: impl Into<String>, claim_to_check: Option<String>) -> Self {
        let user_query = user_query.into();
        let claim_to_check = claim_to_check.filter(|c| !c.trim().is_empty());
        Self {
            search_query: user_query.clone(),
            user_query,
            is_claim_check: claim_to_check.is_some(),
            claim_to_check,
            extracted_entity: None,
            drug_label: None,
            literature: None,
            health_topic: None,
            assembled_context: None,
            answer: None,
            vetting_conclusion: None,
            errors: ErrorLog::new(),
        }
    }
}

/// State for the outbreak early-warning workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutbreakState {
    /// Raw report text under analysis.
    pub report_text: String,

    /// Symptom-scan slot.
    pub symptoms: Option<FetchOutcome<SymptomScan>>,
    /// Literature slot.
    pub literature: Option<FetchOutcome<Vec<Article>>>,
    /// Curated-topic slot.
    pub health_topic: Option<FetchOutcome<HealthTopic>>,

    /// Assessed alert tier.
    pub alert_level: AlertLevel,
    /// Why that tier was assigned.
    pub alert_rationale: String,
    /// Final monitoring report. Always non-empty after a run.
    pub report: Option<String>,
    /// Recoverable errors accumulated across stages.
    pub errors: ErrorLog,
}

impl OutbreakState {
    /// Creates the initial state for a run.
    #[must_use]
    pub fn new(report_text: impl Into<String>) -> Self {
        Self {
            report_text: report_text.into(),
            symptoms: None,
            literature: None,
            health_topic: None,
            alert_level: AlertLevel::None,
            alert_rationale: String::new(),
            report: None,
            errors: ErrorLog::new(),
        }
    }
}

/// Alert tier assessed by the outbreak workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    /// Not assessed yet.
    None,
    /// Routine monitoring.
    Low,
    /// Symptoms with some literature context.
    LowMedium,
    /// Multiple symptoms with related literature, or a relevant standing alert.
    Medium,
    /// Multiple symptoms with highly relevant or concerning literature.
    High,
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::None => "None",
            Self::Low => "Low",
            Self::LowMedium => "Low-Medium",
            Self::Medium => "Medium",
            Self::High => "High",
        };
        f.write_str(label)
    }
}

/// State for the post-discharge support workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDischargeState {
    /// Condition the user is recovering from, when given.
    pub condition: Option<String>,
    /// Medication the user asks about, when given.
    pub medication: Option<String>,
    /// The user's aftercare question.
    pub question: String,

    /// Condition-guidance slot.
    pub condition_info: Option<FetchOutcome<HealthTopic>>,
    /// Medication-label slot.
    pub medication_info: Option<FetchOutcome<DrugLabel>>,

    /// Final response text. Always non-empty after a run.
    pub answer: Option<String>,
    /// Recoverable errors accumulated across stages.
    pub errors: ErrorLog,
}

impl PostDischargeState {
    /// Creates the initial state for a run.
    #[must_use]
    pub fn new(
        condition: Option<String>,
        medication: Option<String>,
        question: impl Into<String>,
    ) -> Self {
        Self {
            condition: condition.filter(|c| !c.trim().is_empty()),
            medication: medication.filter(|m| !m.trim().is_empty()),
            question: question.into(),
            condition_info: None,
            medication_info: None,
            answer: None,
            errors: ErrorLog::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_log_accumulates_in_order() {
        let mut log = ErrorLog::new();
        log.push(Stage::Preprocess, ErrorKind::EmptyInput, "User query is empty.");
        log.push(Stage::Fetch, ErrorKind::ToolFailure, "timeout");

        assert_eq!(log.len(), 2);
        assert!(log.has_kind(ErrorKind::ToolFailure));
        assert!(!log.has_kind(ErrorKind::SynthesisFailure));
        assert_eq!(log.messages(), "User query is empty. timeout");

        let stages: Vec<Stage> = log.iter().map(|e| e.stage).collect();
        assert_eq!(stages, vec![Stage::Preprocess, Stage::Fetch]);
    }

    #[test]
    fn test_health_info_state_claim_mode() {
        let state = HealthInfoState::new("is it true?", Some("Garlic cures cancer.".to_string()));
        assert!(state.is_claim_check);
        assert_eq!(state.search_query, "is it true?");
        assert!(state.drug_label.is_none());
    }

    #[test]
    fn test_blank_claim_is_plain_question() {
        let state = HealthInfoState::new("is it true?", Some(String::new()));
        assert!(!state.is_claim_check);
        assert!(state.claim_to_check.is_none());

        let state = HealthInfoState::new("is it true?", Some("   ".to_string()));
        assert!(!state.is_claim_check);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Preprocess.to_string(), "preprocess");
        assert_eq!(Stage::Fetch.to_string(), "fetch");
        assert_eq!(Stage::Synthesize.to_string(), "synthesize");
    }

    #[test]
    fn test_post_discharge_blank_context_dropped() {
        let state = PostDischargeState::new(Some("  ".to_string()), None, "what now?");
        assert!(state.condition.is_none());
        assert!(state.medication.is_none());
    }

    #[test]
    fn test_alert_level_ordering() {
        assert!(AlertLevel::High > AlertLevel::Medium);
        assert!(AlertLevel::Low < AlertLevel::LowMedium);
    }
}
