//! Keyword symptom scan.
//!
//! Spots known symptom keywords in free-text reports. When nothing
//! specific matches but the text reads like a report, a non-specific
//! general-concern signal is emitted instead so downstream triage still
//! has something to act on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::outcome::{ToolFailure, ToolReply};
use super::ToolAdapter;
use crate::config::SymptomPolicy;

/// Maximum characters kept in the text preview.
const PREVIEW_LEN: usize = 100;

/// Result of a symptom scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomScan {
    /// Matched symptom keywords, in first-seen order.
    pub symptoms_detected: Vec<String>,
    /// Truncated copy of the scanned text.
    pub original_text_preview: String,
}

/// Symptom keyword scanner.
#[derive(Debug, Clone)]
pub struct SymptomScanTool {
    policy: SymptomPolicy,
}

impl SymptomScanTool {
    /// Creates a scanner with the given keyword policy.
    #[must_use]
    pub const fn new(policy: SymptomPolicy) -> Self {
        Self { policy }
    }

    /// Scans text for symptom keywords.
    ///
    /// Empty text is valid input and simply yields no symptoms. Matches
    /// are reported in policy order, deduplicated.
    #[must_use]
    pub fn scan(&self, text: &str) -> SymptomScan {
        let text_lower = text.to_lowercase();

        let mut symptoms: Vec<String> = self
            .policy
            .keywords
            .iter()
            .filter(|keyword| text_lower.contains(keyword.as_str()))
            .cloned()
            .collect();
        symptoms.dedup();

        if symptoms.is_empty()
            && self
                .policy
                .concern_phrases
                .iter()
                .any(|phrase| text_lower.contains(phrase.as_str()))
        {
            symptoms.push(SymptomPolicy::GENERAL_CONCERN.to_string());
        }

        let preview: String = if text.chars().count() > PREVIEW_LEN {
            let truncated: String = text.chars().take(PREVIEW_LEN).collect();
            format!("{truncated}...")
        } else {
            text.to_string()
        };

        SymptomScan {
            symptoms_detected: symptoms,
            original_text_preview: preview,
        }
    }
}

#[async_trait]
impl ToolAdapter for SymptomScanTool {
    fn name(&self) -> &str {
        super::names::SYMPTOM_SCAN
    }

    async fn invoke(&self, input: Value) -> ToolReply {
        let Some(text) = input.get("text").and_then(Value::as_str) else {
            return ToolReply::Failed(ToolFailure::new("Invalid input: 'text' must be a string."));
        };

        let scan = self.scan(text);
        match serde_json::to_value(&scan) {
            Ok(value) => ToolReply::Data(value),
            Err(e) => ToolReply::Failed(ToolFailure::new(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool() -> SymptomScanTool {
        SymptomScanTool::new(SymptomPolicy::default())
    }

    #[test]
    fn test_detects_multiple_symptoms() {
        let scan = tool().scan("Patient reports high fever, persistent cough, and severe headache.");
        assert_eq!(scan.symptoms_detected, vec!["fever", "cough", "headache"]);
    }

    #[test]
    fn test_general_concern_fallback() {
        let scan = tool().scan("There's an unusual illness reported in the northern district.");
        assert_eq!(
            scan.symptoms_detected,
            vec![SymptomPolicy::GENERAL_CONCERN.to_string()]
        );
    }

    #[test]
    fn test_empty_text_is_valid() {
        let scan = tool().scan("");
        assert!(scan.symptoms_detected.is_empty());
        assert!(scan.original_text_preview.is_empty());
    }

    #[test]
    fn test_preview_truncation() {
        let text = "a".repeat(150);
        let scan = tool().scan(&text);
        assert_eq!(scan.original_text_preview.len(), 103);
        assert!(scan.original_text_preview.ends_with("..."));
    }

    #[test]
    fn test_deterministic_order() {
        let scan = tool().scan("severe headache after days of fever");
        // Policy order, not text order.
        assert_eq!(scan.symptoms_detected, vec!["fever", "headache"]);
    }

    #[tokio::test]
    async fn test_invoke_rejects_non_string() {
        let reply = tool().invoke(json!({"text": 123})).await;
        assert!(matches!(reply, ToolReply::Failed(_)));
    }

    #[tokio::test]
    async fn test_invoke_returns_scan_payload() {
        let reply = tool().invoke(json!({"text": "fever and chills"})).await;
        let ToolReply::Data(value) = reply else {
            unreachable!()
        };
        let detected = value["symptoms_detected"]
            .as_array()
            .map(Vec::len)
            .unwrap_or_default();
        assert_eq!(detected, 2);
    }
}
