//! Context assembly: merging fetch results into one bounded text block.
//!
//! Sections render in a fixed order with source attribution. A slot that
//! was attempted but failed renders an explicit issue note; a slot that
//! was never attempted is omitted without annotation. Alongside the text,
//! the assembler keeps a lowercased haystack of all retrieved data for the
//! claim-vetting keyword overlap.

use std::fmt::Write;

use crate::tools::{Article, DrugLabel, FetchOutcome, HealthTopic};

/// Character cap for drug-label text fields.
const LABEL_FIELD_CAP: usize = 250;
/// Character cap for article summaries.
const ARTICLE_SUMMARY_CAP: usize = 150;

/// The assembled context for synthesis and vetting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledContext {
    /// Source-attributed context text, sections joined in fixed order.
    pub text: String,
    /// Lowercased concatenation of all retrieved data.
    pub haystack: String,
    /// Number of sections that carried actual data.
    pub data_sections: usize,
}

impl AssembledContext {
    /// Returns `true` when no section carried data.
    #[must_use]
    pub const fn is_empty_of_data(&self) -> bool {
        self.data_sections == 0
    }
}

/// Builds an [`AssembledContext`] section by section.
#[derive(Debug, Default)]
pub struct ContextAssembler {
    sections: Vec<String>,
    haystack: String,
    data_sections: usize,
}

/// Truncates on a character boundary, appending an ellipsis when cut.
fn truncate(text: &str, cap: usize) -> String {
    if text.chars().count() > cap {
        let cut: String = text.chars().take(cap).collect();
        format!("{cut}...")
    } else {
        text.to_string()
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

impl ContextAssembler {
    /// Creates an empty assembler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders the drug-label slot.
    ///
    /// `entity` names what was looked up, for the no-data annotation.
    pub fn push_drug_label(&mut self, slot: Option<&FetchOutcome<DrugLabel>>, entity: Option<&str>) {
        let Some(outcome) = slot else { return };
        let subject = entity.unwrap_or("this drug");

        match outcome {
            FetchOutcome::Data(label) => {
                let mut section = format!(
                    "--- Drug Label Information for {} ({}) ---\n",
                    label.drug_name_queried, label.source
                );
                let _ = writeln!(section, "  Brand Name(s): {}", join_or_na(&label.brand_name));
                let _ = writeln!(section, "  Generic Name(s): {}", join_or_na(&label.generic_name));
                let _ = writeln!(
                    section,
                    "  Indications: {}",
                    truncate(&label.indications_and_usage, LABEL_FIELD_CAP)
                );
                let _ = write!(
                    section,
                    "  Key Warnings: {}",
                    truncate(&label.warnings_and_precautions, LABEL_FIELD_CAP)
                );
                self.absorb_haystack(label);
                self.sections.push(section);
                self.data_sections += 1;
            }
            FetchOutcome::Absent { .. } => {
                self.sections.push(format!(
                    "--- Drug Label Information for {subject} ---\n  No specific information found for this drug."
                ));
            }
            FetchOutcome::Failed(_) => {
                self.sections.push(format!(
                    "--- Drug Label Information for {subject} ---\n  There was an issue retrieving drug label data."
                ));
            }
        }
    }

    /// Renders the literature slot.
    pub fn push_literature(&mut self, slot: Option<&FetchOutcome<Vec<Article>>>) {
        let Some(outcome) = slot else { return };

        match outcome {
            FetchOutcome::Data(articles) => {
                let mut section = String::from("--- Literature Highlights ---");
                for (i, article) in articles.iter().enumerate() {
                    let _ = write!(section, "\n  [{}] Title: {}", i + 1, article.title);
                    let _ = write!(
                        section,
                        "\n      Summary: {}",
                        truncate(&article.summary, ARTICLE_SUMMARY_CAP)
                    );
                    self.haystack.push_str(&article.title.to_lowercase());
                    self.haystack.push_str(&article.summary.to_lowercase());
                }
                self.sections.push(section);
                self.data_sections += 1;
            }
            FetchOutcome::Absent { .. } => {
                self.sections.push(
                    "--- Literature Highlights ---\n  No relevant articles found.".to_string(),
                );
            }
            FetchOutcome::Failed(_) => {
                self.sections.push(
                    "--- Literature Highlights ---\n  There was an issue retrieving literature results."
                        .to_string(),
                );
            }
        }
    }

    /// Renders the curated-topic slot.
    pub fn push_health_topic(&mut self, slot: Option<&FetchOutcome<HealthTopic>>) {
        let Some(outcome) = slot else { return };

        match outcome {
            FetchOutcome::Data(topic) => {
                let section = format!(
                    "--- General Health Information ({}) ---\n  Topic: {}\n  Summary: {}",
                    topic.source, topic.topic, topic.summary
                );
                self.absorb_haystack(topic);
                self.sections.push(section);
                self.data_sections += 1;
            }
            FetchOutcome::Absent { .. } => {
                self.sections.push(
                    "--- General Health Information ---\n  No specific topic information found."
                        .to_string(),
                );
            }
            FetchOutcome::Failed(_) => {
                self.sections.push(
                    "--- General Health Information ---\n  There was an issue retrieving health topic information."
                        .to_string(),
                );
            }
        }
    }

    /// Folds a serializable record into the lowercased haystack.
    fn absorb_haystack<T: serde::Serialize>(&mut self, record: &T) {
        if let Ok(json) = serde_json::to_string(record) {
            self.haystack.push_str(&json.to_lowercase());
        }
    }

    /// Finalizes the context.
    #[must_use]
    pub fn finish(self) -> AssembledContext {
        AssembledContext {
            text: self.sections.join("\n\n"),
            haystack: self.haystack,
            data_sections: self.data_sections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolFailure;

    fn sample_label() -> DrugLabel {
        DrugLabel {
            drug_name_queried: "Metformin".to_string(),
            brand_name: vec!["Glucophage".to_string()],
            generic_name: vec!["Metformin Hydrochloride".to_string()],
            indications_and_usage: "Metformin is a biguanide antihyperglycemic agent.".to_string(),
            adverse_reactions: "Diarrhea, nausea.".to_string(),
            warnings_and_precautions: "Lactic acidosis is a rare but serious complication."
                .to_string(),
            dosage_and_administration: "N/A".to_string(),
            source: "openFDA".to_string(),
        }
    }

    #[test]
    fn test_data_section_rendering() {
        let mut assembler = ContextAssembler::new();
        assembler.push_drug_label(
            Some(&FetchOutcome::Data(sample_label())),
            Some("metformin"),
        );
        let context = assembler.finish();

        assert!(context.text.contains("Drug Label Information for Metformin"));
        assert!(context.text.contains("Brand Name(s): Glucophage"));
        assert!(context.haystack.contains("lactic acidosis"));
        assert_eq!(context.data_sections, 1);
    }

    #[test]
    fn test_failed_slot_renders_issue_note() {
        let mut assembler = ContextAssembler::new();
        assembler.push_literature(Some(&FetchOutcome::Failed(ToolFailure::new("timeout"))));
        let context = assembler.finish();

        assert!(context.text.contains("issue retrieving literature"));
        assert!(context.is_empty_of_data());
    }

    #[test]
    fn test_unattempted_slot_is_omitted() {
        let mut assembler = ContextAssembler::new();
        assembler.push_drug_label(None, None);
        assembler.push_literature(None);
        assembler.push_health_topic(None);
        let context = assembler.finish();

        assert!(context.text.is_empty());
        assert!(context.is_empty_of_data());
    }

    #[test]
    fn test_fixed_section_order() {
        let mut assembler = ContextAssembler::new();
        assembler.push_drug_label(Some(&FetchOutcome::Data(sample_label())), Some("metformin"));
        assembler.push_literature(Some(&FetchOutcome::Absent {
            reason: "no articles matched the query".to_string(),
        }));
        let context = assembler.finish();

        let drug_pos = context
            .text
            .find("Drug Label Information")
            .unwrap_or_else(|| unreachable!());
        let lit_pos = context
            .text
            .find("Literature Highlights")
            .unwrap_or_else(|| unreachable!());
        assert!(drug_pos < lit_pos);
    }

    #[test]
    fn test_truncation_caps_long_fields() {
        let mut label = sample_label();
        label.indications_and_usage = "x".repeat(400);
        let mut assembler = ContextAssembler::new();
        assembler.push_drug_label(Some(&FetchOutcome::Data(label)), None);
        let context = assembler.finish();

        let indications_line = context
            .text
            .lines()
            .find(|l| l.contains("Indications:"))
            .unwrap_or_else(|| unreachable!());
        assert!(indications_line.ends_with("..."));
        assert!(indications_line.len() < 300);
    }
}
