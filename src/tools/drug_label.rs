//! openFDA drug-label adapter.
//!
//! Queries the openFDA drug label endpoint for the single most relevant
//! label matching a brand or generic name and extracts the consumer-facing
//! sections (indications, adverse reactions, warnings).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::outcome::{ToolFailure, ToolReply};
use super::ToolAdapter;

/// Default openFDA API endpoint.
const OPENFDA_API_URL: &str = "https://api.fda.gov";

/// Placeholder for label sections the API did not return.
const NOT_AVAILABLE: &str = "N/A";

/// A drug label extracted from an openFDA search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugLabel {
    /// The name that was looked up.
    pub drug_name_queried: String,
    /// Brand names from the label's openfda block.
    #[serde(default)]
    pub brand_name: Vec<String>,
    /// Generic names from the label's openfda block.
    #[serde(default)]
    pub generic_name: Vec<String>,
    /// Indications and usage section, or `N/A`.
    #[serde(default = "not_available")]
    pub indications_and_usage: String,
    /// Adverse reactions section, or `N/A`.
    #[serde(default = "not_available")]
    pub adverse_reactions: String,
    /// Warnings and precautions section, or `N/A`.
    #[serde(default = "not_available")]
    pub warnings_and_precautions: String,
    /// Dosage and administration section, or `N/A`.
    #[serde(default = "not_available")]
    pub dosage_and_administration: String,
    /// Attribution string for context rendering.
    #[serde(default)]
    pub source: String,
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

/// Drug-label lookup over the openFDA API.
#[derive(Debug, Clone)]
pub struct DrugLabelTool {
    client: reqwest::Client,
    base_url: String,
}

impl DrugLabelTool {
    /// Creates an adapter against the public openFDA endpoint.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, OPENFDA_API_URL)
    }

    /// Creates an adapter against a custom endpoint (tests, mirrors).
    #[must_use]
    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Builds the openFDA search expression for a drug name.
    ///
    /// Name fields are matched exactly; description and purpose catch
    /// labels where the name only appears in free text.
    fn search_expression(drug_name: &str) -> String {
        format!(
            "(openfda.brand_name:\"{drug_name}\" OR openfda.generic_name:\"{drug_name}\") \
             OR (description:\"{drug_name}\" OR purpose:\"{drug_name}\")"
        )
    }

    /// Extracts a [`DrugLabel`] from the first search result.
    fn extract_label(drug_name: &str, result: &Value) -> DrugLabel {
        let openfda = result.get("openfda");

        let string_list = |field: &Value| -> Vec<String> {
            field
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(ToString::to_string)
                        .collect()
                })
                .unwrap_or_default()
        };

        let first_text = |key: &str| -> String {
            result
                .get(key)
                .and_then(Value::as_array)
                .and_then(|items| items.first())
                .and_then(Value::as_str)
                .map_or_else(not_available, ToString::to_string)
        };

        DrugLabel {
            drug_name_queried: drug_name.to_string(),
            brand_name: openfda
                .and_then(|o| o.get("brand_name"))
                .map(string_list)
                .unwrap_or_default(),
            generic_name: openfda
                .and_then(|o| o.get("generic_name"))
                .map(string_list)
                .unwrap_or_default(),
            indications_and_usage: first_text("indications_and_usage"),
            adverse_reactions: first_text("adverse_reactions"),
            warnings_and_precautions: first_text("warnings_and_precautions"),
            dosage_and_administration: first_text("dosage_and_administration"),
            source: "openFDA".to_string(),
        }
    }

    async fn fetch(&self, drug_name: &str) -> ToolReply {
        let url = format!("{}/drug/label.json", self.base_url);
        debug!(drug_name, "querying openFDA drug labels");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("search", Self::search_expression(drug_name).as_str()),
                ("limit", "1"),
            ])
            .send()
            .await;

        let body: Value = match response.and_then(reqwest::Response::error_for_status) {
            Ok(resp) => match resp.json().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(drug_name, error = %e, "openFDA response was not valid JSON");
                    return ToolReply::Failed(
                        ToolFailure::new(e.to_string())
                            .with_details(format!("Failed to fetch from OpenFDA for {drug_name}"))
                            .with_subject(drug_name),
                    );
                }
            },
            Err(e) => {
                warn!(drug_name, error = %e, "openFDA request failed");
                return ToolReply::Failed(
                    ToolFailure::new(e.to_string())
                        .with_details(format!("Failed to fetch from OpenFDA for {drug_name}"))
                        .with_subject(drug_name),
                );
            }
        };

        match body.get("results").and_then(Value::as_array) {
            Some(results) if !results.is_empty() => {
                let label = Self::extract_label(drug_name, &results[0]);
                match serde_json::to_value(&label) {
                    Ok(value) => ToolReply::Data(value),
                    Err(e) => ToolReply::Failed(
                        ToolFailure::new(e.to_string()).with_subject(drug_name),
                    ),
                }
            }
            _ => {
                debug!(drug_name, "no openFDA results");
                ToolReply::NotFound(
                    ToolFailure::new("No information found or API unavailable.")
                        .with_subject(drug_name),
                )
            }
        }
    }
}

#[async_trait]
impl ToolAdapter for DrugLabelTool {
    fn name(&self) -> &str {
        super::names::DRUG_LABEL
    }

    async fn invoke(&self, input: Value) -> ToolReply {
        let Some(drug_name) = input
            .get("drug_name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            return ToolReply::Failed(ToolFailure::new(
                "Invalid input: 'drug_name' must be a non-empty string.",
            ));
        };

        self.fetch(drug_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_rejects_empty_drug_name() {
        let tool = DrugLabelTool::new(reqwest::Client::new());
        let reply = tool.invoke(json!({"drug_name": "   "})).await;
        let ToolReply::Failed(failure) = reply else {
            unreachable!()
        };
        assert_eq!(
            failure.error,
            "Invalid input: 'drug_name' must be a non-empty string."
        );
    }

    #[tokio::test]
    async fn test_rejects_missing_drug_name() {
        let tool = DrugLabelTool::new(reqwest::Client::new());
        let reply = tool.invoke(json!({})).await;
        assert!(matches!(reply, ToolReply::Failed(_)));
    }

    #[test]
    fn test_search_expression_contains_name_fields() {
        let expr = DrugLabelTool::search_expression("Metformin");
        assert!(expr.contains("openfda.brand_name:\"Metformin\""));
        assert!(expr.contains("openfda.generic_name:\"Metformin\""));
    }

    #[test]
    fn test_extract_label_full_result() {
        let result = json!({
            "openfda": {
                "brand_name": ["Glucophage"],
                "generic_name": ["Metformin Hydrochloride"]
            },
            "indications_and_usage": ["Metformin is a biguanide antihyperglycemic agent."],
            "adverse_reactions": ["Common adverse reactions include diarrhea, nausea."],
            "warnings_and_precautions": ["Lactic acidosis is a rare but serious complication."]
        });
        let label = DrugLabelTool::extract_label("Metformin", &result);
        assert_eq!(label.drug_name_queried, "Metformin");
        assert_eq!(label.brand_name, vec!["Glucophage"]);
        assert!(label.indications_and_usage.contains("biguanide"));
        assert!(label.warnings_and_precautions.contains("Lactic acidosis"));
    }

    #[test]
    fn test_extract_label_sparse_result() {
        let label = DrugLabelTool::extract_label("Mystery", &json!({}));
        assert!(label.brand_name.is_empty());
        assert_eq!(label.indications_and_usage, "N/A");
        assert_eq!(label.adverse_reactions, "N/A");
    }
}
