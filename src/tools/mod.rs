//! Data-source tool adapters and their registry.
//!
//! Every external source sits behind the [`ToolAdapter`] trait: a name and
//! a single JSON-in, reply-out invocation. The [`ToolRegistry`] owns the
//! adapters, applies the per-call timeout, normalizes payloads, and offers
//! typed accessors so workflow stages never touch raw JSON.

pub mod drug_label;
pub mod health_topics;
pub mod literature;
pub mod outcome;
pub mod symptoms;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

pub use drug_label::{DrugLabel, DrugLabelTool};
pub use health_topics::{HealthTopic, HealthTopicsTool};
pub use literature::{Article, LiteratureTool};
pub use outcome::{FetchOutcome, ToolFailure, ToolReply};
pub use symptoms::{SymptomScan, SymptomScanTool};

use crate::config::AppConfig;

/// Registered tool names.
pub mod names {
    /// Drug-label lookup (openFDA).
    pub const DRUG_LABEL: &str = "get_fda_drug_info";
    /// Literature search (PubMed).
    pub const LITERATURE_SEARCH: &str = "search_pubmed";
    /// Curated health-topic lookup.
    pub const HEALTH_TOPIC: &str = "get_health_gov_topic";
    /// Symptom keyword scan.
    pub const SYMPTOM_SCAN: &str = "analyze_text_for_symptoms";
}

/// A single data-source tool.
///
/// Implementations never return `Err`: anything that goes wrong is encoded
/// in the reply so the fetch stages can record it and continue.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    /// Registry name of the tool.
    fn name(&self) -> &str;

    /// Invokes the tool with a JSON parameter object.
    async fn invoke(&self, input: Value) -> ToolReply;
}

/// String-keyed collection of tool adapters.
///
/// Cheap to clone (adapters are shared). Workflows validate their required
/// tools against the registry at construction; at run time every call goes
/// through [`ToolRegistry::invoke`], which bounds it with the configured
/// timeout and normalizes the payload.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolAdapter>>,
    timeout: Duration,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ToolRegistry {
    /// Creates an empty registry with the given per-call timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            tools: HashMap::new(),
            timeout,
        }
    }

    /// Creates a registry with the standard adapters.
    #[must_use]
    pub fn with_defaults(config: &AppConfig) -> Self {
        let client = reqwest::Client::new();
        Self::new(config.tool_timeout)
            .register(Arc::new(DrugLabelTool::new(client.clone())))
            .register(Arc::new(LiteratureTool::new(client)))
            .register(Arc::new(HealthTopicsTool::new()))
            .register(Arc::new(SymptomScanTool::new(config.symptoms.clone())))
    }

    /// Registers an adapter under its own name, replacing any previous one.
    #[must_use]
    pub fn register(mut self, adapter: Arc<dyn ToolAdapter>) -> Self {
        self.tools.insert(adapter.name().to_string(), adapter);
        self
    }

    /// Returns `true` if a tool with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered tool names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Invokes a tool by name with timeout and payload normalization.
    ///
    /// Returns `None` when no tool with that name is registered.
    pub async fn invoke(&self, name: &str, input: Value) -> Option<ToolReply> {
        let adapter = self.tools.get(name)?;
        debug!(tool = name, "invoking tool");

        let reply = match tokio::time::timeout(self.timeout, adapter.invoke(input)).await {
            Ok(reply) => reply,
            Err(_) => {
                warn!(tool = name, timeout_secs = self.timeout.as_secs(), "tool timed out");
                return Some(ToolReply::Failed(ToolFailure::new("timeout").with_details(
                    format!(
                        "Tool '{name}' did not respond within {}s",
                        self.timeout.as_secs()
                    ),
                )));
            }
        };

        // Normalize here so injected test adapters get the same treatment
        // as the real ones.
        Some(match reply {
            ToolReply::Data(value) => ToolReply::from_value(value),
            other => other,
        })
    }

    /// Invokes a tool and decodes its payload into a typed fetch outcome.
    async fn fetch<T: DeserializeOwned>(&self, name: &str, input: Value) -> FetchOutcome<T> {
        match self.invoke(name, input).await {
            None => FetchOutcome::Failed(ToolFailure::new(format!("Tool '{name}' not found."))),
            Some(ToolReply::Data(value)) => match serde_json::from_value(value) {
                Ok(data) => FetchOutcome::Data(data),
                Err(e) => FetchOutcome::Failed(
                    ToolFailure::new(format!("Malformed tool payload: {e}"))
                        .with_subject(name),
                ),
            },
            Some(ToolReply::NotFound(failure)) => FetchOutcome::Absent {
                reason: failure.error,
            },
            Some(ToolReply::Failed(failure)) => FetchOutcome::Failed(failure),
        }
    }

    /// Looks up a drug label by name.
    pub async fn drug_label(&self, drug_name: &str) -> FetchOutcome<DrugLabel> {
        self.fetch(names::DRUG_LABEL, json!({ "drug_name": drug_name }))
            .await
    }

    /// Searches the literature for a query.
    ///
    /// An empty result list is reported as [`FetchOutcome::Absent`].
    pub async fn literature(&self, query: &str, max_results: usize) -> FetchOutcome<Vec<Article>> {
        let outcome: FetchOutcome<Vec<Article>> = self
            .fetch(
                names::LITERATURE_SEARCH,
                json!({ "query": query, "max_results": max_results }),
            )
            .await;

        match outcome {
            FetchOutcome::Data(articles) if articles.is_empty() => FetchOutcome::Absent {
                reason: "no articles matched the query".to_string(),
            },
            other => other,
        }
    }

    /// Looks up a curated health topic.
    pub async fn health_topic(&self, topic_query: &str) -> FetchOutcome<HealthTopic> {
        self.fetch(names::HEALTH_TOPIC, json!({ "topic_query": topic_query }))
            .await
    }

    /// Scans text for symptom keywords.
    pub async fn symptom_scan(&self, text: &str) -> FetchOutcome<SymptomScan> {
        self.fetch(names::SYMPTOM_SCAN, json!({ "text": text })).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowTool;

    #[async_trait]
    impl ToolAdapter for SlowTool {
        fn name(&self) -> &str {
            "slow_tool"
        }

        async fn invoke(&self, _input: Value) -> ToolReply {
            tokio::time::sleep(Duration::from_secs(60)).await;
            ToolReply::Data(json!({}))
        }
    }

    struct EchoTool;

    #[async_trait]
    impl ToolAdapter for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        async fn invoke(&self, input: Value) -> ToolReply {
            ToolReply::Data(input)
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_returns_none() {
        let registry = ToolRegistry::new(Duration::from_secs(1));
        assert!(registry.invoke("nope", json!({})).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_failure() {
        let registry = ToolRegistry::new(Duration::from_secs(1)).register(Arc::new(SlowTool));
        let reply = registry
            .invoke("slow_tool", json!({}))
            .await
            .unwrap_or_else(|| unreachable!());
        let ToolReply::Failed(failure) = reply else {
            unreachable!()
        };
        assert_eq!(failure.error, "timeout");
    }

    #[tokio::test]
    async fn test_invoke_normalizes_embedded_error() {
        let registry = ToolRegistry::new(Duration::from_secs(1)).register(Arc::new(EchoTool));
        let reply = registry
            .invoke("echo", json!([{"error": "timeout"}]))
            .await
            .unwrap_or_else(|| unreachable!());
        assert!(matches!(reply, ToolReply::Failed(_)));
    }

    #[tokio::test]
    async fn test_symptom_scan_typed_accessor() {
        let config = AppConfig::default();
        let registry = ToolRegistry::new(Duration::from_secs(1))
            .register(Arc::new(SymptomScanTool::new(config.symptoms)));

        let outcome = registry.symptom_scan("fever and chills everywhere").await;
        let FetchOutcome::Data(scan) = outcome else {
            unreachable!()
        };
        assert_eq!(scan.symptoms_detected, vec!["fever", "chills"]);
    }

    #[tokio::test]
    async fn test_missing_tool_typed_accessor_fails_soft() {
        let registry = ToolRegistry::new(Duration::from_secs(1));
        let outcome = registry.drug_label("Metformin").await;
        let FetchOutcome::Failed(failure) = outcome else {
            unreachable!()
        };
        assert!(failure.error.contains("not found"));
    }

    #[tokio::test]
    async fn test_registry_names_sorted() {
        let config = AppConfig::default();
        let registry = ToolRegistry::with_defaults(&config);
        let names = registry.names();
        assert_eq!(
            names,
            vec![
                "analyze_text_for_symptoms",
                "get_fda_drug_info",
                "get_health_gov_topic",
                "search_pubmed",
            ]
        );
    }
}
