//! PubMed literature search adapter.
//!
//! Two-step E-utilities flow: `esearch` resolves the query to article IDs,
//! `esummary` fetches their metadata. Results are bounded by `max_results`,
//! which is clamped rather than rejected when out of range.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::outcome::{ToolFailure, ToolReply};
use super::ToolAdapter;

/// Default PubMed E-utilities endpoint.
const PUBMED_API_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Default article count when the caller does not specify one.
const DEFAULT_MAX_RESULTS: usize = 3;
/// Upper bound on requested articles.
const MAX_RESULTS_CAP: usize = 10;

/// A literature search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// PubMed article ID.
    pub id: String,
    /// Article title.
    pub title: String,
    /// Short summary or abstract, when available.
    pub summary: String,
}

/// Literature search over the PubMed E-utilities API.
#[derive(Debug, Clone)]
pub struct LiteratureTool {
    client: reqwest::Client,
    base_url: String,
}

impl LiteratureTool {
    /// Creates an adapter against the public E-utilities endpoint.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, PUBMED_API_URL)
    }

    /// Creates an adapter against a custom endpoint (tests, mirrors).
    #[must_use]
    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Clamps a requested result count into the supported range.
    fn clamp_max_results(requested: Option<u64>) -> usize {
        requested.map_or(DEFAULT_MAX_RESULTS, |n| {
            usize::try_from(n).unwrap_or(MAX_RESULTS_CAP).clamp(1, MAX_RESULTS_CAP)
        })
    }

    async fn search_ids(&self, query: &str, max_results: usize) -> Result<Vec<String>, ToolFailure> {
        let url = format!("{}/esearch.fcgi", self.base_url);
        let retmax = max_results.to_string();

        let body: Value = self
            .client
            .get(&url)
            .query(&[
                ("db", "pubmed"),
                ("term", query),
                ("retmax", retmax.as_str()),
                ("retmode", "json"),
                ("sort", "relevance"),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| {
                warn!(query, error = %e, "PubMed esearch failed");
                ToolFailure::new(e.to_string()).with_details("Failed to fetch from PubMed")
            })?
            .json()
            .await
            .map_err(|e| ToolFailure::new(e.to_string()).with_details("Failed to fetch from PubMed"))?;

        let ids = body
            .get("esearchresult")
            .and_then(|r| r.get("idlist"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(ids)
    }

    async fn fetch_summaries(&self, ids: &[String]) -> Result<Vec<Article>, ToolFailure> {
        let url = format!("{}/esummary.fcgi", self.base_url);
        let ids_str = ids.join(",");

        let body: Value = self
            .client
            .get(&url)
            .query(&[
                ("db", "pubmed"),
                ("id", ids_str.as_str()),
                ("retmode", "json"),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| {
                warn!(error = %e, "PubMed esummary failed");
                ToolFailure::new(e.to_string()).with_details("Failed to fetch from PubMed")
            })?
            .json()
            .await
            .map_err(|e| ToolFailure::new(e.to_string()).with_details("Failed to fetch from PubMed"))?;

        let result = body.get("result").and_then(Value::as_object);

        // Preserve the requested ID order; the result object also carries
        // a "uids" bookkeeping key that is not an article.
        let articles = result.map_or_else(Vec::new, |result| {
            ids.iter()
                .filter_map(|id| result.get(id))
                .map(Self::extract_article)
                .collect()
        });

        Ok(articles)
    }

    fn extract_article(info: &Value) -> Article {
        let text = |key: &str, default: &str| -> String {
            info.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
                .to_string()
        };

        Article {
            id: text("uid", "unknown"),
            title: text("title", "N/A"),
            summary: text("abstract", "No abstract available."),
        }
    }

    async fn search(&self, query: &str, max_results: usize) -> ToolReply {
        debug!(query, max_results, "searching PubMed");

        let ids = match self.search_ids(query, max_results).await {
            Ok(ids) => ids,
            Err(failure) => return ToolReply::Failed(failure),
        };

        if ids.is_empty() {
            debug!(query, "no PubMed matches");
            return ToolReply::Data(Value::Array(Vec::new()));
        }

        match self.fetch_summaries(&ids).await {
            Ok(articles) => match serde_json::to_value(&articles) {
                Ok(value) => ToolReply::Data(value),
                Err(e) => ToolReply::Failed(ToolFailure::new(e.to_string())),
            },
            Err(failure) => ToolReply::Failed(failure),
        }
    }
}

#[async_trait]
impl ToolAdapter for LiteratureTool {
    fn name(&self) -> &str {
        super::names::LITERATURE_SEARCH
    }

    async fn invoke(&self, input: Value) -> ToolReply {
        let Some(query) = input
            .get("query")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            return ToolReply::Failed(ToolFailure::new(
                "Invalid input: 'query' must be a non-empty string.",
            ));
        };

        let max_results = Self::clamp_max_results(input.get("max_results").and_then(Value::as_u64));

        self.search(query, max_results).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_rejects_empty_query() {
        let tool = LiteratureTool::new(reqwest::Client::new());
        let reply = tool.invoke(json!({"query": ""})).await;
        let ToolReply::Failed(failure) = reply else {
            unreachable!()
        };
        assert_eq!(
            failure.error,
            "Invalid input: 'query' must be a non-empty string."
        );
    }

    #[test]
    fn test_clamp_max_results() {
        assert_eq!(LiteratureTool::clamp_max_results(None), 3);
        assert_eq!(LiteratureTool::clamp_max_results(Some(0)), 1);
        assert_eq!(LiteratureTool::clamp_max_results(Some(5)), 5);
        assert_eq!(LiteratureTool::clamp_max_results(Some(500)), 10);
    }

    #[test]
    fn test_extract_article_defaults() {
        let article = LiteratureTool::extract_article(&json!({"uid": "32000001"}));
        assert_eq!(article.id, "32000001");
        assert_eq!(article.title, "N/A");
        assert_eq!(article.summary, "No abstract available.");
    }

    #[test]
    fn test_extract_article_full() {
        let article = LiteratureTool::extract_article(&json!({
            "uid": "12000001",
            "title": "Seasonal Influenza: Prevention and Control",
            "abstract": "Strategies for preventing influenza outbreaks."
        }));
        assert_eq!(article.title, "Seasonal Influenza: Prevention and Control");
        assert!(article.summary.contains("preventing influenza"));
    }
}
