//! Curated health-topic lookup.
//!
//! Consumer guidance pages do not sit behind a general-purpose query API,
//! so this adapter serves a small curated table with layered matching:
//! exact key, substring either way, then single-word overlap. No network
//! access is involved.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::outcome::{ToolFailure, ToolReply};
use super::ToolAdapter;

/// Minimum word length considered in the overlap match.
const MIN_OVERLAP_WORD_LEN: usize = 4;

/// A curated health topic entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthTopic {
    /// Display title.
    pub topic: String,
    /// Consumer-facing guidance summary.
    pub summary: String,
    /// Link to the authoritative page.
    pub details_url: String,
    /// Attribution string for context rendering.
    pub source: String,
}

/// Curated topic lookup keyed by topic phrase.
#[derive(Debug, Clone)]
pub struct HealthTopicsTool {
    topics: Vec<(String, HealthTopic)>,
}

impl HealthTopicsTool {
    /// Creates the adapter with the built-in topic table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            topics: builtin_topics(),
        }
    }

    /// Creates the adapter with a custom topic table (keys should be lowercase).
    #[must_use]
    pub const fn with_topics(topics: Vec<(String, HealthTopic)>) -> Self {
        Self { topics }
    }

    /// Looks up a topic by layered matching.
    fn lookup(&self, query: &str) -> Option<&HealthTopic> {
        let query_lower = query.to_lowercase();

        // Exact key match first.
        if let Some((_, topic)) = self.topics.iter().find(|(key, _)| *key == query_lower) {
            return Some(topic);
        }

        for (key, topic) in &self.topics {
            if query_lower.contains(key.as_str()) || key.contains(&query_lower) {
                return Some(topic);
            }
            // Any sufficiently long query word appearing in the key counts.
            if query_lower
                .split_whitespace()
                .any(|word| word.len() >= MIN_OVERLAP_WORD_LEN && key.contains(word))
            {
                return Some(topic);
            }
        }

        None
    }
}

impl Default for HealthTopicsTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolAdapter for HealthTopicsTool {
    fn name(&self) -> &str {
        super::names::HEALTH_TOPIC
    }

    async fn invoke(&self, input: Value) -> ToolReply {
        let Some(query) = input
            .get("topic_query")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            return ToolReply::Failed(ToolFailure::new(
                "Invalid input: 'topic_query' must be a non-empty string.",
            ));
        };

        match self.lookup(query) {
            Some(topic) => match serde_json::to_value(topic) {
                Ok(value) => ToolReply::Data(value),
                Err(e) => ToolReply::Failed(ToolFailure::new(e.to_string())),
            },
            None => {
                debug!(query, "no curated topic matched");
                ToolReply::NotFound(
                    ToolFailure::new("Topic not found or information unavailable.")
                        .with_subject(query),
                )
            }
        }
    }
}

/// The built-in curated topic table.
fn builtin_topics() -> Vec<(String, HealthTopic)> {
    let entry = |key: &str, topic: &str, summary: &str, url: &str, source: &str| {
        (
            key.to_string(),
            HealthTopic {
                topic: topic.to_string(),
                summary: summary.to_string(),
                details_url: url.to_string(),
                source: source.to_string(),
            },
        )
    };

    vec![
        entry(
            "flu prevention",
            "Flu Prevention",
            "Key strategies to prevent influenza include getting your annual flu vaccine, \
             practicing good hand hygiene (washing hands often with soap and water), covering \
             coughs and sneezes, avoiding close contact with people who are sick, and staying \
             home when you are sick.",
            "https://www.cdc.gov/flu/prevent/index.html",
            "Health.gov / CDC",
        ),
        entry(
            "healthy diet",
            "Healthy Eating",
            "A healthy eating plan emphasizes fruits, vegetables, whole grains, and fat-free or \
             low-fat dairy products. It includes lean meats, poultry, fish, beans, eggs, and \
             nuts, and is low in saturated fats, trans fats, cholesterol, salt (sodium), and \
             added sugars.",
            "https://www.myplate.gov/",
            "Health.gov / MyPlate",
        ),
        entry(
            "diabetes management",
            "Diabetes Management",
            "Managing diabetes involves healthy eating, regular physical activity, monitoring \
             your blood sugar, taking medication as prescribed, and learning how to prevent or \
             treat complications. Work with your health care team to create a diabetes \
             self-management plan.",
            "https://www.niddk.nih.gov/health-information/diabetes/overview/managing-diabetes",
            "Health.gov / NIDDK",
        ),
        entry(
            "common cold",
            "Common Cold",
            "The common cold is a viral infection of your nose and throat (upper respiratory \
             tract). Symptoms usually include a runny nose, sore throat, cough, congestion, and \
             mild body aches or a mild headache. Most people recover in about 7 to 10 days. Get \
             plenty of rest and drink fluids.",
            "https://www.cdc.gov/antibiotic-use/colds.html",
            "Health.gov / CDC",
        ),
        entry(
            "public health alerts",
            "Public Health Alerts",
            "Stay informed about current public health alerts and advisories by checking \
             official sources like the CDC and your local health department. These alerts \
             provide crucial information on outbreaks, health risks, and preventive measures.",
            "https://www.cdc.gov/outbreaks/",
            "Health.gov / CDC",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_direct_match() {
        let tool = HealthTopicsTool::new();
        let reply = tool.invoke(json!({"topic_query": "healthy diet"})).await;
        let ToolReply::Data(value) = reply else {
            unreachable!()
        };
        assert_eq!(value["topic"], "Healthy Eating");
    }

    #[tokio::test]
    async fn test_partial_match() {
        let tool = HealthTopicsTool::new();
        let reply = tool
            .invoke(json!({"topic_query": "healthy diet tips"}))
            .await;
        let ToolReply::Data(value) = reply else {
            unreachable!()
        };
        assert_eq!(value["topic"], "Healthy Eating");
    }

    #[tokio::test]
    async fn test_word_overlap_match() {
        let tool = HealthTopicsTool::new();
        let reply = tool
            .invoke(json!({"topic_query": "managing my diabetes"}))
            .await;
        let ToolReply::Data(value) = reply else {
            unreachable!()
        };
        assert_eq!(value["topic"], "Diabetes Management");
    }

    #[tokio::test]
    async fn test_unknown_topic_not_found() {
        let tool = HealthTopicsTool::new();
        let reply = tool
            .invoke(json!({"topic_query": "rare tropical disease"}))
            .await;
        let ToolReply::NotFound(failure) = reply else {
            unreachable!()
        };
        assert_eq!(failure.error, "Topic not found or information unavailable.");
        assert_eq!(failure.subject.as_deref(), Some("rare tropical disease"));
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let tool = HealthTopicsTool::new();
        let reply = tool.invoke(json!({"topic_query": "  "})).await;
        assert!(matches!(reply, ToolReply::Failed(_)));
    }

    #[test]
    fn test_short_words_ignored_in_overlap() {
        let tool = HealthTopicsTool::new();
        // "flu" is only three characters, so it must not overlap-match;
        // substring matching still catches it inside "flu prevention".
        assert!(tool.lookup("flu prevention").is_some());
        assert!(tool.lookup("the and for").is_none());
    }
}
