//! Tool reply and fetch outcome types.
//!
//! Data-source failures are data, not `Err`: a tool that cannot answer
//! returns a structured [`ToolFailure`] inside its reply, and the fetch
//! stages record it in the workflow state. Nothing in this module aborts
//! a pipeline run.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A structured tool failure record.
///
/// Mirrors the uniform `{error, details}` shape every tool emits, with an
/// optional `subject` naming what was being looked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFailure {
    /// Short failure description.
    pub error: String,
    /// Additional detail, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// What was being looked up (drug name, topic query).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

impl ToolFailure {
    /// Creates a failure with just an error message.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            subject: None,
        }
    }

    /// Attaches detail text.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Attaches the lookup subject.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

impl std::fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)?;
        if let Some(ref details) = self.details {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}

/// The reply of a single tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolReply {
    /// The tool produced a payload.
    Data(Value),
    /// The tool ran but found nothing for the request.
    NotFound(ToolFailure),
    /// The tool could not complete the request.
    Failed(ToolFailure),
}

impl ToolReply {
    /// Normalizes an untrusted payload into a reply.
    ///
    /// Applies the defensive checks the fetch stages rely on:
    /// - a JSON string that itself parses as JSON is unwrapped first;
    /// - an object carrying an `error` key folds into [`ToolReply::Failed`];
    /// - an array whose first element is such an error object (the shape
    ///   list-returning tools use for failures) folds the same way.
    ///
    /// Anything else is passed through as [`ToolReply::Data`].
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        let value = match value {
            Value::String(s) => match serde_json::from_str::<Value>(&s) {
                Ok(inner) => inner,
                Err(_) => return Self::Data(Value::String(s)),
            },
            other => other,
        };

        if let Some(failure) = Self::embedded_failure(&value) {
            return Self::Failed(failure);
        }

        Self::Data(value)
    }

    /// Extracts an embedded error record, if the payload carries one.
    fn embedded_failure(value: &Value) -> Option<ToolFailure> {
        let obj = match value {
            Value::Object(obj) => obj,
            Value::Array(items) => match items.first() {
                Some(Value::Object(obj)) => obj,
                _ => return None,
            },
            _ => return None,
        };

        let error = obj.get("error")?.as_str()?.to_string();
        let details = obj
            .get("details")
            .and_then(Value::as_str)
            .map(ToString::to_string);
        let subject = obj
            .get("drug_name_queried")
            .or_else(|| obj.get("topic_queried"))
            .and_then(Value::as_str)
            .map(ToString::to_string);

        Some(ToolFailure {
            error,
            details,
            subject,
        })
    }
}

/// The state of one fetch slot after its stage ran.
///
/// Workflow states hold these behind an `Option`: `None` means the fetch
/// was never attempted (for example, no entity was extracted so the
/// drug-label lookup was skipped), which is distinct from all three
/// attempted outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FetchOutcome<T> {
    /// The source answered with usable data.
    Data(T),
    /// The source answered but had nothing for the request.
    Absent {
        /// Why there is no data.
        reason: String,
    },
    /// The source could not be consulted.
    Failed(ToolFailure),
}

impl<T> FetchOutcome<T> {
    /// Returns the payload, if this outcome carries one.
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Data(value) => Some(value),
            _ => None,
        }
    }

    /// Returns `true` when the slot carries usable data.
    #[must_use]
    pub const fn is_data(&self) -> bool {
        matches!(self, Self::Data(_))
    }

    /// Returns `true` when the fetch was attempted but failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns the failure record, if the fetch failed.
    pub const fn failure(&self) -> Option<&ToolFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_object_passes_through() {
        let reply = ToolReply::from_value(json!({"topic": "Flu Prevention"}));
        assert!(matches!(reply, ToolReply::Data(_)));
    }

    #[test]
    fn test_error_object_folds_to_failed() {
        let reply = ToolReply::from_value(json!({
            "error": "No information found or API unavailable.",
            "drug_name_queried": "UnknownDrugXYZ"
        }));
        let ToolReply::Failed(failure) = reply else {
            unreachable!()
        };
        assert_eq!(failure.error, "No information found or API unavailable.");
        assert_eq!(failure.subject.as_deref(), Some("UnknownDrugXYZ"));
    }

    #[test]
    fn test_error_array_folds_to_failed() {
        let reply = ToolReply::from_value(json!([{"error": "timeout"}]));
        let ToolReply::Failed(failure) = reply else {
            unreachable!()
        };
        assert_eq!(failure.error, "timeout");
    }

    #[test]
    fn test_json_string_is_unwrapped() {
        let reply = ToolReply::from_value(json!(r#"{"error": "timeout", "details": "upstream"}"#));
        let ToolReply::Failed(failure) = reply else {
            unreachable!()
        };
        assert_eq!(failure.error, "timeout");
        assert_eq!(failure.details.as_deref(), Some("upstream"));
    }

    #[test]
    fn test_plain_string_stays_data() {
        let reply = ToolReply::from_value(json!("not json at all"));
        assert_eq!(reply, ToolReply::Data(json!("not json at all")));
    }

    #[test]
    fn test_array_of_articles_passes_through() {
        let reply = ToolReply::from_value(json!([
            {"id": "pmid1", "title": "T", "summary": "S"}
        ]));
        assert!(matches!(reply, ToolReply::Data(_)));
    }

    #[test]
    fn test_fetch_outcome_accessors() {
        let outcome: FetchOutcome<u32> = FetchOutcome::Data(7);
        assert!(outcome.is_data());
        assert_eq!(outcome.data(), Some(&7));

        let outcome: FetchOutcome<u32> = FetchOutcome::Failed(ToolFailure::new("timeout"));
        assert!(outcome.is_failed());
        assert_eq!(
            outcome.failure().map(|f| f.error.as_str()),
            Some("timeout")
        );
    }
}
