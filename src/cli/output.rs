//! CLI output formatting.

use serde_json::Value;

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format string, defaulting to text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Formats a completed workflow response body.
///
/// Text mode prints the primary answer text; with `verbose`, recoverable
/// pipeline notes from the serialized state follow. JSON mode prints the
/// whole body (result plus final state).
pub fn format_workflow_body(
    body: &Value,
    format: OutputFormat,
    verbose: bool,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(body),
        OutputFormat::Text => {
            let mut out = body["result"].as_str().unwrap_or_default().to_string();
            if verbose {
                let notes = pipeline_notes(body);
                if !notes.is_empty() {
                    out.push_str("\n\nPipeline notes:");
                    for note in notes {
                        out.push_str("\n  ");
                        out.push_str(&note);
                    }
                }
            }
            Ok(out)
        }
    }
}

/// Extracts `[stage] message` lines from the serialized error log.
fn pipeline_notes(body: &Value) -> Vec<String> {
    body["state"]["errors"]
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let stage = entry["stage"].as_str()?;
                    let message = entry["message"].as_str()?;
                    Some(format!("[{stage}] {message}"))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_format() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("anything"), OutputFormat::Text);
    }

    #[test]
    fn test_text_output_is_result_only() {
        let body = json!({"result": "the answer", "state": {"errors": []}});
        let out = format_workflow_body(&body, OutputFormat::Text, false)
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(out, "the answer");
    }

    #[test]
    fn test_verbose_appends_notes() {
        let body = json!({
            "result": "the answer",
            "state": {"errors": [
                {"stage": "fetch", "kind": "tool_failure", "message": "Issue retrieving literature: timeout"}
            ]}
        });
        let out = format_workflow_body(&body, OutputFormat::Text, true)
            .unwrap_or_else(|_| unreachable!());
        assert!(out.contains("Pipeline notes:"));
        assert!(out.contains("[fetch] Issue retrieving literature: timeout"));
    }

    #[test]
    fn test_json_output_carries_state() {
        let body = json!({"result": "r", "state": {"errors": []}});
        let out = format_workflow_body(&body, OutputFormat::Json, false)
            .unwrap_or_else(|_| unreachable!());
        assert!(out.contains("\"state\""));
    }
}
