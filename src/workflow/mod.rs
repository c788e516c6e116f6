//! Workflow drivers and their shared pipeline pieces.
//!
//! Three fail-soft pipelines share the same shape: validate input, fetch
//! from independent data sources, assemble what came back, and synthesize
//! a response. Recoverable problems land in the run's [`ErrorLog`] and
//! the pipeline continues; only a missing tool or an unusable provider is
//! fatal, and that is caught at construction.

pub mod context;
pub mod fetch;
pub mod health_info;
pub mod outbreak;
pub mod post_discharge;
pub mod preprocess;
pub mod state;
pub mod synthesis;

pub use context::{AssembledContext, ContextAssembler};
pub use health_info::{HealthInfoInput, HealthInfoWorkflow};
pub use outbreak::{OutbreakInput, OutbreakWorkflow};
pub use post_discharge::{PostDischargeInput, PostDischargeWorkflow};
pub use preprocess::{ExtractedQuery, QueryPreprocessor};
pub use state::{
    AlertLevel, ErrorKind, ErrorLog, HealthInfoState, OutbreakState, PostDischargeState, Stage,
    StageError,
};
pub use synthesis::{
    AFTERCARE_DISCLAIMER, GENERAL_DISCLAIMER, Synthesizer, VettingVerdict, vet_claim,
};

use crate::tools::FetchOutcome;

/// Records a fetch failure for one data-source slot.
///
/// Only a failed outcome produces an entry; an unattempted slot (`None`)
/// and a no-data outcome are normal results, not errors.
pub(crate) fn note_tool_failure<T>(
    errors: &mut ErrorLog,
    source: &str,
    slot: Option<&FetchOutcome<T>>,
) {
    if let Some(FetchOutcome::Failed(failure)) = slot {
        errors.push(
            state::Stage::Fetch,
            state::ErrorKind::ToolFailure,
            format!("Issue retrieving {source}: {failure}"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolFailure;

    #[test]
    fn test_note_tool_failure_records_only_failures() {
        let mut errors = ErrorLog::new();

        note_tool_failure::<String>(&mut errors, "literature", None);
        note_tool_failure(
            &mut errors,
            "literature",
            Some(&FetchOutcome::Data("hit".to_string())),
        );
        note_tool_failure::<String>(
            &mut errors,
            "literature",
            Some(&FetchOutcome::Absent {
                reason: "no articles matched the query".to_string(),
            }),
        );
        assert!(errors.is_empty());

        note_tool_failure::<String>(
            &mut errors,
            "literature",
            Some(&FetchOutcome::Failed(ToolFailure::new("timeout"))),
        );
        assert_eq!(errors.len(), 1);
        assert!(errors.has_kind(ErrorKind::ToolFailure));
        assert!(errors.messages().contains("Issue retrieving literature"));
    }
}
