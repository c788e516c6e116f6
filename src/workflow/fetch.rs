//! Fetch-stage query selection helpers.
//!
//! Small pure functions shared by the workflow drivers: which query each
//! data source receives depends on mode, extracted entity, and detected
//! symptoms. The drivers run the actual fetches concurrently; each
//! adapter writes only its own state slot.

/// Fallback literature query when only a non-specific concern was signaled.
pub const GENERAL_CONCERN_QUERY: &str =
    "public health emerging concerns OR unusual illness patterns";

/// Picks the literature query for the health-info workflow.
///
/// In vetting mode the claim itself is searched; otherwise the refined
/// query is used.
#[must_use]
pub fn literature_query<'a>(
    is_claim_check: bool,
    claim: Option<&'a str>,
    search_query: &'a str,
) -> &'a str {
    match claim {
        Some(claim) if is_claim_check && !claim.trim().is_empty() => claim,
        _ => search_query,
    }
}

/// Picks the curated-topic query: the extracted entity when one exists,
/// otherwise the first word of the search query.
#[must_use]
pub fn topic_query<'a>(entity: Option<&'a str>, search_query: &'a str) -> &'a str {
    entity.unwrap_or_else(|| search_query.split_whitespace().next().unwrap_or(search_query))
}

/// Filters the symptom list down to specific symptoms, dropping the
/// non-specific general-concern signal.
#[must_use]
pub fn significant_symptoms(symptoms: &[String]) -> Vec<&str> {
    symptoms
        .iter()
        .map(String::as_str)
        .filter(|s| !s.contains("general concern"))
        .collect()
}

/// Builds the literature query for the outbreak workflow from detected
/// symptoms. Only a general-concern signal (or nothing specific) falls
/// back to the broad emerging-concerns query.
#[must_use]
pub fn outbreak_literature_query(symptoms: &[String]) -> String {
    let specific = significant_symptoms(symptoms);
    if specific.is_empty() {
        GENERAL_CONCERN_QUERY.to_string()
    } else {
        format!(
            "{} (emerging OR unusual OR outbreak OR epidemic)",
            specific.join(" AND ")
        )
    }
}

/// Picks the curated-topic query for the outbreak workflow: the first
/// specific symptom, or the standing public-health-alerts topic.
#[must_use]
pub fn outbreak_topic_query(symptoms: &[String]) -> String {
    significant_symptoms(symptoms)
        .first()
        .map_or_else(|| "public health alerts".to_string(), ToString::to_string)
}

/// Builds the condition-guidance query for the aftercare workflow.
///
/// Appends "management" so the curated lookup lands on management topics,
/// unless the condition already reads like one.
#[must_use]
pub fn condition_query(condition: &str) -> String {
    let lower = condition.to_lowercase();
    if lower.contains("recovery") || lower.contains("management") {
        condition.to_string()
    } else {
        format!("{condition} management")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_takes_precedence_for_literature() {
        let query = literature_query(true, Some("Garlic cures cancer."), "is it true");
        assert_eq!(query, "Garlic cures cancer.");

        // Without the vetting flag the claim is ignored.
        let query = literature_query(false, Some("Garlic cures cancer."), "is it true");
        assert_eq!(query, "is it true");
    }

    #[test]
    fn test_topic_query_prefers_entity() {
        assert_eq!(topic_query(Some("metformin"), "tell me about metformin"), "metformin");
        assert_eq!(topic_query(None, "flu prevention tips"), "flu");
        assert_eq!(topic_query(None, ""), "");
    }

    #[test]
    fn test_outbreak_literature_query_from_symptoms() {
        let symptoms = vec!["fever".to_string(), "cough".to_string()];
        assert_eq!(
            outbreak_literature_query(&symptoms),
            "fever AND cough (emerging OR unusual OR outbreak OR epidemic)"
        );
    }

    #[test]
    fn test_outbreak_general_concern_fallback() {
        let symptoms = vec!["general concern signal (non-specific)".to_string()];
        assert_eq!(outbreak_literature_query(&symptoms), GENERAL_CONCERN_QUERY);
        assert_eq!(outbreak_topic_query(&symptoms), "public health alerts");
    }

    #[test]
    fn test_condition_query_appends_management() {
        assert_eq!(condition_query("minor knee sprain"), "minor knee sprain management");
        assert_eq!(condition_query("recovery from flu"), "recovery from flu");
        assert_eq!(condition_query("diabetes management"), "diabetes management");
    }
}
