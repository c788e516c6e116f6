//! Application configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.
//! The keyword lists and thresholds that drive entity extraction, symptom
//! scanning, claim vetting, and alert assessment are deliberately part of the
//! configuration (policy structs) rather than hard-coded: they are heuristics,
//! not validated clinical behavior, and deployments are expected to tune them.

use std::path::PathBuf;
use std::time::Duration;

/// Default per-call timeout for data-source adapters.
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 12;
/// Default timeout for LLM completion calls.
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;
/// Default number of literature results fetched per query.
const DEFAULT_MAX_LITERATURE_RESULTS: usize = 2;
/// Default max tokens for synthesis completions.
const DEFAULT_SYNTHESIS_MAX_TOKENS: u32 = 1000;
/// Default max tokens for extraction completions.
const DEFAULT_EXTRACTION_MAX_TOKENS: u32 = 256;

/// Configuration for the healthmate pipeline.
///
/// Constructed once at process start and passed by reference into tool
/// registry and workflow construction; nothing in the library reads
/// environment variables after this point.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// LLM provider name (e.g., "openai").
    pub provider: String,
    /// API key for the provider. `None` disables the LLM-assisted
    /// extraction and synthesis strategies; the deterministic paths
    /// keep working.
    pub api_key: Option<String>,
    /// Optional base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Model used for both extraction and synthesis calls.
    pub model: String,
    /// Maximum tokens for synthesis responses.
    pub synthesis_max_tokens: u32,
    /// Maximum tokens for extraction responses.
    pub extraction_max_tokens: u32,
    /// Per-call timeout for data-source adapters.
    pub tool_timeout: Duration,
    /// Timeout for LLM completion calls.
    pub llm_timeout: Duration,
    /// Literature results fetched per query.
    pub max_literature_results: usize,
    /// Directory containing prompt template files.
    ///
    /// When set, system prompts are loaded from markdown files in this
    /// directory, falling back to compiled-in defaults for missing files.
    pub prompt_dir: Option<PathBuf>,
    /// Entity-extraction heuristics.
    pub extraction: ExtractionPolicy,
    /// Claim-vetting keyword policy.
    pub vetting: VettingPolicy,
    /// Symptom-scan keyword policy.
    pub symptoms: SymptomPolicy,
    /// Outbreak alert-level thresholds.
    pub alerts: AlertPolicy,
}

/// Heuristic entity-extraction policy.
#[derive(Debug, Clone)]
pub struct ExtractionPolicy {
    /// Phrases whose following token is treated as a candidate entity.
    pub trigger_phrases: Vec<String>,
    /// Minimum candidate length in characters.
    pub min_entity_len: usize,
    /// Maximum candidate length in characters.
    pub max_entity_len: usize,
    /// Maximum word count for the whole-query-as-entity rule.
    pub short_query_words: usize,
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self {
            trigger_phrases: [
                "side effects of",
                "what is",
                "tell me about",
                "information on",
                "info on",
                "about",
                "drug",
                "medication",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            min_entity_len: 4,
            max_entity_len: 30,
            short_query_words: 2,
        }
    }
}

/// Claim-vetting keyword policy.
#[derive(Debug, Clone)]
pub struct VettingPolicy {
    /// Words that mark a claim as asserting a cure.
    pub cure_words: Vec<String>,
    /// Serious or chronic conditions for which cure claims always
    /// trigger the heightened-caution verdict.
    pub serious_conditions: Vec<String>,
    /// Minimum claim-keyword length for the overlap check.
    pub min_keyword_len: usize,
}

impl Default for VettingPolicy {
    fn default() -> Self {
        Self {
            cure_words: vec!["cure".to_string(), "cures".to_string()],
            serious_conditions: ["cancer", "diabetes", "aids", "hiv"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            min_keyword_len: 4,
        }
    }
}

/// Symptom-scan keyword policy.
#[derive(Debug, Clone)]
pub struct SymptomPolicy {
    /// Symptom keywords spotted in report text.
    pub keywords: Vec<String>,
    /// Phrases that raise the general-concern signal when no specific
    /// symptom matched.
    pub concern_phrases: Vec<String>,
}

impl SymptomPolicy {
    /// Label emitted when no specific symptom matched but the text reads
    /// like a report.
    pub const GENERAL_CONCERN: &'static str = "general concern signal (non-specific)";
}

impl Default for SymptomPolicy {
    fn default() -> Self {
        Self {
            keywords: [
                "fever",
                "cough",
                "sore throat",
                "headache",
                "fatigue",
                "rash",
                "nausea",
                "vomiting",
                "diarrhea",
                "shortness of breath",
                "body ache",
                "chills",
                "congestion",
                "runny nose",
                "loss of taste",
                "loss of smell",
                "dizziness",
                "unusual bleeding",
                "swelling",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            concern_phrases: ["report", "outbreak", "unusual illness"]
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Outbreak alert-level thresholds.
#[derive(Debug, Clone)]
pub struct AlertPolicy {
    /// Number of specific symptoms that, with corroborating literature,
    /// escalates to the medium tier.
    pub medium_symptom_count: usize,
    /// Keywords in literature titles/summaries that escalate medium to high.
    pub escalation_keywords: Vec<String>,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            medium_symptom_count: 2,
            escalation_keywords: ["outbreak", "epidemic", "unusual surge"]
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl AppConfig {
    /// Creates a new builder for `AppConfig`.
    #[must_use]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::builder().from_env().build()
    }

    /// Returns `true` if an API key is configured (LLM strategies available).
    #[must_use]
    pub const fn llm_available(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`AppConfig`].
#[derive(Debug, Clone, Default)]
pub struct AppConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    synthesis_max_tokens: Option<u32>,
    extraction_max_tokens: Option<u32>,
    tool_timeout: Option<Duration>,
    llm_timeout: Option<Duration>,
    max_literature_results: Option<usize>,
    prompt_dir: Option<PathBuf>,
    extraction: Option<ExtractionPolicy>,
    vetting: Option<VettingPolicy>,
    symptoms: Option<SymptomPolicy>,
    alerts: Option<AlertPolicy>,
}

impl AppConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.provider.is_none() {
            self.provider = std::env::var("HEALTHMATE_PROVIDER").ok();
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var("OPENAI_API_KEY")
                .or_else(|_| std::env::var("HEALTHMATE_API_KEY"))
                .ok();
        }
        if self.base_url.is_none() {
            self.base_url = std::env::var("OPENAI_BASE_URL")
                .or_else(|_| std::env::var("HEALTHMATE_BASE_URL"))
                .ok();
        }
        if self.model.is_none() {
            self.model = std::env::var("HEALTHMATE_MODEL").ok();
        }
        if self.max_literature_results.is_none() {
            self.max_literature_results = std::env::var("HEALTHMATE_MAX_LITERATURE")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = std::env::var("HEALTHMATE_PROMPT_DIR")
                .ok()
                .map(PathBuf::from);
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the synthesis max tokens.
    #[must_use]
    pub const fn synthesis_max_tokens(mut self, n: u32) -> Self {
        self.synthesis_max_tokens = Some(n);
        self
    }

    /// Sets the extraction max tokens.
    #[must_use]
    pub const fn extraction_max_tokens(mut self, n: u32) -> Self {
        self.extraction_max_tokens = Some(n);
        self
    }

    /// Sets the per-call tool timeout.
    #[must_use]
    pub const fn tool_timeout(mut self, duration: Duration) -> Self {
        self.tool_timeout = Some(duration);
        self
    }

    /// Sets the LLM call timeout.
    #[must_use]
    pub const fn llm_timeout(mut self, duration: Duration) -> Self {
        self.llm_timeout = Some(duration);
        self
    }

    /// Sets the literature results fetched per query.
    #[must_use]
    pub const fn max_literature_results(mut self, n: usize) -> Self {
        self.max_literature_results = Some(n);
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Sets the entity-extraction policy.
    #[must_use]
    pub fn extraction(mut self, policy: ExtractionPolicy) -> Self {
        self.extraction = Some(policy);
        self
    }

    /// Sets the claim-vetting policy.
    #[must_use]
    pub fn vetting(mut self, policy: VettingPolicy) -> Self {
        self.vetting = Some(policy);
        self
    }

    /// Sets the symptom-scan policy.
    #[must_use]
    pub fn symptoms(mut self, policy: SymptomPolicy) -> Self {
        self.symptoms = Some(policy);
        self
    }

    /// Sets the alert-level policy.
    #[must_use]
    pub fn alerts(mut self, policy: AlertPolicy) -> Self {
        self.alerts = Some(policy);
        self
    }

    /// Builds the [`AppConfig`].
    ///
    /// A missing API key is not an error here: it disables the
    /// LLM-assisted strategies while the deterministic paths keep working.
    /// Call sites that require a provider surface
    /// [`WorkflowError::ProviderUnavailable`](crate::error::WorkflowError::ProviderUnavailable)
    /// at workflow construction.
    #[must_use]
    pub fn build(self) -> AppConfig {
        AppConfig {
            provider: self.provider.unwrap_or_else(|| "openai".to_string()),
            api_key: self.api_key,
            base_url: self.base_url,
            model: self.model.unwrap_or_else(|| "gpt-4o-mini".to_string()),
            synthesis_max_tokens: self
                .synthesis_max_tokens
                .unwrap_or(DEFAULT_SYNTHESIS_MAX_TOKENS),
            extraction_max_tokens: self
                .extraction_max_tokens
                .unwrap_or(DEFAULT_EXTRACTION_MAX_TOKENS),
            tool_timeout: self
                .tool_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS)),
            llm_timeout: self
                .llm_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS)),
            max_literature_results: self
                .max_literature_results
                .unwrap_or(DEFAULT_MAX_LITERATURE_RESULTS),
            prompt_dir: self.prompt_dir,
            extraction: self.extraction.unwrap_or_default(),
            vetting: self.vetting.unwrap_or_default(),
            symptoms: self.symptoms.unwrap_or_default(),
            alerts: self.alerts.unwrap_or_default(),
        }
    }
}
