//! System prompts and template builders for the model-assisted stages.
//!
//! Two prompts exist: extraction (query refinement before fetch) and
//! synthesis (answer composition over retrieved context). Synthesis is
//! strictly closed-context: the model is instructed to answer only from
//! the material in the user message, never from its own knowledge.

use std::path::Path;

/// System prompt for query refinement.
///
/// The model must return a single JSON object with exactly the
/// `search_query` and `entity` keys; anything else is discarded by the
/// caller and the heuristic result stands.
pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"You are a query refinement assistant for a consumer health information service.

Given a user's health question, produce:
1. "search_query": a concise query suitable for searching medical literature and drug label databases. Strip filler words, keep medical terms.
2. "entity": the single most relevant drug, condition, or health topic named in the question, or null if none is named.

## Output Format (JSON)

Return ONLY a JSON object, no surrounding text:
```json
{"search_query": "<refined query>", "entity": "<drug, condition, or topic, or null>"}
```

## Rules

- Never invent an entity the user did not mention.
- Keep "search_query" under 15 words.
- Preserve drug and condition names exactly as written.
- Return ONLY the JSON object."#;

/// System prompt for answer synthesis.
pub const SYNTHESIS_SYSTEM_PROMPT: &str = r#"You are a consumer health information assistant. You compose a clear, plain-language answer to the user's question using ONLY the retrieved context provided in the message.

## Instructions

1. Answer the user's question from the context sections (drug label data, research article titles, curated health topic summaries).
2. Attribute information to its source section (e.g., "According to the drug label...", "Recent research articles suggest...").
3. If a section notes a retrieval issue or contains no data, acknowledge the gap rather than filling it from memory.
4. Keep the answer focused and readable for a general audience. Avoid jargon; where a technical term is necessary, explain it briefly.

## Rules

- Use ONLY the provided context. Do not add facts from your own knowledge, even well-known ones.
- Do not diagnose, prescribe, or recommend dosages.
- Do not remove or contradict safety warnings present in the context.
- If the context contains nothing relevant to the question, say so plainly."#;

/// Default prompt directory under user config.
const DEFAULT_PROMPT_DIR: &str = ".config/healthmate/prompts";

/// Filename for the extraction prompt template.
const EXTRACTION_FILENAME: &str = "extraction.md";
/// Filename for the synthesis prompt template.
const SYNTHESIS_FILENAME: &str = "synthesis.md";

/// The set of system prompts used by the pipeline.
///
/// Loaded from external template files when available, falling back to
/// compiled-in defaults. Use [`PromptSet::load`] to resolve the prompt
/// directory from configuration, environment, or the default path.
#[derive(Debug, Clone)]
pub struct PromptSet {
    /// System prompt for query refinement.
    pub extraction: String,
    /// System prompt for answer synthesis.
    pub synthesis: String,
}

impl PromptSet {
    /// Loads prompts from the given directory, falling back to compiled-in defaults.
    ///
    /// Resolution order for `prompt_dir`:
    /// 1. Explicit `prompt_dir` argument (from config / `--prompt-dir`)
    /// 2. `HEALTHMATE_PROMPT_DIR` environment variable
    /// 3. `~/.config/healthmate/prompts/`
    ///
    /// Each file is loaded independently — a missing file uses its default.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir
            .map(std::path::PathBuf::from)
            .or_else(|| {
                std::env::var("HEALTHMATE_PROMPT_DIR")
                    .ok()
                    .map(std::path::PathBuf::from)
            })
            .or_else(|| dirs::home_dir().map(|h| h.join(DEFAULT_PROMPT_DIR)));

        let load_file = |filename: &str, default: &str| -> String {
            resolved_dir
                .as_ref()
                .map(|dir| dir.join(filename))
                .and_then(|path| std::fs::read_to_string(&path).ok())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            extraction: load_file(EXTRACTION_FILENAME, EXTRACTION_SYSTEM_PROMPT),
            synthesis: load_file(SYNTHESIS_FILENAME, SYNTHESIS_SYSTEM_PROMPT),
        }
    }

    /// Returns compiled-in defaults without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            extraction: EXTRACTION_SYSTEM_PROMPT.to_string(),
            synthesis: SYNTHESIS_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Writes the compiled-in default prompts to the given directory.
    ///
    /// Creates the directory if it does not exist. Existing files are
    /// **not** overwritten — use this for initial scaffolding only.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<std::path::PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let templates = [
            (EXTRACTION_FILENAME, EXTRACTION_SYSTEM_PROMPT),
            (SYNTHESIS_FILENAME, SYNTHESIS_SYSTEM_PROMPT),
        ];

        let mut written = Vec::new();
        for (filename, content) in &templates {
            let path = dir.join(filename);
            if !path.exists() {
                std::fs::write(&path, content)?;
                written.push(path);
            }
        }

        Ok(written)
    }

    /// Returns the default prompt directory under the user's home.
    ///
    /// Returns `None` if the home directory cannot be determined.
    #[must_use]
    pub fn default_dir() -> Option<std::path::PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_PROMPT_DIR))
    }
}

/// Builds the user message for the extraction call.
#[must_use]
pub fn build_extraction_prompt(query: &str) -> String {
    format!("<question>{query}</question>\n\nRefine this health question.")
}

/// Builds the user message for the synthesis call.
///
/// `context` is the assembled, source-attributed context block; the model
/// is instructed to answer from it alone.
#[must_use]
pub fn build_synthesis_prompt(query: &str, context: &str) -> String {
    format!(
        "<question>{query}</question>\n\n\
         <context>\n{context}\n</context>\n\n\
         Answer the question using only the context above."
    )
}
