//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// HealthMate: consumer health question answering.
///
/// Orchestrates drug-label, literature, and curated health-topic lookups
/// into synthesized, claim-vetted answers.
#[derive(Parser, Debug)]
#[command(name = "healthmate")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// Show pipeline notes (recoverable errors) alongside the answer.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Model for the LLM-assisted stages.
    #[arg(long, global = true, env = "HEALTHMATE_MODEL")]
    pub model: Option<String>,

    /// Directory containing prompt template files.
    #[arg(long, global = true)]
    pub prompt_dir: Option<PathBuf>,

    /// Disable the LLM-assisted stages even when an API key is configured.
    #[arg(long, global = true)]
    pub no_llm: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a health question.
    ///
    /// Runs the full pipeline: query refinement, concurrent lookups
    /// against the drug-label, literature, and curated-topic sources,
    /// and answer synthesis.
    #[command(after_help = r#"Examples:
  healthmate ask "Tell me about Metformin side effects"
  healthmate ask "How can I prevent the flu?"
  OPENAI_API_KEY=sk-... healthmate ask "What is ibuprofen used for?"
  healthmate --format json ask "metformin" | jq '.state.extracted_entity'
"#)]
    Ask {
        /// The health question.
        question: String,
    },

    /// Vet a health claim against retrieved sources.
    ///
    /// Searches the literature for the claim itself and appends a
    /// conservative vetting conclusion to the answer.
    #[command(after_help = r#"Examples:
  healthmate vet "Garlic cures all types of cancer naturally."
  healthmate vet "Vitamin C shortens colds." --question "Does vitamin C help with colds?"
  healthmate --format json vet "..." | jq '.state.vetting_conclusion'
"#)]
    Vet {
        /// The claim to vet.
        claim: String,

        /// Question to answer alongside the vetting (defaults to the claim).
        #[arg(short, long)]
        question: Option<String>,
    },

    /// Analyze a free-text report for outbreak signals.
    ///
    /// Scans for symptom keywords, researches them, assesses an alert
    /// level, and prints a monitoring report.
    #[command(after_help = r#"Examples:
  healthmate report "Several villagers report fever and unusual rash."
  healthmate report --file field_notes.txt
  cat observations.txt | healthmate report
  healthmate --format json report "..." | jq '.state.alert_level'
"#)]
    Report {
        /// Report text to analyze (reads from stdin if omitted).
        text: Option<String>,

        /// Read the report text from a file instead.
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },

    /// Answer a post-discharge aftercare question.
    #[command(after_help = r#"Examples:
  healthmate aftercare "What are the side effects?" --medication Ibuprofen
  healthmate aftercare "When can I exercise?" --condition "minor knee sprain"
  healthmate aftercare "What are the warning signs?"
"#)]
    Aftercare {
        /// The aftercare question.
        question: String,

        /// Condition the user is recovering from.
        #[arg(short, long)]
        condition: Option<String>,

        /// Medication the user asks about.
        #[arg(short, long)]
        medication: Option<String>,
    },

    /// Invoke a single data-source tool directly.
    ///
    /// Useful for inspecting what each source returns before it is
    /// assembled into an answer.
    #[command(after_help = r#"Examples:
  healthmate tool get_fda_drug_info '{"drug_name": "Metformin"}'
  healthmate tool search_pubmed '{"query": "flu vaccine efficacy", "max_results": 3}'
  healthmate tool get_health_gov_topic '{"topic_query": "healthy diet"}'
  healthmate tool analyze_text_for_symptoms '{"text": "fever and chills"}'
  healthmate tool --list
"#)]
    Tool {
        /// Tool name.
        #[arg(required_unless_present = "list")]
        name: Option<String>,

        /// JSON parameter object (defaults to `{}`).
        params: Option<String>,

        /// List registered tools instead of invoking one.
        #[arg(short, long)]
        list: bool,
    },

    /// Write default prompt templates to disk for customization.
    ///
    /// Creates markdown template files so the extraction and synthesis
    /// system prompts can be customized without recompiling.
    #[command(name = "init-prompts")]
    #[command(after_help = r#"Examples:
  healthmate init-prompts                      # Write to ~/.config/healthmate/prompts/
  healthmate init-prompts --dir ./my-prompts   # Write to custom directory
"#)]
    InitPrompts {
        /// Target directory for prompt templates.
        ///
        /// Defaults to `~/.config/healthmate/prompts/`.
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ask_parses() {
        let cli = Cli::parse_from(["healthmate", "ask", "what is metformin"]);
        assert!(matches!(cli.command, Commands::Ask { .. }));
        assert_eq!(cli.format, "text");
    }

    #[test]
    fn test_tool_requires_name_or_list() {
        assert!(Cli::try_parse_from(["healthmate", "tool"]).is_err());
        assert!(Cli::try_parse_from(["healthmate", "tool", "--list"]).is_ok());
    }
}
