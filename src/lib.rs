//! # healthmate-rs
//!
//! Consumer health question answering: orchestrates drug-label,
//! literature, and curated health-topic lookups into synthesized,
//! claim-vetted answers.
//!
//! The library is organized around three fail-soft workflow pipelines:
//!
//! - [`workflow::HealthInfoWorkflow`] answers health questions and vets
//!   claims against retrieved sources.
//! - [`workflow::OutbreakWorkflow`] scans free-text reports for symptom
//!   signals and assesses an alert level.
//! - [`workflow::PostDischargeWorkflow`] answers aftercare questions from
//!   condition and medication context.
//!
//! Data sources sit behind the [`tools::ToolAdapter`] trait and are
//! invoked through a [`tools::ToolRegistry`] that applies timeouts and
//! payload normalization. Recoverable failures travel as data through the
//! pipeline instead of aborting it; every run ends with a non-empty
//! answer. The [`dispatch`] module routes named tool and workflow
//! requests with HTTP-style result classification.
//!
//! ## Example
//!
//! ```no_run
//! use healthmate::config::AppConfig;
//! use healthmate::tools::ToolRegistry;
//! use healthmate::workflow::{HealthInfoInput, HealthInfoWorkflow};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env();
//! let registry = ToolRegistry::with_defaults(&config);
//! let workflow = HealthInfoWorkflow::new(&config, registry, None)?;
//!
//! let state = workflow
//!     .run(HealthInfoInput {
//!         user_query: "Tell me about Metformin side effects".to_string(),
//!         claim_to_check: None,
//!     })
//!     .await;
//!
//! println!("{}", state.answer.unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod llm;
pub mod tools;
pub mod workflow;
