//! Request dispatch boundary.
//!
//! Routes named tool and workflow invocations, classifying each result
//! with an HTTP-style status. The mapping is deliberately narrow: only an
//! unknown tool or workflow name is `NotFound`, only malformed input is
//! `BadRequest`, and only an internal fault is `ServerError`. A tool that
//! ran but reported a failure still dispatches as `Ok` with the failure
//! payload in the body, because the caller asked a well-formed question
//! and got a well-formed answer.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::llm::{LlmProvider, create_provider};
use crate::tools::{ToolRegistry, ToolReply};
use crate::workflow::{
    HealthInfoInput, HealthInfoWorkflow, OutbreakInput, OutbreakWorkflow, PostDischargeInput,
    PostDischargeWorkflow,
};

/// Registered workflow identifiers.
pub mod workflows {
    /// Health information / claim vetting.
    pub const HEALTH_INFO: &str = "health_info";
    /// Outbreak early warning.
    pub const OUTBREAK: &str = "outbreak";
    /// Post-discharge support.
    pub const POST_DISCHARGE: &str = "post_discharge";
}

/// Classification of a dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    /// The request was routed and executed.
    Ok,
    /// The input was not a valid parameter object for the target.
    BadRequest,
    /// No tool or workflow with that name is registered.
    NotFound,
    /// An internal fault prevented execution.
    ServerError,
}

impl DispatchStatus {
    /// HTTP-style status code for this classification.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::ServerError => 500,
        }
    }
}

/// A dispatched result: the classification plus a JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchResponse {
    /// Result classification.
    pub status: DispatchStatus,
    /// Response payload.
    pub body: Value,
}

impl DispatchResponse {
    fn ok(body: Value) -> Self {
        Self {
            status: DispatchStatus::Ok,
            body,
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: DispatchStatus::BadRequest,
            body: json!({ "error": message.into() }),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: DispatchStatus::NotFound,
            body: json!({ "error": message.into() }),
        }
    }

    fn server_error(message: impl Into<String>) -> Self {
        Self {
            status: DispatchStatus::ServerError,
            body: json!({ "error": message.into() }),
        }
    }
}

/// Routes tool and workflow requests against one configuration.
pub struct Dispatcher {
    config: AppConfig,
    registry: ToolRegistry,
    provider: Option<Arc<dyn LlmProvider>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("has_provider", &self.provider.is_some())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher over explicit parts.
    #[must_use]
    pub fn new(
        config: AppConfig,
        registry: ToolRegistry,
        provider: Option<Arc<dyn LlmProvider>>,
    ) -> Self {
        Self {
            config,
            registry,
            provider,
        }
    }

    /// Creates a dispatcher from configuration with the standard adapters.
    ///
    /// A provider is attached only when the configuration carries an API
    /// key; without one (or when provider creation fails) the workflows
    /// run in their deterministic modes.
    #[must_use]
    pub fn from_config(config: AppConfig) -> Self {
        let registry = ToolRegistry::with_defaults(&config);
        let provider = if config.api_key.is_some() {
            match create_provider(&config) {
                Ok(provider) => Some(provider),
                Err(e) => {
                    warn!(error = %e, "provider unavailable, using deterministic modes");
                    None
                }
            }
        } else {
            None
        };
        Self::new(config, registry, provider)
    }

    /// Executes a single tool by name.
    ///
    /// Adapter-level validation failures (the `Invalid input:` replies)
    /// dispatch as `BadRequest`; every other tool-reported failure is an
    /// `Ok` response carrying the failure payload.
    pub async fn execute_tool(&self, name: &str, input: Value) -> DispatchResponse {
        info!(tool = name, "dispatching tool call");
        if !input.is_object() {
            return DispatchResponse::bad_request("Tool input must be a JSON object.");
        }

        let Some(reply) = self.registry.invoke(name, input).await else {
            return DispatchResponse::not_found(format!("Tool '{name}' not found."));
        };

        match reply {
            ToolReply::Data(value) => DispatchResponse::ok(value),
            ToolReply::NotFound(failure) => match serde_json::to_value(&failure) {
                Ok(body) => DispatchResponse::ok(body),
                Err(e) => DispatchResponse::server_error(format!("Serialization error: {e}")),
            },
            ToolReply::Failed(failure) => {
                let response = match serde_json::to_value(&failure) {
                    Ok(body) => DispatchResponse::ok(body),
                    Err(e) => {
                        return DispatchResponse::server_error(format!(
                            "Serialization error: {e}"
                        ));
                    }
                };
                if failure.error.starts_with("Invalid input:") {
                    DispatchResponse {
                        status: DispatchStatus::BadRequest,
                        body: response.body,
                    }
                } else {
                    response
                }
            }
        }
    }

    /// Runs a workflow by identifier.
    ///
    /// The body of an `Ok` response carries the primary text under
    /// `result` and the full serialized final state under `state`.
    pub async fn run_workflow(&self, workflow: &str, input: Value) -> DispatchResponse {
        info!(workflow, "dispatching workflow run");
        match workflow {
            workflows::HEALTH_INFO => {
                let input: HealthInfoInput = match serde_json::from_value(input) {
                    Ok(input) => input,
                    Err(e) => {
                        return DispatchResponse::bad_request(format!("Invalid input: {e}"));
                    }
                };
                let flow = match HealthInfoWorkflow::new(
                    &self.config,
                    self.registry.clone(),
                    self.provider.clone(),
                ) {
                    Ok(flow) => flow,
                    Err(e) => return DispatchResponse::server_error(e.to_string()),
                };
                let state = flow.run(input).await;
                workflow_response(state.answer.clone(), &state)
            }
            workflows::OUTBREAK => {
                let input: OutbreakInput = match serde_json::from_value(input) {
                    Ok(input) => input,
                    Err(e) => {
                        return DispatchResponse::bad_request(format!("Invalid input: {e}"));
                    }
                };
                let flow = match OutbreakWorkflow::new(&self.config, self.registry.clone()) {
                    Ok(flow) => flow,
                    Err(e) => return DispatchResponse::server_error(e.to_string()),
                };
                let state = flow.run(input).await;
                workflow_response(state.report.clone(), &state)
            }
            workflows::POST_DISCHARGE => {
                let input: PostDischargeInput = match serde_json::from_value(input) {
                    Ok(input) => input,
                    Err(e) => {
                        return DispatchResponse::bad_request(format!("Invalid input: {e}"));
                    }
                };
                let flow = match PostDischargeWorkflow::new(self.registry.clone()) {
                    Ok(flow) => flow,
                    Err(e) => return DispatchResponse::server_error(e.to_string()),
                };
                let state = flow.run(input).await;
                workflow_response(state.answer.clone(), &state)
            }
            _ => DispatchResponse::not_found(format!("Workflow '{workflow}' not found.")),
        }
    }
}

/// Builds the `Ok` body for a completed workflow run.
fn workflow_response<S: Serialize>(result: Option<String>, state: &S) -> DispatchResponse {
    match serde_json::to_value(state) {
        Ok(state) => DispatchResponse::ok(json!({
            "result": result.unwrap_or_default(),
            "state": state,
        })),
        Err(e) => DispatchResponse::server_error(format!("Serialization error: {e}")),
    }
}
