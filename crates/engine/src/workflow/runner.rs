//! Sequential workflow runner.
//!
//! Steps run strictly in order. Each step is gated by its `if` condition, has its params
//! interpolated against the execution context, and is dispatched by name through the
//! [`ActionRegistry`]. The external context is handed to every handler unchanged.

use std::{sync::Arc, time::Instant};

use cadence_types::{RunReport, StepRecord, StepStatus, WorkflowDefinition};
use cadence_util::redact_json;
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{Level, debug, info, warn};

use crate::{
    action::{ActionRegistry, global_registry},
    context::{ExternalContext, WorkflowInvoker},
    error::RunError,
    resolve::{eval_condition, interpolate_value},
    templates::collect_unresolved_templates_from_value,
};

/// Executes workflow definitions against a registry.
#[derive(Debug, Clone)]
pub struct WorkflowRunner {
    registry: Arc<ActionRegistry>,
}

impl WorkflowRunner {
    pub fn new(registry: Arc<ActionRegistry>) -> Self {
        Self { registry }
    }

    /// Runner bound to the process-wide registry.
    pub fn global() -> Self {
        Self::new(global_registry())
    }

    pub fn registry(&self) -> &Arc<ActionRegistry> {
        &self.registry
    }

    /// Runs `definition` and returns the final `lastResult`.
    ///
    /// `None` means no step executed successfully (for example, a zero-step workflow).
    pub async fn run(&self, definition: &WorkflowDefinition, context: &ExternalContext) -> Result<Option<Value>, RunError> {
        self.run_with_report(definition, context)
            .await
            .map(|report| report.last_result)
    }

    /// Runs `definition` and returns a per-step report alongside the final `lastResult`.
    pub async fn run_with_report(&self, definition: &WorkflowDefinition, context: &ExternalContext) -> Result<RunReport, RunError> {
        let started_at = Utc::now();
        let mut execution = context.seed_execution_context().await;
        let mut records = Vec::with_capacity(definition.steps.len());
        info!(steps = definition.steps.len(), depth = context.depth(), "workflow run started");

        for (index, step) in definition.steps.iter().enumerate() {
            if context.is_cancelled() {
                warn!(step = index, "workflow run cancelled");
                return Err(RunError::Cancelled { step_index: index });
            }
            execution.set_globals(context.globals().await);

            if !eval_condition(step.r#if.as_deref(), &execution) {
                debug!(step = index, action = %step.action_name, condition = ?step.r#if, "step skipped");
                records.push(StepRecord {
                    index,
                    action_name: step.action_name.clone(),
                    status: StepStatus::Skipped,
                    duration_ms: 0,
                    error: None,
                });
                continue;
            }

            let raw_params = Value::Object(step.params.clone().unwrap_or_else(Map::new));
            if tracing::enabled!(Level::DEBUG) {
                let mut unresolved = Vec::new();
                collect_unresolved_templates_from_value(&raw_params, "params", &execution, &mut unresolved);
                for reference in unresolved {
                    debug!(
                        step = index,
                        source = %reference.source_path,
                        expression = %reference.expression,
                        "placeholder resolved to empty"
                    );
                }
            }
            let params = interpolate_value(&raw_params, &execution);

            let Some(handler) = self.registry.get(&step.action_name) else {
                warn!(step = index, action = %step.action_name, "unknown action");
                return Err(RunError::UnknownAction {
                    step_index: index,
                    action_name: step.action_name.clone(),
                });
            };

            debug!(step = index, action = %step.action_name, params = %redact_json(&params), "dispatching step");
            let started = Instant::now();
            let outcome = handler.invoke(&step.action_name, params, context).await;
            let duration_ms = started.elapsed().as_millis().try_into().unwrap_or(u64::MAX);

            match outcome {
                Ok(result) => {
                    debug!(step = index, action = %step.action_name, duration_ms, "step succeeded");
                    execution.last_result = Some(result);
                    records.push(StepRecord {
                        index,
                        action_name: step.action_name.clone(),
                        status: StepStatus::Succeeded,
                        duration_ms,
                        error: None,
                    });
                }
                Err(error) if step.continue_on_error => {
                    warn!(step = index, action = %step.action_name, error = %error, "step failed; continuing");
                    records.push(StepRecord {
                        index,
                        action_name: step.action_name.clone(),
                        status: StepStatus::Failed,
                        duration_ms,
                        error: Some(error.to_string()),
                    });
                }
                Err(error) => {
                    warn!(step = index, action = %step.action_name, error = %error, "step failed; aborting run");
                    return Err(RunError::StepFailed {
                        step_index: index,
                        action_name: step.action_name.clone(),
                        source: error,
                    });
                }
            }
        }

        info!(steps = records.len(), depth = context.depth(), "workflow run finished");
        Ok(RunReport {
            last_result: execution.last_result,
            steps: records,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

#[async_trait::async_trait]
impl WorkflowInvoker for WorkflowRunner {
    async fn run_nested(&self, definition: WorkflowDefinition, context: ExternalContext) -> Result<Option<Value>, RunError> {
        self.run(&definition, &context).await
    }
}

/// Runs `definition` with the process-wide registry.
pub async fn run_workflow(definition: &WorkflowDefinition, context: &ExternalContext) -> Result<Option<Value>, RunError> {
    WorkflowRunner::global().run(definition, context).await
}
