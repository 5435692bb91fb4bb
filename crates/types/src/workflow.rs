//! Strongly typed workflow schema definitions shared across the engine and CLI.
//!
//! A workflow is nothing more than an ordered list of steps. Each step names an action,
//! optionally carries templated parameters, an `if` gate, and an error-continuation flag.
//! Field names follow the authoring format (`actionName`, `continueOnError`).

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

/// Ordered sequence of steps executed by the runner.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WorkflowDefinition {
    /// Steps executed strictly in order.
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
}

impl WorkflowDefinition {
    /// Builds a definition from a list of steps.
    pub fn new(steps: Vec<WorkflowStep>) -> Self {
        Self { steps }
    }

    /// Returns true when the definition has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// A single unit of a workflow naming an action and its parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    /// Key into the action registry.
    pub action_name: String,
    /// Arbitrary nested parameters; string leaves may contain `{{path}}` placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<JsonMap<String, JsonValue>>,
    /// Optional gate expression. Absent means the step always runs.
    #[serde(default, rename = "if", skip_serializing_if = "Option::is_none")]
    pub r#if: Option<String>,
    /// When true, a failing handler is logged and the run continues.
    #[serde(default)]
    pub continue_on_error: bool,
}

impl WorkflowStep {
    /// Creates a step with no parameters, no gate, and fail-fast error policy.
    pub fn new(action_name: impl Into<String>) -> Self {
        Self {
            action_name: action_name.into(),
            params: None,
            r#if: None,
            continue_on_error: false,
        }
    }

    /// Attaches parameters. Non-object values are ignored.
    pub fn with_params(mut self, params: JsonValue) -> Self {
        if let JsonValue::Object(map) = params {
            self.params = Some(map);
        }
        self
    }

    /// Attaches an `if` gate expression.
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.r#if = Some(condition.into());
        self
    }

    /// Sets the error-continuation policy.
    pub fn continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }
}

/// A collection of named workflows loaded from one file, preserving authoring order.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WorkflowBundle {
    /// Mapping of workflow names to their definitions.
    pub workflows: IndexMap<String, WorkflowDefinition>,
}

impl WorkflowBundle {
    /// Looks up a workflow by name.
    pub fn get(&self, name: &str) -> Option<&WorkflowDefinition> {
        self.workflows.get(name)
    }

    /// Returns the first workflow in authoring order.
    pub fn first(&self) -> Option<(&String, &WorkflowDefinition)> {
        self.workflows.first()
    }
}

/// Final state of a single step within a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// The `if` gate evaluated to false.
    Skipped,
    /// The handler returned a result.
    Succeeded,
    /// The handler failed and `continueOnError` suppressed the failure.
    Failed,
}

/// Record of one processed step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    /// Zero-based position in the definition.
    pub index: usize,
    /// Action the step referenced.
    pub action_name: String,
    /// Final status.
    pub status: StepStatus,
    /// Wall time spent invoking the handler.
    pub duration_ms: u64,
    /// Error message for suppressed failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Result of the last executed step, if any step executed.
    pub last_result: Option<JsonValue>,
    /// One record per processed step, in execution order.
    pub steps: Vec<StepRecord>,
    /// Time the run began.
    pub started_at: DateTime<Utc>,
    /// Time the run finished.
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Number of steps whose handler succeeded.
    pub fn succeeded_count(&self) -> usize {
        self.steps.iter().filter(|step| step.status == StepStatus::Succeeded).count()
    }

    /// Number of steps skipped by their gate.
    pub fn skipped_count(&self) -> usize {
        self.steps.iter().filter(|step| step.status == StepStatus::Skipped).count()
    }
}
