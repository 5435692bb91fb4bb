//! Error types for action handlers and workflow runs.

use thiserror::Error;

/// Failure raised by an action handler.
///
/// Every variant is subject to the step's `continueOnError` policy.
#[derive(Debug, Error)]
pub enum ActionError {
    /// A parameter was missing or had the wrong shape.
    #[error("{action}: invalid parameter '{param}': {reason}")]
    InvalidParam { action: String, param: String, reason: String },

    /// The action needs a capability the external context does not provide.
    #[error("{action}: missing capability '{capability}' in external context")]
    MissingCapability { action: String, capability: String },

    /// An HTTP request could not be completed.
    #[error("{action}: http request failed: {source}")]
    Http {
        action: String,
        #[source]
        source: reqwest::Error,
    },

    /// A nested workflow run aborted.
    #[error("{action}: nested workflow failed: {source}")]
    NestedRun {
        action: String,
        #[source]
        source: Box<RunError>,
    },

    /// A nested run would exceed the configured depth limit.
    #[error("{action}: nesting depth {depth} exceeds limit {limit}")]
    NestingLimit { action: String, depth: usize, limit: usize },

    /// Generic handler failure.
    #[error("{action}: {message}")]
    Failed { action: String, message: String },
}

impl ActionError {
    /// Create an invalid parameter error.
    pub fn invalid_param(action: impl Into<String>, param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParam {
            action: action.into(),
            param: param.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing capability error.
    pub fn missing_capability(action: impl Into<String>, capability: impl Into<String>) -> Self {
        Self::MissingCapability {
            action: action.into(),
            capability: capability.into(),
        }
    }

    /// Create a generic failure.
    pub fn failed(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            action: action.into(),
            message: message.into(),
        }
    }
}

/// Reason a workflow run aborted.
#[derive(Debug, Error)]
pub enum RunError {
    /// A step referenced an action with no registered handler. Never suppressed.
    #[error("step {step_index}: unknown action '{action_name}'")]
    UnknownAction { step_index: usize, action_name: String },

    /// A handler failed on a step without `continueOnError`.
    #[error("step {step_index} ({action_name}) failed: {source}")]
    StepFailed {
        step_index: usize,
        action_name: String,
        #[source]
        source: ActionError,
    },

    /// The run's cancellation token fired before the step started.
    #[error("run cancelled before step {step_index}")]
    Cancelled { step_index: usize },
}

impl RunError {
    /// Index of the step at which the run stopped.
    pub fn step_index(&self) -> usize {
        match self {
            Self::UnknownAction { step_index, .. } | Self::StepFailed { step_index, .. } | Self::Cancelled { step_index } => {
                *step_index
            }
        }
    }
}
