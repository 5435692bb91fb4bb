//! Built-in action catalog.
//!
//! Handlers live in three groups: [`http`] for outbound requests, [`data`] for pure value
//! manipulation and context writes, and [`interaction`] for actions that reach the caller's
//! capabilities (notifications, routing, timers, nested runs).

use std::sync::Arc;

use serde_json::Value;

use super::{ActionRegistry, BuiltInOptions};
use crate::error::ActionError;

pub mod data;
pub mod http;
pub mod interaction;

pub const HTTP_REQUEST: &str = "httpRequest";
pub const SHOW_TOAST: &str = "showToast";
pub const NAVIGATE: &str = "navigate";
pub const WAIT: &str = "wait";
pub const LOG: &str = "log";
pub const SET_VAR: &str = "setVar";
pub const MERGE_OBJECTS: &str = "mergeObjects";
pub const BRANCH: &str = "branch";
pub const MATH_OP: &str = "mathOp";
pub const CALL_WORKFLOW: &str = "callWorkflow";

/// Names of every built-in action.
pub const BUILT_IN_ACTIONS: &[&str] = &[
    HTTP_REQUEST,
    SHOW_TOAST,
    NAVIGATE,
    WAIT,
    LOG,
    SET_VAR,
    MERGE_OBJECTS,
    BRANCH,
    MATH_OP,
    CALL_WORKFLOW,
];

/// Registers the full built-in catalog into `registry`.
pub(crate) fn register_all(registry: &ActionRegistry, options: BuiltInOptions) {
    registry.register(HTTP_REQUEST, Arc::new(http::HttpRequestAction::new(options.http_client)));
    registry.register(SHOW_TOAST, Arc::new(interaction::ShowToastAction));
    registry.register(NAVIGATE, Arc::new(interaction::NavigateAction));
    registry.register(WAIT, Arc::new(interaction::WaitAction::new(options.default_wait)));
    registry.register(CALL_WORKFLOW, Arc::new(interaction::CallWorkflowAction));
    registry.register(LOG, Arc::new(data::LogAction));
    registry.register(SET_VAR, Arc::new(data::SetVarAction));
    registry.register(MERGE_OBJECTS, Arc::new(data::MergeObjectsAction));
    registry.register(BRANCH, Arc::new(data::BranchAction));
    registry.register(MATH_OP, Arc::new(data::MathOpAction));
}

/// Returns the named parameter when present and not null.
pub(crate) fn param<'a>(params: &'a Value, name: &str) -> Option<&'a Value> {
    params.get(name).filter(|value| !value.is_null())
}

/// Returns the named parameter or an `InvalidParam` error.
pub(crate) fn required_param<'a>(action: &str, params: &'a Value, name: &str) -> Result<&'a Value, ActionError> {
    param(params, name).ok_or_else(|| ActionError::invalid_param(action, name, "is required"))
}

/// Returns a required string parameter.
pub(crate) fn string_param<'a>(action: &str, params: &'a Value, name: &str) -> Result<&'a str, ActionError> {
    required_param(action, params, name)?
        .as_str()
        .ok_or_else(|| ActionError::invalid_param(action, name, "expected a string"))
}

/// Reads an optional numeric parameter, accepting numbers and numeric strings.
pub(crate) fn number_param(action: &str, params: &Value, name: &str) -> Result<Option<f64>, ActionError> {
    param(params, name).map(|value| number_value(action, name, value)).transpose()
}

/// Coerces a JSON number or numeric string into `f64`.
pub(crate) fn number_value(action: &str, name: &str, value: &Value) -> Result<f64, ActionError> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ActionError::invalid_param(action, name, format!("expected a number, got {value}")))
}
