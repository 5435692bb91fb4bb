//! Value manipulation built-ins: `log`, `setVar`, `mergeObjects`, `branch`, `mathOp`.

use serde_json::{Map, Number, Value};
use tracing::info;

use super::{number_value, param, required_param, string_param};
use crate::{action::ActionHandler, context::ExternalContext, error::ActionError, resolve::is_truthy, resolve::stringify_value};

/// Logs `message` and returns it unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAction;

#[async_trait::async_trait]
impl ActionHandler for LogAction {
    async fn invoke(&self, action_name: &str, params: Value, _context: &ExternalContext) -> Result<Value, ActionError> {
        let message = params.get("message").cloned().unwrap_or(Value::Null);
        info!(action = %action_name, message = %stringify_value(&message), "workflow log");
        Ok(message)
    }
}

/// Writes `value` into the external context at a dotted `path`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetVarAction;

#[async_trait::async_trait]
impl ActionHandler for SetVarAction {
    async fn invoke(&self, action_name: &str, params: Value, context: &ExternalContext) -> Result<Value, ActionError> {
        let path = string_param(action_name, &params, "path")?;
        if path.split('.').any(str::is_empty) {
            return Err(ActionError::invalid_param(action_name, "path", format!("invalid path '{path}'")));
        }
        let value = params.get("value").cloned().unwrap_or(Value::Null);
        context.set(path, value.clone()).await;
        Ok(value)
    }
}

/// Shallow merge of `base` and `extra`; keys from `extra` win.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeObjectsAction;

impl MergeObjectsAction {
    fn object_param(action: &str, params: &Value, name: &str) -> Result<Map<String, Value>, ActionError> {
        match param(params, name) {
            None => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(other) => Err(ActionError::invalid_param(action, name, format!("expected an object, got {other}"))),
        }
    }
}

#[async_trait::async_trait]
impl ActionHandler for MergeObjectsAction {
    async fn invoke(&self, action_name: &str, params: Value, _context: &ExternalContext) -> Result<Value, ActionError> {
        let mut merged = Self::object_param(action_name, &params, "base")?;
        merged.extend(Self::object_param(action_name, &params, "extra")?);
        Ok(Value::Object(merged))
    }
}

/// Ternary: `trueValue` when `condition` is truthy, else `falseValue`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BranchAction;

#[async_trait::async_trait]
impl ActionHandler for BranchAction {
    async fn invoke(&self, _action_name: &str, params: Value, _context: &ExternalContext) -> Result<Value, ActionError> {
        let condition = params.get("condition").unwrap_or(&Value::Null);
        let key = if is_truthy(condition) { "trueValue" } else { "falseValue" };
        Ok(params.get(key).cloned().unwrap_or(Value::Null))
    }
}

/// Arithmetic operator accepted by `mathOp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOperator {
    Add,
    Sub,
    Mul,
    Div,
}

impl MathOperator {
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "add" => Some(Self::Add),
            "sub" => Some(Self::Sub),
            "mul" => Some(Self::Mul),
            "div" => Some(Self::Div),
            _ => None,
        }
    }

    /// Applies the operator. Division by zero yields `None`.
    pub fn apply(self, a: f64, b: f64) -> Option<f64> {
        match self {
            Self::Add => Some(a + b),
            Self::Sub => Some(a - b),
            Self::Mul => Some(a * b),
            Self::Div if b == 0.0 => None,
            Self::Div => Some(a / b),
        }
    }
}

/// `a op b` for `op` in add, sub, mul, div.
#[derive(Debug, Clone, Copy, Default)]
pub struct MathOpAction;

#[async_trait::async_trait]
impl ActionHandler for MathOpAction {
    async fn invoke(&self, action_name: &str, params: Value, _context: &ExternalContext) -> Result<Value, ActionError> {
        let op = string_param(action_name, &params, "op")?;
        let operator = MathOperator::parse(op)
            .ok_or_else(|| ActionError::invalid_param(action_name, "op", format!("unknown operator '{op}'")))?;
        let a = number_value(action_name, "a", required_param(action_name, &params, "a")?)?;
        let b = number_value(action_name, "b", required_param(action_name, &params, "b")?)?;

        Ok(operator.apply(a, b).map_or(Value::Null, number_to_value))
    }
}

/// Converts an arithmetic result to JSON, keeping integral results as integers.
fn number_to_value(result: f64) -> Value {
    if !result.is_finite() {
        return Value::Null;
    }
    if result.fract() == 0.0 && result.abs() < i64::MAX as f64 {
        return Value::from(result as i64);
    }
    Number::from_f64(result).map_or(Value::Null, Value::Number)
}
