//! Built-ins that reach caller capabilities: `showToast`, `navigate`, `wait`, `callWorkflow`.

use std::time::Duration;

use cadence_types::WorkflowDefinition;
use serde_json::Value;
use tracing::{debug, info};

use super::{number_param, param, required_param};
use crate::{action::ActionHandler, context::ExternalContext, error::ActionError, resolve::stringify_value};

/// Sends `message` to the caller's notifier, or logs it when none is supplied.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShowToastAction;

#[async_trait::async_trait]
impl ActionHandler for ShowToastAction {
    async fn invoke(&self, action_name: &str, params: Value, context: &ExternalContext) -> Result<Value, ActionError> {
        let message = params.get("message").cloned().unwrap_or(Value::Null);
        let text = stringify_value(&message);
        match context.notifier() {
            Some(notifier) => notifier.notify(&text),
            None => info!(action = %action_name, message = %text, "toast"),
        }
        Ok(message)
    }
}

/// Delegates `target` to the caller's navigator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NavigateAction;

#[async_trait::async_trait]
impl ActionHandler for NavigateAction {
    async fn invoke(&self, action_name: &str, params: Value, context: &ExternalContext) -> Result<Value, ActionError> {
        let navigator = context
            .navigator()
            .ok_or_else(|| ActionError::missing_capability(action_name, "navigator"))?;
        let target = required_param(action_name, &params, "target")?;
        navigator
            .navigate(target)
            .await
            .map_err(|error| ActionError::failed(action_name, format!("{error:#}")))
    }
}

/// Sleeps for `ms` milliseconds, or the configured default.
#[derive(Debug, Clone, Copy)]
pub struct WaitAction {
    default_wait: Duration,
}

impl WaitAction {
    pub fn new(default_wait: Duration) -> Self {
        Self { default_wait }
    }
}

#[async_trait::async_trait]
impl ActionHandler for WaitAction {
    async fn invoke(&self, action_name: &str, params: Value, _context: &ExternalContext) -> Result<Value, ActionError> {
        let duration = match number_param(action_name, &params, "ms")? {
            Some(ms) if ms >= 0.0 => Duration::try_from_secs_f64(ms / 1000.0)
                .map_err(|_| ActionError::invalid_param(action_name, "ms", format!("{ms} is out of range")))?,
            Some(ms) => return Err(ActionError::invalid_param(action_name, "ms", format!("expected a non-negative number, got {ms}"))),
            None => self.default_wait,
        };
        let wait_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        debug!(action = %action_name, wait_ms, "waiting");
        tokio::time::sleep(duration).await;
        Ok(Value::Null)
    }
}

/// Runs a nested workflow through the caller's workflow invoker.
///
/// `workflow` is either an inline definition or the name of a workflow in the context catalog.
/// The nested run shares the caller's data store; `input`, when given, replaces the nested
/// run's input seed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallWorkflowAction;

impl CallWorkflowAction {
    fn definition(action_name: &str, params: &Value, context: &ExternalContext) -> Result<WorkflowDefinition, ActionError> {
        match required_param(action_name, params, "workflow")? {
            Value::String(name) => {
                let catalog = context
                    .catalog()
                    .ok_or_else(|| ActionError::missing_capability(action_name, "catalog"))?;
                catalog
                    .get(name)
                    .cloned()
                    .ok_or_else(|| ActionError::invalid_param(action_name, "workflow", format!("no workflow named '{name}'")))
            }
            inline @ Value::Object(_) => serde_json::from_value(inline.clone())
                .map_err(|error| ActionError::invalid_param(action_name, "workflow", error.to_string())),
            other => Err(ActionError::invalid_param(
                action_name,
                "workflow",
                format!("expected a definition object or workflow name, got {other}"),
            )),
        }
    }
}

#[async_trait::async_trait]
impl ActionHandler for CallWorkflowAction {
    async fn invoke(&self, action_name: &str, params: Value, context: &ExternalContext) -> Result<Value, ActionError> {
        let invoker = context
            .workflow_invoker()
            .ok_or_else(|| ActionError::missing_capability(action_name, "workflow_invoker"))?;
        let definition = Self::definition(action_name, &params, context)?;

        let depth = context.depth() + 1;
        if let Some(limit) = context.max_nesting_depth()
            && depth > limit
        {
            return Err(ActionError::NestingLimit {
                action: action_name.to_string(),
                depth,
                limit,
            });
        }

        let nested_context = context.nested(param(&params, "input").cloned());
        debug!(action = %action_name, depth, steps = definition.steps.len(), "starting nested workflow");
        let last_result = invoker
            .run_nested(definition, nested_context)
            .await
            .map_err(|source| ActionError::NestedRun {
                action: action_name.to_string(),
                source: Box::new(source),
            })?;
        Ok(last_result.unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::{Navigator, Notifier, WorkflowInvoker},
        error::RunError,
    };
    use cadence_types::{WorkflowBundle, WorkflowStep};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, message: &str) {
            self.messages.lock().expect("lock").push(message.to_string());
        }
    }

    struct EchoNavigator;

    #[async_trait::async_trait]
    impl Navigator for EchoNavigator {
        async fn navigate(&self, target: &Value) -> anyhow::Result<Value> {
            if target == "nowhere" {
                anyhow::bail!("no route for {target}");
            }
            Ok(json!({ "navigated": target }))
        }
    }

    /// Reports the step count, depth, and input seed of each nested run.
    struct InspectingInvoker;

    #[async_trait::async_trait]
    impl WorkflowInvoker for InspectingInvoker {
        async fn run_nested(&self, definition: WorkflowDefinition, context: ExternalContext) -> Result<Option<Value>, RunError> {
            let seeded = context.seed_execution_context().await;
            Ok(Some(json!({
                "steps": definition.steps.len(),
                "depth": context.depth(),
                "input": seeded.input,
            })))
        }
    }

    #[tokio::test]
    async fn toast_uses_notifier_when_present() {
        let notifier = Arc::new(RecordingNotifier::default());
        let context = ExternalContext::builder().notifier(notifier.clone()).build();
        let result = ShowToastAction
            .invoke("showToast", json!({ "message": "saved" }), &context)
            .await
            .expect("toast");

        assert_eq!(result, json!("saved"));
        assert_eq!(*notifier.messages.lock().expect("lock"), vec!["saved".to_string()]);

        let result = ShowToastAction
            .invoke("showToast", json!({ "message": "logged" }), &ExternalContext::new())
            .await
            .expect("fallback");
        assert_eq!(result, json!("logged"));
    }

    #[tokio::test]
    async fn navigate_requires_navigator() {
        let error = NavigateAction
            .invoke("navigate", json!({ "target": "/home" }), &ExternalContext::new())
            .await
            .expect_err("no navigator");
        assert!(matches!(error, ActionError::MissingCapability { ref capability, .. } if capability == "navigator"));

        let context = ExternalContext::builder().navigator(Arc::new(EchoNavigator)).build();
        let result = NavigateAction
            .invoke("navigate", json!({ "target": "/home" }), &context)
            .await
            .expect("navigate");
        assert_eq!(result, json!({ "navigated": "/home" }));

        let error = NavigateAction
            .invoke("navigate", json!({ "target": "nowhere" }), &context)
            .await
            .expect_err("navigator failure");
        assert!(matches!(error, ActionError::Failed { .. }));
    }

    #[tokio::test]
    async fn wait_sleeps_and_returns_null() {
        let action = WaitAction::new(Duration::from_millis(40));
        let started = std::time::Instant::now();
        let result = action.invoke("wait", json!({}), &ExternalContext::new()).await.expect("wait");
        assert_eq!(result, Value::Null);
        assert!(started.elapsed() >= Duration::from_millis(40));

        let started = std::time::Instant::now();
        action.invoke("wait", json!({ "ms": "10" }), &ExternalContext::new()).await.expect("wait");
        assert!(started.elapsed() >= Duration::from_millis(10));

        let error = action
            .invoke("wait", json!({ "ms": -1 }), &ExternalContext::new())
            .await
            .expect_err("negative");
        assert!(matches!(error, ActionError::InvalidParam { .. }));
    }

    #[tokio::test]
    async fn wait_rejects_durations_out_of_range() {
        let action = WaitAction::new(Duration::from_millis(1));
        for ms in [json!(1e30), json!("1e300")] {
            let error = action
                .invoke("wait", json!({ "ms": ms }), &ExternalContext::new())
                .await
                .expect_err("out of range");
            assert!(matches!(error, ActionError::InvalidParam { ref param, .. } if param == "ms"), "{ms}");
        }
    }

    #[tokio::test]
    async fn call_workflow_requires_invoker() {
        let error = CallWorkflowAction
            .invoke("callWorkflow", json!({ "workflow": { "steps": [] } }), &ExternalContext::new())
            .await
            .expect_err("no invoker");
        assert!(matches!(error, ActionError::MissingCapability { ref capability, .. } if capability == "workflow_invoker"));
    }

    #[tokio::test]
    async fn call_workflow_passes_inline_definition_and_input() {
        let context = ExternalContext::builder()
            .input(json!({ "outer": true }))
            .workflow_invoker(Arc::new(InspectingInvoker))
            .build();
        let params = json!({
            "workflow": { "steps": [{ "actionName": "log", "params": { "message": "x" } }] },
            "input": { "inner": 1 }
        });

        let result = CallWorkflowAction.invoke("callWorkflow", params, &context).await.expect("nested");
        assert_eq!(result, json!({ "steps": 1, "depth": 1, "input": { "inner": 1 } }));

        let result = CallWorkflowAction
            .invoke("callWorkflow", json!({ "workflow": { "steps": [] } }), &context)
            .await
            .expect("nested without input");
        assert_eq!(result["input"], json!({ "outer": true }));
    }

    #[tokio::test]
    async fn call_workflow_resolves_catalog_names() {
        let mut bundle = WorkflowBundle::default();
        bundle.workflows.insert(
            "greet".into(),
            WorkflowDefinition::new(vec![WorkflowStep::new("log"), WorkflowStep::new("log")]),
        );
        let context = ExternalContext::builder()
            .workflow_invoker(Arc::new(InspectingInvoker))
            .catalog(Arc::new(bundle))
            .build();

        let result = CallWorkflowAction
            .invoke("callWorkflow", json!({ "workflow": "greet" }), &context)
            .await
            .expect("catalog");
        assert_eq!(result["steps"], json!(2));

        let error = CallWorkflowAction
            .invoke("callWorkflow", json!({ "workflow": "missing" }), &context)
            .await
            .expect_err("unknown name");
        assert!(matches!(error, ActionError::InvalidParam { .. }));
    }

    #[tokio::test]
    async fn call_workflow_enforces_nesting_limit() {
        let context = ExternalContext::builder()
            .workflow_invoker(Arc::new(InspectingInvoker))
            .max_nesting_depth(Some(1))
            .build();
        let params = json!({ "workflow": { "steps": [] } });

        CallWorkflowAction
            .invoke("callWorkflow", params.clone(), &context)
            .await
            .expect("first level");
        let error = CallWorkflowAction
            .invoke("callWorkflow", params, &context.nested(None))
            .await
            .expect_err("too deep");
        assert!(matches!(error, ActionError::NestingLimit { depth: 2, limit: 1, .. }));
    }
}
