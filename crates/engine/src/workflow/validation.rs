//! Static checks for workflow definitions.
//!
//! Validation never executes actions. It reports empty or unregistered action names and
//! placeholders whose root is not one of the execution-context roots. Inline definitions passed
//! to `callWorkflow` are checked recursively.

use std::fmt;

use cadence_types::WorkflowDefinition;
use serde_json::Value;

use crate::{
    action::{ActionRegistry, builtin::CALL_WORKFLOW},
    templates::{TEMPLATE_ROOTS, has_known_root, visit_template_expressions},
};

/// A single problem found in a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Location of the problem, for example `steps[1].params.url`.
    pub location: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Returns every issue found in `definition`; an empty list means the definition is valid.
pub fn validate_workflow(definition: &WorkflowDefinition, registry: &ActionRegistry) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    validate_steps(definition, registry, "steps", &mut issues);
    issues
}

fn validate_steps(definition: &WorkflowDefinition, registry: &ActionRegistry, prefix: &str, issues: &mut Vec<ValidationIssue>) {
    for (index, step) in definition.steps.iter().enumerate() {
        let location = format!("{prefix}[{index}]");
        let action_name = step.action_name.trim();

        if action_name.is_empty() {
            issues.push(ValidationIssue {
                location: format!("{location}.actionName"),
                message: "action name is empty".into(),
            });
        } else if !registry.contains(&step.action_name) {
            issues.push(ValidationIssue {
                location: format!("{location}.actionName"),
                message: format!("unknown action '{}'", step.action_name),
            });
        }

        if let Some(condition) = step.r#if.as_deref() {
            check_placeholders(&Value::String(condition.to_string()), &format!("{location}.if"), issues);
        }

        let Some(params) = step.params.as_ref() else {
            continue;
        };

        if step.action_name == CALL_WORKFLOW
            && let Some(inline @ Value::Object(_)) = params.get("workflow")
        {
            let nested_prefix = format!("{location}.params.workflow.steps");
            match serde_json::from_value::<WorkflowDefinition>(inline.clone()) {
                Ok(nested) => validate_steps(&nested, registry, &nested_prefix, issues),
                Err(error) => issues.push(ValidationIssue {
                    location: format!("{location}.params.workflow"),
                    message: format!("invalid inline workflow: {error}"),
                }),
            }
            for (key, value) in params.iter().filter(|(key, _)| key.as_str() != "workflow") {
                check_placeholders(value, &format!("{location}.params.{key}"), issues);
            }
            continue;
        }

        for (key, value) in params {
            check_placeholders(value, &format!("{location}.params.{key}"), issues);
        }
    }
}

fn check_placeholders(value: &Value, source_path: &str, issues: &mut Vec<ValidationIssue>) {
    visit_template_expressions(value, source_path, &mut |path, expression| {
        if !has_known_root(&expression) {
            issues.push(ValidationIssue {
                location: path.to_string(),
                message: format!(
                    "placeholder '{{{{{expression}}}}}' does not start with one of: {}",
                    TEMPLATE_ROOTS.join(", ")
                ),
            });
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::BuiltInOptions;
    use cadence_types::WorkflowStep;
    use serde_json::json;

    fn registry() -> ActionRegistry {
        ActionRegistry::with_built_ins(BuiltInOptions::default())
    }

    #[test]
    fn valid_definition_has_no_issues() {
        let definition = WorkflowDefinition::new(vec![
            WorkflowStep::new("log").with_params(json!({ "message": "hi {{user.name}}" })),
            WorkflowStep::new("mathOp")
                .with_params(json!({ "op": "add", "a": "{{lastResult}}", "b": 1 }))
                .with_condition("{{globals.enabled}}"),
        ]);
        assert!(validate_workflow(&definition, &registry()).is_empty());
    }

    #[test]
    fn reports_empty_and_unknown_actions() {
        let definition = WorkflowDefinition::new(vec![WorkflowStep::new(" "), WorkflowStep::new("doesNotExist")]);
        let issues = validate_workflow(&definition, &registry());

        assert_eq!(
            issues,
            vec![
                ValidationIssue {
                    location: "steps[0].actionName".into(),
                    message: "action name is empty".into()
                },
                ValidationIssue {
                    location: "steps[1].actionName".into(),
                    message: "unknown action 'doesNotExist'".into()
                },
            ]
        );
    }

    #[test]
    fn reports_placeholders_with_unknown_roots() {
        let definition = WorkflowDefinition::new(vec![
            WorkflowStep::new("log")
                .with_params(json!({ "message": "{{flag}}" }))
                .with_condition("{{ env.DEBUG }}"),
        ]);
        let issues = validate_workflow(&definition, &registry());
        let locations: Vec<&str> = issues.iter().map(|issue| issue.location.as_str()).collect();

        assert_eq!(locations, vec!["steps[0].if", "steps[0].params.message"]);
        assert_eq!(
            issues[1].to_string(),
            "steps[0].params.message: placeholder '{{flag}}' does not start with one of: input, globals, user, lastResult"
        );
    }

    #[test]
    fn recurses_into_inline_call_workflow_definitions() {
        let definition = WorkflowDefinition::new(vec![WorkflowStep::new("callWorkflow").with_params(json!({
            "workflow": { "steps": [ { "actionName": "missing" } ] },
            "input": { "name": "{{input.name}}" }
        }))]);
        let issues = validate_workflow(&definition, &registry());

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].location, "steps[0].params.workflow.steps[0].actionName");
    }
}
