//! Shared template parsing and diagnostics helpers.

use crate::resolve::TemplateScope;
use serde_json::Value;

/// Roots a placeholder may start with.
pub const TEMPLATE_ROOTS: &[&str] = &["input", "globals", "user", "lastResult"];

/// Structured unresolved template reference diagnostic.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UnresolvedTemplateRef {
    /// Source path where the template was found (for example `params.headers.Authorization`).
    pub source_path: String,
    /// Raw template expression without delimiters.
    pub expression: String,
}

/// Extracts template expressions from a string value.
///
/// Returned expressions do not include `{{` or `}}` delimiters and are trimmed.
pub fn extract_template_expressions(value: &str) -> Vec<String> {
    let mut expressions = Vec::new();
    let mut remainder = value;

    while let Some(start) = remainder.find("{{") {
        let after_start = &remainder[start + 2..];
        let Some(end) = after_start.find("}}") else {
            break;
        };
        expressions.push(after_start[..end].trim().to_string());
        remainder = &after_start[end + 2..];
    }

    expressions
}

/// Calls `visit(source_path, expression)` for every placeholder in a JSON value tree.
pub fn visit_template_expressions(value: &Value, source_path: &str, visit: &mut impl FnMut(&str, String)) {
    match value {
        Value::String(raw_text) => {
            for expression in extract_template_expressions(raw_text) {
                visit(source_path, expression);
            }
        }
        Value::Array(values) => {
            for (index, nested_value) in values.iter().enumerate() {
                visit_template_expressions(nested_value, format!("{source_path}[{index}]").as_str(), visit);
            }
        }
        Value::Object(map) => {
            for (key, nested_value) in map {
                visit_template_expressions(nested_value, format!("{source_path}.{key}").as_str(), visit);
            }
        }
        _ => {}
    }
}

/// Collect unresolved template references from an arbitrary JSON value tree.
pub fn collect_unresolved_templates_from_value(
    value: &Value,
    source_path: &str,
    scope: &impl TemplateScope,
    unresolved: &mut Vec<UnresolvedTemplateRef>,
) {
    visit_template_expressions(value, source_path, &mut |path, expression| {
        if scope.lookup(expression.as_str()).is_none() {
            unresolved.push(UnresolvedTemplateRef {
                source_path: path.to_string(),
                expression,
            });
        }
    });
}

/// Returns true when the expression starts with one of [`TEMPLATE_ROOTS`].
pub fn has_known_root(expression: &str) -> bool {
    let head = expression.split('.').next().unwrap_or_default();
    TEMPLATE_ROOTS.contains(&head)
}
