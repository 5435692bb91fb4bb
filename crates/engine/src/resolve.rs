//! # Path Resolution, Template Interpolation, and Condition Evaluation
//!
//! This module implements the value-level semantics of a workflow run:
//!
//! - **Path Resolution**: walk a dotted key path (`globals.user.name`) through nested mappings
//! - **Template Interpolation**: replace `{{ path }}` placeholders in strings, recursively
//!   through arrays and objects
//! - **Condition Evaluation**: textual truthiness of an interpolated `if` expression
//!
//! ## Template Syntax
//!
//! - `{{ input.field }}` - caller-supplied seed data
//! - `{{ globals.field }}` - shared mutable state
//! - `{{ user.field }}` - identity/session data
//! - `{{ lastResult.field }}` - result of the most recently executed step
//!
//! Placeholders that resolve to nothing (or to null) become the empty string. There is no
//! escape syntax for a literal `{{`, and an opening `{{` without a closing `}}` is left as-is.
//!
//! ## Usage
//!
//! ```rust
//! use cadence_engine::resolve::{ExecutionContext, eval_condition, interpolate_value};
//! use serde_json::json;
//!
//! let context = ExecutionContext::new(json!({ "env": "production" }), json!({}), json!({ "name": "ada" }));
//!
//! let value = json!({ "greeting": "hello {{ user.name }} in {{input.env}}" });
//! assert_eq!(interpolate_value(&value, &context)["greeting"], "hello ada in production");
//! assert!(eval_condition(Some("{{ input.env }}"), &context));
//! ```

use serde_json::{Map, Number, Value};

/// Anything placeholders can be resolved against.
pub trait TemplateScope {
    /// Resolves a dotted path, returning `None` when any segment is missing or not traversable.
    fn lookup(&self, path: &str) -> Option<&Value>;
}

impl TemplateScope for Value {
    fn lookup(&self, path: &str) -> Option<&Value> {
        resolve_path(self, path)
    }
}

/// Per-run state used for interpolation and condition evaluation.
///
/// Created fresh for every run and owned by the runner. `input`, `globals`, and `user` are always
/// JSON objects; `last_result` is unset until a step executes successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionContext {
    /// Read-only seed data supplied by the caller.
    pub input: Value,
    /// Caller-supplied shared state. Refreshed from the external context before every step.
    pub globals: Value,
    /// Caller-supplied identity/session data.
    pub user: Value,
    /// Result of the most recently executed step.
    pub last_result: Option<Value>,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            input: empty_object(),
            globals: empty_object(),
            user: empty_object(),
            last_result: None,
        }
    }
}

impl ExecutionContext {
    /// Seeds a context. Values that are not JSON objects are replaced by empty objects.
    pub fn new(input: Value, globals: Value, user: Value) -> Self {
        Self {
            input: object_or_empty(input),
            globals: object_or_empty(globals),
            user: object_or_empty(user),
            last_result: None,
        }
    }

    /// Replaces the `globals` view, typically with a fresh snapshot of shared state.
    pub fn set_globals(&mut self, globals: Value) {
        self.globals = object_or_empty(globals);
    }

    /// Builds the interpolation root as a single JSON object.
    pub fn to_value(&self) -> Value {
        let mut root = Map::new();
        root.insert("input".into(), self.input.clone());
        root.insert("globals".into(), self.globals.clone());
        root.insert("user".into(), self.user.clone());
        if let Some(last_result) = &self.last_result {
            root.insert("lastResult".into(), last_result.clone());
        }
        Value::Object(root)
    }
}

impl TemplateScope for ExecutionContext {
    fn lookup(&self, path: &str) -> Option<&Value> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let root = match head {
            "input" => &self.input,
            "globals" => &self.globals,
            "user" => &self.user,
            "lastResult" => self.last_result.as_ref()?,
            _ => return None,
        };
        match rest {
            Some(rest) => resolve_path(root, rest),
            None => Some(root),
        }
    }
}

/// Resolves a dot-separated key path against a nested object graph.
///
/// Only object keys are supported; there is no array-index syntax and no escaping of literal
/// dots. Traversal stops with `None` as soon as a segment is missing or the current value is not
/// an object.
///
/// ```rust
/// use cadence_engine::resolve::resolve_path;
/// use serde_json::json;
///
/// let root = json!({ "globals": { "user": { "name": "ada" } } });
/// assert_eq!(resolve_path(&root, "globals.user.name"), Some(&json!("ada")));
/// assert_eq!(resolve_path(&root, "globals.missing.name"), None);
/// ```
pub fn resolve_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |current, key| match current {
        Value::Object(map) => map.get(key),
        _ => None,
    })
}

/// Recursively interpolates all `{{ ... }}` placeholders in a JSON value.
///
/// Strings are interpolated, arrays and objects are rebuilt element by element, and every other
/// value is returned unchanged. The input is never mutated.
pub fn interpolate_value(value: &Value, scope: &impl TemplateScope) -> Value {
    match value {
        Value::String(text) => Value::String(interpolate_string(text, scope)),
        Value::Array(items) => Value::Array(items.iter().map(|item| interpolate_value(item, scope)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, nested)| (key.clone(), interpolate_value(nested, scope)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Interpolates placeholders in a single string.
///
/// Each `{{expr}}` is replaced by the string form of `scope.lookup(expr.trim())`. Missing and
/// null values render as the empty string. Text outside placeholders is preserved verbatim.
pub fn interpolate_string(input: &str, scope: &impl TemplateScope) -> String {
    let mut output = String::with_capacity(input.len());
    let mut remaining = input;

    while let Some(start) = remaining.find("{{") {
        let (before, from_marker) = remaining.split_at(start);
        output.push_str(before);

        let after_open = &from_marker[2..];
        let Some(end) = after_open.find("}}") else {
            // unterminated placeholder
            output.push_str(from_marker);
            return output;
        };

        let expression = after_open[..end].trim();
        if let Some(resolved) = scope.lookup(expression) {
            output.push_str(&stringify_value(resolved));
        }
        remaining = &after_open[end + 2..];
    }

    output.push_str(remaining);
    output
}

/// Evaluates a step gate.
///
/// An absent or empty condition is true. Otherwise the condition is interpolated, trimmed, and
/// lowercased; the result is false only for `""`, `"false"`, and `"0"`. No operators are
/// understood: composite conditions must be computed by an earlier step and referenced through a
/// placeholder.
pub fn eval_condition(condition: Option<&str>, scope: &impl TemplateScope) -> bool {
    let Some(condition) = condition.filter(|condition| !condition.is_empty()) else {
        return true;
    };
    let normalized = interpolate_string(condition, scope).trim().to_lowercase();
    !matches!(normalized.as_str(), "" | "false" | "0")
}

/// Renders a JSON value the way it appears inside an interpolated string.
///
/// Strings render without quotes, null renders empty, integral floats drop their fraction, and
/// arrays/objects render as compact JSON.
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => format_number(number),
        other => other.to_string(),
    }
}

/// JSON truthiness: null, false, zero, NaN, and the empty string are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|number| number != 0.0 && !number.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn format_number(number: &Number) -> String {
    if number.is_f64()
        && let Some(float) = number.as_f64()
        && float.fract() == 0.0
        && float.abs() < 1e15
    {
        return format!("{}", float as i64);
    }
    number.to_string()
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn object_or_empty(value: Value) -> Value {
    match value {
        Value::Object(_) => value,
        _ => empty_object(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> ExecutionContext {
        let mut context = ExecutionContext::new(
            json!({ "flag": "yes", "count": 3, "nested": { "deep": { "value": "x" } } }),
            json!({ "theme": "dark" }),
            json!({ "name": "ada", "roles": ["admin", "dev"] }),
        );
        context.last_result = Some(json!({ "id": 7, "ok": true }));
        context
    }

    #[test]
    fn resolve_path_walks_nested_objects() {
        let root = json!({ "a": { "b": "x" } });
        assert_eq!(resolve_path(&root, "a.b"), Some(&json!("x")));
        assert_eq!(resolve_path(&root, "a"), Some(&json!({ "b": "x" })));
        assert_eq!(resolve_path(&json!({ "a": {} }), "a.b"), None);
    }

    #[test]
    fn resolve_path_stops_at_null_and_scalars() {
        let root = json!({ "a": null, "s": "text", "arr": [1, 2] });
        assert_eq!(resolve_path(&root, "a.b"), None);
        assert_eq!(resolve_path(&root, "s.length"), None);
        assert_eq!(resolve_path(&root, "arr.0"), None);
        assert_eq!(resolve_path(&root, "a"), Some(&Value::Null));
    }

    #[test]
    fn interpolating_plain_text_is_identity() {
        let scope = json!({});
        for text in ["", "plain", "a { b } c", "}} {"] {
            assert_eq!(interpolate_string(text, &scope), text);
        }
    }

    #[test]
    fn missing_paths_become_empty() {
        assert_eq!(interpolate_string("{{a.b}}", &json!({ "a": { "b": "x" } })), "x");
        assert_eq!(interpolate_string("{{a.b}}", &json!({ "a": {} })), "");
        assert_eq!(interpolate_string("[{{ a.n }}]", &json!({ "a": { "n": null } })), "[]");
    }

    #[test]
    fn multiple_placeholders_and_literal_text() {
        let rendered = interpolate_string("{{ user.name }} has {{input.count}} items ({{ lastResult.ok }})", &context());
        assert_eq!(rendered, "ada has 3 items (true)");
    }

    #[test]
    fn unterminated_placeholder_is_preserved() {
        assert_eq!(interpolate_string("a {{ user.name }} b {{ user.name", &context()), "a ada b {{ user.name");
    }

    #[test]
    fn containers_render_as_json() {
        assert_eq!(interpolate_string("{{user.roles}}", &context()), r#"["admin","dev"]"#);
        assert_eq!(interpolate_string("{{lastResult}}", &context()), r#"{"id":7,"ok":true}"#);
    }

    #[test]
    fn integral_floats_render_without_fraction() {
        assert_eq!(stringify_value(&json!(42.0)), "42");
        assert_eq!(stringify_value(&json!(1.5)), "1.5");
        assert_eq!(stringify_value(&json!(-7)), "-7");
    }

    #[test]
    fn interpolate_value_preserves_structure_and_scalars() {
        let value = json!({
            "list": ["{{ input.flag }}", 1, null, false],
            "map": { "inner": "{{input.nested.deep.value}}" },
            "number": 4.5
        });
        let rendered = interpolate_value(&value, &context());
        assert_eq!(
            rendered,
            json!({
                "list": ["yes", 1, null, false],
                "map": { "inner": "x" },
                "number": 4.5
            })
        );
        assert_eq!(value["list"][0], "{{ input.flag }}");
    }

    #[test]
    fn unknown_roots_do_not_resolve() {
        assert_eq!(context().lookup("flag"), None);
        assert_eq!(context().lookup("env.HOME"), None);
    }

    #[test]
    fn last_result_is_absent_until_set() {
        let context = ExecutionContext::default();
        assert_eq!(context.lookup("lastResult"), None);
        assert_eq!(interpolate_string("[{{lastResult}}]", &context), "[]");
    }

    #[test]
    fn non_object_seeds_become_empty_objects() {
        let context = ExecutionContext::new(json!("x"), Value::Null, json!([1]));
        assert_eq!(context.input, json!({}));
        assert_eq!(context.globals, json!({}));
        assert_eq!(context.user, json!({}));
    }

    #[test]
    fn empty_and_absent_conditions_are_true() {
        let scope = json!({});
        assert!(eval_condition(None, &scope));
        assert!(eval_condition(Some(""), &scope));
    }

    #[test]
    fn falsy_strings_are_false() {
        let scope = json!({});
        assert!(!eval_condition(Some("false"), &scope));
        assert!(!eval_condition(Some("0"), &scope));
        assert!(!eval_condition(Some("  FALSE  "), &scope));
        assert!(!eval_condition(Some("{{ missing.path }}"), &scope));
    }

    #[test]
    fn conditions_follow_interpolated_values() {
        let mut context = context();
        assert!(eval_condition(Some("{{input.flag}}"), &context));
        context.input = json!({ "flag": "0" });
        assert!(!eval_condition(Some("{{input.flag}}"), &context));
        context.input = json!({ "flag": false });
        assert!(!eval_condition(Some("{{ input.flag }}"), &context));
        assert!(eval_condition(Some("a && b"), &context));
    }

    #[test]
    fn truthiness_matches_json_semantics() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("false")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!(0.5)));
    }

    #[test]
    fn to_value_exposes_every_root() {
        let root = context().to_value();
        assert_eq!(resolve_path(&root, "lastResult.id"), Some(&json!(7)));
        assert_eq!(resolve_path(&root, "globals.theme"), Some(&json!("dark")));
    }
}
