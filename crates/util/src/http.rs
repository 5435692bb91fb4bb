//! # HTTP Utilities
//!
//! Helpers for turning loosely typed JSON request descriptions into concrete request parts and
//! for decoding response bodies.

use serde_json::{Map, Value};

use crate::text_processing::{REDACTED, is_sensitive_key, redact_sensitive};

/// Parse response text as JSON, falling back to the raw text.
///
/// # Example
/// ```rust
/// use cadence_util::http::parse_response_body;
/// use serde_json::json;
///
/// assert_eq!(parse_response_body(r#"{"ok": true}"#), json!({"ok": true}));
/// assert_eq!(parse_response_body("plain text"), json!("plain text"));
/// ```
pub fn parse_response_body(text: &str) -> Value {
    serde_json::from_str::<Value>(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Converts a JSON header mapping into `(name, value)` pairs.
///
/// Non-string values are rendered as compact JSON, null values are dropped, and
/// non-object inputs yield no headers.
pub fn header_pairs(headers: Option<&Value>) -> Vec<(String, String)> {
    let Some(Value::Object(map)) = headers else {
        return Vec::new();
    };
    map.iter()
        .filter_map(|(name, value)| match value {
            Value::Null => None,
            Value::String(text) => Some((name.clone(), text.clone())),
            other => Some((name.clone(), other.to_string())),
        })
        .collect()
}

/// Request body encodings derived from a JSON `body` parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Objects and arrays are sent as JSON.
    Json(Value),
    /// Strings are sent verbatim.
    Text(String),
}

/// Classifies a JSON body parameter. Null or absent bodies produce `None`.
pub fn request_body(body: Option<&Value>) -> Option<RequestBody> {
    match body? {
        Value::Null => None,
        Value::String(text) => Some(RequestBody::Text(text.clone())),
        other => Some(RequestBody::Json(other.clone())),
    }
}

/// Builds the `{status, data}` envelope returned to workflow steps.
pub fn response_envelope(status: u16, body_text: &str) -> Value {
    let mut envelope = Map::new();
    envelope.insert("status".into(), Value::from(status));
    envelope.insert("data".into(), parse_response_body(body_text));
    Value::Object(envelope)
}

/// Renders a header as `name: value` for logging.
///
/// Values of credential-bearing headers (see [`is_sensitive_key`]) are replaced outright; other
/// values still pass through [`redact_sensitive`].
pub fn redact_header(name: &str, value: &str) -> String {
    if is_sensitive_key(name) {
        return format!("{name}: {REDACTED}");
    }
    redact_sensitive(&format!("{name}: {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn header_pairs_stringifies_values() {
        let headers = json!({ "X-Count": 3, "Accept": "application/json", "X-Skip": null });
        let mut pairs = header_pairs(Some(&headers));
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("X-Count".to_string(), "3".to_string()),
            ]
        );
        assert!(header_pairs(Some(&json!("nope"))).is_empty());
    }

    #[test]
    fn request_body_classification() {
        assert_eq!(request_body(None), None);
        assert_eq!(request_body(Some(&Value::Null)), None);
        assert_eq!(request_body(Some(&json!("raw"))), Some(RequestBody::Text("raw".into())));
        assert_eq!(request_body(Some(&json!({"a": 1}))), Some(RequestBody::Json(json!({"a": 1}))));
    }

    #[test]
    fn envelope_parses_json_when_possible() {
        assert_eq!(response_envelope(201, "[1,2]"), json!({ "status": 201, "data": [1, 2] }));
        assert_eq!(response_envelope(500, "boom"), json!({ "status": 500, "data": "boom" }));
    }

    #[test]
    fn credential_headers_are_redacted_for_logging() {
        assert_eq!(redact_header("X-Api-Key", "s3cr3t"), "X-Api-Key: [REDACTED]");
        assert_eq!(redact_header("Cookie", "session=s3cr3t"), "Cookie: [REDACTED]");
        assert_eq!(redact_header("authorization", "Bearer abc"), "authorization: [REDACTED]");
        assert_eq!(redact_header("X-Trace", "TOKEN=abc"), "X-Trace: TOKEN=[REDACTED]");
        assert_eq!(redact_header("Accept", "application/json"), "Accept: application/json");
    }
}
