//! # Text Processing Utilities
//!
//! Redaction helpers used before request details or action parameters reach the logs.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Placeholder substituted for secret values.
pub const REDACTED: &str = "[REDACTED]";

/// Header or field names whose values are always treated as secrets.
const SENSITIVE_KEYS: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "api_key",
    "apikey",
    "password",
    "secret",
    "token",
    "access_token",
    "refresh_token",
];

/// Redacts values that look like secrets in a string.
///
/// # Example
/// ```rust
/// use cadence_util::text_processing::redact_sensitive;
///
/// assert_eq!(redact_sensitive("API_KEY=abc123 TOKEN=xyz789"), "API_KEY=[REDACTED] TOKEN=[REDACTED]");
/// assert_eq!(redact_sensitive("Authorization: Bearer secret123"), "Authorization: [REDACTED]");
/// ```
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for pattern in redact_patterns().iter() {
        redacted = pattern
            .replace_all(&redacted, |captures: &regex::Captures| {
                let prefix = captures.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{prefix}{REDACTED}")
            })
            .to_string();
    }
    redacted
}

/// Returns true when a header or field name is known to carry credentials.
pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_ascii_lowercase();
    SENSITIVE_KEYS.iter().any(|candidate| *candidate == normalized)
}

/// Redacts every string in a JSON tree. Values under sensitive keys are replaced entirely.
pub fn redact_json(value: &Value) -> Value {
    match value {
        Value::String(text) => Value::String(redact_sensitive(text)),
        Value::Array(items) => Value::Array(items.iter().map(redact_json).collect()),
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, nested) in map {
                let redacted = if is_sensitive_key(key) {
                    Value::String(REDACTED.to_string())
                } else {
                    redact_json(nested)
                };
                out.insert(key.clone(), redacted);
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

fn redact_patterns() -> &'static Vec<Regex> {
    static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
        [
            r"(?i)(authorization:\s*)(\S+(?:\s+\S+)*)",
            r"(?i)((?:^|\b)Bearer\s+)([A-Za-z0-9\-._~+/]+=*)",
            r"(?i)(\b[A-Z0-9_]*(?:KEY|TOKEN|SECRET|PASSWORD)=)(\S+)",
            r"(?i)(\bDATABASE_URL=)(\S+)",
        ]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
    });
    &PATTERNS
}
