//! `httpRequest`: performs an HTTP call and returns `{status, data}`.

use cadence_util::{
    http::{RequestBody, header_pairs, redact_header, request_body, response_envelope},
    redact_sensitive,
};
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;

use super::{param, string_param};
use crate::{action::ActionHandler, context::ExternalContext, error::ActionError};

/// Sends one request with the shared client.
///
/// `method` defaults to `GET`. Object and array bodies are sent as JSON, string bodies verbatim.
/// Non-2xx responses are not errors; the status is reported in the envelope.
#[derive(Debug, Clone)]
pub struct HttpRequestAction {
    client: Client,
}

impl HttpRequestAction {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ActionHandler for HttpRequestAction {
    async fn invoke(&self, action_name: &str, params: Value, _context: &ExternalContext) -> Result<Value, ActionError> {
        let url = string_param(action_name, &params, "url")?;
        let method = match param(&params, "method") {
            Some(Value::String(method)) => Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
                .map_err(|_| ActionError::invalid_param(action_name, "method", format!("unsupported method '{method}'")))?,
            Some(other) => {
                return Err(ActionError::invalid_param(
                    action_name,
                    "method",
                    format!("expected a string, got {other}"),
                ));
            }
            None => Method::GET,
        };

        let headers = header_pairs(param(&params, "headers"));
        debug!(
            action = %action_name,
            %method,
            url = %redact_sensitive(url),
            headers = ?headers
                .iter()
                .map(|(name, value)| redact_header(name, value))
                .collect::<Vec<_>>(),
            "sending http request"
        );

        let mut request = self.client.request(method, url);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        request = match request_body(param(&params, "body")) {
            Some(RequestBody::Json(body)) => request.json(&body),
            Some(RequestBody::Text(body)) => request.body(body),
            None => request,
        };

        let http_error = |source: reqwest::Error| ActionError::Http {
            action: action_name.to_string(),
            source,
        };
        let response = request.send().await.map_err(http_error)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(http_error)?;
        debug!(action = %action_name, status, bytes = text.len(), "received http response");

        Ok(response_envelope(status, &text))
    }
}
