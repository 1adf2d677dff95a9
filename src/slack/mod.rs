//! Slack delivery — incoming webhook for block messages, Web API for file
//! uploads. Raw `reqwest` with typed envelopes, no framework.

pub mod upload;
pub mod webhook;

use serde_json::Value;

use crate::error::AgentError;

/// Build an [`AgentError::Api`] from a non-`ok` Web API payload, joining the
/// `error` code with any `response_metadata.messages` detail.
pub(crate) fn api_error(context: &str, payload: &Value) -> AgentError {
    let code = payload
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown_error");

    let mut message = format!("{context}: {code}");
    if let Some(messages) = payload
        .get("response_metadata")
        .and_then(|m| m.get("messages"))
        .and_then(Value::as_array)
    {
        let details: Vec<&str> = messages.iter().filter_map(Value::as_str).collect();
        if !details.is_empty() {
            message = format!("{message} ({})", details.join("; "));
        }
    }

    AgentError::Api(message)
}

/// True when the payload carries `"ok": true`.
pub(crate) fn is_ok(payload: &Value) -> bool {
    payload.get("ok").and_then(Value::as_bool).unwrap_or(false)
}
