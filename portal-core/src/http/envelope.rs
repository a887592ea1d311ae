//! The `{status, code, message, data}` wrapper the portal backend puts around
//! most payloads. A few legacy endpoints return the bare payload instead, so
//! unwrapping accepts both.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{PortalError, RemoteFailure};

#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default = "default_status")]
    pub status: bool,
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

fn default_status() -> bool {
    true
}

/// Best-effort human message from an error body.
pub fn message_from_body(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let message = value
        .get("message")
        .or_else(|| value.get("title"))
        .or_else(|| value.get("error"))?;
    match message {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Decode `body` as either an enveloped or a bare `T`.
///
/// An envelope with `status: false` is a remote failure even though the HTTP
/// status was 2xx.
pub fn unwrap_data<T: DeserializeOwned>(url: &str, body: &[u8]) -> Result<T, PortalError> {
    let value: Value = serde_json::from_slice(body)?;

    let is_envelope = value
        .as_object()
        .map(|obj| obj.contains_key("data") && (obj.contains_key("status") || obj.contains_key("code")))
        .unwrap_or(false);

    if !is_envelope {
        return Ok(serde_json::from_value(value)?);
    }

    let envelope: ApiEnvelope<Value> = serde_json::from_value(value)?;
    if !envelope.status {
        return Err(PortalError::RemoteUnavailable(RemoteFailure {
            url: url.to_string(),
            status: envelope.code,
            message: envelope
                .message
                .unwrap_or_else(|| "request was not successful".to_string()),
        }));
    }

    Ok(serde_json::from_value(envelope.data.unwrap_or(Value::Null))?)
}
