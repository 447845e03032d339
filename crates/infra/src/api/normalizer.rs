//! Raw response to `(body, error)`

use serde_json::Value;
use zscaler_common::case::from_wire_case;
use zscaler_domain::{RawResponse, Result, ServiceErrorBody, ZscalerError};

/// Decoded body and the error a non-2xx status maps to
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// JSON with snake_case keys, or the raw text as a string value
    pub body: Option<Value>,
    /// Error for a non-2xx status, `None` on success
    pub error: Option<ZscalerError>,
}

/// Normalize one response
///
/// - 204 yields neither body nor error
/// - JSON is decoded only when `Content-Type` says so; other bodies pass
///   through as text
/// - a non-2xx status becomes `ZscalerError::Api` when the body carries the
///   structured `{id, reason, params}` payload and `ZscalerError::Http`
///   otherwise
///
/// # Errors
/// Returns `ZscalerError::Serialization` when a successful response claims
/// JSON but does not parse.
pub fn normalize(response: &RawResponse, url: &str) -> Result<Normalized> {
    let status = response.status();
    if status == 204 {
        return Ok(Normalized::default());
    }

    let text = response.body();
    let decoded = if response.is_json() && !text.trim().is_empty() {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Some(value),
            Err(err) if response.is_success() => {
                return Err(ZscalerError::Serialization(format!(
                    "invalid JSON from {url}: {err}"
                )));
            }
            Err(_) => None,
        }
    } else {
        None
    };

    let error = (!response.is_success()).then(|| {
        match decoded.as_ref().and_then(ServiceErrorBody::from_value) {
            Some(body) => ZscalerError::Api { status, url: url.to_string(), body },
            None => ZscalerError::Http { status, url: url.to_string(), body: text.to_string() },
        }
    });

    let body = match decoded {
        Some(value) => Some(from_wire_case(&value)),
        None if text.is_empty() => None,
        None => Some(Value::String(text.to_string())),
    };

    Ok(Normalized { body, error })
}
