//! Error types used throughout the SDK

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// HTTP statuses the retry controller treats as transient
pub const RETRYABLE_STATUSES: [u16; 3] = [429, 503, 504];

/// Structured error payload returned by Zscaler services
///
/// Services that report failures in this shape send an object carrying an
/// `id` and a `reason`; `params` is optional and free-form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceErrorBody {
    /// Machine-readable error code
    pub id: String,
    /// Human-readable message
    pub reason: String,
    /// Extra context, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl ServiceErrorBody {
    /// Interpret a decoded body as a structured service error.
    ///
    /// Returns `None` unless the value is an object with string `id` and
    /// `reason` fields.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let id = object.get("id")?.as_str()?.to_string();
        let reason = object.get("reason")?.as_str()?.to_string();
        let params = object.get("params").filter(|p| !p.is_null()).cloned();
        Some(Self { id, reason, params })
    }
}

/// Categories of SDK errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Connection or timeout failure before any server response
    Transport,
    /// Server response violated the expected protocol (missing headers)
    Protocol,
    /// Server returned a structured error payload
    Service,
    /// Non-2xx response without the structured payload
    Http,
    /// Credential exchange failed
    Authentication,
    /// The request deadline elapsed across retries
    Timeout,
    /// Invalid or incomplete configuration
    Config,
    /// Body could not be encoded or decoded
    Serialization,
    /// Caller supplied an unusable request
    InvalidRequest,
}

/// Main error type for the SDK
#[derive(Error, Debug, Clone)]
pub enum ZscalerError {
    /// Request never got an HTTP answer, for example a refused connection
    #[error("Transport error on {method} {url}: {message}")]
    Transport {
        /// Method of the failed request, empty when unknown
        method: String,
        /// URL of the failed request
        url: String,
        /// Failure description without the URL
        message: String,
    },

    /// Server answered in a way the protocol does not allow, such as a
    /// 429 without reset information
    #[error("Protocol error from {url} (status {status}): {message}")]
    Protocol {
        /// Status of the offending answer
        status: u16,
        /// URL that answered
        url: String,
        /// What was missing or malformed
        message: String,
    },

    /// Non-2xx answer carrying a structured `{id, reason}` body
    #[error("API error {status} from {url}: {} ({})", .body.reason, .body.id)]
    Api {
        /// HTTP status
        status: u16,
        /// URL that answered
        url: String,
        /// Decoded error payload
        body: ServiceErrorBody,
    },

    /// Non-2xx answer with any other body
    #[error("HTTP error {status} from {url}: {body}")]
    Http {
        /// HTTP status
        status: u16,
        /// URL that answered
        url: String,
        /// Body text, possibly empty
        body: String,
    },

    /// Credential exchange failed or was rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Overall request deadline passed
    #[error("Request deadline of {0:?} exceeded")]
    Timeout(Duration),

    /// Configuration is incomplete or unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// Body could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Caller supplied an unusable request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ZscalerError {
    /// Get the error category for this error
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport { .. } => ErrorCategory::Transport,
            Self::Protocol { .. } => ErrorCategory::Protocol,
            Self::Api { .. } => ErrorCategory::Service,
            Self::Http { .. } => ErrorCategory::Http,
            Self::Auth(_) => ErrorCategory::Authentication,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Config(_) => ErrorCategory::Config,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::InvalidRequest(_) => ErrorCategory::InvalidRequest,
        }
    }

    /// HTTP status attached to this error, when a server answered
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Protocol { status, .. } | Self::Api { status, .. } | Self::Http { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Check if this error could succeed on a later attempt
    ///
    /// Transport failures are transient. Server errors are only transient
    /// when their status is in [`RETRYABLE_STATUSES`].
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Api { status, .. } | Self::Http { status, .. } => {
                RETRYABLE_STATUSES.contains(status)
            }
            _ => false,
        }
    }

    /// Structured service payload, if the server sent one
    pub const fn service_error(&self) -> Option<&ServiceErrorBody> {
        match self {
            Self::Api { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, ZscalerError>;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn http(status: u16) -> ZscalerError {
        ZscalerError::Http { status, url: "https://api.zsapi.net/x".into(), body: String::new() }
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(ZscalerError::Auth("bad".into()).category(), ErrorCategory::Authentication);
        assert_eq!(http(404).category(), ErrorCategory::Http);
        assert_eq!(
            ZscalerError::Timeout(Duration::from_secs(1)).category(),
            ErrorCategory::Timeout
        );
        assert_eq!(
            ZscalerError::Protocol { status: 429, url: "u".into(), message: "m".into() }.category(),
            ErrorCategory::Protocol
        );
    }

    #[test]
    fn test_should_retry() {
        assert!(http(429).is_retryable());
        assert!(http(503).is_retryable());
        assert!(http(504).is_retryable());
        assert!(!http(500).is_retryable());
        assert!(!http(404).is_retryable());
        assert!(!ZscalerError::Auth("x".into()).is_retryable());
        assert!(ZscalerError::Transport {
            method: "GET".into(),
            url: "u".into(),
            message: "connection refused".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_service_error_detection() {
        let body = json!({"id": "resource.not.found", "reason": "Missing", "params": ["5"]});
        let parsed = ServiceErrorBody::from_value(&body).unwrap();
        assert_eq!(parsed.id, "resource.not.found");
        assert_eq!(parsed.reason, "Missing");
        assert_eq!(parsed.params, Some(json!(["5"])));

        assert!(ServiceErrorBody::from_value(&json!({"code": "X", "message": "y"})).is_none());
        assert!(ServiceErrorBody::from_value(&json!(["id", "reason"])).is_none());
    }

    #[test]
    fn test_status_accessor() {
        assert_eq!(http(418).status(), Some(418));
        assert_eq!(ZscalerError::Config("c".into()).status(), None);
    }

    #[test]
    fn test_api_error_display() {
        let err = ZscalerError::Api {
            status: 400,
            url: "https://api.zsapi.net/zpa/x".into(),
            body: ServiceErrorBody { id: "invalid".into(), reason: "Bad name".into(), params: None },
        };
        assert_eq!(err.to_string(), "API error 400 from https://api.zsapi.net/zpa/x: Bad name (invalid)");
        assert!(err.service_error().is_some());
    }
}
