//! Conversions from external infrastructure errors into domain errors.

use zscaler_domain::{HttpMethod, ZscalerError};

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ZscalerError);

impl From<InfraError> for ZscalerError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ZscalerError> for InfraError {
    fn from(value: ZscalerError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoZscalerError {
    fn into_zscaler(self) -> ZscalerError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ZscalerError */
/* -------------------------------------------------------------------------- */

/// Short description of a reqwest failure without the URL
fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        return "HTTP request timed out".into();
    }
    if err.is_connect() {
        return "HTTP connection failure".into();
    }
    if err.is_body() || err.is_decode() {
        return format!("failed to read response body: {err}");
    }
    format!("HTTP request failed: {err}")
}

/// Transport error for a request that never produced a response
pub fn transport_error(method: HttpMethod, url: &str, err: &reqwest::Error) -> ZscalerError {
    if err.is_builder() {
        return ZscalerError::InvalidRequest(format!("{method} {url}: {err}"));
    }
    ZscalerError::Transport {
        method: method.to_string(),
        url: url.to_string(),
        message: describe(err),
    }
}

impl IntoZscalerError for reqwest::Error {
    fn into_zscaler(self) -> ZscalerError {
        if self.is_builder() {
            return ZscalerError::Config(format!("invalid HTTP client settings: {self}"));
        }
        ZscalerError::Transport {
            method: String::new(),
            url: self.url().map(ToString::to_string).unwrap_or_default(),
            message: describe(&self),
        }
    }
}

impl From<reqwest::Error> for InfraError {
    fn from(value: reqwest::Error) -> Self {
        Self(value.into_zscaler())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json / toml / io → ZscalerError */
/* -------------------------------------------------------------------------- */

impl IntoZscalerError for serde_json::Error {
    fn into_zscaler(self) -> ZscalerError {
        ZscalerError::Serialization(format!("invalid JSON at line {}: {self}", self.line()))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        Self(value.into_zscaler())
    }
}

impl IntoZscalerError for toml::de::Error {
    fn into_zscaler(self) -> ZscalerError {
        ZscalerError::Config(format!("Invalid TOML format: {}", self.message()))
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        Self(value.into_zscaler())
    }
}

impl IntoZscalerError for std::io::Error {
    fn into_zscaler(self) -> ZscalerError {
        ZscalerError::Config(format!("I/O error: {self}"))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        Self(value.into_zscaler())
    }
}

/* -------------------------------------------------------------------------- */
/* jsonwebtoken::Error → ZscalerError */
/* -------------------------------------------------------------------------- */

impl IntoZscalerError for jsonwebtoken::errors::Error {
    fn into_zscaler(self) -> ZscalerError {
        use jsonwebtoken::errors::ErrorKind;

        match self.kind() {
            ErrorKind::InvalidKeyFormat | ErrorKind::InvalidRsaKey(_) => {
                ZscalerError::Config(format!("private key is not a usable RSA PEM key: {self}"))
            }
            _ => ZscalerError::Auth(format!("failed to sign client assertion: {self}")),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for InfraError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        Self(value.into_zscaler())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn connection_refused_maps_to_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let url = format!("http://{addr}/widgets");

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let err = client.get(&url).send().await.unwrap_err();

        match transport_error(HttpMethod::Get, &url, &err) {
            ZscalerError::Transport { method, url: mapped_url, message } => {
                assert_eq!(method, "GET");
                assert_eq!(mapped_url, url);
                assert!(message.to_lowercase().contains("http"));
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn serde_error_maps_to_serialization() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let mapped: ZscalerError = InfraError::from(err).into();
        assert!(matches!(mapped, ZscalerError::Serialization(_)));
    }

    #[test]
    fn toml_error_maps_to_config() {
        let err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let mapped: ZscalerError = InfraError::from(err).into();
        match mapped {
            ZscalerError::Config(msg) => assert!(msg.contains("TOML")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn bad_pem_maps_to_config() {
        let err = jsonwebtoken::EncodingKey::from_rsa_pem(b"not a key").unwrap_err();
        let mapped: ZscalerError = InfraError::from(err).into();
        assert!(matches!(mapped, ZscalerError::Config(_)), "got {mapped:?}");
    }
}
