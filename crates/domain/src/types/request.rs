//! Request descriptors
//!
//! A descriptor is a complete, immutable description of one outgoing call.
//! Every `with_*` method returns a new descriptor, so the retry controller
//! and the page walker derive per-attempt and per-page values without
//! touching the original.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::service::Service;

/// HTTP verbs used by the Zscaler APIs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    /// `GET`, the only cacheable method
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Upper-case method name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Only GET responses are cached
    pub const fn is_get(self) -> bool {
        matches!(self, Self::Get)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            other => Err(format!("Invalid HttpMethod: {other}")),
        }
    }
}

/// One outgoing request
///
/// Header names are stored lowercase so later merges replace rather than
/// duplicate. Query parameters are kept sorted by key.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: HttpMethod,
    url: String,
    service: Service,
    headers: BTreeMap<String, String>,
    query: BTreeMap<String, String>,
    body: Option<Value>,
    correlation_id: Uuid,
}

impl RequestDescriptor {
    /// Start a descriptor for an absolute URL with a fresh correlation id
    pub fn new(method: HttpMethod, url: impl Into<String>, service: Service) -> Self {
        Self {
            method,
            url: url.into(),
            service,
            headers: BTreeMap::new(),
            query: BTreeMap::new(),
            body: None,
            correlation_id: Uuid::new_v4(),
        }
    }

    /// Set one header, replacing any value under the same name
    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name.as_ref().to_lowercase(), value.into());
        self
    }

    /// Merge headers; later values replace earlier ones case-insensitively
    #[must_use]
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.headers.insert(name.as_ref().to_lowercase(), value.into());
        }
        self
    }

    /// Set one query parameter
    #[must_use]
    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Replace the whole query string
    #[must_use]
    pub fn with_query(mut self, query: BTreeMap<String, String>) -> Self {
        self.query = query;
        self
    }

    /// Replace the JSON body
    #[must_use]
    pub fn with_body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }

    /// Same request under a new correlation id
    #[must_use]
    pub fn with_new_correlation_id(mut self) -> Self {
        self.correlation_id = Uuid::new_v4();
        self
    }

    /// HTTP method
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Absolute URL without the query string
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Service resolved from the endpoint path
    pub const fn service(&self) -> Service {
        self.service
    }

    /// Headers keyed by lowercase name
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Header value, looked up case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Query parameters in wire case
    pub const fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    /// Query parameter value, exact name
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// JSON body in wire case
    pub const fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Id attached to every log line for this request
    pub const fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_method_round_trip() {
        for method in
            [HttpMethod::Get, HttpMethod::Post, HttpMethod::Put, HttpMethod::Patch, HttpMethod::Delete]
        {
            assert_eq!(method.to_string().parse::<HttpMethod>().unwrap(), method);
        }
        assert_eq!("delete".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        assert!("TRACE".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let descriptor = RequestDescriptor::new(HttpMethod::Get, "https://x/y", Service::Zia)
            .with_header("Content-Type", "application/json")
            .with_headers([("content-type", "text/plain")]);

        assert_eq!(descriptor.headers().len(), 1);
        assert_eq!(descriptor.header("CONTENT-TYPE"), Some("text/plain"));
    }

    #[test]
    fn test_derived_descriptors_leave_original_untouched() {
        let original = RequestDescriptor::new(HttpMethod::Post, "https://x/y", Service::Zpa)
            .with_query_param("page", "1")
            .with_body(Some(json!({"name": "a"})));
        let next = original.clone().with_query_param("page", "2");

        assert_eq!(original.query_param("page"), Some("1"));
        assert_eq!(next.query_param("page"), Some("2"));
        assert_eq!(original.correlation_id(), next.correlation_id());
        assert_ne!(next.clone().with_new_correlation_id().correlation_id(), next.correlation_id());
    }

    #[test]
    fn test_query_is_sorted() {
        let descriptor = RequestDescriptor::new(HttpMethod::Get, "https://x", Service::Zia)
            .with_query_param("search", "a")
            .with_query_param("page", "1");
        let keys: Vec<_> = descriptor.query().keys().cloned().collect();
        assert_eq!(keys, vec!["page".to_string(), "search".to_string()]);
    }
}
