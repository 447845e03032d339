//! Raw HTTP responses as returned by the transport

use std::collections::BTreeMap;

use crate::constants::{CONTENT_TYPE_JSON, HEADER_CONTENT_TYPE};

/// Status, headers and body text of one HTTP exchange
///
/// Header names are lowercase. Repeated headers are joined with `", "`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    status: u16,
    headers: BTreeMap<String, String>,
    body: String,
}

impl RawResponse {
    /// Response with lowercased header names; repeated headers are joined
    /// with `, `
    pub fn new<I, K, V>(status: u16, headers: I, body: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut map: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in headers {
            let value = value.into();
            map.entry(name.as_ref().to_lowercase())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert(value);
        }
        Self { status, headers: map, body: body.into() }
    }

    /// HTTP status code
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// 2xx
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Headers keyed by lowercase name
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Header value, looked up case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Body text, possibly empty
    pub fn body(&self) -> &str {
        &self.body
    }

    /// `true` when `Content-Type` names a JSON media type
    pub fn is_json(&self) -> bool {
        self.header(HEADER_CONTENT_TYPE).is_some_and(|ct| {
            let ct = ct.to_lowercase();
            ct.contains(CONTENT_TYPE_JSON) || ct.contains("+json")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = RawResponse::new(200, [("Content-Type", "application/json")], "{}");
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("CONTENT-TYPE"), Some("application/json"));
        assert!(response.is_json());
    }

    #[test]
    fn test_json_detection() {
        let vendor = RawResponse::new(200, [("content-type", "application/problem+json")], "");
        assert!(vendor.is_json());
        let charset = RawResponse::new(200, [("content-type", "application/json; charset=utf-8")], "");
        assert!(charset.is_json());
        let text = RawResponse::new(200, [("content-type", "text/plain")], "ok");
        assert!(!text.is_json());
        let missing = RawResponse::new(200, Vec::<(String, String)>::new(), "ok");
        assert!(!missing.is_json());
    }

    #[test]
    fn test_repeated_headers_are_joined() {
        let response = RawResponse::new(200, [("set-cookie", "a=1"), ("Set-Cookie", "b=2")], "");
        assert_eq!(response.header("set-cookie"), Some("a=1, b=2"));
    }

    #[test]
    fn test_success_range() {
        assert!(RawResponse::new(204, Vec::<(String, String)>::new(), "").is_success());
        assert!(!RawResponse::new(302, Vec::<(String, String)>::new(), "").is_success());
    }
}
