//! Request construction
//!
//! Turns `(method, endpoint, body, headers, params)` into a
//! [`RequestDescriptor`] ready for the retry controller:
//!
//! 1. Resolve the absolute URL from the configured base
//! 2. Merge headers: defaults, then executor custom headers, then per-call
//! 3. Pull the microtenant out of the body and query and re-apply it as a
//!    query parameter for ZPA only
//! 4. Clamp the page size to the service's bounds
//! 5. Translate body and query keys to camelCase

use std::collections::BTreeMap;

use serde_json::Value;
use zscaler_common::case::{snake_to_camel, to_wire_case};
use zscaler_domain::constants::{
    CONTENT_TYPE_JSON, HEADER_ACCEPT, HEADER_CONTENT_TYPE, HEADER_PARTNER_ID, HEADER_USER_AGENT,
    MICROTENANT_BODY_KEY, MICROTENANT_QUERY_KEY, SDK_USER_AGENT_PREFIX,
};
use zscaler_domain::{
    ClientConfig, HttpMethod, LegacyProduct, RequestDescriptor, Result, Service, ZscalerError,
};

use super::base_url;

/// User agent sent with every request
pub fn user_agent(extra: Option<&str>) -> String {
    let base = format!("{SDK_USER_AGENT_PREFIX}/{}", env!("CARGO_PKG_VERSION"));
    match extra.map(str::trim).filter(|e| !e.is_empty()) {
        Some(extra) => format!("{base} {extra}"),
        None => base,
    }
}

/// Turns `(method, endpoint, body, headers, params)` into a
/// [`RequestDescriptor`]: base URL join, header merge, wire-case keys and
/// microtenant scoping
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    base_url: String,
    legacy_product: Option<LegacyProduct>,
    default_headers: BTreeMap<String, String>,
    microtenant_id: Option<String>,
}

impl RequestBuilder {
    /// # Errors
    /// Returns `ZscalerError::Config` when the base URL cannot be resolved.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut default_headers = BTreeMap::new();
        default_headers
            .insert(HEADER_USER_AGENT.to_string(), user_agent(config.user_agent_extra.as_deref()));
        default_headers.insert(HEADER_ACCEPT.to_string(), CONTENT_TYPE_JSON.to_string());
        default_headers.insert(HEADER_CONTENT_TYPE.to_string(), CONTENT_TYPE_JSON.to_string());
        if let Some(partner) = config.partner_id.as_deref().filter(|p| !p.trim().is_empty()) {
            default_headers.insert(HEADER_PARTNER_ID.to_string(), partner.to_string());
        }

        Ok(Self {
            base_url: base_url::api_base_url(config)?,
            legacy_product: config.legacy_product,
            default_headers,
            microtenant_id: config
                .microtenant_id
                .clone()
                .filter(|m| !m.trim().is_empty()),
        })
    }

    /// Base URL endpoints are joined to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Headers every request starts from
    pub const fn default_headers(&self) -> &BTreeMap<String, String> {
        &self.default_headers
    }

    /// Service an endpoint belongs to under the current configuration
    pub fn service_for(&self, endpoint: &str) -> Service {
        match self.legacy_product {
            Some(LegacyProduct::Zpa) => Service::Zpa,
            Some(LegacyProduct::Zia) => Service::Zia,
            Some(LegacyProduct::Zcc) => Service::Zcc,
            None => Service::from_endpoint(endpoint),
        }
    }

    /// Absolute URL for an endpoint
    ///
    /// Legacy hosts do not carry the product prefix, so a leading
    /// `/<product>` segment is dropped, along with any path the legacy base
    /// already ends in (`/api/v1` for ZIA, `/papi` for ZCC).
    pub fn resolve_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return endpoint.to_string();
        }
        let path = format!("/{}", endpoint.trim_start_matches('/'));
        let path = match self.legacy_product {
            None => path,
            Some(product) => {
                let prefix = format!("/{product}");
                let stripped = match path.strip_prefix(&prefix) {
                    Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.to_string(),
                    _ => path.clone(),
                };
                let base_path = url::Url::parse(&self.base_url)
                    .map(|u| u.path().trim_end_matches('/').to_string())
                    .unwrap_or_default();
                match stripped.strip_prefix(base_path.as_str()) {
                    Some(rest) if !base_path.is_empty() && (rest.is_empty() || rest.starts_with('/')) => {
                        rest.to_string()
                    }
                    _ => stripped,
                }
            }
        };
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    /// Build a descriptor
    ///
    /// # Errors
    /// Returns `ZscalerError::InvalidRequest` for an empty endpoint or a
    /// page size that is not an integer.
    pub fn build(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<Value>,
        custom_headers: &BTreeMap<String, String>,
        headers: &BTreeMap<String, String>,
        params: &BTreeMap<String, String>,
    ) -> Result<RequestDescriptor> {
        if endpoint.trim().is_empty() {
            return Err(ZscalerError::InvalidRequest("endpoint must not be empty".into()));
        }
        let service = self.service_for(endpoint);

        let mut body = body;
        let body_tenant = body.as_mut().and_then(take_microtenant_from_body);

        let mut query: BTreeMap<String, String> =
            params.iter().map(|(k, v)| (snake_to_camel(k), v.clone())).collect();
        let query_tenant = query.remove(MICROTENANT_QUERY_KEY);

        let tenant = body_tenant.or(query_tenant).or_else(|| self.microtenant_id.clone());
        if service.supports_microtenant() {
            if let Some(tenant) = tenant {
                query.insert(MICROTENANT_QUERY_KEY.to_string(), tenant);
            }
        }

        let profile = service.pagination();
        if let Some(size) = query.get_mut(profile.size_param) {
            let requested: i64 = size.trim().parse().map_err(|_| {
                ZscalerError::InvalidRequest(format!(
                    "{} must be an integer, got {size}",
                    profile.size_param
                ))
            })?;
            *size = profile.bounds.clamp(requested).to_string();
        }

        Ok(RequestDescriptor::new(method, self.resolve_url(endpoint), service)
            .with_headers(self.default_headers.iter())
            .with_headers(custom_headers.iter())
            .with_headers(headers.iter())
            .with_query(query)
            .with_body(body.as_ref().map(to_wire_case)))
    }
}

/// Remove the microtenant from a body object, in either spelling
fn take_microtenant_from_body(body: &mut Value) -> Option<String> {
    let object = body.as_object_mut()?;
    let snake = object.remove(MICROTENANT_BODY_KEY);
    let camel = object.remove(MICROTENANT_QUERY_KEY);
    snake.or(camel).and_then(|v| match v {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
