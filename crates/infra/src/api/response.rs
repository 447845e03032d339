//! Executed request with its normalized body

use std::collections::BTreeMap;

use futures::stream::Stream;
use serde::de::DeserializeOwned;
use serde_json::Value;
use zscaler_domain::{RawResponse, RequestDescriptor, Result, ZscalerError};

use super::executor::Executor;
use super::normalizer::Normalized;
use super::pagination::{extract_items, PageLimits, PageWalker};

/// Result of [`Executor::execute`]
///
/// Holds the executor handle so further pages can be fetched with the same
/// configuration, credential and cache.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    executor: Executor,
    request: RequestDescriptor,
    status: u16,
    headers: BTreeMap<String, String>,
    body: Option<Value>,
    error: Option<ZscalerError>,
    limits: PageLimits,
}

impl ApiResponse {
    pub(crate) fn new(
        executor: Executor,
        request: RequestDescriptor,
        raw: &RawResponse,
        normalized: Normalized,
    ) -> Self {
        Self {
            executor,
            request,
            status: raw.status(),
            headers: raw.headers().clone(),
            body: normalized.body,
            error: normalized.error,
            limits: PageLimits::default(),
        }
    }

    /// Cap later pagination walks
    #[must_use]
    pub fn with_limits(mut self, max_items: Option<usize>, max_pages: Option<usize>) -> Self {
        self.limits = PageLimits { max_items, max_pages };
        self
    }

    /// HTTP status of this page
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// `true` unless the status mapped to an error
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Response headers, lowercase names
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Header value, looked up case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Descriptor this response answers
    pub const fn request(&self) -> &RequestDescriptor {
        &self.request
    }

    /// Decoded body with snake_case keys; `None` for 204 and empty bodies
    pub const fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Deserialize the body
    ///
    /// An absent body deserializes from `null`, so `Option<T>` and `()`
    /// targets work for 204 responses.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T> {
        let value = self.body.clone().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| ZscalerError::Serialization(e.to_string()))
    }

    /// Items of this page only; no network call
    pub fn results(&self) -> Vec<Value> {
        extract_items(self.body.as_ref())
    }

    /// Items of this page decoded as `T`
    ///
    /// # Errors
    /// Returns `ZscalerError::Serialization` for the first item that does not
    /// decode.
    pub fn results_as<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.results()
            .into_iter()
            .map(|item| {
                serde_json::from_value(item).map_err(|e| ZscalerError::Serialization(e.to_string()))
            })
            .collect()
    }

    /// Fresh walker starting from this page
    pub fn walker(&self) -> PageWalker {
        PageWalker::new(self.executor.clone(), self.request.clone(), self.body.as_ref(), self.limits)
    }

    /// Every item across all pages, walking from this page each call
    ///
    /// # Errors
    /// Propagates the error of this response or of any page fetch.
    pub async fn all_pages_results(&self) -> Result<Vec<Value>> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        self.walker().collect_all().await
    }

    /// Every item across all pages, decoded as `T`
    ///
    /// # Errors
    /// As [`all_pages_results`](Self::all_pages_results), plus
    /// `ZscalerError::Serialization` for an item that does not decode.
    pub async fn all_pages_results_as<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.all_pages_results()
            .await?
            .into_iter()
            .map(|item| {
                serde_json::from_value(item).map_err(|e| ZscalerError::Serialization(e.to_string()))
            })
            .collect()
    }

    /// Pages as a lazily fetched stream
    pub fn pages(&self) -> impl Stream<Item = Result<Vec<Value>>> {
        self.walker().into_stream()
    }

    /// Error the status mapped to, kept when `failSafe` is off
    pub const fn error(&self) -> Option<&ZscalerError> {
        self.error.as_ref()
    }

    /// `Err` when the server answered with an error status
    pub fn into_result(mut self) -> Result<Self> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}
