//! Request executor
//!
//! The executor is the one entry point resource modules call:
//! `create_request` builds a descriptor, `execute` runs it through the
//! cache and the retry controller and returns a normalized
//! [`ApiResponse`]. Handles are cheap to clone and share one transport,
//! credential and cache.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use zscaler_common::cache::{NoOpCache, ResponseCache, TtlCache};
use zscaler_common::time::{Clock, Sleeper, SystemClock, TokioSleeper};
use zscaler_domain::{
    ClientConfig, HttpMethod, RawResponse, RequestDescriptor, Result, ZscalerError,
};

use super::builder::{user_agent, RequestBuilder};
use super::normalizer::normalize;
use super::response::ApiResponse;
use super::retry::{RetryController, RetryPolicy};
use crate::auth::{AuthProvider, AuthStrategy, TokenProvider};
use crate::http::{HttpClient, Transport};

/// Shared response cache type
pub type SharedCache = Arc<dyn ResponseCache<RawResponse>>;

/// Request executor shared by every service client
///
/// Cloning is cheap; clones share the credential, cache and custom headers.
#[derive(Clone)]
pub struct Executor {
    inner: Arc<ExecutorInner>,
}

struct ExecutorInner {
    config: ClientConfig,
    builder: RequestBuilder,
    retry: RetryController,
    auth: Arc<dyn AuthProvider>,
    cache: SharedCache,
    custom_headers: RwLock<BTreeMap<String, String>>,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("base_url", &self.inner.builder.base_url())
            .field("fail_safe", &self.inner.config.fail_safe)
            .field("cache_enabled", &self.inner.cache.is_enabled())
            .field("retry", &self.inner.retry)
            .finish_non_exhaustive()
    }
}

impl Executor {
    /// Executor with the default transport, token provider and cache
    ///
    /// # Errors
    /// Returns `ZscalerError::Config` for an incomplete configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Builder for injecting a transport, auth provider, clock or cache
    pub fn builder(config: ClientConfig) -> ExecutorBuilder {
        ExecutorBuilder::new(config)
    }

    /// Configuration the executor was built from
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Base URL every endpoint is joined to
    pub fn base_url(&self) -> &str {
        self.inner.builder.base_url()
    }

    /// Build a descriptor for `endpoint`
    ///
    /// Body and query keys are given in snake_case. Per-call `headers` win
    /// over the executor's custom headers, which win over the defaults.
    ///
    /// # Errors
    /// Returns `ZscalerError::InvalidRequest` for an empty endpoint or a
    /// non-numeric page size.
    pub fn create_request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<Value>,
        headers: Option<&BTreeMap<String, String>>,
        params: Option<&BTreeMap<String, String>>,
    ) -> Result<RequestDescriptor> {
        let empty = BTreeMap::new();
        let custom = self.inner.custom_headers.read().clone();
        self.inner.builder.build(
            method,
            endpoint,
            body,
            &custom,
            headers.unwrap_or(&empty),
            params.unwrap_or(&empty),
        )
    }

    /// Run a descriptor to completion
    ///
    /// With `failSafe` off a non-2xx answer is returned inside the response
    /// (see [`ApiResponse::error`]); with it on the error is returned as
    /// `Err`.
    ///
    /// # Errors
    /// Transport, protocol, timeout, authentication and serialization
    /// failures are always `Err`.
    #[instrument(
        skip(self, request),
        fields(
            method = %request.method(),
            url = %request.url(),
            correlation_id = %request.correlation_id()
        )
    )]
    pub async fn execute(&self, request: RequestDescriptor) -> Result<ApiResponse> {
        let raw = self.send(&request).await?;
        let normalized = normalize(&raw, request.url())?;

        if let Some(err) = &normalized.error {
            warn!(status = raw.status(), error = %err, "Request failed");
            if self.inner.config.fail_safe {
                return Err(err.clone());
            }
        }
        Ok(ApiResponse::new(self.clone(), request, &raw, normalized))
    }

    /// `GET endpoint` with optional snake_case query parameters
    ///
    /// # Errors
    /// As [`Executor::execute`].
    pub async fn get(
        &self,
        endpoint: &str,
        params: Option<&BTreeMap<String, String>>,
    ) -> Result<ApiResponse> {
        let request = self.create_request(HttpMethod::Get, endpoint, None, None, params)?;
        self.execute(request).await
    }

    /// `POST endpoint` with a JSON body
    ///
    /// # Errors
    /// As [`Executor::execute`].
    pub async fn post(&self, endpoint: &str, body: Value) -> Result<ApiResponse> {
        let request = self.create_request(HttpMethod::Post, endpoint, Some(body), None, None)?;
        self.execute(request).await
    }

    /// `PUT endpoint` with a JSON body
    ///
    /// # Errors
    /// As [`Executor::execute`].
    pub async fn put(&self, endpoint: &str, body: Value) -> Result<ApiResponse> {
        let request = self.create_request(HttpMethod::Put, endpoint, Some(body), None, None)?;
        self.execute(request).await
    }

    /// `PATCH endpoint` with a JSON body
    ///
    /// # Errors
    /// As [`Executor::execute`].
    pub async fn patch(&self, endpoint: &str, body: Value) -> Result<ApiResponse> {
        let request = self.create_request(HttpMethod::Patch, endpoint, Some(body), None, None)?;
        self.execute(request).await
    }

    /// `DELETE endpoint`
    ///
    /// # Errors
    /// As [`Executor::execute`].
    pub async fn delete(&self, endpoint: &str) -> Result<ApiResponse> {
        let request = self.create_request(HttpMethod::Delete, endpoint, None, None, None)?;
        self.execute(request).await
    }

    /// Headers added to every request built from now on
    pub fn set_custom_headers<I, K, V>(&self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut custom = self.inner.custom_headers.write();
        for (name, value) in headers {
            custom.insert(name.as_ref().to_lowercase(), value.into());
        }
    }

    /// Forget every custom header
    pub fn clear_custom_headers(&self) {
        self.inner.custom_headers.write().clear();
    }

    /// Snapshot of the custom headers, keyed by lowercase name
    pub fn custom_headers(&self) -> BTreeMap<String, String> {
        self.inner.custom_headers.read().clone()
    }

    /// Evict every cached response
    pub fn clear_cache(&self) {
        self.inner.cache.clear();
    }

    /// Drop the cached credential; the next request re-authenticates
    pub async fn invalidate_credential(&self) {
        self.inner.auth.invalidate().await;
    }

    /// Fetch one page of a walk, failing on any error status
    pub(crate) async fn fetch_page(&self, request: &RequestDescriptor) -> Result<Option<Value>> {
        let raw = self.send(request).await?;
        let normalized = normalize(&raw, request.url())?;
        match normalized.error {
            Some(err) => Err(err),
            None => Ok(normalized.body),
        }
    }

    /// Cache lookup, invalidation, retrying send, cache fill
    async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse> {
        let cache = &self.inner.cache;
        let key = cache.create_key(request.url(), request.query());
        let is_get = request.method().is_get();

        if cache.is_enabled() {
            if is_get {
                if let Some(hit) = cache.get(&key) {
                    debug!(key = %key, "Response cache hit");
                    return Ok(hit);
                }
            } else {
                debug!(key = %key, "Invalidating cached response");
                cache.delete(&key);
            }
        }

        let raw = self.inner.retry.send(request).await?;

        if is_get && raw.is_success() && cache.is_enabled() {
            cache.add(&key, raw.clone());
        }
        Ok(raw)
    }
}

/// Assembles an [`Executor`], with injectable collaborators for tests
pub struct ExecutorBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    auth: Option<Arc<dyn AuthProvider>>,
    sleeper: Option<Arc<dyn Sleeper>>,
    clock: Option<Arc<dyn Clock>>,
    cache: Option<SharedCache>,
}

impl ExecutorBuilder {
    /// Builder with no injected collaborators
    pub fn new(config: ClientConfig) -> Self {
        Self { config, transport: None, auth: None, sleeper: None, clock: None, cache: None }
    }

    /// Transport used instead of the reqwest client
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Auth provider used instead of one derived from the configuration
    #[must_use]
    pub fn auth_provider(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Sleeper for retry delays
    #[must_use]
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    /// Clock for the request deadline and credential expiry
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Response cache used regardless of `cache.enabled`
    #[must_use]
    pub fn cache(mut self, cache: SharedCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Assemble the executor
    ///
    /// # Errors
    /// Returns `ZscalerError::Config` for a zero request timeout or cache
    /// durations the cache cannot hold, and when the configuration cannot
    /// produce a base URL, an HTTP client or (without an injected provider)
    /// an auth strategy.
    pub fn build(self) -> Result<Executor> {
        let config = self.config;
        if config.request_timeout == 0 {
            return Err(ZscalerError::Config("requestTimeout must be positive".into()));
        }
        // Injected auth providers skip ClientConfig::validate
        config.cache.validate()?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let sleeper = self.sleeper.unwrap_or_else(|| Arc::new(TokioSleeper));
        let http = build_http_client(&config)?;

        let auth: Arc<dyn AuthProvider> = match self.auth {
            Some(auth) => auth,
            None => Arc::new(
                TokenProvider::new(AuthStrategy::from_config(&config)?, http.clone())
                    .with_clock(Arc::clone(&clock)),
            ),
        };
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(http),
        };
        let cache: SharedCache = match self.cache {
            Some(cache) => cache,
            None if config.cache.enabled => {
                Arc::new(TtlCache::<RawResponse>::new(config.cache.ttl(), config.cache.tti()))
            }
            None => Arc::new(NoOpCache),
        };

        let policy = RetryPolicy {
            max_retries: config.rate_limit.max_retries,
            base_backoff: Duration::from_millis(config.rate_limit.retry_backoff_ms),
            timeout: config.request_timeout(),
        };
        let retry = RetryController::new(transport, Arc::clone(&auth), sleeper, clock, policy);
        let builder = RequestBuilder::from_config(&config)?;

        debug!(
            base_url = builder.base_url(),
            legacy_product = ?config.legacy_product,
            cache_enabled = cache.is_enabled(),
            max_retries = policy.max_retries,
            "Executor ready"
        );

        Ok(Executor {
            inner: Arc::new(ExecutorInner {
                config,
                builder,
                retry,
                auth,
                cache,
                custom_headers: RwLock::new(BTreeMap::new()),
            }),
        })
    }
}

fn build_http_client(config: &ClientConfig) -> Result<HttpClient> {
    let mut builder = HttpClient::builder()
        .timeout(config.request_timeout())
        .user_agent(user_agent(config.user_agent_extra.as_deref()))
        .verify_tls(config.verify_tls);
    if let Some(url) = config.proxy.url() {
        builder = builder.proxy(url);
        if let (Some(user), Some(pass)) = (&config.proxy.username, &config.proxy.password) {
            builder = builder.proxy_credentials(user.clone(), pass.clone());
        }
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use zscaler_common::testing::{MockClock, RecordingSleeper};

    use super::*;

    #[derive(Debug, Default)]
    struct StaticAuth;

    #[async_trait]
    impl AuthProvider for StaticAuth {
        async fn auth_headers(&self) -> Result<Vec<(String, String)>> {
            Ok(vec![("authorization".into(), "Bearer static".into())])
        }

        async fn invalidate(&self) {}
    }

    /// Answers every request with the same response and records it
    #[derive(Debug)]
    struct FixedTransport {
        response: RawResponse,
        sent: Mutex<Vec<RequestDescriptor>>,
    }

    #[async_trait]
    impl Transport for FixedTransport {
        async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse> {
            self.sent.lock().push(request.clone());
            Ok(self.response.clone())
        }
    }

    fn executor(config: ClientConfig, response: RawResponse) -> (Executor, Arc<FixedTransport>) {
        let transport = Arc::new(FixedTransport { response, sent: Mutex::default() });
        let clock = MockClock::new();
        let executor = Executor::builder(config)
            .transport(transport.clone())
            .auth_provider(Arc::new(StaticAuth))
            .sleeper(Arc::new(RecordingSleeper::with_clock(clock.clone())))
            .clock(Arc::new(clock))
            .build()
            .unwrap();
        (executor, transport)
    }

    fn not_found() -> RawResponse {
        RawResponse::new(
            404,
            [("content-type", "application/json")],
            r#"{"id": "resource.not.found", "reason": "missing"}"#,
        )
    }

    #[test]
    fn test_oversized_cache_ttl_is_rejected() {
        let mut config = ClientConfig::default();
        config.cache.enabled = true;
        config.cache.default_ttl = 40_000_000_000;

        let result = Executor::builder(config)
            .transport(Arc::new(FixedTransport { response: not_found(), sent: Mutex::default() }))
            .auth_provider(Arc::new(StaticAuth))
            .build();
        assert!(matches!(result, Err(ZscalerError::Config(message)) if message.contains("cache.defaultTtl")));
    }

    #[tokio::test]
    async fn test_error_returned_inside_response_by_default() {
        let (executor, _) = executor(ClientConfig::default(), not_found());

        let response = executor.get("/zia/api/v1/users/9", None).await.unwrap();

        assert_eq!(response.status(), 404);
        assert!(!response.is_success());
        assert_eq!(response.error().and_then(ZscalerError::service_error).map(|b| b.id.as_str()), Some("resource.not.found"));
        assert!(response.into_result().is_err());
    }

    #[tokio::test]
    async fn test_fail_safe_returns_err() {
        let config = ClientConfig { fail_safe: true, ..ClientConfig::default() };
        let (executor, _) = executor(config, not_found());

        let err = executor.get("/zia/api/v1/users/9", None).await.unwrap_err();
        assert!(matches!(err, ZscalerError::Api { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_custom_headers_and_auth_are_sent() {
        let ok = RawResponse::new(200, [("content-type", "application/json")], "[]");
        let (executor, transport) = executor(ClientConfig::default(), ok);
        executor.set_custom_headers([("X-Custom", "1")]);

        executor.get("/zia/api/v1/users", None).await.unwrap();
        executor.clear_custom_headers();
        executor.get("/zia/api/v1/users", None).await.unwrap();

        let sent = transport.sent.lock();
        assert_eq!(sent[0].header("x-custom"), Some("1"));
        assert_eq!(sent[0].header("authorization"), Some("Bearer static"));
        assert_eq!(sent[1].header("x-custom"), None);
    }

    #[tokio::test]
    async fn test_cache_serves_repeat_get_and_post_invalidates() {
        let config = ClientConfig {
            cache: zscaler_domain::CacheSettings { enabled: true, ..Default::default() },
            ..ClientConfig::default()
        };
        let ok = RawResponse::new(200, [("content-type", "application/json")], r#"{"id": 1}"#);
        let (executor, transport) = executor(config, ok);

        executor.get("/zia/api/v1/users/1", None).await.unwrap();
        let cached = executor.get("/zia/api/v1/users/1", None).await.unwrap();
        assert_eq!(cached.body(), Some(&json!({"id": 1})));
        assert_eq!(transport.sent.lock().len(), 1);

        executor.put("/zia/api/v1/users/1", json!({"name": "x"})).await.unwrap();
        executor.get("/zia/api/v1/users/1", None).await.unwrap();
        assert_eq!(transport.sent.lock().len(), 3);
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let config = ClientConfig { request_timeout: 0, ..ClientConfig::default() };
        let result = Executor::builder(config).auth_provider(Arc::new(StaticAuth)).build();
        assert!(matches!(result, Err(ZscalerError::Config(_))));
    }
}
