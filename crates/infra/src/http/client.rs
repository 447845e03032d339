//! reqwest-backed [`Transport`](super::Transport)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Client as ReqwestClient, Method, Response};
use tracing::debug;
use zscaler_domain::{HttpMethod, RawResponse, RequestDescriptor, Result, ZscalerError};

use super::Transport;
use crate::errors::{transport_error, InfraError};

/// reqwest-backed transport with proxy, TLS and timeout settings.
///
/// Clones share one connection pool; the pool is released when the last
/// clone is dropped.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: ReqwestClient,
    timeout: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Per-exchange timeout.
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute one request described by `request`.
    pub async fn execute(&self, request: &RequestDescriptor) -> Result<RawResponse> {
        let method = request.method();
        let mut url = reqwest::Url::parse(request.url()).map_err(|err| {
            ZscalerError::InvalidRequest(format!("invalid URL {}: {err}", request.url()))
        })?;
        if !request.query().is_empty() {
            url.query_pairs_mut().extend_pairs(request.query());
        }

        let mut builder = self.client.request(to_reqwest_method(method), url.clone());
        for (name, value) in request.headers() {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
                ZscalerError::InvalidRequest(format!("invalid header name {name}: {err}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|err| {
                ZscalerError::InvalidRequest(format!("invalid value for header {name}: {err}"))
            })?;
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body() {
            let bytes = serde_json::to_vec(body).map_err(|err| ZscalerError::from(InfraError::from(err)))?;
            builder = builder.body(bytes);
        }

        debug!(
            %method,
            url = %url,
            correlation_id = %request.correlation_id(),
            "sending HTTP request"
        );

        let response =
            builder.send().await.map_err(|err| transport_error(method, request.url(), &err))?;
        let raw = read_response(method, request.url(), response).await?;

        debug!(
            %method,
            url = %url,
            status = raw.status(),
            correlation_id = %request.correlation_id(),
            "received HTTP response"
        );
        Ok(raw)
    }

    /// POST an `application/x-www-form-urlencoded` body.
    ///
    /// Used by the OAuth and legacy signin endpoints, which do not accept JSON.
    pub async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<RawResponse> {
        debug!(url, "sending form POST");
        let response = self
            .client
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(form)
            .send()
            .await
            .map_err(|err| transport_error(HttpMethod::Post, url, &err))?;
        read_response(HttpMethod::Post, url, response).await
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse> {
        self.execute(request).await
    }
}

async fn read_response(method: HttpMethod, url: &str, response: Response) -> Result<RawResponse> {
    let status = response.status().as_u16();
    let headers: Vec<(String, String)> = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (name.as_str().to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned())
        })
        .collect();
    let body = response.text().await.map_err(|err| transport_error(method, url, &err))?;
    Ok(RawResponse::new(status, headers, body))
}

const fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    proxy_url: Option<String>,
    proxy_credentials: Option<(String, String)>,
    verify_tls: bool,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: None,
            proxy_url: None,
            proxy_credentials: None,
            verify_tls: true,
        }
    }
}

impl HttpClientBuilder {
    /// Per-exchange timeout (default 30s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `user-agent` sent when a request carries none.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Route every request through `url`; without one, no proxy is used.
    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }

    /// Basic auth for the proxy set with [`proxy`](Self::proxy).
    pub fn proxy_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.proxy_credentials = Some((username.into(), password.into()));
        self
    }

    /// Disable certificate verification when `false`.
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Build the reqwest client.
    ///
    /// # Errors
    /// Returns `ZscalerError::Config` for an unparseable proxy URL or when
    /// reqwest cannot build the client.
    pub fn build(self) -> Result<HttpClient> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout);

        builder = match self.proxy_url {
            Some(url) => {
                let mut proxy = reqwest::Proxy::all(&url).map_err(|err| {
                    ZscalerError::Config(format!("invalid proxy URL {url}: {err}"))
                })?;
                if let Some((username, password)) = &self.proxy_credentials {
                    proxy = proxy.basic_auth(username, password);
                }
                builder.proxy(proxy)
            }
            None => builder.no_proxy(),
        };

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if !self.verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(|err| ZscalerError::from(InfraError::from(err)))?;

        Ok(HttpClient { client, timeout: self.timeout })
    }
}
