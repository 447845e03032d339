//! Client configuration
//!
//! The configuration is one nested `client` mapping. Field names are
//! camelCase on disk (`clientId`, `rateLimit.maxRetries`, ...), which is also
//! what the `ZSCALER_*` environment overrides are derived from.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, ZscalerError};
use crate::impl_domain_enum_conversions;

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 240;
/// Default number of retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 2;
/// Default base delay for exponential back-off on 503/504 and transport errors
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1000;
/// Default cache time-to-live in seconds
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
/// Default cache time-to-idle in seconds
pub const DEFAULT_CACHE_TTI_SECS: u64 = 300;
/// Longest cache TTL/TTI accepted, one thousand years
pub const MAX_CACHE_DURATION_SECS: u64 = 1000 * 365 * 24 * 3600;

/// Root configuration document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZscalerConfig {
    /// Settings under the `client` key
    pub client: ClientConfig,
}

/// Legacy product selector
///
/// When set, the executor authenticates against the product's own login
/// endpoint instead of OneAPI and targets the product's legacy host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyProduct {
    /// ZPA `/signin` client credentials
    Zpa,
    /// ZIA session cookie
    Zia,
    /// ZCC portal login
    Zcc,
}

impl_domain_enum_conversions!(LegacyProduct {
    Zpa => "zpa",
    Zia => "zia",
    Zcc => "zcc",
});

/// Client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// OneAPI client identifier
    pub client_id: Option<String>,
    /// OneAPI client secret (client-secret grant)
    pub client_secret: Option<String>,
    /// PEM private key, or a path to one (private-key JWT grant)
    pub private_key: Option<String>,
    /// Vanity domain used to build the OneAPI token endpoint
    pub vanity_domain: Option<String>,
    /// Cloud name; absent or `production` targets production
    pub cloud: Option<String>,
    /// ZPA customer identifier
    pub customer_id: Option<String>,
    /// Default ZPA microtenant, overridable per call
    pub microtenant_id: Option<String>,
    /// Sent as `x-partner-id` when present
    pub partner_id: Option<String>,
    /// Replaces the derived OneAPI token endpoint
    pub token_url: Option<String>,
    /// Replaces the derived API base URL (OneAPI or legacy)
    pub override_url: Option<String>,
    /// Authenticate with a legacy product login instead of OneAPI
    pub legacy_product: Option<LegacyProduct>,
    /// Request timeout in seconds; also bounds the whole retry sequence
    pub request_timeout: u64,
    /// Verify server certificates
    pub verify_tls: bool,
    /// Return HTTP error statuses as `Err` instead of inside the response
    pub fail_safe: bool,
    /// Appended to the SDK user agent
    pub user_agent_extra: Option<String>,
    /// Retry budget and back-off
    pub rate_limit: RateLimitSettings,
    /// GET response cache
    pub cache: CacheSettings,
    /// Outbound proxy
    pub proxy: ProxySettings,
    /// Tracing output
    pub logging: LoggingSettings,
    /// Legacy ZPA credentials, used when `legacyProduct` is `zpa`
    pub zpa: LegacyZpaSettings,
    /// Legacy ZIA credentials, used when `legacyProduct` is `zia`
    pub zia: LegacyZiaSettings,
    /// Legacy ZCC credentials, used when `legacyProduct` is `zcc`
    pub zcc: LegacyZccSettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            private_key: None,
            vanity_domain: None,
            cloud: None,
            customer_id: None,
            microtenant_id: None,
            partner_id: None,
            token_url: None,
            override_url: None,
            legacy_product: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
            verify_tls: true,
            fail_safe: false,
            user_agent_extra: None,
            rate_limit: RateLimitSettings::default(),
            cache: CacheSettings::default(),
            proxy: ProxySettings::default(),
            logging: LoggingSettings::default(),
            zpa: LegacyZpaSettings::default(),
            zia: LegacyZiaSettings::default(),
            zcc: LegacyZccSettings::default(),
        }
    }
}

impl ClientConfig {
    /// Overall deadline for one request, retries included
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Cloud name, lowercased, or `None` for production
    pub fn non_production_cloud(&self) -> Option<String> {
        normalize_cloud(self.cloud.as_deref())
    }

    /// Check that one complete credential set is present and the cache
    /// settings are usable
    ///
    /// # Errors
    /// Returns `ZscalerError::Config` naming the first missing field, or
    /// for cache durations out of range.
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout == 0 {
            return Err(ZscalerError::Config("requestTimeout must be positive".into()));
        }
        self.cache.validate()?;

        match self.legacy_product {
            Some(LegacyProduct::Zpa) => {
                require(&self.zpa.client_id, "zpa.clientId")?;
                require(&self.zpa.client_secret, "zpa.clientSecret")?;
                require(&self.customer_id, "customerId")
            }
            Some(LegacyProduct::Zia) => {
                require(&self.zia.username, "zia.username")?;
                require(&self.zia.password, "zia.password")?;
                require(&self.zia.api_key, "zia.apiKey")?;
                require(&self.zia.cloud, "zia.cloud")
            }
            Some(LegacyProduct::Zcc) => {
                require(&self.zcc.api_key, "zcc.apiKey")?;
                require(&self.zcc.secret_key, "zcc.secretKey")?;
                require(&self.zcc.cloud, "zcc.cloud")
            }
            None => {
                require(&self.client_id, "clientId")?;
                if is_blank(&self.client_secret) && is_blank(&self.private_key) {
                    return Err(ZscalerError::Config(
                        "one of clientSecret or privateKey is required".into(),
                    ));
                }
                if self.token_url.is_none() {
                    require(&self.vanity_domain, "vanityDomain")?;
                }
                Ok(())
            }
        }
    }
}

/// Retry settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateLimitSettings {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base delay doubled on each back-off retry
    pub retry_backoff_ms: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self { max_retries: DEFAULT_MAX_RETRIES, retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS }
    }
}

/// GET response cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheSettings {
    /// Cache successful GET responses
    pub enabled: bool,
    /// Time-to-live in seconds
    pub default_ttl: u64,
    /// Time-to-idle in seconds
    pub default_tti: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            default_ttl: DEFAULT_CACHE_TTL_SECS,
            default_tti: DEFAULT_CACHE_TTI_SECS,
        }
    }
}

impl CacheSettings {
    /// Time-to-live as a `Duration`
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    /// Time-to-idle as a `Duration`
    pub const fn tti(&self) -> Duration {
        Duration::from_secs(self.default_tti)
    }

    /// Check that both expiry durations fit the cache
    ///
    /// # Errors
    /// Returns `ZscalerError::Config` when `defaultTtl` or `defaultTti`
    /// exceeds [`MAX_CACHE_DURATION_SECS`].
    pub fn validate(&self) -> Result<()> {
        for (name, secs) in [("cache.defaultTtl", self.default_ttl), ("cache.defaultTti", self.default_tti)] {
            if secs > MAX_CACHE_DURATION_SECS {
                return Err(ZscalerError::Config(format!(
                    "{name} must be at most {MAX_CACHE_DURATION_SECS} seconds, got {secs}"
                )));
            }
        }
        Ok(())
    }
}

/// Outbound proxy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxySettings {
    /// Host, with or without a scheme
    pub host: Option<String>,
    /// Appended to the host when set
    pub port: Option<u16>,
    /// Proxy basic auth user
    pub username: Option<String>,
    /// Proxy basic auth password
    pub password: Option<String>,
}

impl ProxySettings {
    /// Proxy URL, when a host is configured
    pub fn url(&self) -> Option<String> {
        let host = self.host.as_deref().map(str::trim).filter(|h| !h.is_empty())?;
        let base = if host.contains("://") { host.to_string() } else { format!("http://{host}") };
        Some(match self.port {
            Some(port) => format!("{base}:{port}"),
            None => base,
        })
    }
}

/// Tracing output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Install the tracing subscriber
    pub enabled: bool,
    /// Log at debug level instead of info
    pub verbose: bool,
}

/// Legacy ZPA credentials (`/signin`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacyZpaSettings {
    /// API client id
    pub client_id: Option<String>,
    /// API client secret
    pub client_secret: Option<String>,
    /// ZPA cloud name, `production` when unset
    pub cloud: Option<String>,
}

/// Legacy ZIA credentials (`/authenticatedSession`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacyZiaSettings {
    /// Admin login
    pub username: Option<String>,
    /// Admin password
    pub password: Option<String>,
    /// Obfuscated with the request timestamp before it is sent
    pub api_key: Option<String>,
    /// ZIA cloud name, for example `zscalertwo`
    pub cloud: Option<String>,
}

/// Legacy ZCC credentials (`/auth/v1/login`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacyZccSettings {
    /// Mobile portal API key
    pub api_key: Option<String>,
    /// Mobile portal secret key
    pub secret_key: Option<String>,
    /// ZCC cloud name
    pub cloud: Option<String>,
}

/// Lowercased cloud name, or `None` for absent/blank/`production`
pub fn normalize_cloud(cloud: Option<&str>) -> Option<String> {
    cloud
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty() && c != crate::constants::PRODUCTION_CLOUD)
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn require(value: &Option<String>, name: &str) -> Result<()> {
    if is_blank(value) {
        return Err(ZscalerError::Config(format!("missing required setting: {name}")));
    }
    Ok(())
}
