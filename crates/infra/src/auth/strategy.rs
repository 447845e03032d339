//! Grant selection and dispatch

use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use zscaler_common::time::Clock;
use zscaler_domain::constants::{DEFAULT_TOKEN_LIFETIME_SECS, ONEAPI_AUDIENCE};
use zscaler_domain::{ClientConfig, Credential, GrantType, LegacyProduct, RawResponse, Result, ZscalerError};

use super::{legacy, oneapi};
use crate::api::base_url;
use crate::http::HttpClient;

/// The configured way of obtaining a credential
#[derive(Clone)]
pub enum AuthStrategy {
    /// OneAPI `client_credentials` with a shared secret
    ClientSecret {
        /// Full token endpoint URL
        token_url: String,
        /// OAuth client id
        client_id: String,
        /// OAuth client secret
        client_secret: String,
    },
    /// OneAPI `client_credentials` with an RS256 client assertion
    PrivateKeyJwt {
        /// Full token endpoint URL
        token_url: String,
        /// OAuth client id, the assertion issuer and subject
        client_id: String,
        /// PEM contents, already read from disk when a path was configured
        private_key_pem: String,
    },
    /// Legacy ZPA `/signin`
    LegacyZpa {
        /// Legacy ZPA host
        base_url: String,
        /// API client id
        client_id: String,
        /// API client secret
        client_secret: String,
    },
    /// Legacy ZIA `/authenticatedSession`
    LegacyZia {
        /// ZIA API base
        base_url: String,
        /// Admin login
        username: String,
        /// Admin password
        password: String,
        /// Unobfuscated API key
        api_key: String,
    },
    /// Legacy ZCC `/auth/v1/login`
    LegacyZcc {
        /// ZCC API base
        base_url: String,
        /// Portal API key
        api_key: String,
        /// Portal secret key
        secret_key: String,
    },
}

impl AuthStrategy {
    /// Select the strategy described by `config`
    ///
    /// A legacy product wins over OneAPI credentials; among OneAPI
    /// credentials a client secret wins over a private key. Private keys
    /// given as a file path are read here.
    ///
    /// # Errors
    /// Returns `ZscalerError::Config` when the selected credential set is
    /// incomplete or the private key file cannot be read.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        match config.legacy_product {
            Some(LegacyProduct::Zpa) => Ok(Self::LegacyZpa {
                base_url: base_url::legacy_base_url(config, LegacyProduct::Zpa)?,
                client_id: required(config.zpa.client_id.as_deref(), "zpa.clientId")?,
                client_secret: required(config.zpa.client_secret.as_deref(), "zpa.clientSecret")?,
            }),
            Some(LegacyProduct::Zia) => Ok(Self::LegacyZia {
                base_url: base_url::legacy_base_url(config, LegacyProduct::Zia)?,
                username: required(config.zia.username.as_deref(), "zia.username")?,
                password: required(config.zia.password.as_deref(), "zia.password")?,
                api_key: required(config.zia.api_key.as_deref(), "zia.apiKey")?,
            }),
            Some(LegacyProduct::Zcc) => Ok(Self::LegacyZcc {
                base_url: base_url::legacy_base_url(config, LegacyProduct::Zcc)?,
                api_key: required(config.zcc.api_key.as_deref(), "zcc.apiKey")?,
                secret_key: required(config.zcc.secret_key.as_deref(), "zcc.secretKey")?,
            }),
            None => {
                let token_url = base_url::oneapi_token_url(config)?;
                let client_id = required(config.client_id.as_deref(), "clientId")?;
                match config.client_secret.as_deref().filter(|s| !s.trim().is_empty()) {
                    Some(secret) => Ok(Self::ClientSecret {
                        token_url,
                        client_id,
                        client_secret: secret.to_string(),
                    }),
                    None => {
                        let key = required(config.private_key.as_deref(), "privateKey")?;
                        Ok(Self::PrivateKeyJwt {
                            token_url,
                            client_id,
                            private_key_pem: oneapi::resolve_private_key(&key)?,
                        })
                    }
                }
            }
        }
    }

    /// Grant this strategy performs
    pub const fn grant_type(&self) -> GrantType {
        match self {
            Self::ClientSecret { .. } => GrantType::ClientSecret,
            Self::PrivateKeyJwt { .. } => GrantType::PrivateKeyJwt,
            Self::LegacyZpa { .. } => GrantType::LegacyZpa,
            Self::LegacyZia { .. } => GrantType::LegacyZiaSession,
            Self::LegacyZcc { .. } => GrantType::LegacyZcc,
        }
    }

    /// URL the credential exchange is sent to
    pub fn endpoint(&self) -> String {
        match self {
            Self::ClientSecret { token_url, .. } | Self::PrivateKeyJwt { token_url, .. } => {
                token_url.clone()
            }
            Self::LegacyZpa { base_url, .. } => legacy::zpa_signin_url(base_url),
            Self::LegacyZia { base_url, .. } => legacy::zia_session_url(base_url),
            Self::LegacyZcc { base_url, .. } => legacy::zcc_login_url(base_url),
        }
    }

    /// Perform one credential exchange
    ///
    /// # Errors
    /// Returns `ZscalerError::Auth` for any non-2xx answer or an unreadable
    /// token response, and `ZscalerError::Transport` when the endpoint is
    /// unreachable. Nothing is retried here.
    pub async fn authenticate(&self, http: &HttpClient, clock: &dyn Clock) -> Result<Credential> {
        match self {
            Self::ClientSecret { token_url, client_id, client_secret } => {
                oneapi::client_secret_exchange(http, token_url, client_id, client_secret).await
            }
            Self::PrivateKeyJwt { token_url, client_id, private_key_pem } => {
                let assertion = oneapi::build_client_assertion(
                    client_id,
                    ONEAPI_AUDIENCE,
                    private_key_pem,
                    clock,
                )?;
                oneapi::private_key_exchange(http, token_url, &assertion).await
            }
            Self::LegacyZpa { base_url, client_id, client_secret } => {
                legacy::zpa_signin(http, base_url, client_id, client_secret).await
            }
            Self::LegacyZia { base_url, username, password, api_key } => {
                legacy::zia_session(http, base_url, username, password, api_key, clock).await
            }
            Self::LegacyZcc { base_url, api_key, secret_key } => {
                legacy::zcc_login(http, base_url, api_key, secret_key).await
            }
        }
    }
}

impl fmt::Debug for AuthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthStrategy")
            .field("grant_type", &self.grant_type())
            .field("endpoint", &self.endpoint())
            .finish_non_exhaustive()
    }
}

fn required(value: Option<&str>, name: &str) -> Result<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| ZscalerError::Config(format!("missing required setting: {name}")))
}

/// Fail with an authentication error unless the exchange succeeded
pub(crate) fn ensure_success(response: &RawResponse, url: &str) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    let body: String = response.body().chars().take(512).collect();
    Err(ZscalerError::Auth(format!("{url} returned status {}: {body}", response.status())))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<Value>,
}

/// Token and lifetime from an OAuth-style `{access_token, expires_in}` body
pub(crate) fn parse_token_response(response: &RawResponse, url: &str) -> Result<(String, i64)> {
    let parsed: TokenResponse = serde_json::from_str(response.body()).map_err(|err| {
        ZscalerError::Auth(format!("token response from {url} is not usable: {err}"))
    })?;
    if parsed.access_token.trim().is_empty() {
        return Err(ZscalerError::Auth(format!("token response from {url} has an empty token")));
    }
    Ok((parsed.access_token, lifetime_secs(parsed.expires_in.as_ref())))
}

/// `expires_in` may arrive as a number or a numeric string
pub(crate) fn lifetime_secs(expires_in: Option<&Value>) -> i64 {
    match expires_in {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|secs| *secs > 0)
    .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use zscaler_domain::{LegacyZccSettings, LegacyZiaSettings, LegacyZpaSettings};

    use super::*;

    fn oneapi_config() -> ClientConfig {
        ClientConfig {
            client_id: Some("client".into()),
            client_secret: Some("secret".into()),
            vanity_domain: Some("acme".into()),
            ..ClientConfig::default()
        }
    }

    #[test]
    fn test_selects_client_secret() {
        let strategy = AuthStrategy::from_config(&oneapi_config()).unwrap();
        assert_eq!(strategy.grant_type(), GrantType::ClientSecret);
        assert_eq!(strategy.endpoint(), "https://acme.zslogin.net/oauth2/v1/token");
    }

    #[test]
    fn test_non_production_token_url() {
        let config = ClientConfig { cloud: Some("beta".into()), ..oneapi_config() };
        let strategy = AuthStrategy::from_config(&config).unwrap();
        assert_eq!(strategy.endpoint(), "https://acme.zsloginbeta.net/oauth2/v1/token");
    }

    #[test]
    fn test_selects_legacy_products() {
        let zpa = ClientConfig {
            legacy_product: Some(LegacyProduct::Zpa),
            customer_id: Some("123".into()),
            zpa: LegacyZpaSettings {
                client_id: Some("id".into()),
                client_secret: Some("secret".into()),
                cloud: Some("BETA".into()),
            },
            ..ClientConfig::default()
        };
        let strategy = AuthStrategy::from_config(&zpa).unwrap();
        assert_eq!(strategy.grant_type(), GrantType::LegacyZpa);
        assert_eq!(strategy.endpoint(), "https://config.zpabeta.net/signin");

        let zia = ClientConfig {
            legacy_product: Some(LegacyProduct::Zia),
            zia: LegacyZiaSettings {
                username: Some("admin@acme.com".into()),
                password: Some("pw".into()),
                api_key: Some("abcdefghijkl".into()),
                cloud: Some("zscalertwo".into()),
            },
            ..ClientConfig::default()
        };
        let strategy = AuthStrategy::from_config(&zia).unwrap();
        assert_eq!(strategy.grant_type(), GrantType::LegacyZiaSession);
        assert_eq!(strategy.endpoint(), "https://zsapi.zscalertwo.net/api/v1/authenticatedSession");

        let zcc = ClientConfig {
            legacy_product: Some(LegacyProduct::Zcc),
            zcc: LegacyZccSettings {
                api_key: Some("k".into()),
                secret_key: Some("s".into()),
                cloud: Some("zscaler".into()),
            },
            ..ClientConfig::default()
        };
        let strategy = AuthStrategy::from_config(&zcc).unwrap();
        assert_eq!(strategy.grant_type(), GrantType::LegacyZcc);
        assert_eq!(strategy.endpoint(), "https://api-mobile.zscaler.net/papi/auth/v1/login");
    }

    #[test]
    fn test_incomplete_config_is_rejected() {
        let config = ClientConfig { client_secret: None, ..oneapi_config() };
        assert!(matches!(AuthStrategy::from_config(&config), Err(ZscalerError::Config(_))));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let strategy = AuthStrategy::from_config(&oneapi_config()).unwrap();
        let printed = format!("{strategy:?}");
        assert!(!printed.contains("secret\""));
        assert!(!printed.contains("client_secret"));
    }

    #[test]
    fn test_lifetime_parsing() {
        assert_eq!(lifetime_secs(Some(&json!(3599))), 3599);
        assert_eq!(lifetime_secs(Some(&json!("1800"))), 1800);
        assert_eq!(lifetime_secs(Some(&json!("soon"))), DEFAULT_TOKEN_LIFETIME_SECS);
        assert_eq!(lifetime_secs(Some(&json!(0))), DEFAULT_TOKEN_LIFETIME_SECS);
        assert_eq!(lifetime_secs(None), DEFAULT_TOKEN_LIFETIME_SECS);
    }

    #[test]
    fn test_non_success_is_auth_error() {
        let response = RawResponse::new(401, [("content-type", "application/json")], "{\"error\":\"invalid_client\"}");
        match ensure_success(&response, "https://t") {
            Err(ZscalerError::Auth(msg)) => {
                assert!(msg.contains("401"));
                assert!(msg.contains("invalid_client"));
            }
            other => panic!("expected auth error, got {other:?}"),
        }
    }
}
