//! Credentials produced by the authentication strategies
//!
//! A credential knows how it must be attached to a request. Bearer tokens go
//! in `Authorization`, the legacy ZIA session travels as a cookie, and the
//! legacy ZCC token uses its own header.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{HEADER_AUTHORIZATION, HEADER_COOKIE};
use crate::impl_domain_enum_conversions;

/// How a credential was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrantType {
    /// OneAPI client id and secret
    ClientSecret,
    /// OneAPI signed client assertion
    PrivateKeyJwt,
    /// ZPA `/signin`
    LegacyZpa,
    /// ZIA `/authenticatedSession`
    LegacyZiaSession,
    /// ZCC `/auth/v1/login`
    LegacyZcc,
}

impl_domain_enum_conversions!(GrantType {
    ClientSecret => "client_secret",
    PrivateKeyJwt => "private_key_jwt",
    LegacyZpa => "legacy_zpa",
    LegacyZiaSession => "legacy_zia_session",
    LegacyZcc => "legacy_zcc",
});

/// How a credential is attached to outgoing requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthScheme {
    /// `Authorization: Bearer <token>`
    Bearer,
    /// `Cookie: <name>=<token>`
    Cookie(String),
    /// `<name>: <token>`
    Header(String),
}

/// Authentication material held by the token provider
///
/// The token is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    expires_at: DateTime<Utc>,
    grant_type: GrantType,
    scheme: AuthScheme,
}

impl Credential {
    /// Create a credential expiring `lifetime_secs` from now
    ///
    /// Lifetimes beyond the representable range saturate instead of
    /// overflowing.
    pub fn new(
        token: impl Into<String>,
        lifetime_secs: i64,
        grant_type: GrantType,
        scheme: AuthScheme,
    ) -> Self {
        Self::with_expiry(token, offset_from_now(lifetime_secs), grant_type, scheme)
    }

    /// Credential with an absolute expiry
    pub fn with_expiry(
        token: impl Into<String>,
        expires_at: DateTime<Utc>,
        grant_type: GrantType,
        scheme: AuthScheme,
    ) -> Self {
        Self { token: token.into(), expires_at, grant_type, scheme }
    }

    /// Raw token, cookie value or ZCC token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Instant after which the credential must not be sent
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// How the credential was obtained
    pub const fn grant_type(&self) -> GrantType {
        self.grant_type
    }

    /// How the credential is attached to a request
    pub const fn scheme(&self) -> &AuthScheme {
        &self.scheme
    }

    /// Check if the credential is empty, expired, or expires within
    /// `skew_secs`
    pub fn is_expired(&self, skew_secs: i64) -> bool {
        self.token.is_empty() || offset_from_now(skew_secs) >= self.expires_at
    }

    /// Headers that authenticate a request with this credential
    ///
    /// Header names are lowercase.
    pub fn header_fragment(&self) -> Vec<(String, String)> {
        match &self.scheme {
            AuthScheme::Bearer => {
                vec![(HEADER_AUTHORIZATION.to_string(), format!("Bearer {}", self.token))]
            }
            AuthScheme::Cookie(name) => {
                vec![(HEADER_COOKIE.to_string(), format!("{name}={}", self.token))]
            }
            AuthScheme::Header(name) => vec![(name.to_lowercase(), self.token.clone())],
        }
    }
}

/// `now + secs`, clamped to the range `DateTime<Utc>` can hold
fn offset_from_now(secs: i64) -> DateTime<Utc> {
    let saturated = if secs < 0 { DateTime::<Utc>::MIN_UTC } else { DateTime::<Utc>::MAX_UTC };
    TimeDelta::try_seconds(secs)
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .unwrap_or(saturated)
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("grant_type", &self.grant_type)
            .field("scheme", &self.scheme)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_fragment() {
        let cred = Credential::new("abc", 3600, GrantType::ClientSecret, AuthScheme::Bearer);
        assert_eq!(
            cred.header_fragment(),
            vec![("authorization".to_string(), "Bearer abc".to_string())]
        );
    }

    #[test]
    fn test_cookie_fragment() {
        let cred = Credential::new(
            "SESSION123",
            1800,
            GrantType::LegacyZiaSession,
            AuthScheme::Cookie("JSESSIONID".into()),
        );
        let fragment = cred.header_fragment();
        assert_eq!(fragment, vec![("cookie".to_string(), "JSESSIONID=SESSION123".to_string())]);
        assert!(fragment.iter().all(|(name, _)| name != "authorization"));
    }

    #[test]
    fn test_named_header_fragment() {
        let cred =
            Credential::new("jwt", 3600, GrantType::LegacyZcc, AuthScheme::Header("Auth-Token".into()));
        assert_eq!(cred.header_fragment(), vec![("auth-token".to_string(), "jwt".to_string())]);
    }

    #[test]
    fn test_expiry_with_skew() {
        let cred = Credential::new("t", 60, GrantType::LegacyZpa, AuthScheme::Bearer);
        assert!(!cred.is_expired(0));
        assert!(!cred.is_expired(30));
        assert!(cred.is_expired(120));

        let expired = Credential::new("t", -1, GrantType::LegacyZpa, AuthScheme::Bearer);
        assert!(expired.is_expired(0));

        let empty = Credential::new("", 3600, GrantType::LegacyZpa, AuthScheme::Bearer);
        assert!(empty.is_expired(0));
    }

    #[test]
    fn test_extreme_lifetimes_saturate() {
        let forever = Credential::new("t", i64::MAX, GrantType::ClientSecret, AuthScheme::Bearer);
        assert_eq!(forever.expires_at(), DateTime::<Utc>::MAX_UTC);
        assert!(!forever.is_expired(60));

        let huge = Credential::new("t", 10_000_000_000_000, GrantType::ClientSecret, AuthScheme::Bearer);
        assert!(!huge.is_expired(60));

        let ancient = Credential::new("t", i64::MIN, GrantType::ClientSecret, AuthScheme::Bearer);
        assert!(ancient.is_expired(0));
    }

    #[test]
    fn test_debug_redacts_token() {
        let cred = Credential::new("super-secret", 60, GrantType::ClientSecret, AuthScheme::Bearer);
        let printed = format!("{cred:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
