//! SDK constants
//!
//! Well-known hosts, audiences and protocol literals shared by the request
//! builder and the authentication strategies.

// OneAPI
/// `audience` sent with every OneAPI token request
pub const ONEAPI_AUDIENCE: &str = "https://api.zscaler.com";
/// OneAPI gateway for the production cloud
pub const ONEAPI_PRODUCTION_BASE_URL: &str = "https://api.zsapi.net";
/// Gateway domain; non-production clouds prefix it with `api.<cloud>.`
pub const ONEAPI_API_DOMAIN: &str = "zsapi.net";
/// Identity host label, `<vanity>.zslogin.net`
pub const ONEAPI_LOGIN_DOMAIN: &str = "zslogin";
/// Token endpoint path on the identity host
pub const ONEAPI_TOKEN_PATH: &str = "/oauth2/v1/token";
/// Cloud name that selects the production hosts
pub const PRODUCTION_CLOUD: &str = "production";

// OAuth2 literals
/// OAuth2 `grant_type` for both OneAPI grants
pub const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "client_credentials";
/// `client_assertion_type` for private-key JWT assertions
pub const CLIENT_ASSERTION_TYPE_JWT_BEARER: &str =
    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";
/// Lifetime of a signed client assertion
pub const JWT_ASSERTION_LIFETIME_SECS: i64 = 600;

// Credential refresh
/// Used when a token response carries no `expires_in`
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;
/// The ZIA session cookie is refreshed after this long
pub const ZIA_SESSION_LIFETIME_SECS: i64 = 1800;
/// Credentials this close to expiry are refreshed early
pub const TOKEN_REFRESH_SKEW_SECS: i64 = 30;

// Legacy ZIA session
/// Cookie the ZIA session is carried in
pub const ZIA_SESSION_COOKIE: &str = "JSESSIONID";
/// ZIA session endpoint, relative to the API base
pub const ZIA_SESSION_PATH: &str = "/authenticatedSession";

// Legacy ZPA signin
/// ZPA signin endpoint, relative to the legacy host
pub const ZPA_SIGNIN_PATH: &str = "/signin";

// Legacy ZCC login
/// ZCC login endpoint, relative to the ZCC base URL
pub const ZCC_LOGIN_PATH: &str = "/auth/v1/login";
/// Header carrying the ZCC login token
pub const ZCC_AUTH_HEADER: &str = "auth-token";

// Request headers
/// Bearer token header
pub const HEADER_AUTHORIZATION: &str = "authorization";
/// Session cookie header
pub const HEADER_COOKIE: &str = "cookie";
/// User agent header
pub const HEADER_USER_AGENT: &str = "user-agent";
/// Accept header
pub const HEADER_ACCEPT: &str = "accept";
/// Content type header
pub const HEADER_CONTENT_TYPE: &str = "content-type";
/// Optional partner attribution header
pub const HEADER_PARTNER_ID: &str = "x-partner-id";
/// Accept and content type of every request
pub const CONTENT_TYPE_JSON: &str = "application/json";
/// First token of the `user-agent` header
pub const SDK_USER_AGENT_PREFIX: &str = "zscaler-sdk-rust";

// Tenant scoping
/// Body key moved into the query string for ZPA requests
pub const MICROTENANT_BODY_KEY: &str = "microtenant_id";
/// Query key the microtenant id is sent under
pub const MICROTENANT_QUERY_KEY: &str = "microtenantId";

/// Legacy ZPA configuration hosts, keyed by cloud name
pub const ZPA_LEGACY_BASE_URLS: [(&str, &str); 8] = [
    ("production", "https://config.private.zscaler.com"),
    ("zpatwo", "https://config.zpatwo.net"),
    ("beta", "https://config.zpabeta.net"),
    ("gov", "https://config.zpagov.net"),
    ("govus", "https://config.zpagov.us"),
    ("preview", "https://config.zpapreview.net"),
    ("qa", "https://config.qa.zpath.net"),
    ("qa2", "https://pdx2-zpa-config.qa2.zpath.net"),
];

/// Look up the legacy ZPA host for a cloud name (case-insensitive)
pub fn zpa_legacy_base_url(cloud: &str) -> Option<&'static str> {
    let cloud = cloud.trim().to_lowercase();
    ZPA_LEGACY_BASE_URLS.iter().find(|(name, _)| *name == cloud).map(|(_, url)| *url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zpa_legacy_lookup() {
        assert_eq!(zpa_legacy_base_url("PRODUCTION"), Some("https://config.private.zscaler.com"));
        assert_eq!(zpa_legacy_base_url("govus"), Some("https://config.zpagov.us"));
        assert_eq!(zpa_legacy_base_url("mars"), None);
    }
}
