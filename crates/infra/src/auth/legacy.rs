//! Legacy product logins
//!
//! Each product predates OneAPI and has its own login endpoint and its own
//! way of presenting the resulting credential:
//!
//! - ZPA posts a form to `/signin` and returns a bearer token
//! - ZIA posts an obfuscated API key to `/authenticatedSession` and returns
//!   a `JSESSIONID` cookie
//! - ZCC posts its key pair to `/auth/v1/login` and returns a JWT that is
//!   sent back as the `auth-token` header

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use zscaler_common::time::Clock;
use zscaler_domain::constants::{
    CONTENT_TYPE_JSON, DEFAULT_TOKEN_LIFETIME_SECS, HEADER_CONTENT_TYPE, ZCC_AUTH_HEADER,
    ZCC_LOGIN_PATH, ZIA_SESSION_COOKIE, ZIA_SESSION_LIFETIME_SECS, ZIA_SESSION_PATH,
    ZPA_SIGNIN_PATH,
};
use zscaler_domain::{
    AuthScheme, Credential, GrantType, HttpMethod, RawResponse, RequestDescriptor, Result,
    Service, ZscalerError,
};

use super::strategy::{ensure_success, parse_token_response};
use crate::http::HttpClient;

/// Minimum API key length the obfuscation indexes into
const ZIA_API_KEY_MIN_LEN: usize = 12;

/// `<base>/signin`
pub fn zpa_signin_url(base_url: &str) -> String {
    format!("{}{ZPA_SIGNIN_PATH}", base_url.trim_end_matches('/'))
}

/// `<base>/authenticatedSession`
pub fn zia_session_url(base_url: &str) -> String {
    format!("{}{ZIA_SESSION_PATH}", base_url.trim_end_matches('/'))
}

/// `<base>/auth/v1/login`
pub fn zcc_login_url(base_url: &str) -> String {
    format!("{}{ZCC_LOGIN_PATH}", base_url.trim_end_matches('/'))
}

/* -------------------------------------------------------------------------- */
/* ZPA */
/* -------------------------------------------------------------------------- */

/// Exchange ZPA client credentials for a bearer token
///
/// # Errors
/// Returns `ZscalerError::Auth` when the signin is rejected or the answer
/// carries no token.
pub async fn zpa_signin(
    http: &HttpClient,
    base_url: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<Credential> {
    let url = zpa_signin_url(base_url);
    debug!(url = %url, client_id, "Signing in to ZPA");

    let response = http
        .post_form(&url, &[("client_id", client_id), ("client_secret", client_secret)])
        .await?;
    ensure_success(&response, &url)?;

    let (token, lifetime) = parse_token_response(&response, &url)?;
    Ok(Credential::new(token, lifetime, GrantType::LegacyZpa, AuthScheme::Bearer))
}

/* -------------------------------------------------------------------------- */
/* ZIA */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ZiaSessionRequest<'a> {
    api_key: String,
    username: &'a str,
    password: &'a str,
    timestamp: String,
}

/// Open a ZIA session and return its `JSESSIONID` cookie
///
/// The API key is obfuscated with `clock`'s current time before it is sent.
///
/// # Errors
/// Returns `ZscalerError::Auth` for a short API key, a rejected login or
/// a response without the session cookie.
pub async fn zia_session(
    http: &HttpClient,
    base_url: &str,
    username: &str,
    password: &str,
    api_key: &str,
    clock: &dyn Clock,
) -> Result<Credential> {
    let url = zia_session_url(base_url);
    let timestamp = clock.millis_since_epoch();
    let payload = ZiaSessionRequest {
        api_key: obfuscate_api_key(api_key, timestamp)?,
        username,
        password,
        timestamp: timestamp.to_string(),
    };
    debug!(url = %url, username, "Opening ZIA session");

    let response = post_json(http, &url, Service::Zia, &payload).await?;
    ensure_success(&response, &url)?;

    let session = response
        .header("set-cookie")
        .and_then(extract_session_id)
        .ok_or_else(|| {
            ZscalerError::Auth(format!("{url} did not return a {ZIA_SESSION_COOKIE} cookie"))
        })?;

    Ok(Credential::new(
        session,
        ZIA_SESSION_LIFETIME_SECS,
        GrantType::LegacyZiaSession,
        AuthScheme::Cookie(ZIA_SESSION_COOKIE.to_string()),
    ))
}

/// Obfuscate a ZIA API key against a millisecond timestamp
///
/// With `n` the last six digits of the timestamp and `r` the value of `n`
/// shifted right by one, zero-padded to six digits, the result is the key
/// character at each digit of `n` followed by the key character at each
/// digit of `r` plus two.
///
/// # Errors
/// Returns `ZscalerError::Config` when the key is shorter than 12
/// characters.
pub fn obfuscate_api_key(api_key: &str, timestamp_ms: u64) -> Result<String> {
    let key: Vec<char> = api_key.chars().collect();
    if key.len() < ZIA_API_KEY_MIN_LEN {
        return Err(ZscalerError::Config(format!(
            "zia.apiKey must be at least {ZIA_API_KEY_MIN_LEN} characters"
        )));
    }

    let n = timestamp_ms % 1_000_000;
    let high = format!("{n:06}");
    let low = format!("{:06}", n >> 1);

    let mut out = String::with_capacity(ZIA_API_KEY_MIN_LEN);
    for digit in high.bytes() {
        out.push(key[usize::from(digit - b'0')]);
    }
    for digit in low.bytes() {
        out.push(key[usize::from(digit - b'0') + 2]);
    }
    Ok(out)
}

/// Session id from a `Set-Cookie` header value
pub fn extract_session_id(set_cookie: &str) -> Option<String> {
    let pattern = Regex::new(&format!("{ZIA_SESSION_COOKIE}=([^;,\\s]+)")).ok()?;
    pattern.captures(set_cookie).and_then(|c| c.get(1)).map(|m| m.as_str().to_string())
}

/* -------------------------------------------------------------------------- */
/* ZCC */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ZccLoginRequest<'a> {
    api_key: &'a str,
    secret_key: &'a str,
}

/// Log in to the ZCC portal; the token travels in `auth-token`
///
/// # Errors
/// Returns `ZscalerError::Auth` when the login is rejected or the answer
/// carries no token.
pub async fn zcc_login(
    http: &HttpClient,
    base_url: &str,
    api_key: &str,
    secret_key: &str,
) -> Result<Credential> {
    let url = zcc_login_url(base_url);
    debug!(url = %url, "Logging in to ZCC");

    let response =
        post_json(http, &url, Service::Zcc, &ZccLoginRequest { api_key, secret_key }).await?;
    ensure_success(&response, &url)?;

    let body: Value = serde_json::from_str(response.body())
        .map_err(|err| ZscalerError::Auth(format!("login response from {url} is not JSON: {err}")))?;
    let token = body
        .get("jwtToken")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ZscalerError::Auth(format!("login response from {url} has no jwtToken")))?;

    Ok(Credential::new(
        token,
        DEFAULT_TOKEN_LIFETIME_SECS,
        GrantType::LegacyZcc,
        AuthScheme::Header(ZCC_AUTH_HEADER.to_string()),
    ))
}

async fn post_json<T: Serialize>(
    http: &HttpClient,
    url: &str,
    service: Service,
    payload: &T,
) -> Result<RawResponse> {
    let body = serde_json::to_value(payload)
        .map_err(|err| ZscalerError::Serialization(err.to_string()))?;
    let request = RequestDescriptor::new(HttpMethod::Post, url, service)
        .with_header(HEADER_CONTENT_TYPE, CONTENT_TYPE_JSON)
        .with_body(Some(body));
    http.execute(&request).await
}
