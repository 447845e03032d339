//! OneAPI `client_credentials` exchanges
//!
//! Both grants post a form to the vanity token endpoint. The private-key
//! variant replaces the shared secret with an RS256 client assertion.

use std::path::Path;

use serde::Serialize;
use tracing::debug;
use zscaler_common::time::Clock;
use zscaler_domain::constants::{
    CLIENT_ASSERTION_TYPE_JWT_BEARER, GRANT_TYPE_CLIENT_CREDENTIALS, JWT_ASSERTION_LIFETIME_SECS,
    ONEAPI_AUDIENCE,
};
use zscaler_domain::{AuthScheme, Credential, GrantType, Result, ZscalerError};

use super::strategy::{ensure_success, parse_token_response};
use crate::errors::InfraError;
use crate::http::HttpClient;

/// Claims of the client assertion
#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
    jti: String,
}

/// Exchange a client id and secret for a bearer token
pub async fn client_secret_exchange(
    http: &HttpClient,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<Credential> {
    debug!(token_url, client_id, "Requesting OneAPI token with client secret");
    let response = http
        .post_form(
            token_url,
            &[
                ("grant_type", GRANT_TYPE_CLIENT_CREDENTIALS),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("audience", ONEAPI_AUDIENCE),
            ],
        )
        .await?;
    ensure_success(&response, token_url)?;

    let (token, lifetime) = parse_token_response(&response, token_url)?;
    Ok(Credential::new(token, lifetime, GrantType::ClientSecret, AuthScheme::Bearer))
}

/// Exchange a signed client assertion for a bearer token
pub async fn private_key_exchange(
    http: &HttpClient,
    token_url: &str,
    assertion: &str,
) -> Result<Credential> {
    debug!(token_url, "Requesting OneAPI token with client assertion");
    let response = http
        .post_form(
            token_url,
            &[
                ("grant_type", GRANT_TYPE_CLIENT_CREDENTIALS),
                ("client_assertion_type", CLIENT_ASSERTION_TYPE_JWT_BEARER),
                ("client_assertion", assertion),
                ("audience", ONEAPI_AUDIENCE),
            ],
        )
        .await?;
    ensure_success(&response, token_url)?;

    let (token, lifetime) = parse_token_response(&response, token_url)?;
    Ok(Credential::new(token, lifetime, GrantType::PrivateKeyJwt, AuthScheme::Bearer))
}

/// Sign a client assertion valid for ten minutes from `clock`'s now
///
/// # Errors
/// Returns `ZscalerError::Config` when the key is not a usable RSA PEM.
pub fn build_client_assertion(
    client_id: &str,
    audience: &str,
    private_key_pem: &str,
    clock: &dyn Clock,
) -> Result<String> {
    let iat = (clock.millis_since_epoch() / 1000) as i64;
    let claims = AssertionClaims {
        iss: client_id,
        sub: client_id,
        aud: audience,
        iat,
        exp: iat + JWT_ASSERTION_LIFETIME_SECS,
        jti: uuid::Uuid::new_v4().to_string(),
    };

    let key = jsonwebtoken::EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
        .map_err(|e| ZscalerError::from(InfraError::from(e)))?;
    let header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256);
    jsonwebtoken::encode(&header, &claims, &key).map_err(|e| InfraError::from(e).into())
}

/// Accept inline PEM text or a path to a PEM file
///
/// # Errors
/// Returns `ZscalerError::Config` when the path cannot be read.
pub fn resolve_private_key(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.starts_with("-----BEGIN") {
        return Ok(trimmed.to_string());
    }
    std::fs::read_to_string(Path::new(trimmed)).map_err(|err| {
        ZscalerError::Config(format!("cannot read private key file {trimmed}: {err}"))
    })
}
