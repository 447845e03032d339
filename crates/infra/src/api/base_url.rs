//! Host resolution per cloud and product

use zscaler_domain::constants::{
    zpa_legacy_base_url, ONEAPI_API_DOMAIN, ONEAPI_LOGIN_DOMAIN, ONEAPI_PRODUCTION_BASE_URL,
    ONEAPI_TOKEN_PATH, PRODUCTION_CLOUD,
};
use zscaler_domain::{normalize_cloud, ClientConfig, LegacyProduct, Result, ZscalerError};

/// Base URL every request endpoint is appended to
pub fn api_base_url(config: &ClientConfig) -> Result<String> {
    match config.legacy_product {
        Some(product) => legacy_base_url(config, product),
        None => Ok(oneapi_base_url(config)),
    }
}

/// `https://api.zsapi.net` or `https://api.<cloud>.zsapi.net`
pub fn oneapi_base_url(config: &ClientConfig) -> String {
    if let Some(url) = override_url(config) {
        return url;
    }
    match config.non_production_cloud() {
        Some(cloud) => format!("https://api.{cloud}.{ONEAPI_API_DOMAIN}"),
        None => ONEAPI_PRODUCTION_BASE_URL.to_string(),
    }
}

/// OneAPI token endpoint on the tenant's vanity domain
///
/// # Errors
/// Returns `ZscalerError::Config` when neither `tokenUrl` nor
/// `vanityDomain` is set.
pub fn oneapi_token_url(config: &ClientConfig) -> Result<String> {
    if let Some(url) = config.token_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        return Ok(url.to_string());
    }
    let vanity = config
        .vanity_domain
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ZscalerError::Config("missing required setting: vanityDomain".into()))?;
    let cloud = config.non_production_cloud().unwrap_or_default();
    Ok(format!("https://{vanity}.{ONEAPI_LOGIN_DOMAIN}{cloud}.net{ONEAPI_TOKEN_PATH}"))
}

/// Legacy product host, honoring `overrideUrl`
///
/// # Errors
/// Returns `ZscalerError::Config` for an unknown ZPA cloud or a missing
/// ZIA/ZCC cloud.
pub fn legacy_base_url(config: &ClientConfig, product: LegacyProduct) -> Result<String> {
    if let Some(url) = override_url(config) {
        return Ok(url);
    }
    match product {
        LegacyProduct::Zpa => {
            let cloud = normalize_cloud(config.zpa.cloud.as_deref().or(config.cloud.as_deref()))
                .unwrap_or_else(|| PRODUCTION_CLOUD.to_string());
            zpa_legacy_base_url(&cloud)
                .map(ToString::to_string)
                .ok_or_else(|| ZscalerError::Config(format!("unknown ZPA cloud: {cloud}")))
        }
        LegacyProduct::Zia => {
            let cloud = product_cloud(config.zia.cloud.as_deref(), "zia.cloud")?;
            Ok(format!("https://zsapi.{cloud}.net/api/v1"))
        }
        LegacyProduct::Zcc => {
            let cloud = product_cloud(config.zcc.cloud.as_deref(), "zcc.cloud")?;
            Ok(format!("https://api-mobile.{cloud}.net/papi"))
        }
    }
}

fn override_url(config: &ClientConfig) -> Option<String> {
    config
        .override_url
        .as_deref()
        .map(|u| u.trim().trim_end_matches('/'))
        .filter(|u| !u.is_empty())
        .map(ToString::to_string)
}

fn product_cloud(cloud: Option<&str>, name: &str) -> Result<String> {
    cloud
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ZscalerError::Config(format!("missing required setting: {name}")))
}
