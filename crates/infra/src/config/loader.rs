//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Search the standard locations for a config file; use defaults if none
//! 2. Apply `ZSCALER_*` environment overrides
//! 3. Validate that one complete credential set is present
//!
//! ## Environment Variables
//! Every setting can be overridden by flattening its dotted path and
//! uppercasing it: `client.cache.enabled` is `ZSCALER_CLIENT_CACHE_ENABLED`,
//! `client.rateLimit.maxRetries` is `ZSCALER_CLIENT_RATE_LIMIT_MAX_RETRIES`.
//!
//! The common credentials also answer to short names when the long form is
//! unset: `ZSCALER_CLIENT_ID`, `ZSCALER_CLIENT_SECRET`,
//! `ZSCALER_PRIVATE_KEY`, `ZSCALER_VANITY_DOMAIN`, `ZSCALER_CLOUD`.
//!
//! ## File Locations
//! The loader searches the following paths (in order):
//! 1. `./zscaler.json` or `./zscaler.toml`
//! 2. `$HOME/.zscaler/zscaler.json` or `$HOME/.zscaler/zscaler.toml`

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use zscaler_common::case::camel_to_snake;
use zscaler_domain::{Result, ZscalerConfig, ZscalerError};

use crate::errors::InfraError;

const ENV_PREFIX: &str = "ZSCALER";

/// Settings that default to `null` but hold numbers
const NUMERIC_OPTIONAL_PATHS: [&str; 1] = ["client.proxy.port"];

/// Short environment names accepted for common credentials
const ENV_ALIASES: [(&str, &str); 5] = [
    ("client.clientId", "ZSCALER_CLIENT_ID"),
    ("client.clientSecret", "ZSCALER_CLIENT_SECRET"),
    ("client.privateKey", "ZSCALER_PRIVATE_KEY"),
    ("client.vanityDomain", "ZSCALER_VANITY_DOMAIN"),
    ("client.cloud", "ZSCALER_CLOUD"),
];

/// Load, override and validate the configuration
///
/// # Errors
/// Returns `ZscalerError::Config` if a found file is invalid, an override
/// has the wrong type, or no complete credential set results.
pub fn load() -> Result<ZscalerConfig> {
    let config = match search_config_paths() {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::debug!("No config file found, starting from defaults");
            ZscalerConfig::default()
        }
    };
    let config = apply_env_overrides(config)?;
    config.client.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, searches the standard locations. Format is detected by
/// extension (`.json` or `.toml`). No overrides are applied.
///
/// # Errors
/// Returns `ZscalerError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<ZscalerConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ZscalerError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => search_config_paths().ok_or_else(|| {
            ZscalerError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ZscalerError::from(InfraError::from(e)))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<ZscalerConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ZscalerError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ZscalerError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(ZscalerError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file in the standard locations
pub fn search_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend([cwd.join("zscaler.json"), cwd.join("zscaler.toml")]);
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        let dir = home.join(".zscaler");
        candidates.extend([dir.join("zscaler.json"), dir.join("zscaler.toml")]);
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Environment variable for a dotted camelCase path
///
/// ```
/// use zscaler_infra::config::env_var_name;
///
/// assert_eq!(env_var_name("client.rateLimit.maxRetries"), "ZSCALER_CLIENT_RATE_LIMIT_MAX_RETRIES");
/// ```
pub fn env_var_name(dotted: &str) -> String {
    let flattened: Vec<String> =
        dotted.split('.').map(|segment| camel_to_snake(segment).to_uppercase()).collect();
    format!("{ENV_PREFIX}_{}", flattened.join("_"))
}

/// Overlay every `ZSCALER_*` variable that names a setting
///
/// # Errors
/// Returns `ZscalerError::Config` when a value does not fit the setting's
/// type.
pub fn apply_env_overrides(config: ZscalerConfig) -> Result<ZscalerConfig> {
    let mut tree = serde_json::to_value(&config)
        .map_err(|e| ZscalerError::Config(format!("cannot flatten configuration: {e}")))?;

    if let Value::Object(map) = &mut tree {
        override_leaves(map, "")?;
    }

    serde_json::from_value(tree)
        .map_err(|e| ZscalerError::Config(format!("Invalid environment override: {e}")))
}

fn override_leaves(map: &mut Map<String, Value>, prefix: &str) -> Result<()> {
    for (key, value) in map.iter_mut() {
        let path = if prefix.is_empty() { key.clone() } else { format!("{prefix}.{key}") };
        if let Value::Object(child) = value {
            override_leaves(child, &path)?;
            continue;
        }

        let name = env_var_name(&path);
        let raw = std::env::var(&name).ok().or_else(|| {
            ENV_ALIASES
                .iter()
                .find(|(dotted, _)| *dotted == path)
                .and_then(|(_, alias)| std::env::var(alias).ok())
        });
        if let Some(raw) = raw {
            tracing::debug!(setting = %path, variable = %name, "Applying environment override");
            *value = coerce(&path, value, &raw)?;
        }
    }
    Ok(())
}

/// Convert an environment string to the JSON type the setting already has
fn coerce(path: &str, current: &Value, raw: &str) -> Result<Value> {
    let invalid = |kind: &str| {
        ZscalerError::Config(format!("{} must be {kind}, got {raw:?}", env_var_name(path)))
    };
    match current {
        Value::Bool(_) => parse_bool(raw).map(Value::Bool).ok_or_else(|| invalid("a boolean")),
        Value::Number(_) => {
            raw.trim().parse::<u64>().map(Value::from).map_err(|_| invalid("a non-negative integer"))
        }
        Value::Null if NUMERIC_OPTIONAL_PATHS.contains(&path) => {
            raw.trim().parse::<u64>().map(Value::from).map_err(|_| invalid("a non-negative integer"))
        }
        _ => Ok(Value::String(raw.to_string())),
    }
}

/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
