//! Tracing setup
//!
//! The SDK only emits `tracing` events; installing a subscriber is left to
//! the application. [`init_tracing`] is a convenience for applications that
//! want the SDK's `logging` settings to decide.
//!
//! `RUST_LOG` wins over the settings when it is set.

use tracing_subscriber::EnvFilter;
use zscaler_domain::LoggingSettings;

/// Filter directive for the SDK crates
pub fn filter_directive(settings: &LoggingSettings) -> &'static str {
    if settings.verbose {
        "zscaler_infra=debug,zscaler_common=debug"
    } else {
        "zscaler_infra=info,zscaler_common=info"
    }
}

/// Install a global fmt subscriber
///
/// Returns `false` when logging is disabled or a subscriber is already
/// installed.
pub fn init_tracing(settings: &LoggingSettings) -> bool {
    if !settings.enabled {
        return false;
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(settings)));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).try_init().is_ok()
}

/// Install a JSON subscriber, for log shipping
pub fn init_json_tracing(settings: &LoggingSettings) -> bool {
    if !settings.enabled {
        return false;
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(settings)));
    tracing_subscriber::fmt().json().with_env_filter(filter).try_init().is_ok()
}
