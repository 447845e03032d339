//! Configuration loading
//!
//! This module loads the `client` configuration document from a file and
//! layers `ZSCALER_*` environment overrides on top.

pub mod loader;

// Re-export commonly used items
pub use loader::{apply_env_overrides, env_var_name, load, load_from_file, search_config_paths};
