//! Configuration file loading
//!
//! Values are resolved in this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Tiers 1 and 2 are handled by each binary's argument parser. This module
//! finds and reads tier 3.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "CURIO_CONFIG";

/// Settings that may be supplied by the TOML config file.
///
/// Every field is optional; anything left out falls through to the compiled
/// default chosen by the binary.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    pub port: Option<u16>,
    pub apollo_url: Option<String>,
    pub iiif_url: Option<String>,
    pub fedora_url: Option<String>,
    pub tracksys_url: Option<String>,
    pub hostname: Option<String>,
    pub rights_url: Option<String>,
    pub archival_bucket: Option<String>,
    pub archival_endpoint: Option<String>,
    pub archival_dir: Option<PathBuf>,
    pub web_dir: Option<PathBuf>,
    pub health_pid: Option<String>,
    pub no_cache: Option<bool>,
    pub concurrent_probes: Option<bool>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
    /// tracing filter directive, e.g. "info" or "curio_viewer=debug"
    pub log_level: Option<String>,
}

/// Find the config file to use, if any.
///
/// An explicit path wins, then `CURIO_CONFIG`, then the per-user config
/// directory, then `/etc/curio/config.toml`. Only the explicit path and the
/// environment variable are returned without checking that the file exists.
pub fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join("curio").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc/curio/config.toml");
    if system_config.exists() {
        return Some(system_config);
    }

    None
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
}

/// Load the config file if one can be found.
///
/// A missing file is not fatal: a warning is logged and empty settings are
/// returned so compiled defaults apply. A file that exists but does not parse
/// is an error.
pub fn load_config_or_default(explicit: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = locate_config_file(explicit) else {
        debug!("No config file found, using defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file {} not found, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    debug!("Loading config file {}", path.display());
    load_toml_config(&path)
}

/// Strip trailing slashes from an upstream base URL so paths can be appended
/// with a single `/`.
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
