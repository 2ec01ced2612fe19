//! Configuration loading and config file resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// TOML configuration file contents for a GeoRisk service
///
/// All fields are optional; compiled defaults apply when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Address to bind the HTTP listener to (default 127.0.0.1)
    pub bind_address: Option<String>,
    /// HTTP listener port (default 5001)
    pub port: Option<u16>,
    /// Gemini API key (prefer the environment variable; see service docs)
    pub gemini_api_key: Option<String>,
    /// Gemini model identifier (default "gemini-2.5-flash")
    pub gemini_model: Option<String>,
    /// Geocoder base URL (default Nominatim public instance)
    pub geocoder_base_url: Option<String>,
    /// Environmental-data service base URL
    pub earthdata_base_url: Option<String>,
    /// Environmental-data service API key
    pub earthdata_api_key: Option<String>,
    /// Client-side map-service key for address autocomplete (optional)
    pub map_api_key: Option<String>,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging section of the TOML config
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter directive (same syntax as RUST_LOG)
    pub level: Option<String>,
}

/// Config file resolution following priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. OS-dependent default location (fallback; may not exist)
pub fn resolve_config_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    file_name: &str,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        return PathBuf::from(path);
    }

    // Priority 3: OS-dependent default
    default_config_dir().join(file_name)
}

/// Get the platform config directory for GeoRisk
fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("georisk"))
        .unwrap_or_else(|| PathBuf::from("/etc/georisk"))
}

/// Load a TOML config file, treating a missing file as empty defaults
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "Config file not found, using defaults");
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read config failed ({}): {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse config failed ({}): {}", path.display(), e)))
}

/// Write a TOML config file, creating parent directories as needed
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize config failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Write to a sibling temp file then rename, so readers never see a partial file
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;

    Ok(())
}
