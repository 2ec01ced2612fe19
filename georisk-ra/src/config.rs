//! Configuration resolution for georisk-ra
//!
//! Builds the immutable [`ServiceConfig`] snapshot from the TOML config file,
//! environment variables, and CLI overrides. Secrets resolve with
//! ENV → TOML priority.

use georisk_common::config::TomlConfig;
use georisk_common::{Error, Result};
use tracing::{info, warn};

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEOCODER_BASE_URL: &str = "https://nominatim.openstreetmap.org";

pub const GEMINI_API_KEY_ENV: &str = "GEORISK_GEMINI_API_KEY";
pub const MAP_API_KEY_ENV: &str = "GEORISK_MAP_API_KEY";

/// Resolved service configuration
///
/// A snapshot taken once at startup; handlers receive it through `AppState`.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub port: u16,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub geocoder_base_url: String,
    /// Environmental-data service; observational enrichment is disabled when unset
    pub earthdata_base_url: Option<String>,
    pub earthdata_api_key: Option<String>,
    /// Client-side map-service key for address autocomplete
    pub map_api_key: Option<String>,
}

impl ServiceConfig {
    /// Resolve the full configuration from TOML plus CLI overrides
    pub fn resolve(
        toml_config: &TomlConfig,
        cli_bind: Option<String>,
        cli_port: Option<u16>,
    ) -> Result<Self> {
        let gemini_api_key = resolve_gemini_api_key(toml_config)?;

        Ok(Self {
            bind_address: cli_bind
                .or_else(|| toml_config.bind_address.clone())
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port: cli_port.or(toml_config.port).unwrap_or(DEFAULT_PORT),
            gemini_api_key,
            gemini_model: toml_config
                .gemini_model
                .clone()
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            geocoder_base_url: toml_config
                .geocoder_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_GEOCODER_BASE_URL.to_string()),
            earthdata_base_url: toml_config.earthdata_base_url.clone(),
            earthdata_api_key: toml_config.earthdata_api_key.clone(),
            map_api_key: resolve_map_api_key(toml_config),
        })
    }
}

/// Resolve the Gemini API key from 2-tier configuration
///
/// **Priority:** ENV → TOML
pub fn resolve_gemini_api_key(toml_config: &TomlConfig) -> Result<String> {
    let mut sources = Vec::new();

    let env_key = std::env::var(GEMINI_API_KEY_ENV).ok();
    if let Some(key) = &env_key {
        if is_valid_key(key) {
            sources.push("environment");
        }
    }

    let toml_key = toml_config.gemini_api_key.as_ref();
    if let Some(key) = toml_key {
        if is_valid_key(key) {
            sources.push("TOML");
        }
    }

    // Warn if multiple sources (potential misconfiguration)
    if sources.len() > 1 {
        warn!(
            "Gemini API key found in multiple sources: {}. Using environment (highest priority).",
            sources.join(", ")
        );
    }

    if let Some(key) = env_key {
        if is_valid_key(&key) {
            info!("Gemini API key loaded from environment variable");
            return Ok(key.trim().to_string());
        }
    }

    if let Some(key) = toml_key {
        if is_valid_key(key) {
            info!("Gemini API key loaded from TOML config");
            return Ok(key.trim().to_string());
        }
    }

    Err(Error::Config(
        "Gemini API key not configured. Please configure using one of:\n\
         1. Environment: GEORISK_GEMINI_API_KEY=your-key-here\n\
         2. TOML config: ~/.config/georisk/georisk-ra.toml (gemini_api_key = \"your-key\")\n\
         \n\
         Obtain API key at: https://aistudio.google.com/apikey"
            .to_string(),
    ))
}

/// Resolve the optional client-side map-service key (ENV → TOML)
pub fn resolve_map_api_key(toml_config: &TomlConfig) -> Option<String> {
    std::env::var(MAP_API_KEY_ENV)
        .ok()
        .filter(|k| is_valid_key(k))
        .or_else(|| toml_config.map_api_key.clone().filter(|k| is_valid_key(k)))
        .map(|k| k.trim().to_string())
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn toml_with_key(key: &str) -> TomlConfig {
        TomlConfig {
            gemini_api_key: Some(key.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn key_validation() {
        assert!(is_valid_key("AIza-something"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
    }

    #[test]
    #[serial]
    fn environment_beats_toml() {
        std::env::set_var(GEMINI_API_KEY_ENV, "env-key");
        let resolved = resolve_gemini_api_key(&toml_with_key("toml-key")).unwrap();
        std::env::remove_var(GEMINI_API_KEY_ENV);
        assert_eq!(resolved, "env-key");
    }

    #[test]
    #[serial]
    fn toml_key_used_when_env_absent() {
        std::env::remove_var(GEMINI_API_KEY_ENV);
        let resolved = resolve_gemini_api_key(&toml_with_key("toml-key")).unwrap();
        assert_eq!(resolved, "toml-key");
    }

    #[test]
    #[serial]
    fn missing_key_names_every_configuration_avenue() {
        std::env::remove_var(GEMINI_API_KEY_ENV);
        let err = resolve_gemini_api_key(&TomlConfig::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("GEORISK_GEMINI_API_KEY"));
        assert!(message.contains("georisk-ra.toml"));
    }

    #[test]
    #[serial]
    fn whitespace_key_is_rejected() {
        std::env::remove_var(GEMINI_API_KEY_ENV);
        assert!(resolve_gemini_api_key(&toml_with_key("   ")).is_err());
    }

    #[test]
    #[serial]
    fn defaults_fill_unset_fields() {
        std::env::remove_var(GEMINI_API_KEY_ENV);
        let config = ServiceConfig::resolve(&toml_with_key("k"), None, None).unwrap();
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.geocoder_base_url, DEFAULT_GEOCODER_BASE_URL);
        assert!(config.earthdata_base_url.is_none());
    }

    #[test]
    #[serial]
    fn cli_overrides_beat_toml() {
        std::env::remove_var(GEMINI_API_KEY_ENV);
        let toml = TomlConfig {
            gemini_api_key: Some("k".to_string()),
            bind_address: Some("0.0.0.0".to_string()),
            port: Some(9000),
            ..Default::default()
        };
        let config =
            ServiceConfig::resolve(&toml, Some("127.0.0.1".to_string()), Some(5001)).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.port, 5001);
    }
}
