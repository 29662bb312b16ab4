//! Configuration management for flightabove.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::location::IpGeoService;
use crate::provider::{ADSBDB_BASE_URL, FR24_BASE_URL};
use crate::settings::{FlightServiceSettings, MAX_FLIGHTS_LIMIT};
use crate::usage::CreditCosts;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "flightabove";

/// Default saved-settings file name.
const SETTINGS_FILE_NAME: &str = "settings.json";

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "FLIGHTABOVE_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FLIGHTABOVE_`, sections split by `__`)
/// 2. TOML config file at `~/.config/flightabove/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initial polling settings.
    pub flights: FlightServiceSettings,
    /// Location lookup configuration.
    pub location: LocationConfig,
    /// Live provider configuration.
    pub provider: ProviderConfig,
    /// Route enrichment configuration.
    pub enrichment: EnrichmentConfig,
    /// Demo mode configuration.
    pub demo: DemoConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
}

/// Location-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// IP-geolocation services to try, in order.
    pub providers: Vec<String>,
    /// Minutes a resolved location is reused without asking again.
    pub freshness_minutes: u64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Live provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API token. Usually supplied as `FLIGHTABOVE_PROVIDER__API_TOKEN`.
    pub api_token: Option<String>,
    /// API base URL.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Credits charged per returned item.
    pub credits: CreditCosts,
}

/// Route enrichment configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Route lookup base URL.
    pub base_url: String,
    /// Minutes a looked-up route is reused.
    pub cache_ttl_minutes: u64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Demo mode configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Fewest flights a demo poll produces.
    pub min_flights: usize,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the saved settings file.
    /// Defaults to `~/.local/share/flightabove/settings.json`
    pub settings_path: Option<PathBuf>,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            providers: IpGeoService::ALL
                .iter()
                .map(|service| service.name().to_string())
                .collect(),
            freshness_minutes: 30,
            timeout_secs: 5,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: FR24_BASE_URL.to_string(),
            timeout_secs: 10,
            credits: CreditCosts::default(),
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            base_url: ADSBDB_BASE_URL.to_string(),
            cache_ttl_minutes: 60,
            timeout_secs: 5,
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self { min_flights: 3 }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `FLIGHTABOVE_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        Self::from_figment(Self::figment(config_file))
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn figment(config_file: PathBuf) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        self.flights
            .validate()
            .map_err(|e| Error::config_validation(format!("flights: {e}")))?;

        for name in &self.location.providers {
            if IpGeoService::from_name(name).is_none() {
                let known: Vec<_> = IpGeoService::ALL.iter().map(|s| s.name()).collect();
                return Err(Error::config_validation(format!(
                    "unknown location provider '{name}' (known: {})",
                    known.join(", ")
                )));
            }
        }

        for (section, timeout) in [
            ("location", self.location.timeout_secs),
            ("provider", self.provider.timeout_secs),
            ("enrichment", self.enrichment.timeout_secs),
        ] {
            if timeout == 0 {
                return Err(Error::config_validation(format!(
                    "{section}.timeout_secs must be greater than 0"
                )));
            }
        }

        for (section, url) in [
            ("provider", &self.provider.base_url),
            ("enrichment", &self.enrichment.base_url),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(Error::config_validation(format!(
                    "{section}.base_url must be an http(s) URL, got '{url}'"
                )));
            }
        }

        if self.demo.min_flights == 0 || self.demo.min_flights > MAX_FLIGHTS_LIMIT {
            return Err(Error::config_validation(format!(
                "demo.min_flights must be between 1 and {MAX_FLIGHTS_LIMIT}"
            )));
        }

        Ok(())
    }

    /// Get the saved-settings path, resolving defaults if not set.
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.storage
            .settings_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(SETTINGS_FILE_NAME))
    }

    /// Get the location freshness window as a Duration.
    #[must_use]
    pub fn location_freshness(&self) -> Duration {
        Duration::from_secs(self.location.freshness_minutes * 60)
    }

    /// Get the provider request timeout as a Duration.
    #[must_use]
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.timeout_secs)
    }

    /// Get the enrichment cache TTL as a Duration.
    #[must_use]
    pub fn enrichment_ttl(&self) -> Duration {
        Duration::from_secs(self.enrichment.cache_ttl_minutes * 60)
    }

    /// Get the enrichment request timeout as a Duration.
    #[must_use]
    pub fn enrichment_timeout(&self) -> Duration {
        Duration::from_secs(self.enrichment.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.flights, FlightServiceSettings::default());
        assert_eq!(config.location.providers.len(), 4);
        assert_eq!(config.location.providers[0], "ipapi.co");
        assert!(config.provider.api_token.is_none());
        assert_eq!(config.demo.min_flights, 3);
    }

    #[test]
    fn test_default_provider_config() {
        let provider = ProviderConfig::default();

        assert_eq!(provider.base_url, FR24_BASE_URL);
        assert_eq!(provider.timeout_secs, 10);
        assert_eq!(provider.credits, CreditCosts { light: 6, full: 8 });
    }

    #[test]
    fn test_default_enrichment_config() {
        let enrichment = EnrichmentConfig::default();

        assert_eq!(enrichment.base_url, ADSBDB_BASE_URL);
        assert_eq!(enrichment.cache_ttl_minutes, 60);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_flight_settings() {
        let mut config = Config::default();
        config.flights.radius_km = -1.0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("flights"));
        assert!(err.contains("radius_km"));
    }

    #[test]
    fn test_validate_unknown_location_provider() {
        let mut config = Config::default();
        config.location.providers = vec!["geo.example".to_string()];

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("unknown location provider"));
        assert!(err.contains("ipinfo.io"));
    }

    #[test]
    fn test_validate_empty_location_providers_allowed() {
        let mut config = Config::default();
        config.location.providers.clear();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.enrichment.timeout_secs = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("enrichment.timeout_secs"));
    }

    #[test]
    fn test_validate_bad_base_url() {
        let mut config = Config::default();
        config.provider.base_url = "ftp://example.com".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("provider.base_url"));
    }

    #[test]
    fn test_validate_demo_min_flights() {
        let mut config = Config::default();
        config.demo.min_flights = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_settings_path_default() {
        let config = Config::default();
        let path = config.settings_path();

        assert!(path.to_string_lossy().contains("flightabove"));
        assert!(path.to_string_lossy().contains("settings.json"));
    }

    #[test]
    fn test_settings_path_custom() {
        let mut config = Config::default();
        config.storage.settings_path = Some(PathBuf::from("/custom/settings.json"));

        assert_eq!(config.settings_path(), PathBuf::from("/custom/settings.json"));
    }

    #[test]
    fn test_durations() {
        let config = Config::default();

        assert_eq!(config.location_freshness(), Duration::from_secs(30 * 60));
        assert_eq!(config.provider_timeout(), Duration::from_secs(10));
        assert_eq!(config.enrichment_ttl(), Duration::from_secs(60 * 60));
        assert_eq!(config.enrichment_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_config_clone() {
        let config = Config::default();
        let cloned = config.clone();
        assert_eq!(config, cloned);
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("flightabove"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Loading from a nonexistent path should work (uses defaults)
        let config = Config::figment(PathBuf::from("/nonexistent/config.toml"))
            .extract::<Config>()
            .unwrap();
        assert_eq!(config.location, LocationConfig::default());
        assert_eq!(config.demo, DemoConfig::default());
    }

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[flights]
radius_km = 25.0
demo_mode = true

[location]
providers = ["ipinfo.io"]

[provider.credits]
light = 2
full = 4
"#
        )
        .unwrap();

        let config = Config::from_figment(Config::figment(file.path().to_path_buf())).unwrap();
        assert_eq!(config.flights.radius_km, 25.0);
        assert!(config.flights.demo_mode);
        assert_eq!(config.flights.max_flights_per_request, 10);
        assert_eq!(config.location.providers, ["ipinfo.io"]);
        assert_eq!(config.provider.credits, CreditCosts { light: 2, full: 4 });
    }

    #[test]
    fn test_load_invalid_toml_values_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[flights]\nrefresh_interval_minutes = 0").unwrap();

        let err = Config::from_figment(Config::figment(file.path().to_path_buf())).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_config_serialize_round_trip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("refresh_interval_minutes"));
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
