//! User-adjustable polling settings and their persistence.
//!
//! [`FlightServiceSettings`] starts from the `[flights]` section of the
//! configuration. Changes made at runtime are written through a
//! [`SettingsStore`] and take precedence on the next start.

use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::provider::EndpointTier;

/// Largest accepted search radius.
pub const MAX_RADIUS_KM: f64 = 500.0;

/// Largest accepted per-request flight count.
pub const MAX_FLIGHTS_LIMIT: usize = 100;

/// Settings that drive each poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightServiceSettings {
    /// Minutes between scheduled polls.
    pub refresh_interval_minutes: u32,
    /// Maximum flights kept per poll.
    pub max_flights_per_request: usize,
    /// Search radius around the user.
    pub radius_km: f64,
    /// Call the full endpoint instead of the light one.
    pub use_full_endpoint: bool,
    /// Synthesize flights instead of calling the provider.
    pub demo_mode: bool,
    /// Look up missing routes for ranked flights.
    pub enrich_routes: bool,
}

impl Default for FlightServiceSettings {
    fn default() -> Self {
        Self {
            refresh_interval_minutes: 5,
            max_flights_per_request: 10,
            radius_km: 50.0,
            use_full_endpoint: false,
            demo_mode: false,
            enrich_routes: false,
        }
    }
}

impl FlightServiceSettings {
    /// The endpoint tier these settings select.
    #[must_use]
    pub const fn tier(&self) -> EndpointTier {
        EndpointTier::from_full_flag(self.use_full_endpoint)
    }

    /// Time between scheduled polls.
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.refresh_interval_minutes) * 60)
    }

    /// Apply the fields set in `patch`.
    #[must_use]
    pub fn merged(&self, patch: &SettingsPatch) -> Self {
        Self {
            refresh_interval_minutes: patch
                .refresh_interval_minutes
                .unwrap_or(self.refresh_interval_minutes),
            max_flights_per_request: patch
                .max_flights_per_request
                .unwrap_or(self.max_flights_per_request),
            radius_km: patch.radius_km.unwrap_or(self.radius_km),
            use_full_endpoint: patch.use_full_endpoint.unwrap_or(self.use_full_endpoint),
            demo_mode: patch.demo_mode.unwrap_or(self.demo_mode),
            enrich_routes: patch.enrich_routes.unwrap_or(self.enrich_routes),
        }
    }

    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSetting`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval_minutes == 0 {
            return Err(Error::invalid_setting(
                "refresh_interval_minutes",
                "must be at least 1",
            ));
        }

        if self.max_flights_per_request == 0 || self.max_flights_per_request > MAX_FLIGHTS_LIMIT {
            return Err(Error::invalid_setting(
                "max_flights_per_request",
                format!("must be between 1 and {MAX_FLIGHTS_LIMIT}"),
            ));
        }

        if !self.radius_km.is_finite() || self.radius_km <= 0.0 || self.radius_km > MAX_RADIUS_KM {
            return Err(Error::invalid_setting(
                "radius_km",
                format!("must be greater than 0 and at most {MAX_RADIUS_KM}"),
            ));
        }

        Ok(())
    }
}

/// A partial settings update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    /// New refresh interval.
    pub refresh_interval_minutes: Option<u32>,
    /// New flight cap.
    pub max_flights_per_request: Option<usize>,
    /// New radius.
    pub radius_km: Option<f64>,
    /// New tier flag.
    pub use_full_endpoint: Option<bool>,
    /// New demo flag.
    pub demo_mode: Option<bool>,
    /// New enrichment flag.
    pub enrich_routes: Option<bool>,
}

impl SettingsPatch {
    /// Set one field from its name and a textual value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSetting`] for unknown keys or unparsable values.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "refresh_interval_minutes" => {
                self.refresh_interval_minutes = Some(parse(key, value)?);
            }
            "max_flights_per_request" => {
                self.max_flights_per_request = Some(parse(key, value)?);
            }
            "radius_km" => self.radius_km = Some(parse(key, value)?),
            "use_full_endpoint" => self.use_full_endpoint = Some(parse(key, value)?),
            "demo_mode" => self.demo_mode = Some(parse(key, value)?),
            "enrich_routes" => self.enrich_routes = Some(parse(key, value)?),
            _ => return Err(Error::invalid_setting(key, "unknown setting")),
        }
        Ok(())
    }

    /// Check whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| Error::invalid_setting(key, format!("'{value}': {e}")))
}

/// Persistence for [`FlightServiceSettings`].
pub trait SettingsStore: Send + Sync + std::fmt::Debug {
    /// Load saved settings, if any were saved.
    ///
    /// # Errors
    ///
    /// Returns an error if saved settings exist but cannot be read.
    fn load(&self) -> Result<Option<FlightServiceSettings>>;

    /// Save settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be written.
    fn save(&self, settings: &FlightServiceSettings) -> Result<()>;
}

/// Settings stored as pretty-printed JSON in a file.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    /// Create a store backed by `path`. Nothing is read until [`SettingsStore::load`].
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> Result<Option<FlightServiceSettings>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::settings_store(&self.path, e.to_string())),
        };

        let settings = serde_json::from_str(&contents)
            .map_err(|e| Error::settings_store(&self.path, e.to_string()))?;
        debug!(path = %self.path.display(), "loaded saved settings");
        Ok(Some(settings))
    }

    fn save(&self, settings: &FlightServiceSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let json = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, json)
            .map_err(|e| Error::settings_store(&self.path, e.to_string()))?;
        debug!(path = %self.path.display(), "saved settings");
        Ok(())
    }
}

/// Settings kept in memory only.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    saved: Mutex<Option<FlightServiceSettings>>,
}

impl MemorySettingsStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Option<FlightServiceSettings>> {
        Ok(self.saved.lock().clone())
    }

    fn save(&self, settings: &FlightServiceSettings) -> Result<()> {
        *self.saved.lock() = Some(settings.clone());
        Ok(())
    }
}
