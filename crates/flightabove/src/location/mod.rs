//! Location resolution.
//!
//! [`LocationResolver::current_location`] answers "where is the user?" and
//! never fails. It serves a cached coordinate while it is fresh, otherwise
//! walks an ordered list of [`GeoProvider`]s until one succeeds. When every
//! provider fails it degrades to the last coordinate it ever resolved, and
//! finally to a fixed fallback.

mod ip;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::TtlCache;
use crate::config::LocationConfig;
use crate::geo::Coordinate;
use crate::http::{HttpError, HttpFetch};

pub use ip::{IpGeoProvider, IpGeoService};

/// Coordinate used when no provider has ever succeeded (San Francisco).
pub const FALLBACK_LOCATION: Coordinate = Coordinate::new(37.7749, -122.4194);

/// Default time a resolved coordinate is served without asking again.
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(30 * 60);

/// Why a single provider could not produce a coordinate.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LocationError {
    /// No response was received.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The provider answered with a non-success status.
    #[error("{provider} returned HTTP {status}")]
    Status {
        /// Provider name.
        provider: &'static str,
        /// HTTP status code.
        status: u16,
    },

    /// The provider says we are asking too often.
    #[error("{provider} is rate limiting requests")]
    RateLimited {
        /// Provider name.
        provider: &'static str,
    },

    /// The body could not be understood.
    #[error("{provider} returned an unreadable response: {message}")]
    InvalidResponse {
        /// Provider name.
        provider: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// The body parsed but had no usable coordinates.
    #[error("{provider} returned no usable coordinates")]
    MissingCoordinates {
        /// Provider name.
        provider: &'static str,
    },
}

/// A source of the user's approximate position.
#[async_trait::async_trait]
pub trait GeoProvider: Send + Sync + std::fmt::Debug {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Ask the provider for a coordinate.
    ///
    /// # Errors
    ///
    /// Returns a [`LocationError`] describing why this provider failed.
    async fn resolve(&self) -> Result<Coordinate, LocationError>;
}

/// Cached, fault-tolerant location lookup over an ordered provider list.
#[derive(Debug)]
pub struct LocationResolver {
    providers: Vec<Box<dyn GeoProvider>>,
    cache: TtlCache<(), Coordinate>,
}

impl LocationResolver {
    /// Create a resolver that tries `providers` in order.
    #[must_use]
    pub fn new(providers: Vec<Box<dyn GeoProvider>>, freshness: Duration) -> Self {
        Self {
            providers,
            cache: TtlCache::new(freshness),
        }
    }

    /// Build the IP-geolocation providers named in the configuration.
    ///
    /// Names that do not match a known service are skipped here; they are
    /// rejected earlier by [`crate::Config::validate`].
    #[must_use]
    pub fn from_config(config: &LocationConfig, http: &Arc<dyn HttpFetch>) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        let providers = config
            .providers
            .iter()
            .filter_map(|name| IpGeoService::from_name(name))
            .map(|service| {
                Box::new(IpGeoProvider::new(service, Arc::clone(http)).with_timeout(timeout))
                    as Box<dyn GeoProvider>
            })
            .collect();

        Self::new(
            providers,
            Duration::from_secs(config.freshness_minutes * 60),
        )
    }

    /// Names of the configured providers, in priority order.
    #[must_use]
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// The last resolved coordinate of any age.
    #[must_use]
    pub fn last_known(&self) -> Option<Coordinate> {
        self.cache.get_stale(&())
    }

    /// Resolve the current location. Never fails.
    pub async fn current_location(&self) -> Coordinate {
        if let Some(cached) = self.cache.get(&()) {
            debug!(
                latitude = cached.latitude,
                longitude = cached.longitude,
                "using cached location"
            );
            return cached;
        }

        for provider in &self.providers {
            match provider.resolve().await {
                Ok(coordinate) => {
                    info!(
                        provider = provider.name(),
                        latitude = coordinate.latitude,
                        longitude = coordinate.longitude,
                        "resolved location"
                    );
                    self.cache.insert((), coordinate);
                    return coordinate;
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "location provider failed");
                }
            }
        }

        if let Some(stale) = self.cache.get_stale(&()) {
            warn!(
                age_secs = self.cache.age(&()).map(|age| age.as_secs()),
                "all location providers failed; using last known location"
            );
            return stale;
        }

        warn!("all location providers failed; using fallback location");
        FALLBACK_LOCATION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock::MockHttp;
    use serde_json::json;

    fn resolver(http: &Arc<MockHttp>, services: &[IpGeoService], freshness: Duration) -> LocationResolver {
        let fetch: Arc<dyn HttpFetch> = http.clone();
        let providers = services
            .iter()
            .map(|s| Box::new(IpGeoProvider::new(*s, Arc::clone(&fetch))) as Box<dyn GeoProvider>)
            .collect();
        LocationResolver::new(providers, freshness)
    }

    #[tokio::test]
    async fn test_first_success_is_returned() {
        let http = Arc::new(
            MockHttp::new().with_json("ipapi.co", 200, &json!({"latitude": 51.5, "longitude": -0.12})),
        );
        let resolver = resolver(&http, &[IpGeoService::IpApiCo], DEFAULT_FRESHNESS);

        let location = resolver.current_location().await;
        assert_eq!(location.latitude, 51.5);
        assert_eq!(location.longitude, -0.12);
        assert_eq!(http.calls(), 1);
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_network() {
        let http = Arc::new(
            MockHttp::new().with_json("ipapi.co", 200, &json!({"latitude": 51.5, "longitude": -0.12})),
        );
        let resolver = resolver(&http, &[IpGeoService::IpApiCo], DEFAULT_FRESHNESS);

        let first = resolver.current_location().await;
        let second = resolver.current_location().await;
        assert_eq!(first, second);
        assert_eq!(http.calls(), 1);
    }

    #[tokio::test]
    async fn test_falls_through_failed_providers() {
        let http = Arc::new(
            MockHttp::new()
                .with_body("ipapi.co", 500, "oops")
                .with_body("ip-api.com", 200, "Too Many Requests")
                .with_json("ipinfo.io", 200, &json!({"loc": "48.85,2.35"})),
        );
        let resolver = resolver(
            &http,
            &[IpGeoService::IpApiCo, IpGeoService::IpApiCom, IpGeoService::IpInfo],
            DEFAULT_FRESHNESS,
        );

        let location = resolver.current_location().await;
        assert_eq!(location, Coordinate::with_accuracy(48.85, 2.35, ip::IP_ACCURACY_METERS));
        assert_eq!(http.calls(), 3);
    }

    #[tokio::test]
    async fn test_all_fail_without_history_uses_fallback() {
        let http = Arc::new(MockHttp::new().with_transport_error("ipapi.co"));
        let resolver = resolver(&http, &[IpGeoService::IpApiCo], DEFAULT_FRESHNESS);

        assert_eq!(resolver.current_location().await, FALLBACK_LOCATION);
        assert!(resolver.last_known().is_none());
    }

    #[tokio::test]
    async fn test_all_fail_uses_stale_location() {
        let good = Arc::new(
            MockHttp::new().with_json("freeipapi.com", 200, &json!({"latitude": 35.68, "longitude": 139.69})),
        );
        // Zero freshness: every lookup goes to the network.
        let resolver = resolver(&good, &[IpGeoService::FreeIpApi], Duration::ZERO);
        let first = resolver.current_location().await;

        let broken: Arc<dyn HttpFetch> = Arc::new(MockHttp::new());
        let degraded = LocationResolver {
            providers: vec![Box::new(IpGeoProvider::new(IpGeoService::FreeIpApi, broken))],
            cache: resolver.cache,
        };
        assert_eq!(degraded.current_location().await, first);
    }

    #[tokio::test]
    async fn test_no_providers_uses_fallback() {
        let resolver = LocationResolver::new(Vec::new(), DEFAULT_FRESHNESS);
        assert_eq!(resolver.current_location().await, FALLBACK_LOCATION);
    }

    #[test]
    fn test_from_config_keeps_order_and_skips_unknown() {
        let http: Arc<dyn HttpFetch> = Arc::new(MockHttp::new());
        let config = LocationConfig {
            providers: vec![
                "ipinfo.io".to_string(),
                "nowhere".to_string(),
                "ipapi.co".to_string(),
            ],
            ..LocationConfig::default()
        };
        let resolver = LocationResolver::from_config(&config, &http);
        assert_eq!(resolver.provider_names(), ["ipinfo.io", "ipapi.co"]);
    }

    #[test]
    fn test_location_error_display() {
        let err = LocationError::Status {
            provider: "ipapi.co",
            status: 503,
        };
        assert_eq!(err.to_string(), "ipapi.co returned HTTP 503");
        let err = LocationError::RateLimited { provider: "ip-api.com" };
        assert!(err.to_string().contains("rate limiting"));
    }
}
