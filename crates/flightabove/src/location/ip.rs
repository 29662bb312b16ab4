//! IP-geolocation providers.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use super::{GeoProvider, LocationError};
use crate::geo::Coordinate;
use crate::http::{HttpFetch, HttpRequest, DEFAULT_TIMEOUT};

/// Accuracy reported for IP-derived coordinates.
pub const IP_ACCURACY_METERS: f64 = 10_000.0;

const RATE_LIMIT_PHRASES: &[&str] = &["rate limit", "ratelimit", "too many requests"];

/// The IP-geolocation services we know how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpGeoService {
    /// `ipapi.co`
    IpApiCo,
    /// `ip-api.com`
    IpApiCom,
    /// `ipinfo.io`
    IpInfo,
    /// `freeipapi.com`
    FreeIpApi,
}

impl IpGeoService {
    /// Every service, in the default priority order.
    pub const ALL: [Self; 4] = [Self::IpApiCo, Self::IpApiCom, Self::IpInfo, Self::FreeIpApi];

    /// The configuration name of the service.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::IpApiCo => "ipapi.co",
            Self::IpApiCom => "ip-api.com",
            Self::IpInfo => "ipinfo.io",
            Self::FreeIpApi => "freeipapi.com",
        }
    }

    /// Look a service up by its configuration name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|service| service.name().eq_ignore_ascii_case(name))
    }

    const fn url(self) -> &'static str {
        match self {
            Self::IpApiCo => "https://ipapi.co/json/",
            Self::IpApiCom => "http://ip-api.com/json/",
            Self::IpInfo => "https://ipinfo.io/json",
            Self::FreeIpApi => "https://freeipapi.com/api/json",
        }
    }

    /// Pull `(latitude, longitude)` out of a response body.
    fn coordinates(self, body: &Value) -> Result<(f64, f64), LocationError> {
        let provider = self.name();
        match self {
            Self::IpApiCo => {
                if body.get("error").and_then(Value::as_bool) == Some(true) {
                    return Err(LocationError::InvalidResponse {
                        provider,
                        message: text_field(body, "reason").unwrap_or("error flag set").to_string(),
                    });
                }
                pair(number_field(body, "latitude"), number_field(body, "longitude"), provider)
            }
            Self::IpApiCom => {
                if let Some(status) = text_field(body, "status") {
                    if status != "success" {
                        return Err(LocationError::InvalidResponse {
                            provider,
                            message: text_field(body, "message").unwrap_or(status).to_string(),
                        });
                    }
                }
                pair(number_field(body, "lat"), number_field(body, "lon"), provider)
            }
            Self::IpInfo => {
                let (lat, lon) = text_field(body, "loc")
                    .and_then(|loc| loc.split_once(','))
                    .map_or((None, None), |(lat, lon)| {
                        (lat.trim().parse().ok(), lon.trim().parse().ok())
                    });
                pair(lat, lon, provider)
            }
            Self::FreeIpApi => {
                pair(number_field(body, "latitude"), number_field(body, "longitude"), provider)
            }
        }
    }
}

impl std::fmt::Display for IpGeoService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A [`GeoProvider`] backed by one IP-geolocation service.
#[derive(Debug)]
pub struct IpGeoProvider {
    service: IpGeoService,
    http: Arc<dyn HttpFetch>,
    timeout: Duration,
}

impl IpGeoProvider {
    /// Create a provider for `service`.
    #[must_use]
    pub fn new(service: IpGeoService, http: Arc<dyn HttpFetch>) -> Self {
        Self {
            service,
            http,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait::async_trait]
impl GeoProvider for IpGeoProvider {
    fn name(&self) -> &'static str {
        self.service.name()
    }

    async fn resolve(&self) -> Result<Coordinate, LocationError> {
        let provider = self.name();
        let request = HttpRequest::get(self.service.url())
            .header("Accept", "application/json")
            .timeout(self.timeout);
        let response = self.http.get(request).await?;

        if response.status == 429 || is_rate_limited(&response.body) {
            return Err(LocationError::RateLimited { provider });
        }
        if !response.is_success() {
            return Err(LocationError::Status {
                provider,
                status: response.status,
            });
        }

        let body = response.json().map_err(|e| LocationError::InvalidResponse {
            provider,
            message: e.to_string(),
        })?;
        let (latitude, longitude) = self.service.coordinates(&body)?;
        Ok(Coordinate::with_accuracy(latitude, longitude, IP_ACCURACY_METERS))
    }
}

fn is_rate_limited(body: &str) -> bool {
    let body = body.to_lowercase();
    RATE_LIMIT_PHRASES.iter().any(|phrase| body.contains(phrase))
}

/// Accept a pair only when both parts are present, non-zero and in range.
fn pair(
    latitude: Option<f64>,
    longitude: Option<f64>,
    provider: &'static str,
) -> Result<(f64, f64), LocationError> {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) if lat != 0.0 && lon != 0.0 => {
            if Coordinate::new(lat, lon).is_valid() {
                Ok((lat, lon))
            } else {
                Err(LocationError::InvalidResponse {
                    provider,
                    message: format!("coordinates out of range: {lat},{lon}"),
                })
            }
        }
        _ => Err(LocationError::MissingCoordinates { provider }),
    }
}

fn number_field(body: &Value, key: &str) -> Option<f64> {
    match body.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_field<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str)
}
