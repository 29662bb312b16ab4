//! Route enrichment from adsbdb.
//!
//! Light position records carry no origin or destination. When enabled, the
//! orchestrator passes ranked records through [`RouteEnricher::enrich`],
//! which looks each callsign up and merges the route into the record so the
//! normalizer sees it as a full record. Lookups run concurrently with a fixed
//! bound; a failed lookup leaves its record as it was.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::{debug, warn};

use super::ProviderError;
use crate::cache::TtlCache;
use crate::flight::RawFlightRecord;
use crate::http::{HttpFetch, HttpRequest, DEFAULT_TIMEOUT};

/// Production API base URL.
pub const ADSBDB_BASE_URL: &str = "https://api.adsbdb.com";

/// Route facts for one callsign.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Route {
    /// Origin airport IATA code.
    pub origin: Option<String>,
    /// Destination airport IATA code.
    pub destination: Option<String>,
    /// Operating airline ICAO code.
    pub airline_icao: Option<String>,
}

impl Route {
    fn from_response(body: &Value) -> Option<Self> {
        let route = body.pointer("/response/flightroute")?;
        let text = |pointer: &str| {
            route
                .pointer(pointer)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
        };

        Some(Self {
            origin: text("/origin/iata_code"),
            destination: text("/destination/iata_code"),
            airline_icao: text("/airline/icao"),
        })
    }

    /// Write the route into an object record without overwriting anything
    /// the provider already supplied.
    fn merge_into(&self, raw: &mut RawFlightRecord) {
        let Value::Object(map) = raw.as_value_mut() else {
            return;
        };

        for (key, value) in [
            ("orig_iata", &self.origin),
            ("dest_iata", &self.destination),
            ("airline_icao", &self.airline_icao),
        ] {
            if let Some(value) = value {
                map.entry(key)
                    .or_insert_with(|| Value::String(value.clone()));
            }
        }
    }
}

/// Looks up and caches routes by callsign.
#[derive(Debug)]
pub struct RouteEnricher {
    http: Arc<dyn HttpFetch>,
    base_url: String,
    timeout: Duration,
    cache: TtlCache<String, Option<Route>>,
}

impl RouteEnricher {
    /// Create an enricher against `base_url`, caching answers for `ttl`.
    #[must_use]
    pub fn new(http: Arc<dyn HttpFetch>, base_url: impl Into<String>, ttl: Duration) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            cache: TtlCache::new(ttl),
        }
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Look up the route for `callsign`.
    ///
    /// Unknown callsigns are answered with `Ok(None)` and cached like hits.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] if the service could not be reached or
    /// answered with an unexpected status. Errors are not cached.
    pub async fn lookup(&self, callsign: &str) -> Result<Option<Route>, ProviderError> {
        let key = callsign.trim().to_ascii_uppercase();
        self.cache
            .get_or_try_insert_with(key.clone(), || self.fetch(key))
            .await
    }

    async fn fetch(&self, callsign: String) -> Result<Option<Route>, ProviderError> {
        let request = HttpRequest::get(format!("{}/v0/callsign/{callsign}", self.base_url))
            .header("Accept", "application/json")
            .timeout(self.timeout);
        let response = self.http.get(request).await?;

        if response.status == 404 {
            debug!(%callsign, "no route known");
            return Ok(None);
        }
        if !response.is_success() {
            return Err(ProviderError::from_status(response.status, &response.body));
        }

        let body = response
            .json()
            .map_err(|e| ProviderError::invalid_response(format!("unreadable route: {e}")))?;
        Ok(Route::from_response(&body))
    }

    /// Enrich records in order, at most `concurrency` lookups at a time.
    ///
    /// Records that already have both ends of the route, records without a
    /// callsign and records whose lookup fails are returned unchanged.
    pub async fn enrich(
        &self,
        records: Vec<RawFlightRecord>,
        concurrency: usize,
    ) -> Vec<RawFlightRecord> {
        stream::iter(records)
            .map(|raw| self.enrich_one(raw))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    async fn enrich_one(&self, mut raw: RawFlightRecord) -> RawFlightRecord {
        let fields = raw.strategy().extract(&raw);
        if fields.origin.is_some() && fields.destination.is_some() {
            return raw;
        }
        let Some(callsign) = fields.callsign else {
            return raw;
        };

        match self.lookup(&callsign).await {
            Ok(Some(route)) => route.merge_into(&mut raw),
            Ok(None) => {}
            Err(e) => warn!(%callsign, error = %e, "route lookup failed"),
        }
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight::normalize;
    use crate::http::mock::MockHttp;
    use serde_json::json;

    fn route_body(origin: &str, destination: &str, airline: &str) -> Value {
        json!({
            "response": {
                "flightroute": {
                    "callsign": "UAL123",
                    "airline": {"name": "United Airlines", "icao": airline},
                    "origin": {"iata_code": origin, "municipality": "San Francisco"},
                    "destination": {"iata_code": destination, "municipality": "Newark"}
                }
            }
        })
    }

    fn enricher(http: &Arc<MockHttp>) -> RouteEnricher {
        let fetch: Arc<dyn HttpFetch> = http.clone();
        RouteEnricher::new(fetch, "https://adsbdb.test", Duration::from_secs(60))
    }

    #[test]
    fn test_route_from_response() {
        let route = Route::from_response(&route_body("SFO", "EWR", "UAL")).unwrap();
        assert_eq!(route.origin.as_deref(), Some("SFO"));
        assert_eq!(route.destination.as_deref(), Some("EWR"));
        assert_eq!(route.airline_icao.as_deref(), Some("UAL"));

        assert!(Route::from_response(&json!({"response": "unknown callsign"})).is_none());
    }

    #[test]
    fn test_merge_keeps_existing_fields() {
        let mut raw = RawFlightRecord::new(json!({"callsign": "UAL123", "orig_iata": "OAK"}));
        let route = Route {
            origin: Some("SFO".to_string()),
            destination: Some("EWR".to_string()),
            airline_icao: None,
        };
        route.merge_into(&mut raw);
        assert_eq!(raw.as_value()["orig_iata"], "OAK");
        assert_eq!(raw.as_value()["dest_iata"], "EWR");
        assert!(raw.as_value().get("airline_icao").is_none());
    }

    #[tokio::test]
    async fn test_lookup_is_cached() {
        let http = Arc::new(MockHttp::new().with_json("/v0/callsign/UAL123", 200, &route_body("SFO", "EWR", "UAL")));
        let enricher = enricher(&http);

        let first = enricher.lookup("ual123").await.unwrap();
        let second = enricher.lookup("UAL123").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(http.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_callsign_cached_as_none() {
        let http = Arc::new(MockHttp::new().with_json(
            "/v0/callsign/",
            404,
            &json!({"response": "unknown callsign"}),
        ));
        let enricher = enricher(&http);

        assert!(enricher.lookup("ZZZ1").await.unwrap().is_none());
        assert!(enricher.lookup("ZZZ1").await.unwrap().is_none());
        assert_eq!(http.calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_not_cached() {
        let http = Arc::new(MockHttp::new().with_body("/v0/callsign/", 500, "boom"));
        let enricher = enricher(&http);

        assert!(enricher.lookup("UAL1").await.is_err());
        assert!(enricher.lookup("UAL1").await.is_err());
        assert_eq!(http.calls(), 2);
    }

    #[tokio::test]
    async fn test_enrich_merges_routes_in_order() {
        let http = Arc::new(
            MockHttp::new()
                .with_json("/v0/callsign/UAL123", 200, &route_body("SFO", "EWR", "UAL"))
                .with_transport_error("/v0/callsign/DAL9"),
        );
        let enricher = enricher(&http);

        let records = vec![
            RawFlightRecord::new(json!({"callsign": "UAL123", "lat": 1.0, "lon": 1.0})),
            RawFlightRecord::new(json!({"callsign": "DAL9", "lat": 1.0, "lon": 1.0})),
            RawFlightRecord::new(json!({"lat": 1.0, "lon": 1.0})),
        ];
        let enriched = enricher.enrich(records.clone(), 2).await;

        assert_eq!(enriched.len(), 3);
        let first = normalize(&enriched[0]);
        assert_eq!(first.origin, "SFO");
        assert_eq!(first.destination, "EWR");
        // Failed and callsign-less records come back untouched.
        assert_eq!(enriched[1], records[1]);
        assert_eq!(enriched[2], records[2]);
        assert_eq!(http.calls(), 2);
    }

    #[tokio::test]
    async fn test_enrich_skips_complete_records() {
        let http = Arc::new(MockHttp::new());
        let enricher = enricher(&http);

        let records = vec![RawFlightRecord::new(json!({
            "callsign": "UAL123",
            "orig_iata": "SFO",
            "dest_iata": "EWR"
        }))];
        let enriched = enricher.enrich(records.clone(), 0).await;
        assert_eq!(enriched, records);
        assert_eq!(http.calls(), 0);
    }
}
