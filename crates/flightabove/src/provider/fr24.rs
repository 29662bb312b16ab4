//! Flightradar24 live positions client.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument};

use super::{EndpointTier, FlightProvider, ProviderError};
use crate::flight::RawFlightRecord;
use crate::geo::BoundingBox;
use crate::http::{HttpFetch, HttpRequest, DEFAULT_TIMEOUT};

/// Production API base URL.
pub const FR24_BASE_URL: &str = "https://fr24api.flightradar24.com";

const API_VERSION: &str = "v1";

/// Client for the `/api/live/flight-positions/{light|full}` endpoints.
#[derive(Debug, Clone)]
pub struct Fr24Client {
    http: Arc<dyn HttpFetch>,
    base_url: String,
    timeout: Duration,
}

impl Fr24Client {
    /// Create a client against `base_url`.
    #[must_use]
    pub fn new(http: Arc<dyn HttpFetch>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self, tier: EndpointTier) -> String {
        format!("{}/api/live/flight-positions/{}", self.base_url, tier.path())
    }
}

#[async_trait::async_trait]
impl FlightProvider for Fr24Client {
    fn name(&self) -> &'static str {
        "fr24"
    }

    #[instrument(skip(self, credential, bounds))]
    async fn fetch_positions(
        &self,
        credential: &str,
        bounds: &BoundingBox,
        tier: EndpointTier,
        limit: usize,
    ) -> Result<Vec<RawFlightRecord>, ProviderError> {
        let request = HttpRequest::get(self.endpoint(tier))
            .header("Accept", "application/json")
            .header("Accept-Version", API_VERSION)
            .header("Authorization", format!("Bearer {credential}"))
            .param("bounds", bounds.to_query_value())
            .param("limit", limit.to_string())
            .timeout(self.timeout);

        let response = self.http.get(request).await?;
        if !response.is_success() {
            return Err(ProviderError::from_status(response.status, &response.body));
        }

        let body = response
            .json()
            .map_err(|e| ProviderError::invalid_response(format!("unreadable response: {e}")))?;
        let records = data_array(body)?;

        debug!(count = records.len(), "received flight positions");
        Ok(records)
    }
}

/// Accept `{"data": [...]}`, or a bare array.
fn data_array(body: Value) -> Result<Vec<RawFlightRecord>, ProviderError> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) => Vec::new(),
            _ => {
                return Err(ProviderError::invalid_response(
                    "response has no data array",
                ))
            }
        },
        _ => {
            return Err(ProviderError::invalid_response(
                "response is not a JSON object",
            ))
        }
    };

    Ok(items.into_iter().map(RawFlightRecord::new).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock::MockHttp;
    use crate::provider::ProviderErrorKind;
    use serde_json::json;

    const BOUNDS: BoundingBox = BoundingBox {
        north: 38.2,
        south: 37.3,
        west: -123.0,
        east: -121.8,
    };

    fn client(http: &Arc<MockHttp>) -> Fr24Client {
        let fetch: Arc<dyn HttpFetch> = http.clone();
        Fr24Client::new(fetch, "https://api.test/")
    }

    #[tokio::test]
    async fn test_request_shape() {
        let http = Arc::new(MockHttp::new().with_json("/flight-positions/full", 200, &json!({"data": []})));
        client(&http)
            .fetch_positions("secret", &BOUNDS, EndpointTier::Full, 7)
            .await
            .unwrap();

        let request = &http.requests()[0];
        assert_eq!(request.url, "https://api.test/api/live/flight-positions/full");
        assert!(request
            .headers
            .contains(&("Accept-Version".to_string(), "v1".to_string())));
        assert!(request
            .headers
            .contains(&("Authorization".to_string(), "Bearer secret".to_string())));
        assert!(request.params.contains(&(
            "bounds".to_string(),
            "38.200,37.300,-123.000,-121.800".to_string()
        )));
        assert!(request.params.contains(&("limit".to_string(), "7".to_string())));
    }

    #[tokio::test]
    async fn test_light_tier_path() {
        let http = Arc::new(MockHttp::new().with_json("/flight-positions/light", 200, &json!({"data": []})));
        client(&http)
            .fetch_positions("t", &BOUNDS, EndpointTier::Light, 1)
            .await
            .unwrap();
        assert!(http.requests()[0].url.ends_with("/light"));
    }

    #[tokio::test]
    async fn test_data_records_returned() {
        let http = Arc::new(MockHttp::new().with_json(
            "flight-positions",
            200,
            &json!({"data": [
                {"fr24_id": "1", "callsign": "UAL1", "lat": 37.6, "lon": -122.4},
                {"fr24_id": "2", "callsign": "DAL2", "lat": 37.7, "lon": -122.3}
            ]}),
        ));
        let records = client(&http)
            .fetch_positions("t", &BOUNDS, EndpointTier::Light, 10)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].callsign().as_deref(), Some("DAL2"));
    }

    #[tokio::test]
    async fn test_status_classified() {
        for (status, kind) in [
            (401, ProviderErrorKind::InvalidCredential),
            (402, ProviderErrorKind::PaymentRequired),
            (404, ProviderErrorKind::NotFound),
            (429, ProviderErrorKind::RateLimited),
            (503, ProviderErrorKind::Other),
        ] {
            let http = Arc::new(MockHttp::new().with_body("flight-positions", status, "{}"));
            let err = client(&http)
                .fetch_positions("t", &BOUNDS, EndpointTier::Light, 10)
                .await
                .unwrap_err();
            assert_eq!(err.kind, kind);
            assert_eq!(err.status, Some(status));
        }
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let http = Arc::new(MockHttp::new().with_transport_error("flight-positions"));
        let err = client(&http)
            .fetch_positions("t", &BOUNDS, EndpointTier::Light, 10)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::NetworkFailure);
    }

    #[tokio::test]
    async fn test_unreadable_body() {
        let http = Arc::new(MockHttp::new().with_body("flight-positions", 200, "<html>"));
        let err = client(&http)
            .fetch_positions("t", &BOUNDS, EndpointTier::Light, 10)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Other);
    }

    #[test]
    fn test_data_array_shapes() {
        assert_eq!(data_array(json!([1, 2])).unwrap().len(), 2);
        assert!(data_array(json!({"data": null})).unwrap().is_empty());
        assert!(data_array(json!({"items": []})).is_err());
        assert!(data_array(json!("nope")).is_err());
    }
}
