//! Flight data providers.
//!
//! A [`FlightProvider`] turns a bounding box into raw position records. The
//! live implementation is [`Fr24Client`]; [`demo`] synthesizes records
//! locally and [`RouteEnricher`] fills in missing routes from a secondary
//! service.

pub mod demo;
mod enrich;
mod fr24;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flight::RawFlightRecord;
use crate::geo::BoundingBox;
use crate::http::HttpError;

pub use enrich::{Route, RouteEnricher, ADSBDB_BASE_URL};
pub use fr24::{Fr24Client, FR24_BASE_URL};

/// Where users go to buy more credits.
pub const BILLING_URL: &str = "https://fr24api.flightradar24.com/subscriptions-and-credits";

/// Longest response body kept as error detail.
const MAX_DETAIL_LEN: usize = 200;

/// Which positions endpoint to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointTier {
    /// Positions and kinematics only.
    #[default]
    Light,
    /// Positions plus route, aircraft and operator.
    Full,
}

impl EndpointTier {
    /// Pick the tier from the `use_full_endpoint` setting.
    #[must_use]
    pub const fn from_full_flag(use_full_endpoint: bool) -> Self {
        if use_full_endpoint {
            Self::Full
        } else {
            Self::Light
        }
    }

    /// The URL path segment for this tier.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Full => "full",
        }
    }
}

impl std::fmt::Display for EndpointTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Classification of a failed provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// 401 or 403: the token was rejected.
    InvalidCredential,
    /// 402: the account is out of credits.
    PaymentRequired,
    /// 429: too many requests.
    RateLimited,
    /// No response was received.
    NetworkFailure,
    /// 404: the endpoint does not exist.
    NotFound,
    /// Anything else.
    Other,
}

impl ProviderErrorKind {
    /// Classify an HTTP status code.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::InvalidCredential,
            402 => Self::PaymentRequired,
            404 => Self::NotFound,
            429 => Self::RateLimited,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCredential => write!(f, "invalid credential"),
            Self::PaymentRequired => write!(f, "payment required"),
            Self::RateLimited => write!(f, "rate limited"),
            Self::NetworkFailure => write!(f, "network failure"),
            Self::NotFound => write!(f, "not found"),
            Self::Other => write!(f, "provider error"),
        }
    }
}

/// A failed provider call, as shown to the user.
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    /// What kind of failure this was.
    pub kind: ProviderErrorKind,
    /// Human-readable description.
    pub message: String,
    /// HTTP status, when a response arrived.
    pub status: Option<u16>,
    /// Extra detail, typically the start of the response body.
    pub detail: Option<String>,
    /// When the failure happened.
    pub timestamp: DateTime<Utc>,
}

impl ProviderError {
    /// Create an error of the given kind.
    #[must_use]
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            detail: None,
            timestamp: Utc::now(),
        }
    }

    /// Build an error from a non-success HTTP response.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        let kind = ProviderErrorKind::from_status(status);
        let message = match kind {
            ProviderErrorKind::InvalidCredential => "the API token was rejected".to_string(),
            ProviderErrorKind::PaymentRequired => {
                "the account has run out of credits".to_string()
            }
            ProviderErrorKind::RateLimited => "too many requests; try again later".to_string(),
            ProviderErrorKind::NotFound => "the endpoint was not found".to_string(),
            ProviderErrorKind::NetworkFailure | ProviderErrorKind::Other => {
                format!("unexpected HTTP status {status}")
            }
        };

        let body = body.trim();
        let detail = (!body.is_empty()).then(|| body.chars().take(MAX_DETAIL_LEN).collect());

        Self {
            status: Some(status),
            detail,
            ..Self::new(kind, message)
        }
    }

    /// Build an error for a request that never got a response.
    #[must_use]
    pub fn network(err: &HttpError) -> Self {
        Self::new(ProviderErrorKind::NetworkFailure, err.to_string())
    }

    /// Build an error for a response that could not be understood.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Other, message)
    }

    /// A URL the user can visit to fix the problem, if there is one.
    #[must_use]
    pub fn action_url(&self) -> Option<&'static str> {
        (self.kind == ProviderErrorKind::PaymentRequired).then_some(BILLING_URL)
    }
}

impl From<HttpError> for ProviderError {
    fn from(err: HttpError) -> Self {
        Self::network(&err)
    }
}

/// A source of live aircraft positions.
#[async_trait::async_trait]
pub trait FlightProvider: Send + Sync + std::fmt::Debug {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Fetch up to `limit` position records inside `bounds`.
    ///
    /// # Errors
    ///
    /// Returns a classified [`ProviderError`] for transport failures,
    /// non-success statuses and unreadable bodies.
    async fn fetch_positions(
        &self,
        credential: &str,
        bounds: &BoundingBox,
        tier: EndpointTier,
        limit: usize,
    ) -> Result<Vec<RawFlightRecord>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert_eq!(ProviderErrorKind::from_status(401), ProviderErrorKind::InvalidCredential);
        assert_eq!(ProviderErrorKind::from_status(403), ProviderErrorKind::InvalidCredential);
        assert_eq!(ProviderErrorKind::from_status(402), ProviderErrorKind::PaymentRequired);
        assert_eq!(ProviderErrorKind::from_status(404), ProviderErrorKind::NotFound);
        assert_eq!(ProviderErrorKind::from_status(429), ProviderErrorKind::RateLimited);
        assert_eq!(ProviderErrorKind::from_status(500), ProviderErrorKind::Other);
        assert_eq!(ProviderErrorKind::from_status(418), ProviderErrorKind::Other);
    }

    #[test]
    fn test_from_status_keeps_detail() {
        let err = ProviderError::from_status(402, r#"{"message": "Insufficient credits"}"#);
        assert_eq!(err.kind, ProviderErrorKind::PaymentRequired);
        assert_eq!(err.status, Some(402));
        assert!(err.detail.unwrap().contains("Insufficient credits"));
    }

    #[test]
    fn test_from_status_truncates_detail() {
        let body = "x".repeat(1000);
        let err = ProviderError::from_status(500, &body);
        assert_eq!(err.detail.unwrap().len(), MAX_DETAIL_LEN);

        let err = ProviderError::from_status(500, "   ");
        assert!(err.detail.is_none());
    }

    #[test]
    fn test_network_error() {
        let err: ProviderError = HttpError::new("https://x", "timed out").into();
        assert_eq!(err.kind, ProviderErrorKind::NetworkFailure);
        assert!(err.status.is_none());
        assert!(err.message.contains("timed out"));
    }

    #[test]
    fn test_action_url_only_for_payment() {
        assert_eq!(
            ProviderError::from_status(402, "").action_url(),
            Some(BILLING_URL)
        );
        assert!(ProviderError::from_status(401, "").action_url().is_none());
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::from_status(429, "");
        assert_eq!(err.to_string(), "rate limited: too many requests; try again later");
    }

    #[test]
    fn test_error_serde() {
        let err = ProviderError::from_status(401, "nope");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "invalid_credential");
        let back: ProviderError = serde_json::from_value(json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn test_tier() {
        assert_eq!(EndpointTier::from_full_flag(true), EndpointTier::Full);
        assert_eq!(EndpointTier::from_full_flag(false), EndpointTier::Light);
        assert_eq!(EndpointTier::Full.to_string(), "full");
        assert_eq!(EndpointTier::default(), EndpointTier::Light);
    }
}
