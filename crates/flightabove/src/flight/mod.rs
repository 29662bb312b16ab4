//! Canonical flight records.
//!
//! Providers hand back [`RawFlightRecord`]s in whatever shape they like. This
//! module is the only place that looks inside them: [`extract`] reads fields
//! through a closed set of strategies and [`normalize`] turns the result into
//! a [`Flight`] with every field filled in.

pub mod airlines;
pub mod extract;
mod normalize;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geo::Coordinate;

pub use extract::{ExtractionStrategy, PartialFlightFields, Speed};
pub use normalize::{normalize, normalize_ranked, KNOTS_TO_MPH};

/// Default for string fields the provider did not supply.
pub const UNKNOWN: &str = "Unknown";

/// An opaque provider record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawFlightRecord(Value);

impl RawFlightRecord {
    /// Wrap a JSON value.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The underlying JSON value.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Mutable access, used to merge enrichment fields.
    pub fn as_value_mut(&mut self) -> &mut Value {
        &mut self.0
    }

    /// The strategy that reads this record.
    #[must_use]
    pub fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::probe(self)
    }

    /// The reported position, if the record has a usable one.
    #[must_use]
    pub fn position(&self) -> Option<Coordinate> {
        self.strategy().position(self)
    }

    /// The callsign, if present.
    #[must_use]
    pub fn callsign(&self) -> Option<String> {
        self.strategy().extract(self).callsign
    }
}

impl From<Value> for RawFlightRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Derived flight status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightStatus {
    /// Airborne or reported on schedule.
    OnTime,
    /// Reported delayed.
    Delayed,
    /// Reported cancelled.
    Cancelled,
    /// Nothing to go on.
    Unknown,
}

impl std::fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OnTime => write!(f, "On Time"),
            Self::Delayed => write!(f, "Delayed"),
            Self::Cancelled => write!(f, "Cancelled"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A normalized flight, ready for display.
///
/// Built fresh for every poll and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    /// Broadcast callsign, or an `UNKNOWN` placeholder.
    pub callsign: String,
    /// Airline name.
    pub airline: String,
    /// Designator the airline was resolved from.
    pub airline_code: Option<String>,
    /// Commercial flight number, defaulting to the callsign.
    pub flight_number: String,
    /// Origin airport.
    pub origin: String,
    /// Destination airport.
    pub destination: String,
    /// Altitude in feet.
    pub altitude_ft: u32,
    /// Ground speed in statute miles per hour.
    pub speed_mph: u32,
    /// Track over ground, `0..360`.
    pub heading_deg: u16,
    /// Reported position.
    pub position: Coordinate,
    /// Derived status.
    pub status: FlightStatus,
    /// Distance from the reference point, when ranked.
    pub distance_km: Option<f64>,
    /// Aircraft type or model.
    pub aircraft: String,
    /// Aircraft registration.
    pub registration: String,
    /// Estimated arrival as reported.
    pub estimated_arrival: String,
    /// Public flight tracker page.
    pub tracking_url: String,
}

impl Flight {
    /// One-line summary for list views.
    #[must_use]
    pub fn summary(&self) -> String {
        let distance = self
            .distance_km
            .map(|km| format!("{km:.1} km"))
            .unwrap_or_default();
        format!(
            "{:<8} {:<24} {:>4} -> {:<4} {:>6} ft {:>4} mph {:>9}",
            self.callsign,
            self.airline,
            self.origin,
            self.destination,
            self.altitude_ft,
            self.speed_mph,
            distance
        )
    }
}
