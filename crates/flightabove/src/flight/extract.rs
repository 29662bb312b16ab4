//! Field extraction strategies for provider-shaped flight records.
//!
//! Providers return aircraft positions in three incompatible shapes:
//!
//! - **Positional**: a JSON array in the public live-feed tuple layout.
//! - **Light**: an object carrying position and kinematics only.
//! - **Full**: an object that additionally carries route, aircraft and
//!   operator fields.
//!
//! [`ExtractionStrategy::probe`] picks the strategy from the record shape and
//! [`ExtractionStrategy::extract`] reads whatever fields are present into a
//! [`PartialFlightFields`]. Extraction never fails; missing or mistyped
//! fields simply come back as `None`.

use serde_json::{Map, Value};

use super::RawFlightRecord;
use crate::geo::Coordinate;

/// Keys whose presence marks an object as a full/enriched record.
const FULL_KEYS: &[&str] = &[
    "flight",
    "flight_number",
    "type",
    "aircraft",
    "reg",
    "registration",
    "painted_as",
    "operating_as",
    "orig_iata",
    "orig_icao",
    "origin",
    "dest_iata",
    "dest_icao",
    "destination",
    "eta",
    "status",
];

const LAT_KEYS: &[&str] = &["lat", "latitude"];
const LON_KEYS: &[&str] = &["lon", "lng", "longitude"];
const CALLSIGN_KEYS: &[&str] = &["callsign", "call_sign"];
const ID_KEYS: &[&str] = &["fr24_id", "hex", "icao24", "id"];
const ALTITUDE_KEYS: &[&str] = &["alt", "altitude"];
const KNOTS_KEYS: &[&str] = &["gspeed", "ground_speed", "speed"];
const MPH_KEYS: &[&str] = &["speed_mph"];
const HEADING_KEYS: &[&str] = &["track", "heading"];

const FLIGHT_NUMBER_KEYS: &[&str] = &["flight", "flight_number"];
const AIRLINE_CODE_KEYS: &[&str] = &[
    "painted_as",
    "operating_as",
    "airline_icao",
    "airline_iata",
    "airline_code",
];
const ORIGIN_KEYS: &[&str] = &["orig_iata", "orig_icao", "origin"];
const DESTINATION_KEYS: &[&str] = &["dest_iata", "dest_icao", "destination"];
const AIRCRAFT_KEYS: &[&str] = &["type", "aircraft", "aircraft_type"];
const REGISTRATION_KEYS: &[&str] = &["reg", "registration"];
const STATUS_KEYS: &[&str] = &["status"];
const ETA_KEYS: &[&str] = &["eta", "estimated_arrival"];

/// Index layout of the positional live-feed tuple.
mod positional {
    pub const HEX: usize = 0;
    pub const LAT: usize = 1;
    pub const LON: usize = 2;
    pub const TRACK: usize = 3;
    pub const ALTITUDE: usize = 4;
    pub const SPEED_KTS: usize = 5;
    pub const AIRCRAFT: usize = 8;
    pub const REGISTRATION: usize = 9;
    pub const ORIGIN: usize = 11;
    pub const DESTINATION: usize = 12;
    pub const FLIGHT: usize = 13;
    pub const CALLSIGN: usize = 16;
    pub const AIRLINE: usize = 18;
}

/// A ground speed reading with its unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Speed {
    /// Knots, as reported by transponder-derived feeds.
    Knots(f64),
    /// Statute miles per hour.
    Mph(f64),
}

/// Whatever fields a strategy could read from a raw record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialFlightFields {
    /// Broadcast callsign.
    pub callsign: Option<String>,
    /// Provider-specific aircraft or flight identifier.
    pub id: Option<String>,
    /// Commercial flight number.
    pub flight_number: Option<String>,
    /// Explicit operator/livery designator.
    pub airline_code: Option<String>,
    /// Origin airport code.
    pub origin: Option<String>,
    /// Destination airport code.
    pub destination: Option<String>,
    /// Aircraft type or model.
    pub aircraft: Option<String>,
    /// Aircraft registration.
    pub registration: Option<String>,
    /// Altitude in feet.
    pub altitude_ft: Option<f64>,
    /// Ground speed.
    pub speed: Option<Speed>,
    /// Track over ground in degrees.
    pub heading_deg: Option<f64>,
    /// Reported position.
    pub position: Option<Coordinate>,
    /// Free-text status.
    pub status: Option<String>,
    /// Estimated arrival, as given.
    pub estimated_arrival: Option<String>,
}

/// The closed set of record shapes the normalizer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionStrategy {
    /// Array tuple in live-feed index order.
    Positional,
    /// Object with position and kinematics only.
    Light,
    /// Object with route, aircraft and operator fields.
    Full,
}

impl std::fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positional => write!(f, "positional"),
            Self::Light => write!(f, "light"),
            Self::Full => write!(f, "full"),
        }
    }
}

impl ExtractionStrategy {
    /// Pick a strategy from the shape of the record.
    ///
    /// Arrays are positional; objects carrying any enriched key are full;
    /// everything else (including scalars and null) is read as light, which
    /// yields an empty field set for non-objects.
    #[must_use]
    pub fn probe(raw: &RawFlightRecord) -> Self {
        match raw.as_value() {
            Value::Array(_) => Self::Positional,
            Value::Object(map) if FULL_KEYS.iter().any(|key| map.contains_key(*key)) => {
                Self::Full
            }
            _ => Self::Light,
        }
    }

    /// Read the fields this strategy knows about.
    #[must_use]
    pub fn extract(self, raw: &RawFlightRecord) -> PartialFlightFields {
        match (self, raw.as_value()) {
            (Self::Positional, Value::Array(items)) => extract_positional(items),
            (Self::Light, Value::Object(map)) => extract_light(map),
            (Self::Full, Value::Object(map)) => extract_full(map),
            _ => PartialFlightFields::default(),
        }
    }

    /// Read only the position.
    #[must_use]
    pub fn position(self, raw: &RawFlightRecord) -> Option<Coordinate> {
        match (self, raw.as_value()) {
            (Self::Positional, Value::Array(items)) => coordinate(
                items.get(positional::LAT).and_then(number),
                items.get(positional::LON).and_then(number),
            ),
            (Self::Light | Self::Full, Value::Object(map)) => object_position(map),
            _ => None,
        }
    }
}

fn extract_positional(items: &[Value]) -> PartialFlightFields {
    let text_at = |index: usize| items.get(index).and_then(text);
    let number_at = |index: usize| items.get(index).and_then(number);

    PartialFlightFields {
        callsign: text_at(positional::CALLSIGN),
        id: text_at(positional::HEX),
        flight_number: text_at(positional::FLIGHT),
        airline_code: text_at(positional::AIRLINE),
        origin: text_at(positional::ORIGIN),
        destination: text_at(positional::DESTINATION),
        aircraft: text_at(positional::AIRCRAFT),
        registration: text_at(positional::REGISTRATION),
        altitude_ft: number_at(positional::ALTITUDE),
        speed: number_at(positional::SPEED_KTS).map(Speed::Knots),
        heading_deg: number_at(positional::TRACK),
        position: coordinate(number_at(positional::LAT), number_at(positional::LON)),
        status: None,
        estimated_arrival: None,
    }
}

fn extract_light(map: &Map<String, Value>) -> PartialFlightFields {
    let speed = first_number(map, MPH_KEYS)
        .map(Speed::Mph)
        .or_else(|| first_number(map, KNOTS_KEYS).map(Speed::Knots));

    PartialFlightFields {
        callsign: first_text(map, CALLSIGN_KEYS),
        id: first_text(map, ID_KEYS),
        altitude_ft: first_number(map, ALTITUDE_KEYS),
        speed,
        heading_deg: first_number(map, HEADING_KEYS),
        position: object_position(map),
        ..PartialFlightFields::default()
    }
}

fn extract_full(map: &Map<String, Value>) -> PartialFlightFields {
    PartialFlightFields {
        flight_number: first_text(map, FLIGHT_NUMBER_KEYS),
        airline_code: first_text(map, AIRLINE_CODE_KEYS),
        origin: first_text(map, ORIGIN_KEYS),
        destination: first_text(map, DESTINATION_KEYS),
        aircraft: first_text(map, AIRCRAFT_KEYS),
        registration: first_text(map, REGISTRATION_KEYS),
        status: first_text(map, STATUS_KEYS),
        estimated_arrival: first_text(map, ETA_KEYS),
        ..extract_light(map)
    }
}

fn object_position(map: &Map<String, Value>) -> Option<Coordinate> {
    coordinate(first_number(map, LAT_KEYS), first_number(map, LON_KEYS))
}

fn coordinate(latitude: Option<f64>, longitude: Option<f64>) -> Option<Coordinate> {
    Some(Coordinate::new(latitude?, longitude?))
}

fn first_number(map: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| map.get(*key).and_then(number))
}

fn first_text(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| map.get(*key).and_then(text))
}

/// A finite number, accepting numeric strings.
fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// A non-blank string with surrounding whitespace removed.
fn text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}
