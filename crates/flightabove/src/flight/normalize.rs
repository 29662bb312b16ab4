//! Raw record to [`Flight`] mapping.

use std::sync::LazyLock;

use regex::Regex;

use super::airlines::{airline_name, UNKNOWN_AIRLINE};
use super::extract::{PartialFlightFields, Speed};
use super::{Flight, FlightStatus, RawFlightRecord, UNKNOWN};
use crate::geo::Coordinate;

/// Statute miles per hour in one knot.
pub const KNOTS_TO_MPH: f64 = 1.150_78;

const TRACKING_BASE_URL: &str = "https://www.flightradar24.com";

static CALLSIGN_PREFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^([A-Z]{2,3})\d").ok());

/// Normalize a record that was not ranked.
///
/// Never fails: every missing field gets its documented default.
#[must_use]
pub fn normalize(raw: &RawFlightRecord) -> Flight {
    let fields = raw.strategy().extract(raw);
    build(fields, None)
}

/// Normalize a record that was ranked at `distance_km` from the reference.
#[must_use]
pub fn normalize_ranked(raw: &RawFlightRecord, distance_km: f64) -> Flight {
    let fields = raw.strategy().extract(raw);
    build(fields, Some(distance_km))
}

fn build(fields: PartialFlightFields, distance_km: Option<f64>) -> Flight {
    let callsign = fields
        .callsign
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or_else(|| placeholder_callsign(fields.id.as_deref()));
    let (airline, airline_code) = resolve_airline(fields.airline_code.as_deref(), &callsign);
    let altitude = fields.altitude_ft.unwrap_or(0.0).max(0.0);
    let status = derive_status(fields.status.as_deref(), altitude);
    let tracking_url = format!("{TRACKING_BASE_URL}/{callsign}");

    Flight {
        flight_number: fields.flight_number.unwrap_or_else(|| callsign.clone()),
        airline,
        airline_code,
        origin: or_unknown(fields.origin),
        destination: or_unknown(fields.destination),
        altitude_ft: to_u32(altitude),
        speed_mph: to_u32(speed_mph(fields.speed)),
        heading_deg: heading(fields.heading_deg),
        position: fields.position.unwrap_or(Coordinate::new(0.0, 0.0)),
        status,
        distance_km,
        aircraft: or_unknown(fields.aircraft),
        registration: or_unknown(fields.registration),
        estimated_arrival: or_unknown(fields.estimated_arrival),
        tracking_url,
        callsign,
    }
}

fn placeholder_callsign(id: Option<&str>) -> String {
    match id {
        Some(id) => format!("UNKNOWN-{}", id.to_ascii_uppercase()),
        None => "UNKNOWN".to_string(),
    }
}

/// Resolve the airline name and the designator it came from.
///
/// An explicit code wins over the callsign prefix. A code that misses the
/// table is still reported so the caller can show it.
fn resolve_airline(explicit: Option<&str>, callsign: &str) -> (String, Option<String>) {
    if let Some(code) = explicit {
        let code = code.to_ascii_uppercase();
        let name = airline_name(&code).unwrap_or(UNKNOWN_AIRLINE);
        return (name.to_string(), Some(code));
    }

    if let Some(prefix) = callsign_prefix(callsign) {
        // Prefer the 3-letter ICAO reading, then the 2-letter IATA one.
        for len in [3, 2] {
            if let Some(name) = prefix.get(..len).and_then(airline_name) {
                return (name.to_string(), Some(prefix[..len].to_string()));
            }
        }
    }

    (UNKNOWN_AIRLINE.to_string(), None)
}

fn callsign_prefix(callsign: &str) -> Option<&str> {
    CALLSIGN_PREFIX
        .as_ref()?
        .captures(callsign)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn derive_status(text: Option<&str>, altitude_ft: f64) -> FlightStatus {
    if let Some(text) = text {
        let text = text.to_lowercase();
        if text.contains("cancel") {
            return FlightStatus::Cancelled;
        }
        if text.contains("delay") {
            return FlightStatus::Delayed;
        }
        if text.contains("on time") || text.contains("scheduled") {
            return FlightStatus::OnTime;
        }
    }

    if altitude_ft > 0.0 {
        FlightStatus::OnTime
    } else {
        FlightStatus::Unknown
    }
}

fn speed_mph(speed: Option<Speed>) -> f64 {
    match speed {
        Some(Speed::Knots(knots)) => (knots * KNOTS_TO_MPH).round(),
        Some(Speed::Mph(mph)) => mph.round(),
        None => 0.0,
    }
    .max(0.0)
}

fn heading(degrees: Option<f64>) -> u16 {
    let normalized = degrees.unwrap_or(0.0).rem_euclid(360.0).round() % 360.0;
    u16::try_from(to_u32(normalized)).unwrap_or(0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u32(value: f64) -> u32 {
    // Saturating float-to-int cast: NaN maps to 0, overflow to u32::MAX.
    value.round() as u32
}

fn or_unknown(value: Option<String>) -> String {
    value.unwrap_or_else(|| UNKNOWN.to_string())
}
