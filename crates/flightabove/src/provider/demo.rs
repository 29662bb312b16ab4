//! Synthetic flights for demo mode.
//!
//! Generated records use the full record shape, so they travel through the
//! same ranking and normalization path as live data. Positions are drawn
//! uniformly in bearing and radial distance and kept just inside the radius.

use chrono::{Duration as ChronoDuration, Utc};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde_json::json;

use crate::flight::airlines;
use crate::flight::RawFlightRecord;
use crate::geo::{bearing_deg, destination, Coordinate};

/// Share of the radius synthetic flights may use, so rounding never pushes
/// one outside the filter.
const RADIUS_FACTOR: f64 = 0.98;

const AIRPORTS: &[&str] = &[
    "SFO", "LAX", "SEA", "JFK", "ORD", "ATL", "DFW", "DEN", "BOS", "MIA", "LHR", "CDG", "FRA",
    "AMS", "DXB", "HND", "SIN", "SYD", "YYZ", "MEX",
];

const AIRCRAFT_TYPES: &[&str] = &[
    "B738", "B739", "A320", "A321", "A20N", "B77W", "B789", "A359", "E175", "CRJ9",
];

/// Largest deviation of a synthetic track from the outbound bearing.
const MAX_TRACK_JITTER_DEG: f64 = 30.0;

const STATUSES: &[&str] = &["On Time", "On Time", "On Time", "Scheduled", "Delayed"];

/// How many flights one demo poll produces.
///
/// Uniform in `[min_flights, max(min_flights, max_flights)]`.
pub fn flight_count<R: Rng + ?Sized>(rng: &mut R, min_flights: usize, max_flights: usize) -> usize {
    rng.random_range(min_flights..=min_flights.max(max_flights))
}

/// Generate `count` records within `radius_km` of `center`.
pub fn synthesize<R: Rng + ?Sized>(
    rng: &mut R,
    center: &Coordinate,
    radius_km: f64,
    count: usize,
) -> Vec<RawFlightRecord> {
    let codes: Vec<&str> = airlines::icao_codes().collect();
    let max_distance = radius_km.max(0.0) * RADIUS_FACTOR;

    (0..count)
        .map(|_| {
            let bearing = rng.random_range(0.0..360.0);
            let distance = rng.random_range(0.0..=max_distance);
            let position = destination(center, bearing, distance);
            // Roughly outbound, so demo traffic drifts across the area.
            let track = (bearing_deg(center, &position)
                + rng.random_range(-MAX_TRACK_JITTER_DEG..=MAX_TRACK_JITTER_DEG))
            .rem_euclid(360.0)
            .round();
            synthetic_record(rng, &codes, &position, track)
        })
        .collect()
}

fn synthetic_record<R: Rng + ?Sized>(
    rng: &mut R,
    codes: &[&str],
    position: &Coordinate,
    track: f64,
) -> RawFlightRecord {
    let airline = pick(rng, codes);
    let number: u16 = rng.random_range(1..=9999);
    let callsign = format!("{airline}{number}");

    let origin = pick(rng, AIRPORTS);
    let destination = loop {
        let candidate = pick(rng, AIRPORTS);
        if candidate != origin {
            break candidate;
        }
    };

    let altitude = rng.random_range(30..=400) * 100;
    let eta = Utc::now() + ChronoDuration::minutes(rng.random_range(20..=360));
    let registration = format!(
        "N{}{}{}",
        rng.random_range(100..=999),
        char::from(rng.random_range(b'A'..=b'Z')),
        char::from(rng.random_range(b'A'..=b'Z')),
    );

    RawFlightRecord::new(json!({
        "fr24_id": format!("{:08x}", rng.random::<u32>()),
        "callsign": callsign,
        "flight": callsign,
        "painted_as": airline,
        "lat": position.latitude,
        "lon": position.longitude,
        "alt": altitude,
        "gspeed": rng.random_range(140..=520),
        "track": track,
        "type": pick(rng, AIRCRAFT_TYPES),
        "reg": registration,
        "orig_iata": origin,
        "dest_iata": destination,
        "status": pick(rng, STATUSES),
        "eta": eta.format("%H:%M UTC").to_string(),
    }))
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or("UNK")
}
