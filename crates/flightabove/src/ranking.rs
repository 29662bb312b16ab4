//! Proximity filtering and ranking of raw provider records.

use crate::flight::RawFlightRecord;
use crate::geo::{distance_km, Coordinate};

/// Rank records by distance from `reference`.
///
/// Records without a usable position are skipped. Records farther than
/// `radius_km` are dropped. The rest are sorted nearest first (ties keep
/// their input order) and truncated to `max_results`. The input is not
/// modified; the returned pairs borrow from it.
#[must_use]
pub fn rank_nearby<'a>(
    raws: &'a [RawFlightRecord],
    reference: &Coordinate,
    radius_km: f64,
    max_results: usize,
) -> Vec<(&'a RawFlightRecord, f64)> {
    let mut ranked: Vec<_> = raws
        .iter()
        .filter_map(|raw| {
            let position = raw.position()?;
            let distance = distance_km(reference, &position);
            (distance <= radius_km).then_some((raw, distance))
        })
        .collect();

    // `sort_by` is stable; NaN distances never survive the radius filter.
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked.truncate(max_results);
    ranked
}
