//! Great-circle distance and nearest-record matching.

use serde::{Deserialize, Serialize};

use crate::record::Record;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Candidates at or beyond this distance never match.
pub const MATCH_RADIUS_KM: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Haversine distance between two points in kilometres.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// The candidate closest to `target`, provided it is strictly within
/// [`MATCH_RADIUS_KM`]. Records without coordinates are skipped; on equal
/// distance the earlier candidate wins.
pub fn distance_match<'a, I>(target: Coordinates, candidates: I) -> Option<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut closest: Option<(&Record, f64)> = None;
    for record in candidates {
        let Some((lat, lon)) = record.coordinates() else {
            continue;
        };
        let distance = haversine_km(target, Coordinates::new(lat, lon));
        if closest.is_none_or(|(_, best)| distance < best) {
            closest = Some((record, distance));
        }
    }

    closest
        .filter(|(_, distance)| *distance < MATCH_RADIUS_KM)
        .map(|(record, _)| record)
}
