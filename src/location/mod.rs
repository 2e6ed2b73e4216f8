//! Binds a device position to a dataset location.
//!
//! A detection attempt moves the resolver from `Idle` to `Detecting` and
//! ends in exactly one [`LocationOutcome`]. Positions are cached for a short
//! window; a cache read past that window triggers a fresh detection.

pub mod matching;
pub mod nominatim;
pub mod provider;

use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::filters::{Field, Selection};
use crate::geo::{Coordinates, distance_match};
use crate::record::{Record, normalize_pincode};
use crate::store::RecordStore;

pub use matching::match_city;
pub use nominatim::NominatimGeocoder;
pub use provider::{Address, FixedGeolocator, GeolocationError, Geolocator, ReverseGeocoder};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStatus {
    Idle,
    Detecting,
    Success,
    Error,
}

/// A position together with its reverse-geocoded address.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub coords: Coordinates,
    pub address: Address,
}

/// A dataset location ready to apply as filters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedLocation {
    pub state: Selection,
    pub city: String,
    pub area: String,
    pub pincode: String,
    pub detection: Detection,
}

impl MatchedLocation {
    /// Field selections in the order they should be applied.
    pub fn selections(&self) -> [(Field, Selection); 4] {
        [
            (Field::State, self.state.clone()),
            (Field::City, Selection::from(self.city.as_str())),
            (Field::Area, Selection::from(self.area.as_str())),
            (Field::Pincode, Selection::from(self.pincode.as_str())),
        ]
    }
}

/// Terminal result of one detection attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LocationOutcome {
    Success(MatchedLocation),
    PermissionDenied,
    /// Geocoding produced no city.
    IncompleteDetection { detection: Detection },
    /// The city is not in the dataset.
    CityNotAvailable { detection: Detection },
    /// The city matched but no area or pincode could be resolved.
    IncompleteData {
        matched_city: String,
        missing_fields: Vec<String>,
        detection: Detection,
    },
    DetectionFailed { message: String },
}

impl LocationOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            LocationOutcome::Success(_) => "success",
            LocationOutcome::PermissionDenied => "permission_denied",
            LocationOutcome::IncompleteDetection { .. } => "incomplete_detection",
            LocationOutcome::CityNotAvailable { .. } => "city_not_available",
            LocationOutcome::IncompleteData { .. } => "incomplete_data",
            LocationOutcome::DetectionFailed { .. } => "detection_failed",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LocationOutcome::Success(_))
    }
}

/// Holds the last detection for `ttl`.
#[derive(Debug)]
pub struct LocationCache {
    ttl: Duration,
    entry: Option<(Detection, Instant)>,
}

impl LocationCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    /// The cached detection if it is younger than the ttl at `now`. A stale
    /// entry is dropped.
    pub fn get(&mut self, now: Instant) -> Option<&Detection> {
        let fresh = self
            .entry
            .as_ref()
            .is_some_and(|(_, at)| now.saturating_duration_since(*at) < self.ttl);
        if !fresh {
            self.entry = None;
        }
        self.entry.as_ref().map(|(detection, _)| detection)
    }

    pub fn put(&mut self, detection: Detection, now: Instant) {
        self.entry = Some((detection, now));
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}

/// Runs detection attempts against a geolocator and a reverse geocoder.
///
/// Attempts take `&mut self`, so only one can be in flight per resolver.
pub struct LocationResolver<G, R> {
    geolocator: G,
    geocoder: R,
    timeout: Duration,
    cache: LocationCache,
    status: DetectionStatus,
    attempts: u64,
}

impl<G: Geolocator, R: ReverseGeocoder> LocationResolver<G, R> {
    pub fn new(geolocator: G, geocoder: R) -> Self {
        Self {
            geolocator,
            geocoder,
            timeout: DEFAULT_TIMEOUT,
            cache: LocationCache::new(DEFAULT_CACHE_TTL),
            status: DetectionStatus::Idle,
            attempts: 0,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = LocationCache::new(ttl);
        self
    }

    pub fn status(&self) -> DetectionStatus {
        self.status
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Returns to `Idle` and forgets the cached position.
    pub fn reset(&mut self) {
        self.status = DetectionStatus::Idle;
        self.cache.clear();
    }

    /// Runs one detection attempt and matches it against `store`.
    #[tracing::instrument(skip_all, fields(attempt = self.attempts + 1))]
    pub async fn detect(&mut self, store: &RecordStore) -> LocationOutcome {
        self.attempts += 1;
        self.status = DetectionStatus::Detecting;

        let outcome = match self.locate().await {
            Ok(detection) => resolve(store, detection),
            Err(failure) => failure,
        };

        self.status = if outcome.is_success() {
            DetectionStatus::Success
        } else {
            DetectionStatus::Error
        };

        match &outcome {
            LocationOutcome::Success(m) => {
                info!(city = %m.city, area = %m.area, pincode = %m.pincode, "Location matched")
            }
            other => warn!(outcome = other.kind(), "Location not resolved"),
        }
        outcome
    }

    async fn locate(&mut self) -> Result<Detection, LocationOutcome> {
        if let Some(detection) = self.cache.get(Instant::now()) {
            debug!("Using cached location");
            return Ok(detection.clone());
        }

        let coords = match timeout(self.timeout, self.geolocator.current_position()).await {
            Ok(Ok(coords)) => coords,
            Ok(Err(GeolocationError::PermissionDenied)) => return Err(LocationOutcome::PermissionDenied),
            Ok(Err(e)) => return Err(LocationOutcome::DetectionFailed { message: e.to_string() }),
            Err(_) => {
                return Err(LocationOutcome::DetectionFailed {
                    message: GeolocationError::Timeout.to_string(),
                });
            }
        };
        debug!(lat = coords.latitude, lon = coords.longitude, "Position acquired");

        let address = match timeout(self.timeout, self.geocoder.reverse(coords)).await {
            Ok(Ok(address)) => address,
            Ok(Err(e)) => {
                return Err(LocationOutcome::DetectionFailed {
                    message: format!("failed to determine your location: {e:#}"),
                });
            }
            Err(_) => {
                return Err(LocationOutcome::DetectionFailed {
                    message: "reverse geocoding timed out".to_string(),
                });
            }
        };

        let detection = Detection { coords, address };
        self.cache.put(detection.clone(), Instant::now());
        Ok(detection)
    }
}

/// Matches a detection against the dataset.
///
/// The city is matched first; within it, the geocoded pincode is tried
/// exactly, then the nearest record within range of the coordinates.
pub fn resolve(store: &RecordStore, detection: Detection) -> LocationOutcome {
    let Some(detected_city) = detection.address.city.clone().filter(|c| !c.trim().is_empty()) else {
        return LocationOutcome::IncompleteDetection { detection };
    };

    let cities = store.unique_values(Field::City);
    let Some(city) = match_city(&detected_city, &cities).map(str::to_string) else {
        return LocationOutcome::CityNotAvailable { detection };
    };

    let city_records: Vec<&Record> = store.records().iter().filter(|r| r.city == city).collect();

    let by_pincode = detection.address.pincode.as_deref().and_then(|p| {
        let p = normalize_pincode(p);
        city_records.iter().copied().find(|r| r.pincode == p)
    });
    let matched = by_pincode.or_else(|| distance_match(detection.coords, city_records.iter().copied()));

    let missing_fields: Vec<String> = match matched {
        None => vec!["area".to_string(), "pincode".to_string()],
        Some(r) => [("area", &r.area), ("pincode", &r.pincode)]
            .iter()
            .filter(|(_, v)| v.is_empty())
            .map(|(name, _)| name.to_string())
            .collect(),
    };

    match matched {
        Some(r) if missing_fields.is_empty() => LocationOutcome::Success(MatchedLocation {
            state: Selection::from(store.state_for_city(&city).unwrap_or_default()),
            city,
            area: r.area.clone(),
            pincode: r.pincode.clone(),
            detection,
        }),
        _ => LocationOutcome::IncompleteData {
            matched_city: city,
            missing_fields,
            detection,
        },
    }
}
