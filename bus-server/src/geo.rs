//! Geospatial stop index.
//!
//! Built once per snapshot from every stop that carries usable coordinates.
//! Queries are a linear scan with great-circle distances; the dataset is a
//! few thousand stops, so a scan beats maintaining a spatial tree across
//! snapshot replacements.

use geo::{HaversineDistance, Point};

use crate::snapshot::Snapshot;

/// One stop returned from a nearby query, with its distance from the query
/// location in meters.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyStop {
    pub stop_id: String,
    pub name_local: String,
    pub name_alt: String,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_m: f64,
}

#[derive(Debug, Clone)]
struct Candidate {
    stop_id: String,
    name_local: String,
    name_alt: String,
    latitude: f64,
    longitude: f64,
}

/// Nearest-stop index over one snapshot.
///
/// Stops lacking coordinates, or carrying non-finite or out-of-range ones,
/// are excluded at build time and can never appear in results. Equal
/// distances keep stop-id order (the build order), so queries are stable.
#[derive(Debug, Default)]
pub struct GeoIndex {
    candidates: Vec<Candidate>,
}

impl GeoIndex {
    /// Collect the geocoded stops of a snapshot.
    pub fn build(snapshot: &Snapshot) -> Self {
        let candidates = snapshot
            .stops
            .iter()
            .filter_map(|(stop_id, stop)| {
                let (latitude, longitude) = match (stop.latitude, stop.longitude) {
                    (Some(lat), Some(lon)) if valid_coordinates(lat, lon) => (lat, lon),
                    _ => return None,
                };
                Some(Candidate {
                    stop_id: stop_id.clone(),
                    name_local: stop.name_local.clone(),
                    name_alt: stop.name_alt.clone(),
                    latitude,
                    longitude,
                })
            })
            .collect();
        GeoIndex { candidates }
    }

    /// Stops within `radius_km` of the location, nearest first, at most
    /// `limit` of them.
    pub fn nearby(&self, latitude: f64, longitude: f64, radius_km: f64, limit: usize) -> Vec<NearbyStop> {
        let origin = Point::new(longitude, latitude);
        let radius_m = radius_km * 1000.0;

        let mut hits: Vec<NearbyStop> = self
            .candidates
            .iter()
            .filter_map(|c| {
                let distance_m = origin.haversine_distance(&Point::new(c.longitude, c.latitude));
                if distance_m <= radius_m {
                    Some(NearbyStop {
                        stop_id: c.stop_id.clone(),
                        name_local: c.name_local.clone(),
                        name_alt: c.name_alt.clone(),
                        latitude: c.latitude,
                        longitude: c.longitude,
                        distance_m,
                    })
                } else {
                    None
                }
            })
            .collect();

        hits.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        hits.truncate(limit);
        hits
    }

    /// A single stop rendered as a nearby hit, measured from the given
    /// location. `None` when the stop is unknown or carries no usable
    /// coordinates.
    pub fn locate(&self, stop_id: &str, latitude: f64, longitude: f64) -> Option<NearbyStop> {
        let origin = Point::new(longitude, latitude);
        self.candidates
            .iter()
            .find(|c| c.stop_id == stop_id)
            .map(|c| NearbyStop {
                stop_id: c.stop_id.clone(),
                name_local: c.name_local.clone(),
                name_alt: c.name_alt.clone(),
                latitude: c.latitude,
                longitude: c.longitude,
                distance_m: origin.haversine_distance(&Point::new(c.longitude, c.latitude)),
            })
    }

    /// Number of geocoded stops in the index.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

fn valid_coordinates(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}
