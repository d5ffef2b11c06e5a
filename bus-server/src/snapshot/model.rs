//! In-memory snapshot model.
//!
//! A [`Snapshot`] is the immutable, versioned dataset the rest of the engine
//! queries. It is built from a decoded [`SnapshotFile`] exactly once and
//! never mutated; replacement swaps in a whole new value. Construction
//! enforces referential consistency: links that mention a route or stop id
//! with no backing record are dropped (and counted in a warning) so that
//! downstream indices can trust every id they see.

use std::collections::BTreeMap;

use tracing::warn;

use crate::domain::{Company, Direction};

use super::file::{SnapshotFile, SummaryFile};

/// One route in one direction of travel.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRecord {
    pub number: String,
    pub company: Company,
    pub direction: Direction,

    /// Origin name, local script.
    pub origin_local: String,
    /// Origin name, alternate (Latin) script.
    pub origin_alt: String,
    pub dest_local: String,
    pub dest_alt: String,

    /// Service sub-type, where the company distinguishes them.
    pub service_variant: Option<String>,
}

/// One physical stop.
///
/// Coordinates stay optional: records without usable coordinates are kept
/// for name lookup but never surface in geospatial queries.
#[derive(Debug, Clone, PartialEq)]
pub struct StopRecord {
    pub name_local: String,
    pub name_alt: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub company: String,
}

/// One entry of a route's ordered stop sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteStopLink {
    pub stop_id: String,
    pub sequence: u32,
}

/// One entry of a stop's route listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopRouteLink {
    pub route_number: String,
    pub company: Company,
    pub direction: Direction,
    pub destination: String,
    pub sequence: u32,
    pub route_id: String,
}

/// Dataset-level counts, as reported by the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub total_routes: u64,
    pub total_stops: u64,
    pub total_stop_route_mappings: u64,
}

impl From<SummaryFile> for Summary {
    fn from(s: SummaryFile) -> Self {
        Summary {
            total_routes: s.total_routes,
            total_stops: s.total_stops,
            total_stop_route_mappings: s.total_stop_route_mappings,
        }
    }
}

/// One immutable, versioned dataset of routes, stops, and their links.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Dataset version, a coarse unix timestamp.
    pub version: i64,
    pub generated_at: String,

    /// Route table, keyed by route id string ("CTB_793_O").
    pub routes: BTreeMap<String, RouteRecord>,
    /// Stop table, keyed by stop id.
    pub stops: BTreeMap<String, StopRecord>,
    /// Ordered stop sequence per route id. Sorted by sequence.
    pub route_stops: BTreeMap<String, Vec<RouteStopLink>>,
    /// Routes serving each stop id, in file order.
    pub stop_routes: BTreeMap<String, Vec<StopRouteLink>>,

    pub summary: Summary,
}

impl Snapshot {
    /// Build a consistent snapshot from a decoded file.
    pub fn from_file(file: SnapshotFile) -> Self {
        let mut dropped_routes = 0usize;
        let routes: BTreeMap<String, RouteRecord> = file
            .routes
            .into_iter()
            .filter_map(|(id, rec)| {
                let company = Company::parse(&rec.company).ok();
                let direction = Direction::parse(&rec.direction).ok();
                match (company, direction) {
                    (Some(company), Some(direction)) => Some((
                        id,
                        RouteRecord {
                            number: rec.route_number,
                            company,
                            direction,
                            origin_local: rec.origin_tc,
                            origin_alt: rec.origin_en,
                            dest_local: rec.dest_tc,
                            dest_alt: rec.dest_en,
                            service_variant: rec.service_type,
                        },
                    )),
                    _ => {
                        dropped_routes += 1;
                        None
                    }
                }
            })
            .collect();

        let stops: BTreeMap<String, StopRecord> = file
            .stops
            .into_iter()
            .map(|(id, s)| {
                (
                    id,
                    StopRecord {
                        name_local: s.name_tc,
                        name_alt: s.name_en,
                        latitude: s.latitude,
                        longitude: s.longitude,
                        company: s.company,
                    },
                )
            })
            .collect();

        let mut dropped_route_stops = 0usize;
        let mut route_stops: BTreeMap<String, Vec<RouteStopLink>> = BTreeMap::new();
        for (route_id, entries) in file.route_stops {
            if !routes.contains_key(&route_id) {
                dropped_route_stops += entries.len();
                continue;
            }
            let mut links: Vec<RouteStopLink> = entries
                .into_iter()
                .filter_map(|e| {
                    if stops.contains_key(&e.stop_id) {
                        Some(RouteStopLink {
                            stop_id: e.stop_id,
                            sequence: e.sequence,
                        })
                    } else {
                        dropped_route_stops += 1;
                        None
                    }
                })
                .collect();
            links.sort_by_key(|l| l.sequence);
            if !links.is_empty() {
                route_stops.insert(route_id, links);
            }
        }

        let mut dropped_stop_routes = 0usize;
        let mut stop_routes: BTreeMap<String, Vec<StopRouteLink>> = BTreeMap::new();
        for (stop_id, entries) in file.stop_routes {
            if !stops.contains_key(&stop_id) {
                dropped_stop_routes += entries.len();
                continue;
            }
            let links: Vec<StopRouteLink> = entries
                .into_iter()
                .filter_map(|e| {
                    let known_route = routes.contains_key(&e.route_id);
                    let company = Company::parse(&e.company).ok();
                    let direction = Direction::parse(&e.direction).ok();
                    match (known_route, company, direction) {
                        (true, Some(company), Some(direction)) => Some(StopRouteLink {
                            route_number: e.route_number,
                            company,
                            direction,
                            destination: e.destination,
                            sequence: e.sequence,
                            route_id: e.route_id,
                        }),
                        _ => {
                            dropped_stop_routes += 1;
                            None
                        }
                    }
                })
                .collect();
            if !links.is_empty() {
                stop_routes.insert(stop_id, links);
            }
        }

        if dropped_routes > 0 || dropped_route_stops > 0 || dropped_stop_routes > 0 {
            warn!(
                dropped_routes,
                dropped_route_stops, dropped_stop_routes, "dropped inconsistent snapshot records"
            );
        }

        Snapshot {
            version: file.version,
            generated_at: file.generated_at,
            routes,
            stops,
            route_stops,
            stop_routes,
            summary: file.summary.into(),
        }
    }

    /// Look up one route record by id string.
    pub fn route(&self, route_id: &str) -> Option<&RouteRecord> {
        self.routes.get(route_id)
    }

    /// Look up one stop record by id.
    pub fn stop(&self, stop_id: &str) -> Option<&StopRecord> {
        self.stops.get(stop_id)
    }

    /// The ordered stop sequence of a route, empty when the route has none.
    pub fn stops_on_route(&self, route_id: &str) -> &[RouteStopLink] {
        self.route_stops
            .get(route_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The routes serving a stop, empty when none are known.
    pub fn routes_at_stop(&self, stop_id: &str) -> &[StopRouteLink] {
        self.stop_routes
            .get(stop_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether a route id has a non-empty stop sequence.
    pub fn has_stops(&self, route_id: &str) -> bool {
        !self.stops_on_route(route_id).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> Snapshot {
        let file: SnapshotFile = serde_json::from_str(json).unwrap();
        Snapshot::from_file(file)
    }

    #[test]
    fn builds_consistent_snapshot() {
        let snapshot = decode(
            r#"{
            "version": 1700000000,
            "generated_at": "2023-11-14",
            "routes": {
                "CTB_793_O": {
                    "route_number": "793", "company": "CTB", "direction": "outbound",
                    "origin_tc": "西貢", "origin_en": "Sai Kung",
                    "dest_tc": "將軍澳", "dest_en": "Tseung Kwan O"
                }
            },
            "stops": {
                "003472": {"name_tc": "雍明苑", "name_en": "Wing Ming Estate",
                           "latitude": 22.3128, "longitude": 114.2598, "company": "CTB"}
            },
            "route_stops": {
                "CTB_793_O": [{"stop_id": "003472", "sequence": 1}]
            },
            "stop_routes": {
                "003472": [{"route_number": "793", "company": "CTB", "direction": "outbound",
                            "destination": "將軍澳", "sequence": 1, "route_id": "CTB_793_O"}]
            },
            "summary": {"total_routes": 1, "total_stops": 1, "total_stop_route_mappings": 1}
        }"#,
        );

        assert_eq!(snapshot.version, 1700000000);
        assert!(snapshot.route("CTB_793_O").is_some());
        assert_eq!(snapshot.stops_on_route("CTB_793_O").len(), 1);
        assert_eq!(snapshot.routes_at_stop("003472").len(), 1);
        assert!(snapshot.has_stops("CTB_793_O"));
        assert_eq!(snapshot.summary.total_routes, 1);
    }

    #[test]
    fn drops_dangling_links() {
        let snapshot = decode(
            r#"{
            "version": 1,
            "generated_at": "2023-11-14",
            "routes": {
                "CTB_1_O": {
                    "route_number": "1", "company": "CTB", "direction": "outbound",
                    "origin_tc": "甲", "origin_en": "A", "dest_tc": "乙", "dest_en": "B"
                }
            },
            "stops": {
                "S1": {"name_tc": "站一", "name_en": "Stop 1",
                       "latitude": 22.3, "longitude": 114.2, "company": "CTB"}
            },
            "route_stops": {
                "CTB_1_O": [
                    {"stop_id": "S1", "sequence": 2},
                    {"stop_id": "MISSING", "sequence": 1}
                ],
                "KMB_9_O": [{"stop_id": "S1", "sequence": 1}]
            },
            "stop_routes": {
                "S1": [
                    {"route_number": "1", "company": "CTB", "direction": "outbound",
                     "destination": "乙", "sequence": 2, "route_id": "CTB_1_O"},
                    {"route_number": "9", "company": "KMB", "direction": "outbound",
                     "destination": "丙", "sequence": 1, "route_id": "KMB_9_O"}
                ],
                "MISSING": [
                    {"route_number": "1", "company": "CTB", "direction": "outbound",
                     "destination": "乙", "sequence": 1, "route_id": "CTB_1_O"}
                ]
            },
            "summary": {}
        }"#,
        );

        // The link to an unknown stop and the sequence for an unknown route are gone
        let links = snapshot.stops_on_route("CTB_1_O");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].stop_id, "S1");
        assert!(snapshot.stops_on_route("KMB_9_O").is_empty());

        // Only the link backed by a real route survives at S1
        let at_stop = snapshot.routes_at_stop("S1");
        assert_eq!(at_stop.len(), 1);
        assert_eq!(at_stop[0].route_id, "CTB_1_O");
        assert!(snapshot.routes_at_stop("MISSING").is_empty());
    }

    #[test]
    fn route_stop_sequences_are_sorted() {
        let snapshot = decode(
            r#"{
            "version": 1,
            "generated_at": "2023-11-14",
            "routes": {
                "CTB_1_O": {
                    "route_number": "1", "company": "CTB", "direction": "outbound",
                    "origin_tc": "甲", "origin_en": "A", "dest_tc": "乙", "dest_en": "B"
                }
            },
            "stops": {
                "S1": {"name_tc": "一", "name_en": "1", "latitude": 22.3, "longitude": 114.2, "company": "CTB"},
                "S2": {"name_tc": "二", "name_en": "2", "latitude": 22.3, "longitude": 114.2, "company": "CTB"},
                "S3": {"name_tc": "三", "name_en": "3", "latitude": 22.3, "longitude": 114.2, "company": "CTB"}
            },
            "route_stops": {
                "CTB_1_O": [
                    {"stop_id": "S3", "sequence": "3"},
                    {"stop_id": "S1", "sequence": 1},
                    {"stop_id": "S2", "sequence": 2}
                ]
            },
            "stop_routes": {},
            "summary": {}
        }"#,
        );

        let order: Vec<&str> = snapshot
            .stops_on_route("CTB_1_O")
            .iter()
            .map(|l| l.stop_id.as_str())
            .collect();
        assert_eq!(order, vec!["S1", "S2", "S3"]);
    }

    #[test]
    fn drops_routes_with_unknown_company() {
        let snapshot = decode(
            r#"{
            "version": 1,
            "generated_at": "2023-11-14",
            "routes": {
                "MTR_TCL_O": {
                    "route_number": "TCL", "company": "MTR", "direction": "outbound",
                    "origin_tc": "甲", "origin_en": "A", "dest_tc": "乙", "dest_en": "B"
                }
            },
            "stops": {},
            "route_stops": {},
            "stop_routes": {},
            "summary": {}
        }"#,
        );
        assert!(snapshot.routes.is_empty());
    }

    #[test]
    fn stop_without_coordinates_is_retained() {
        let snapshot = decode(
            r#"{
            "version": 1,
            "generated_at": "2023-11-14",
            "routes": {},
            "stops": {
                "S1": {"name_tc": "無座標", "name_en": "No Coords", "company": "KMB"}
            },
            "route_stops": {},
            "stop_routes": {},
            "summary": {}
        }"#,
        );
        let stop = snapshot.stop("S1").unwrap();
        assert_eq!(stop.name_alt, "No Coords");
        assert_eq!(stop.latitude, None);
    }
}
