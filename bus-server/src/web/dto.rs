//! Data transfer objects for web requests and responses.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::display::DisplayAggregate;
use crate::domain::{Company, Direction};
use crate::engine::{NearbyStopView, StopPage, StopRouteDisplay};
use crate::eta::ArrivalSample;
use crate::search::{DirectionSummary, RouteMatch};
use crate::snapshot::Snapshot;

/// Request for stops near a location.
#[derive(Debug, Deserialize)]
pub struct NearbyRequest {
    /// Latitude in decimal degrees
    pub lat: f64,

    /// Longitude in decimal degrees
    pub lon: f64,

    /// Explicit search radius; when absent the server escalates through
    /// its built-in tiers
    pub radius_km: Option<f64>,

    /// Maximum number of stops to return
    pub limit: Option<usize>,
}

/// Request to search routes by number prefix.
#[derive(Debug, Deserialize)]
pub struct RouteSearchRequest {
    /// Route number prefix (case-insensitive)
    pub q: String,

    /// Maximum number of matches to return
    pub limit: Option<usize>,
}

/// Request for the valid next keypad characters.
#[derive(Debug, Deserialize)]
pub struct KeypadRequest {
    /// Route number typed so far (may be empty)
    pub q: String,
}

/// Request for a live arrival board.
#[derive(Debug, Deserialize)]
pub struct EtaRequest {
    /// Operator code (e.g. "CTB")
    pub company: String,

    /// Route number (e.g. "793")
    pub route: String,

    /// Direction of travel ("outbound" or "inbound")
    pub direction: String,

    /// Stop identifier
    pub stop_id: String,
}

/// A stop near the caller.
#[derive(Debug, Serialize)]
pub struct NearbyStopResult {
    /// Stop identifier
    pub stop_id: String,

    /// Stop name, local script
    pub name_local: String,

    /// Stop name, alternate script
    pub name_alt: String,

    pub latitude: f64,
    pub longitude: f64,

    /// Distance from the queried location, whole metres
    pub distance_m: f64,

    /// Routes serving this stop
    pub routes: Vec<StopRouteResult>,
}

/// One route serving a stop.
#[derive(Debug, Serialize)]
pub struct StopRouteResult {
    /// Route number
    pub route_number: String,

    /// Operator code
    pub company: Company,

    /// Direction of travel
    pub direction: Direction,

    /// Terminus label, arrow-prefixed
    pub destination: String,

    /// Route identity string
    pub route_id: String,
}

/// Response for the nearby-stops search.
#[derive(Debug, Serialize)]
pub struct NearbyResponse {
    /// Which search tier produced the stops: "primary", "extended",
    /// "fallback", or "explicit"
    pub tier: String,

    /// Matching stops, closest first
    pub stops: Vec<NearbyStopResult>,
}

/// Response for a stop's route listing.
#[derive(Debug, Serialize)]
pub struct StopRoutesResponse {
    /// Stop identifier
    pub stop_id: String,

    /// Stop name, local script
    pub name_local: String,

    /// Stop name, alternate script
    pub name_alt: String,

    /// Routes serving this stop, in dataset order
    pub routes: Vec<StopRouteResult>,
}

/// One direction of a matched route.
#[derive(Debug, Serialize)]
pub struct DirectionResult {
    /// Direction of travel
    pub direction: Direction,

    /// Route identity string
    pub route_id: String,

    /// Origin terminus name
    pub origin: String,

    /// Destination terminus name
    pub destination: String,

    /// Number of stops along this direction
    pub stop_count: usize,
}

/// A route matching a number-prefix search.
#[derive(Debug, Serialize)]
pub struct RouteMatchResult {
    /// Route number
    pub route_number: String,

    /// Operator code
    pub company: Company,

    /// Usable directions of this route
    pub directions: Vec<DirectionResult>,
}

/// Response for the route search.
#[derive(Debug, Serialize)]
pub struct RouteSearchResponse {
    /// The query as received
    pub query: String,

    /// Matching routes in natural route-number order
    pub routes: Vec<RouteMatchResult>,
}

/// Response for the keypad helper.
#[derive(Debug, Serialize)]
pub struct KeypadResponse {
    /// The input as received
    pub input: String,

    /// Every valid next character, sorted, concatenated
    pub next_characters: String,
}

/// One upcoming arrival.
#[derive(Debug, Serialize)]
pub struct ArrivalResult {
    /// Whole minutes until arrival, clamped to zero; absent when the feed
    /// gave no estimate
    pub minutes: Option<i64>,

    /// Predicted arrival as an RFC 3339 timestamp
    pub scheduled: Option<String>,

    /// Service variant this prediction came from, where the operator
    /// distinguishes them
    pub variant: Option<u8>,
}

/// Response for a live arrival board.
#[derive(Debug, Serialize)]
pub struct EtaResponse {
    /// Display name of the stop
    pub stop_name: String,

    /// Destination label ("往：蘇屋")
    pub destination: String,

    /// Upcoming arrivals, soonest first
    pub arrivals: Vec<ArrivalResult>,

    /// True when a metadata lookup failed and a placeholder was
    /// substituted
    pub is_partial: bool,
}

/// Response describing the active dataset.
#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    /// Dataset version
    pub version: i64,

    /// When the dataset was generated
    pub generated_at: String,

    pub total_routes: u64,
    pub total_stops: u64,
    pub total_stop_route_mappings: u64,
}

/// Response for a snapshot reload.
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    /// Version that was active before the reload
    pub old_version: i64,

    /// Version that is active now
    pub new_version: i64,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

// Conversion implementations

impl NearbyResponse {
    /// Assemble from engine views, tagging which tier produced them.
    pub fn new(tier: &str, views: &[NearbyStopView]) -> Self {
        Self {
            tier: tier.to_string(),
            stops: views.iter().map(NearbyStopResult::from_view).collect(),
        }
    }
}

impl NearbyStopResult {
    /// Create from an engine view.
    pub fn from_view(view: &NearbyStopView) -> Self {
        Self {
            stop_id: view.stop.stop_id.clone(),
            name_local: view.stop.name_local.clone(),
            name_alt: view.stop.name_alt.clone(),
            latitude: view.stop.latitude,
            longitude: view.stop.longitude,
            distance_m: view.stop.distance_m.round(),
            routes: view.routes.iter().map(StopRouteResult::from_display).collect(),
        }
    }
}

impl StopRouteResult {
    /// Create from an engine listing entry.
    pub fn from_display(display: &StopRouteDisplay) -> Self {
        Self {
            route_number: display.route_number.clone(),
            company: display.company,
            direction: display.direction,
            destination: display.destination.clone(),
            route_id: display.route_id.clone(),
        }
    }
}

impl StopRoutesResponse {
    /// Create from an engine stop page.
    pub fn from_page(page: StopPage) -> Self {
        Self {
            stop_id: page.stop_id,
            name_local: page.name_local,
            name_alt: page.name_alt,
            routes: page.routes.iter().map(StopRouteResult::from_display).collect(),
        }
    }
}

impl RouteMatchResult {
    /// Create from an index match.
    pub fn from_match(m: &RouteMatch) -> Self {
        Self {
            route_number: m.route_number.clone(),
            company: m.company,
            directions: m.directions.iter().map(DirectionResult::from_summary).collect(),
        }
    }
}

impl DirectionResult {
    /// Create from an index direction summary.
    pub fn from_summary(summary: &DirectionSummary) -> Self {
        Self {
            direction: summary.direction,
            route_id: summary.route_id.clone(),
            origin: summary.origin.clone(),
            destination: summary.destination.clone(),
            stop_count: summary.stop_count,
        }
    }
}

impl EtaResponse {
    /// Create from a composed display aggregate, computing countdowns
    /// against `now`.
    pub fn from_aggregate(aggregate: &DisplayAggregate, now: DateTime<FixedOffset>) -> Self {
        Self {
            stop_name: aggregate.stop_name.clone(),
            destination: aggregate.destination.clone(),
            arrivals: aggregate
                .arrivals
                .iter()
                .map(|sample| ArrivalResult::from_sample(sample, now))
                .collect(),
            is_partial: aggregate.is_partial,
        }
    }
}

impl ArrivalResult {
    /// Create from an arrival sample, computing the countdown against
    /// `now`.
    pub fn from_sample(sample: &ArrivalSample, now: DateTime<FixedOffset>) -> Self {
        Self {
            minutes: sample.minutes_from(now),
            scheduled: sample.scheduled.map(|t| t.to_rfc3339()),
            variant: sample.variant,
        }
    }
}

impl SnapshotResponse {
    /// Create from the active snapshot.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            version: snapshot.version,
            generated_at: snapshot.generated_at.clone(),
            total_routes: snapshot.summary.total_routes,
            total_stops: snapshot.summary.total_stops,
            total_stop_route_mappings: snapshot.summary.total_stop_route_mappings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RouteSelection;
    use crate::geo::NearbyStop;
    use crate::snapshot::Summary;
    use std::collections::BTreeMap;

    fn at(rfc3339: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    fn sample(scheduled: Option<&str>, variant: Option<u8>) -> ArrivalSample {
        ArrivalSample {
            scheduled: scheduled.map(at),
            direction_tag: "O".to_string(),
            variant,
        }
    }

    #[test]
    fn arrival_result_computes_countdown() {
        let now = at("2024-01-15T10:00:00+08:00");
        let result = ArrivalResult::from_sample(&sample(Some("2024-01-15T10:05:00+08:00"), Some(1)), now);

        assert_eq!(result.minutes, Some(5));
        assert_eq!(result.scheduled, Some("2024-01-15T10:05:00+08:00".to_string()));
        assert_eq!(result.variant, Some(1));
    }

    #[test]
    fn arrival_result_keeps_unknown_times_unknown() {
        let now = at("2024-01-15T10:00:00+08:00");
        let result = ArrivalResult::from_sample(&sample(None, None), now);

        assert_eq!(result.minutes, None);
        assert_eq!(result.scheduled, None);
        assert_eq!(result.variant, None);
    }

    #[test]
    fn eta_response_from_aggregate() {
        let aggregate = DisplayAggregate {
            selection: RouteSelection::new(
                Company::Ctb,
                "793",
                Direction::Outbound,
                "003472",
            ),
            stop_name: "雍明苑".to_string(),
            destination: "往：蘇屋".to_string(),
            arrivals: vec![
                sample(Some("2024-01-15T10:05:00+08:00"), None),
                sample(Some("2024-01-15T10:17:00+08:00"), None),
            ],
            is_partial: false,
        };

        let response = EtaResponse::from_aggregate(&aggregate, at("2024-01-15T10:00:00+08:00"));
        assert_eq!(response.stop_name, "雍明苑");
        assert_eq!(response.destination, "往：蘇屋");
        assert_eq!(response.arrivals.len(), 2);
        assert_eq!(response.arrivals[0].minutes, Some(5));
        assert_eq!(response.arrivals[1].minutes, Some(17));
        assert!(!response.is_partial);
    }

    #[test]
    fn nearby_stop_result_rounds_distance() {
        let view = NearbyStopView {
            stop: NearbyStop {
                stop_id: "003472".to_string(),
                name_local: "雍明苑".to_string(),
                name_alt: "Wing Ming Estate Bus Terminus".to_string(),
                latitude: 22.3128,
                longitude: 114.2598,
                distance_m: 123.456,
            },
            routes: vec![StopRouteDisplay {
                route_number: "793".to_string(),
                company: Company::Ctb,
                direction: Direction::Outbound,
                destination: "→ 蘇屋".to_string(),
                route_id: "CTB_793_O".to_string(),
            }],
        };

        let result = NearbyStopResult::from_view(&view);
        assert_eq!(result.distance_m, 123.0);
        assert_eq!(result.routes.len(), 1);
        assert_eq!(result.routes[0].destination, "→ 蘇屋");
    }

    #[test]
    fn route_match_serializes_operator_and_direction_codes() {
        let result = RouteMatchResult::from_match(&RouteMatch {
            route_number: "793".to_string(),
            company: Company::Ctb,
            directions: vec![DirectionSummary {
                direction: Direction::Outbound,
                route_id: "CTB_793_O".to_string(),
                origin: "將軍澳（康城站）".to_string(),
                destination: "蘇屋".to_string(),
                stop_count: 4,
            }],
        });

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["company"], "CTB");
        assert_eq!(value["directions"][0]["direction"], "outbound");
        assert_eq!(value["directions"][0]["stop_count"], 4);
    }

    #[test]
    fn snapshot_response_carries_summary_counts() {
        let snapshot = Snapshot {
            version: 1700000000,
            generated_at: "2026-08-20T03:00:00+08:00".to_string(),
            routes: BTreeMap::new(),
            stops: BTreeMap::new(),
            route_stops: BTreeMap::new(),
            stop_routes: BTreeMap::new(),
            summary: Summary {
                total_routes: 1500,
                total_stops: 6000,
                total_stop_route_mappings: 24000,
            },
        };

        let response = SnapshotResponse::from_snapshot(&snapshot);
        assert_eq!(response.version, 1700000000);
        assert_eq!(response.total_routes, 1500);
        assert_eq!(response.total_stop_route_mappings, 24000);
    }
}
