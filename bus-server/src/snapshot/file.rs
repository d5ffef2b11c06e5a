//! Snapshot file schema.
//!
//! These types map directly to the snapshot JSON document produced by the
//! dataset pipeline. Field names follow the file exactly. The `sequence`
//! fields have shipped as both numbers and numeric strings over the
//! dataset's history, so they are coerced rather than decoded strictly.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

/// Top level of the snapshot document.
///
/// Every field here is required: a document missing one of them fails
/// structural validation and is rejected as malformed.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotFile {
    /// Dataset version, a coarse unix timestamp. Monotonic across releases.
    pub version: i64,

    /// When the dataset was generated (ISO 8601 datetime).
    pub generated_at: String,

    /// Route table, keyed by route id string ("CTB_793_O").
    pub routes: BTreeMap<String, RouteRecordFile>,

    /// Stop table, keyed by stop id.
    pub stops: BTreeMap<String, StopRecordFile>,

    /// Ordered stop sequence per route id.
    pub route_stops: BTreeMap<String, Vec<RouteStopFile>>,

    /// Reverse index: routes serving each stop id.
    pub stop_routes: BTreeMap<String, Vec<StopRouteFile>>,

    /// Dataset-level counts.
    pub summary: SummaryFile,
}

/// One route in one direction, as stored in the file.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteRecordFile {
    pub route_number: String,

    /// Company code ("CTB", "KMB", "NWFB").
    pub company: String,

    /// Direction word ("outbound" or "inbound").
    pub direction: String,

    pub origin_tc: String,
    pub origin_en: String,
    pub dest_tc: String,
    pub dest_en: String,

    /// Service sub-type, where the company distinguishes them.
    #[serde(default)]
    pub service_type: Option<String>,
}

/// One stop, as stored in the file.
///
/// Coordinates are optional: malformed upstream entries ship without them
/// and are still useful for name lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct StopRecordFile {
    pub name_tc: String,
    pub name_en: String,

    #[serde(default)]
    pub latitude: Option<f64>,

    #[serde(default)]
    pub longitude: Option<f64>,

    pub company: String,
}

/// One entry of a route's ordered stop sequence.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteStopFile {
    pub stop_id: String,

    #[serde(deserialize_with = "coerce_sequence")]
    pub sequence: u32,
}

/// One entry of a stop's route listing.
#[derive(Debug, Clone, Deserialize)]
pub struct StopRouteFile {
    pub route_number: String,
    pub company: String,
    pub direction: String,
    pub destination: String,

    #[serde(deserialize_with = "coerce_sequence")]
    pub sequence: u32,

    pub route_id: String,
}

/// Dataset-level counts carried in the file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryFile {
    #[serde(default)]
    pub total_routes: u64,

    #[serde(default)]
    pub total_stops: u64,

    #[serde(default)]
    pub total_stop_route_mappings: u64,
}

/// A sequence value that may be a number or a numeric string.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    Text(String),
}

/// Coerce a number-or-string sequence field to an integer.
///
/// Unparseable or negative values coerce to 0 rather than failing the load;
/// the ordering of a degenerate entry is not worth rejecting a whole dataset
/// over.
fn coerce_sequence<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let raw = NumberOrString::deserialize(deserializer)?;
    let n = match raw {
        NumberOrString::Number(n) => n,
        NumberOrString::Text(s) => s.trim().parse::<i64>().unwrap_or(0),
    };
    Ok(u32::try_from(n).unwrap_or(0))
}
