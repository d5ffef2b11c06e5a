//! Wire types for the arrival feeds.
//!
//! Both feed families (Citybus/NWFB and KMB) wrap their payloads in a
//! `{ "data": ... }` envelope and tag arrival entries with a single-letter
//! direction. Timestamps are RFC 3339 with an explicit offset.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use crate::domain::Company;

/// A single upstream arrival request.
///
/// One selection may expand to several of these: KMB routes are queried
/// once per service type variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedRequest {
    pub company: Company,
    pub stop_id: String,
    pub route_number: String,
    /// KMB service type variant; `None` for companies without variants.
    pub variant: Option<u8>,
}

impl FeedRequest {
    pub fn new(
        company: Company,
        stop_id: impl Into<String>,
        route_number: impl Into<String>,
        variant: Option<u8>,
    ) -> Self {
        Self {
            company,
            stop_id: stop_id.into(),
            route_number: route_number.into(),
            variant,
        }
    }
}

/// One arrival entry as the feeds send it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEta {
    /// Predicted arrival as an RFC 3339 timestamp; absent or null when the
    /// feed has no estimate.
    #[serde(default)]
    pub eta: Option<String>,

    /// Single-letter direction tag ("O"/"I").
    #[serde(default)]
    pub dir: String,

    /// Route number echoed by the feed.
    #[serde(default)]
    pub route: Option<String>,

    /// Stop identifier echoed by the feed (Citybus only).
    #[serde(default, rename = "stop")]
    pub stop_id: Option<String>,
}

/// Envelope around a list of arrival entries.
#[derive(Debug, Clone, Deserialize)]
pub struct EtaEnvelope {
    #[serde(default)]
    pub data: Vec<RawEta>,
}

/// Stop metadata as the feeds send it.
#[derive(Debug, Clone, Deserialize)]
pub struct StopInfo {
    pub name_tc: String,
    #[serde(default)]
    pub name_en: Option<String>,
}

/// Envelope around stop metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct StopInfoEnvelope {
    pub data: StopInfo,
}

/// Route metadata as the feeds send it.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteInfo {
    pub orig_tc: String,
    pub dest_tc: String,
    #[serde(default)]
    pub orig_en: Option<String>,
    #[serde(default)]
    pub dest_en: Option<String>,
}

/// Envelope around route metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteInfoEnvelope {
    pub data: RouteInfo,
}

/// Terminus names for one direction of a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteNames {
    pub origin: String,
    pub destination: String,
}

/// A parsed arrival prediction.
///
/// # Examples
///
/// ```
/// use bus_server::eta::{ArrivalSample, RawEta};
/// use chrono::DateTime;
///
/// let raw = RawEta {
///     eta: Some("2026-08-25T12:31:30+08:00".to_string()),
///     dir: "O".to_string(),
///     route: None,
///     stop_id: None,
/// };
/// let sample = ArrivalSample::from_raw(&raw, None);
/// let now = DateTime::parse_from_rfc3339("2026-08-25T12:30:00+08:00").unwrap();
/// assert_eq!(sample.minutes_from(now), Some(2));
/// ```
#[derive(Debug, Clone)]
pub struct ArrivalSample {
    /// Predicted arrival time; `None` when the feed had no estimate or the
    /// timestamp did not parse.
    pub scheduled: Option<DateTime<FixedOffset>>,

    /// Raw direction tag from the feed.
    pub direction_tag: String,

    /// Which service type variant produced this sample (KMB only).
    pub variant: Option<u8>,
}

impl ArrivalSample {
    /// Parse a raw feed entry. An unparseable timestamp is treated the same
    /// as a missing one.
    pub fn from_raw(raw: &RawEta, variant: Option<u8>) -> Self {
        let scheduled = raw
            .eta
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok());

        Self {
            scheduled,
            direction_tag: raw.dir.clone(),
            variant,
        }
    }

    /// Minutes until arrival relative to `now`, rounded to the nearest
    /// minute and clamped at zero. `None` when there is no predicted time.
    pub fn minutes_from(&self, now: DateTime<FixedOffset>) -> Option<i64> {
        let scheduled = self.scheduled?;
        let secs = scheduled.signed_duration_since(now).num_seconds();
        Some(((secs as f64 / 60.0).round() as i64).max(0))
    }
}
