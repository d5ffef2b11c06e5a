//! Live arrival feeds.
//!
//! This module talks to the Hong Kong bus open-data feeds for real-time
//! arrivals and stop/route metadata.
//!
//! Key characteristics of the feeds:
//! - Two feed families with different URL shapes: Citybus/NWFB keys
//!   arrival requests by company, KMB by service type variant
//! - A KMB route may live under any of three service type variants, and
//!   the feed offers no way to ask which, so all three are queried
//! - Arrival entries carry a single-letter direction tag that must be
//!   filtered client-side; timestamps are RFC 3339

mod aggregate;
mod client;
mod error;
mod mock;
mod types;

pub use aggregate::{EtaProvider, fetch_arrivals};
pub use client::{EtaClient, EtaConfig};
pub use error::EtaError;
pub use mock::MockEtaProvider;
pub use types::{
    ArrivalSample, EtaEnvelope, FeedRequest, RawEta, RouteInfo, RouteInfoEnvelope, RouteNames,
    StopInfo, StopInfoEnvelope,
};
