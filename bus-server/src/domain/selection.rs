//! Route-at-stop selection type.

use serde::{Deserialize, Serialize};

use super::{Company, Direction, RouteId};

/// One route in one direction observed at one stop.
///
/// This is the unit the caller asks live-arrival questions about: "route 793
/// outbound, as it passes stop 003472". Everything the upstream feeds need
/// (which endpoints to hit, which direction tag to keep) derives from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteSelection {
    pub company: Company,
    pub route_number: String,
    pub direction: Direction,
    pub stop_id: String,
}

impl RouteSelection {
    pub fn new(
        company: Company,
        route_number: impl Into<String>,
        direction: Direction,
        stop_id: impl Into<String>,
    ) -> Self {
        RouteSelection {
            company,
            route_number: route_number.into(),
            direction,
            stop_id: stop_id.into(),
        }
    }

    /// The route identity this selection refers to, independent of the stop.
    pub fn route_id(&self) -> RouteId {
        RouteId::new(self.company, self.route_number.clone(), self.direction)
    }

    /// The feed variants this selection queries.
    ///
    /// A KMB route may live under any of three numbered service types and the
    /// feed cannot be asked which, so all three are probed. The other
    /// companies expose a single unnumbered feed.
    pub fn service_variants(&self) -> &'static [Option<u8>] {
        match self.company {
            Company::Kmb => &[Some(1), Some(2), Some(3)],
            Company::Ctb | Company::Nwfb => &[None],
        }
    }
}
