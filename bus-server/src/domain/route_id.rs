//! Route identifier type.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{Company, Direction};

/// Error returned when parsing a malformed route id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid route id: {reason}")]
pub struct InvalidRouteId {
    reason: &'static str,
}

/// Identity of one route in one direction of travel.
///
/// Rendered as `"{COMPANY}_{routeNumber}_{O|I}"`, e.g. `"CTB_793_O"`. This is
/// the key format of the snapshot file's route table and the namespace key
/// used for cached destination text. Route numbers never contain underscores,
/// so the rendering parses back unambiguously.
///
/// # Examples
///
/// ```
/// use bus_server::domain::{Company, Direction, RouteId};
///
/// let id = RouteId::parse("CTB_793_O").unwrap();
/// assert_eq!(id.company, Company::Ctb);
/// assert_eq!(id.number, "793");
/// assert_eq!(id.direction, Direction::Outbound);
/// assert_eq!(id.to_string(), "CTB_793_O");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteId {
    pub company: Company,
    pub number: String,
    pub direction: Direction,
}

impl RouteId {
    pub fn new(company: Company, number: impl Into<String>, direction: Direction) -> Self {
        RouteId {
            company,
            number: number.into(),
            direction,
        }
    }

    /// Parse a route id of the form `"{COMPANY}_{routeNumber}_{O|I}"`.
    pub fn parse(s: &str) -> Result<Self, InvalidRouteId> {
        let mut parts = s.split('_');
        let (Some(company), Some(number), Some(letter), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(InvalidRouteId {
                reason: "expected company_number_direction",
            });
        };

        let company = Company::parse(company).map_err(|_| InvalidRouteId {
            reason: "unknown company segment",
        })?;
        if number.is_empty() {
            return Err(InvalidRouteId {
                reason: "empty route number segment",
            });
        }
        if letter.len() != 1 {
            return Err(InvalidRouteId {
                reason: "direction segment must be a single letter",
            });
        }
        let direction = Direction::parse(letter).map_err(|_| InvalidRouteId {
            reason: "direction segment must be O or I",
        })?;

        Ok(RouteId {
            company,
            number: number.to_string(),
            direction,
        })
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.company,
            self.number,
            self.direction.letter()
        )
    }
}

impl Serialize for RouteId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RouteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        RouteId::parse(&s).map_err(serde::de::Error::custom)
    }
}
