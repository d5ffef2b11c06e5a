//! Route direction type.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when parsing an unknown direction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown direction: {value}")]
pub struct InvalidDirection {
    value: String,
}

/// Direction of travel along a route.
///
/// Snapshot data spells directions out ("outbound"/"inbound"); route ids and
/// the live feeds abbreviate them to a single letter ("O"/"I"). Both forms
/// parse, and both renderings are available.
///
/// # Examples
///
/// ```
/// use bus_server::domain::Direction;
///
/// assert_eq!(Direction::parse("outbound").unwrap(), Direction::Outbound);
/// assert_eq!(Direction::parse("I").unwrap(), Direction::Inbound);
/// assert_eq!(Direction::Outbound.letter(), 'O');
/// assert_eq!(Direction::Inbound.as_str(), "inbound");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Outbound,
    Inbound,
}

impl Direction {
    /// Parse a direction from either the full word or the single-letter tag,
    /// case-insensitively.
    pub fn parse(s: &str) -> Result<Self, InvalidDirection> {
        if s.eq_ignore_ascii_case("outbound") || s.eq_ignore_ascii_case("O") {
            Ok(Direction::Outbound)
        } else if s.eq_ignore_ascii_case("inbound") || s.eq_ignore_ascii_case("I") {
            Ok(Direction::Inbound)
        } else {
            Err(InvalidDirection {
                value: s.to_string(),
            })
        }
    }

    /// Returns the full lower-case direction word.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Outbound => "outbound",
            Direction::Inbound => "inbound",
        }
    }

    /// Returns the single-letter tag used in route ids and feed responses.
    pub fn letter(&self) -> char {
        match self {
            Direction::Outbound => 'O',
            Direction::Inbound => 'I',
        }
    }

    /// Whether a feed's direction tag refers to this direction.
    ///
    /// Feeds tag each sample with a single-letter direction; matching is on
    /// the first character, case-insensitively, so "O", "o" and "OB" all
    /// match outbound while an empty tag matches nothing.
    pub fn matches_tag(&self, tag: &str) -> bool {
        tag.chars()
            .next()
            .is_some_and(|c| c.eq_ignore_ascii_case(&self.letter()))
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Direction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Direction::parse(&s).map_err(serde::de::Error::custom)
    }
}
