//! Bus operating company code type.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when parsing an unknown company code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown company code: {code}")]
pub struct InvalidCompany {
    code: String,
}

/// A bus operating company.
///
/// Companies are identified upstream by a short upper-case code ("CTB" for
/// Citybus, "KMB" for Kowloon Motor Bus, "NWFB" for New World First Bus).
/// The code also selects which live-arrival feed shape applies: KMB splits
/// arrivals across numbered service variants, the others expose one feed.
///
/// # Examples
///
/// ```
/// use bus_server::domain::Company;
///
/// let ctb = Company::parse("CTB").unwrap();
/// assert_eq!(ctb.as_str(), "CTB");
///
/// // Parsing is case-insensitive
/// assert_eq!(Company::parse("kmb").unwrap(), Company::Kmb);
///
/// // Unknown codes are rejected
/// assert!(Company::parse("MTR").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Company {
    Ctb,
    Kmb,
    Nwfb,
}

impl Company {
    /// Parse a company code from a string, case-insensitively.
    pub fn parse(s: &str) -> Result<Self, InvalidCompany> {
        if s.eq_ignore_ascii_case("CTB") {
            Ok(Company::Ctb)
        } else if s.eq_ignore_ascii_case("KMB") {
            Ok(Company::Kmb)
        } else if s.eq_ignore_ascii_case("NWFB") {
            Ok(Company::Nwfb)
        } else {
            Err(InvalidCompany {
                code: s.to_string(),
            })
        }
    }

    /// Returns the canonical upper-case company code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Company::Ctb => "CTB",
            Company::Kmb => "KMB",
            Company::Nwfb => "NWFB",
        }
    }
}

impl fmt::Display for Company {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Company {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Company {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Company::parse(&s).map_err(serde::de::Error::custom)
    }
}
