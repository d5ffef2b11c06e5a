//! Route search: the per-snapshot prefix index and the keypad memo cache.

mod keypad;
mod prefix;

pub use keypad::NextCharCache;
pub use prefix::{DirectionSummary, PrefixIndex, RouteMatch};
