//! Domain types for the transit data engine.
//!
//! This module contains the core identifier types shared by the snapshot
//! model, the search indices, and the live-arrival layer. All types enforce
//! their invariants at construction time, so code that receives these types
//! can trust their validity.

mod company;
mod direction;
mod route_id;
mod selection;

pub use company::{Company, InvalidCompany};
pub use direction::{Direction, InvalidDirection};
pub use route_id::{InvalidRouteId, RouteId};
pub use selection::RouteSelection;
