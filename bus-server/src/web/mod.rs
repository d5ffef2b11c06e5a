//! Web layer for the bus arrival server.
//!
//! Provides HTTP endpoints for nearby stops, route search, arrival boards,
//! and dataset administration.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::create_router;
pub use state::AppState;
