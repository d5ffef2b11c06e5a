//! Hong Kong bus arrival server.
//!
//! Serves a bundled route/stop dataset (nearby stops, number-prefix route
//! search, per-stop listings) and composes live arrival boards from the
//! operators' prediction feeds.

pub mod cache;
pub mod display;
pub mod domain;
pub mod engine;
pub mod eta;
pub mod geo;
pub mod search;
pub mod snapshot;
pub mod web;
