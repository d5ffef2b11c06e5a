//! Application state for the web layer.

use std::sync::Arc;

use crate::engine::BusEngine;
use crate::eta::EtaClient;

/// Shared application state.
///
/// The engine already bundles everything a handler needs, so state is one
/// shared handle to it.
#[derive(Clone)]
pub struct AppState {
    /// Snapshot, search indices, caches, and the live arrival feeds.
    pub engine: Arc<BusEngine<EtaClient>>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(engine: BusEngine<EtaClient>) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}
