//! Engine facade over the snapshot, indices, caches, and live feeds.
//!
//! [`BusEngine`] is the one object the HTTP layer talks to. It owns the
//! snapshot store plus the two derived indices, and keeps every cache that
//! has to be dropped when the dataset changes in one place, so a snapshot
//! replacement cannot leave a stale index or memo behind.
//!
//! Index slots are `RwLock<Arc<_>>`: queries clone the `Arc` and run on a
//! consistent index without holding the lock, while a replacement swaps in
//! freshly built ones.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::cache::TtlCache;
use crate::display::{DisplayAggregate, DisplayComposer};
use crate::domain::{Company, Direction, RouteSelection};
use crate::eta::{EtaError, EtaProvider};
use crate::geo::{GeoIndex, NearbyStop};
use crate::search::{NextCharCache, PrefixIndex, RouteMatch};
use crate::snapshot::{LoadError, Snapshot, SnapshotStore};

/// One entry of a stop's route listing, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopRouteDisplay {
    pub route_number: String,
    pub company: Company,
    pub direction: Direction,
    /// Terminus label, already prefixed with an arrow ("→ 蘇屋").
    pub destination: String,
    pub route_id: String,
}

/// A nearby stop together with the routes that serve it.
#[derive(Debug, Clone)]
pub struct NearbyStopView {
    pub stop: NearbyStop,
    pub routes: Vec<StopRouteDisplay>,
}

/// A stop's route listing page: the stop's names plus its routes.
#[derive(Debug, Clone)]
pub struct StopPage {
    pub stop_id: String,
    pub name_local: String,
    pub name_alt: String,
    pub routes: Vec<StopRouteDisplay>,
}

/// Facade over the dataset and the live arrival feeds.
pub struct BusEngine<P> {
    store: SnapshotStore,
    prefix: RwLock<Arc<PrefixIndex>>,
    geo: RwLock<Arc<GeoIndex>>,
    keypad: NextCharCache,
    search_cache: TtlCache<Arc<Vec<RouteMatch>>>,
    composer: DisplayComposer<P>,
}

impl<P: EtaProvider> BusEngine<P> {
    /// Build the indices for the store's active snapshot and wire the
    /// arrival provider in.
    pub fn new(store: SnapshotStore, provider: P) -> Self {
        let snapshot = store.current();
        let prefix = PrefixIndex::build(&snapshot);
        let geo = GeoIndex::build(&snapshot);
        info!(
            version = snapshot.version,
            route_tokens = prefix.token_count(),
            located_stops = geo.len(),
            "search indices built"
        );
        BusEngine {
            store,
            prefix: RwLock::new(Arc::new(prefix)),
            geo: RwLock::new(Arc::new(geo)),
            keypad: NextCharCache::default(),
            search_cache: TtlCache::default(),
            composer: DisplayComposer::new(provider),
        }
    }

    /// Stops within `radius_km` of a location, closest first, each enriched
    /// with its route listing.
    pub fn nearby_stops(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
        limit: usize,
    ) -> Vec<NearbyStopView> {
        let snapshot = self.store.current();
        self.geo_index()
            .nearby(latitude, longitude, radius_km, limit)
            .into_iter()
            .map(|stop| {
                let routes = routes_listing(&snapshot, &stop.stop_id);
                NearbyStopView { stop, routes }
            })
            .collect()
    }

    /// Render specific stops as nearby hits measured from the given
    /// location, in the order given. Ids the snapshot cannot place are
    /// skipped.
    pub fn locate_stops(
        &self,
        latitude: f64,
        longitude: f64,
        stop_ids: &[&str],
    ) -> Vec<NearbyStopView> {
        let snapshot = self.store.current();
        let geo = self.geo_index();
        stop_ids
            .iter()
            .filter_map(|stop_id| geo.locate(stop_id, latitude, longitude))
            .map(|stop| {
                let routes = routes_listing(&snapshot, &stop.stop_id);
                NearbyStopView { stop, routes }
            })
            .collect()
    }

    /// Prefix search over route numbers. Results are shared and cached per
    /// normalized query until the TTL lapses or a snapshot lands.
    pub fn search_routes(&self, query: &str) -> Arc<Vec<RouteMatch>> {
        let key = format!("route_{}", query.trim().to_lowercase());
        if let Some(hit) = self.search_cache.get(&key) {
            return hit;
        }
        let results = Arc::new(self.prefix_index().search(query));
        self.search_cache.insert(key, results.clone());
        results
    }

    /// Valid next keypad characters for a partial route number, memoized.
    pub fn possible_next_characters(&self, input: &str) -> Arc<BTreeSet<char>> {
        let prefix = self.prefix_index();
        self.keypad
            .get_or_compute(input, || prefix.possible_next_characters(input))
    }

    /// Live display aggregate for a selection: stop name, destination label,
    /// and merged arrivals.
    pub async fn compose_display(
        &self,
        selection: &RouteSelection,
    ) -> Result<DisplayAggregate, EtaError> {
        self.composer.compose(selection).await
    }

    /// Routes serving a stop, in the snapshot's stored order. Empty when the
    /// stop is unknown or has no listing.
    pub fn routes_at_stop(&self, stop_id: &str) -> Vec<StopRouteDisplay> {
        routes_listing(&self.store.current(), stop_id)
    }

    /// The route listing page for a stop, `None` when the stop id is
    /// unknown.
    pub fn stop_page(&self, stop_id: &str) -> Option<StopPage> {
        let snapshot = self.store.current();
        let stop = snapshot.stop(stop_id)?;
        Some(StopPage {
            stop_id: stop_id.to_string(),
            name_local: stop.name_local.clone(),
            name_alt: stop.name_alt.clone(),
            routes: routes_listing(&snapshot, stop_id),
        })
    }

    /// Install a new snapshot: swap the store, rebuild both indices, then
    /// drop every derived cache. Returns the installed version.
    pub fn replace_snapshot(&self, snapshot: Snapshot) -> i64 {
        let active = self.store.replace(snapshot);
        let prefix = PrefixIndex::build(&active);
        let geo = GeoIndex::build(&active);
        *self.prefix.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(prefix);
        *self.geo.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(geo);
        self.keypad.clear();
        self.search_cache.invalidate_all();
        self.composer.clear_cache();
        info!(version = active.version, "snapshot replaced, indices rebuilt");
        active.version
    }

    /// Re-read the primary snapshot path and install whatever it holds.
    /// On any load failure the active snapshot, indices, and caches stay
    /// exactly as they were.
    pub fn reload_from_disk(&self) -> Result<i64, LoadError> {
        let snapshot = self.store.load_primary()?;
        Ok(self.replace_snapshot(snapshot))
    }

    /// Shed every derived cache while keeping the snapshot and indices.
    /// Queries after this recompute from the indices, so the only cost is
    /// latency.
    pub fn handle_memory_pressure(&self) {
        self.keypad.clear();
        self.search_cache.invalidate_all();
        self.composer.clear_cache();
        info!("memory pressure: derived caches cleared");
    }

    /// The active snapshot.
    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        self.store.current()
    }

    /// Version of the active snapshot.
    pub fn snapshot_version(&self) -> i64 {
        self.store.version()
    }

    fn prefix_index(&self) -> Arc<PrefixIndex> {
        self.prefix
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn geo_index(&self) -> Arc<GeoIndex> {
        self.geo
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Decorate a stop's stored route links with display-ready terminus labels.
///
/// Outbound entries point at the stored destination; inbound entries point
/// back at the route's origin, since the listing describes where a bus
/// boarded here is heading.
fn routes_listing(snapshot: &Snapshot, stop_id: &str) -> Vec<StopRouteDisplay> {
    snapshot
        .routes_at_stop(stop_id)
        .iter()
        .map(|link| {
            let record = snapshot.route(&link.route_id);
            let terminus = match (link.direction, record) {
                (Direction::Inbound, Some(record)) => record.origin_local.clone(),
                _ => link.destination.clone(),
            };
            StopRouteDisplay {
                route_number: link.route_number.clone(),
                company: link.company,
                direction: link.direction,
                destination: format!("→ {terminus}"),
                route_id: link.route_id.clone(),
            }
        })
        .collect()
}
