//! Display composition for a selected route at a stop.
//!
//! Pulls the three pieces a departure display needs (stop name, destination
//! label, live arrivals) concurrently and degrades gracefully: a failed
//! metadata lookup substitutes a placeholder and marks the aggregate
//! partial, while a failed arrival fetch fails the whole composition,
//! since arrivals are the point of the display.

use tracing::warn;

use crate::cache::TtlCache;
use crate::domain::{Direction, RouteSelection};
use crate::eta::{ArrivalSample, EtaError, EtaProvider, fetch_arrivals};

/// Text substituted when a metadata lookup fails.
pub const PLACEHOLDER_TEXT: &str = "未有資料";

/// Composed display state for one selection.
#[derive(Debug, Clone)]
pub struct DisplayAggregate {
    pub selection: RouteSelection,

    /// Stop display name, or the placeholder when the lookup failed.
    pub stop_name: String,

    /// Destination label ("往：…" for outbound, "返：…" for inbound), or
    /// the placeholder when the lookup failed.
    pub destination: String,

    /// Arrivals for the selected direction, soonest first, unknown last.
    pub arrivals: Vec<ArrivalSample>,

    /// True when any metadata lookup failed and a placeholder was
    /// substituted.
    pub is_partial: bool,
}

/// Composes display aggregates, caching the text lookups.
///
/// Stop names and destination labels change rarely, so they are held in a
/// TTL cache and only refetched after expiry. Failed lookups are never
/// cached; the next composition retries them.
pub struct DisplayComposer<P> {
    provider: P,
    text_cache: TtlCache<String>,
}

impl<P: EtaProvider> DisplayComposer<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            text_cache: TtlCache::default(),
        }
    }

    /// Compose the display aggregate for a selection.
    pub async fn compose(&self, selection: &RouteSelection) -> Result<DisplayAggregate, EtaError> {
        let (stop_name, destination, arrivals) = tokio::join!(
            self.stop_name(selection),
            self.destination_label(selection),
            fetch_arrivals(&self.provider, selection),
        );

        let arrivals = arrivals?;

        let mut is_partial = false;

        let stop_name = match stop_name {
            Ok(name) => name,
            Err(e) => {
                warn!(stop = %selection.stop_id, error = %e, "stop name lookup failed");
                is_partial = true;
                PLACEHOLDER_TEXT.to_string()
            }
        };

        let destination = match destination {
            Ok(label) => label,
            Err(e) => {
                warn!(
                    route = %selection.route_number,
                    direction = %selection.direction,
                    error = %e,
                    "route metadata lookup failed"
                );
                is_partial = true;
                PLACEHOLDER_TEXT.to_string()
            }
        };

        Ok(DisplayAggregate {
            selection: selection.clone(),
            stop_name,
            destination,
            arrivals,
            is_partial,
        })
    }

    /// Drop all cached display text.
    pub fn clear_cache(&self) {
        self.text_cache.invalidate_all();
    }

    async fn stop_name(&self, selection: &RouteSelection) -> Result<String, EtaError> {
        let key = format!("stop_{}", selection.stop_id.to_lowercase());
        if let Some(name) = self.text_cache.get(&key) {
            return Ok(name);
        }

        let name = self
            .provider
            .fetch_stop_name(selection.company, &selection.stop_id)
            .await?;
        self.text_cache.insert(key, name.clone());
        Ok(name)
    }

    /// Destination label, cached under the route id.
    ///
    /// Outbound selections point at the route's destination terminus,
    /// inbound ones back at its origin.
    async fn destination_label(&self, selection: &RouteSelection) -> Result<String, EtaError> {
        let key = selection.route_id().to_string();
        if let Some(label) = self.text_cache.get(&key) {
            return Ok(label);
        }

        let names = self
            .provider
            .fetch_route_names(selection.company, &selection.route_number, selection.direction)
            .await?;

        let label = match selection.direction {
            Direction::Outbound => format!("往：{}", names.destination),
            Direction::Inbound => format!("返：{}", names.origin),
        };
        self.text_cache.insert(key, label.clone());
        Ok(label)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::domain::Company;
    use crate::eta::{FeedRequest, MockEtaProvider, RawEta, RouteNames};

    fn entry(eta: Option<&str>, dir: &str) -> RawEta {
        RawEta {
            eta: eta.map(str::to_string),
            dir: dir.to_string(),
            route: None,
            stop_id: None,
        }
    }

    fn outbound_793() -> RouteSelection {
        RouteSelection::new(Company::Ctb, "793", Direction::Outbound, "003472")
    }

    fn canned_provider() -> MockEtaProvider {
        MockEtaProvider::new()
            .with_eta(
                FeedRequest::new(Company::Ctb, "003472", "793", None),
                vec![
                    entry(Some("2026-08-25T12:16:00+08:00"), "O"),
                    entry(Some("2026-08-25T12:04:00+08:00"), "O"),
                ],
            )
            .with_stop_name(Company::Ctb, "003472", "雍明苑")
            .with_route_names(Company::Ctb, "793", Direction::Outbound, "將軍澳（康城站）", "蘇屋")
    }

    #[tokio::test]
    async fn composes_full_aggregate() {
        let composer = DisplayComposer::new(canned_provider());

        let aggregate = composer.compose(&outbound_793()).await.unwrap();

        assert_eq!(aggregate.stop_name, "雍明苑");
        assert_eq!(aggregate.destination, "往：蘇屋");
        assert_eq!(aggregate.arrivals.len(), 2);
        assert_eq!(
            aggregate.arrivals[0].scheduled.unwrap().to_rfc3339(),
            "2026-08-25T12:04:00+08:00"
        );
        assert!(!aggregate.is_partial);
    }

    #[tokio::test]
    async fn inbound_label_points_back_to_origin() {
        let provider = MockEtaProvider::new()
            .with_eta(
                FeedRequest::new(Company::Ctb, "002917", "793", None),
                vec![entry(Some("2026-08-25T12:04:00+08:00"), "I")],
            )
            .with_stop_name(Company::Ctb, "002917", "調景嶺站")
            .with_route_names(Company::Ctb, "793", Direction::Inbound, "將軍澳（康城站）", "蘇屋");
        let composer = DisplayComposer::new(provider);

        let selection = RouteSelection::new(Company::Ctb, "793", Direction::Inbound, "002917");
        let aggregate = composer.compose(&selection).await.unwrap();

        assert_eq!(aggregate.destination, "返：將軍澳（康城站）");
    }

    #[tokio::test]
    async fn stop_name_failure_substitutes_placeholder() {
        let provider = MockEtaProvider::new()
            .with_eta(
                FeedRequest::new(Company::Ctb, "003472", "793", None),
                vec![entry(Some("2026-08-25T12:04:00+08:00"), "O")],
            )
            .with_stop_name_failure(Company::Ctb, "003472", "stop feed down")
            .with_route_names(Company::Ctb, "793", Direction::Outbound, "將軍澳（康城站）", "蘇屋");
        let composer = DisplayComposer::new(provider);

        let aggregate = composer.compose(&outbound_793()).await.unwrap();

        assert_eq!(aggregate.stop_name, PLACEHOLDER_TEXT);
        assert_eq!(aggregate.destination, "往：蘇屋");
        assert_eq!(aggregate.arrivals.len(), 1);
        assert!(aggregate.is_partial);
    }

    #[tokio::test]
    async fn route_metadata_failure_substitutes_placeholder() {
        let provider = MockEtaProvider::new()
            .with_eta(
                FeedRequest::new(Company::Ctb, "003472", "793", None),
                vec![entry(Some("2026-08-25T12:04:00+08:00"), "O")],
            )
            .with_stop_name(Company::Ctb, "003472", "雍明苑")
            .with_route_names_failure(Company::Ctb, "793", Direction::Outbound, "route feed down");
        let composer = DisplayComposer::new(provider);

        let aggregate = composer.compose(&outbound_793()).await.unwrap();

        assert_eq!(aggregate.stop_name, "雍明苑");
        assert_eq!(aggregate.destination, PLACEHOLDER_TEXT);
        assert!(aggregate.is_partial);
    }

    #[tokio::test]
    async fn arrival_failure_fails_the_composition() {
        let provider = MockEtaProvider::new()
            .with_eta_failure(
                FeedRequest::new(Company::Ctb, "003472", "793", None),
                "eta feed down",
            )
            .with_stop_name(Company::Ctb, "003472", "雍明苑")
            .with_route_names(Company::Ctb, "793", Direction::Outbound, "將軍澳（康城站）", "蘇屋");
        let composer = DisplayComposer::new(provider);

        let err = composer.compose(&outbound_793()).await.unwrap_err();
        assert!(matches!(err, EtaError::AllSourcesFailed(_)));
    }

    #[tokio::test]
    async fn empty_arrivals_with_good_metadata_is_complete() {
        let provider = MockEtaProvider::new()
            .with_eta(FeedRequest::new(Company::Ctb, "003472", "793", None), vec![])
            .with_stop_name(Company::Ctb, "003472", "雍明苑")
            .with_route_names(Company::Ctb, "793", Direction::Outbound, "將軍澳（康城站）", "蘇屋");
        let composer = DisplayComposer::new(provider);

        let aggregate = composer.compose(&outbound_793()).await.unwrap();

        assert!(aggregate.arrivals.is_empty());
        assert!(!aggregate.is_partial);
    }

    /// Counts metadata fetches to observe the text cache.
    struct CountingProvider {
        inner: MockEtaProvider,
        stop_lookups: AtomicUsize,
        route_lookups: AtomicUsize,
    }

    impl CountingProvider {
        fn new(inner: MockEtaProvider) -> Self {
            Self {
                inner,
                stop_lookups: AtomicUsize::new(0),
                route_lookups: AtomicUsize::new(0),
            }
        }
    }

    impl EtaProvider for CountingProvider {
        async fn fetch_eta(&self, request: &FeedRequest) -> Result<Vec<RawEta>, EtaError> {
            self.inner.fetch_eta(request).await
        }

        async fn fetch_stop_name(
            &self,
            company: Company,
            stop_id: &str,
        ) -> Result<String, EtaError> {
            self.stop_lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_stop_name(company, stop_id).await
        }

        async fn fetch_route_names(
            &self,
            company: Company,
            route_number: &str,
            direction: Direction,
        ) -> Result<RouteNames, EtaError> {
            self.route_lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_route_names(company, route_number, direction).await
        }
    }

    #[tokio::test]
    async fn metadata_is_cached_across_compositions() {
        let composer = DisplayComposer::new(CountingProvider::new(canned_provider()));

        composer.compose(&outbound_793()).await.unwrap();
        composer.compose(&outbound_793()).await.unwrap();

        assert_eq!(composer.provider.stop_lookups.load(Ordering::SeqCst), 1);
        assert_eq!(composer.provider.route_lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_lookups_are_not_cached() {
        let composer = DisplayComposer::new(CountingProvider::new(
            MockEtaProvider::new()
                .with_eta(FeedRequest::new(Company::Ctb, "003472", "793", None), vec![])
                .with_stop_name_failure(Company::Ctb, "003472", "down")
                .with_route_names(Company::Ctb, "793", Direction::Outbound, "將軍澳（康城站）", "蘇屋"),
        ));

        composer.compose(&outbound_793()).await.unwrap();
        composer.compose(&outbound_793()).await.unwrap();

        // The failing stop lookup is retried every time.
        assert_eq!(composer.provider.stop_lookups.load(Ordering::SeqCst), 2);
        assert_eq!(composer.provider.route_lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn clear_cache_forces_refetch() {
        let composer = DisplayComposer::new(CountingProvider::new(canned_provider()));

        composer.compose(&outbound_793()).await.unwrap();
        composer.clear_cache();
        composer.compose(&outbound_793()).await.unwrap();

        assert_eq!(composer.provider.stop_lookups.load(Ordering::SeqCst), 2);
    }
}
