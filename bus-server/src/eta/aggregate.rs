//! Arrival aggregation across feed sources.
//!
//! A selection may need several upstream requests: KMB splits each route
//! across up to three service type variants with no way to ask which of
//! them exist, so all three are queried and the answers merged. The
//! aggregate succeeds as long as at least one request does.

use std::future::Future;

use futures::future::join_all;
use tracing::debug;

use crate::domain::{Company, Direction, RouteSelection};

use super::error::EtaError;
use super::types::{ArrivalSample, FeedRequest, RawEta, RouteNames};

/// Trait for fetching arrival data and metadata from the upstream feeds.
///
/// This abstraction allows the display pipeline to be tested with mock data.
pub trait EtaProvider: Send + Sync {
    /// Fetch raw arrival entries for a single feed request.
    fn fetch_eta(
        &self,
        request: &FeedRequest,
    ) -> impl Future<Output = Result<Vec<RawEta>, EtaError>> + Send;

    /// Fetch the display name of a stop.
    fn fetch_stop_name(
        &self,
        company: Company,
        stop_id: &str,
    ) -> impl Future<Output = Result<String, EtaError>> + Send;

    /// Fetch terminus names for one direction of a route.
    fn fetch_route_names(
        &self,
        company: Company,
        route_number: &str,
        direction: Direction,
    ) -> impl Future<Output = Result<RouteNames, EtaError>> + Send;
}

/// Expand a selection into the upstream requests it needs.
fn build_requests(selection: &RouteSelection) -> Vec<FeedRequest> {
    selection
        .service_variants()
        .iter()
        .map(|&variant| {
            FeedRequest::new(
                selection.company,
                selection.stop_id.clone(),
                selection.route_number.clone(),
                variant,
            )
        })
        .collect()
}

/// Fetch and merge arrivals for a selection.
///
/// All upstream requests run concurrently. Entries from successful requests
/// are merged, filtered to the selected direction, and sorted by arrival
/// time with unknown times last. An empty merged list from successful
/// requests is a success ("no buses due" is an answer). Only when every
/// request fails does this return [`EtaError::AllSourcesFailed`], carrying
/// the first failure in request order.
pub async fn fetch_arrivals<P: EtaProvider>(
    provider: &P,
    selection: &RouteSelection,
) -> Result<Vec<ArrivalSample>, EtaError> {
    let requests = build_requests(selection);
    let results = join_all(requests.iter().map(|r| provider.fetch_eta(r))).await;

    let mut samples = Vec::new();
    let mut errors = Vec::new();
    let mut any_ok = false;

    for (request, result) in requests.iter().zip(results) {
        match result {
            Ok(entries) => {
                any_ok = true;
                for raw in &entries {
                    samples.push(ArrivalSample::from_raw(raw, request.variant));
                }
            }
            Err(e) => {
                debug!(
                    company = %request.company,
                    route = %request.route_number,
                    stop = %request.stop_id,
                    variant = ?request.variant,
                    error = %e,
                    "arrival request failed"
                );
                errors.push(e);
            }
        }
    }

    if !any_ok {
        match errors.into_iter().next() {
            Some(first) => return Err(EtaError::AllSourcesFailed(Box::new(first))),
            None => return Ok(Vec::new()),
        }
    }

    samples.retain(|s| selection.direction.matches_tag(&s.direction_tag));
    samples.sort_by_key(|s| (s.scheduled.is_none(), s.scheduled));

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eta::mock::MockEtaProvider;

    fn entry(eta: Option<&str>, dir: &str) -> RawEta {
        RawEta {
            eta: eta.map(str::to_string),
            dir: dir.to_string(),
            route: None,
            stop_id: None,
        }
    }

    fn ctb_selection() -> RouteSelection {
        RouteSelection::new(Company::Ctb, "793", Direction::Outbound, "003472")
    }

    fn kmb_selection() -> RouteSelection {
        RouteSelection::new(Company::Kmb, "296A", Direction::Inbound, "A60AE774B09A5E44")
    }

    fn kmb_request(variant: u8) -> FeedRequest {
        FeedRequest::new(Company::Kmb, "A60AE774B09A5E44", "296A", Some(variant))
    }

    #[tokio::test]
    async fn citybus_selection_is_one_request() {
        let provider = MockEtaProvider::new().with_eta(
            FeedRequest::new(Company::Ctb, "003472", "793", None),
            vec![
                entry(Some("2026-08-25T12:04:00+08:00"), "O"),
                entry(Some("2026-08-25T12:16:00+08:00"), "O"),
            ],
        );

        let samples = fetch_arrivals(&provider, &ctb_selection()).await.unwrap();

        assert_eq!(samples.len(), 2);
        assert!(samples.iter().all(|s| s.variant.is_none()));
    }

    #[tokio::test]
    async fn kmb_merges_all_answering_variants() {
        // Variant 2 has no canned response and fails; 1 and 3 answer.
        let provider = MockEtaProvider::new()
            .with_eta(kmb_request(1), vec![entry(Some("2026-08-25T12:20:00+08:00"), "I")])
            .with_eta(kmb_request(3), vec![entry(Some("2026-08-25T12:08:00+08:00"), "I")]);

        let samples = fetch_arrivals(&provider, &kmb_selection()).await.unwrap();

        assert_eq!(samples.len(), 2);
        // Sorted by time, not by variant.
        assert_eq!(samples[0].variant, Some(3));
        assert_eq!(samples[1].variant, Some(1));
    }

    #[tokio::test]
    async fn one_kmb_variant_answering_is_enough() {
        let provider = MockEtaProvider::new()
            .with_eta(kmb_request(2), vec![entry(Some("2026-08-25T12:11:00+08:00"), "I")]);

        let samples = fetch_arrivals(&provider, &kmb_selection()).await.unwrap();

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].variant, Some(2));
    }

    #[tokio::test]
    async fn all_failures_surface_the_first_error() {
        let provider = MockEtaProvider::new()
            .with_eta_failure(kmb_request(1), "variant 1 down")
            .with_eta_failure(kmb_request(2), "variant 2 down")
            .with_eta_failure(kmb_request(3), "variant 3 down");

        let err = fetch_arrivals(&provider, &kmb_selection())
            .await
            .unwrap_err();

        match err {
            EtaError::AllSourcesFailed(inner) => {
                assert!(inner.to_string().contains("variant 1 down"));
            }
            other => panic!("expected AllSourcesFailed, got {other}"),
        }
    }

    #[tokio::test]
    async fn entries_for_the_other_direction_are_dropped() {
        let provider = MockEtaProvider::new().with_eta(
            FeedRequest::new(Company::Ctb, "003472", "793", None),
            vec![
                entry(Some("2026-08-25T12:04:00+08:00"), "O"),
                entry(Some("2026-08-25T12:05:00+08:00"), "I"),
                entry(Some("2026-08-25T12:06:00+08:00"), ""),
            ],
        );

        let samples = fetch_arrivals(&provider, &ctb_selection()).await.unwrap();

        assert_eq!(samples.len(), 1);
        assert_eq!(
            samples[0].scheduled.unwrap().to_rfc3339(),
            "2026-08-25T12:04:00+08:00"
        );
    }

    #[tokio::test]
    async fn unknown_times_sort_last() {
        let provider = MockEtaProvider::new().with_eta(
            FeedRequest::new(Company::Ctb, "003472", "793", None),
            vec![
                entry(None, "O"),
                entry(Some("2026-08-25T12:16:00+08:00"), "O"),
                entry(Some("2026-08-25T12:04:00+08:00"), "O"),
            ],
        );

        let samples = fetch_arrivals(&provider, &ctb_selection()).await.unwrap();

        assert_eq!(samples.len(), 3);
        assert_eq!(
            samples[0].scheduled.unwrap().to_rfc3339(),
            "2026-08-25T12:04:00+08:00"
        );
        assert_eq!(
            samples[1].scheduled.unwrap().to_rfc3339(),
            "2026-08-25T12:16:00+08:00"
        );
        assert!(samples[2].scheduled.is_none());
    }

    #[tokio::test]
    async fn empty_but_successful_response_is_ok() {
        let provider = MockEtaProvider::new()
            .with_eta(FeedRequest::new(Company::Ctb, "003472", "793", None), vec![]);

        let samples = fetch_arrivals(&provider, &ctb_selection()).await.unwrap();
        assert!(samples.is_empty());
    }
}
