//! Canned arrival provider for testing without feed access.
//!
//! Responses are keyed per request. Anything without a canned response
//! fails with a synthetic 404, which is also how partial KMB variant
//! coverage is modelled: can the variants that should answer and leave
//! the rest out.

use std::collections::HashMap;

use crate::domain::{Company, Direction};

use super::aggregate::EtaProvider;
use super::error::EtaError;
use super::types::{FeedRequest, RawEta, RouteNames};

/// Canned failures are stored as messages and rebuilt into errors on each
/// call, since feed errors do not clone.
type Canned<T> = Result<T, String>;

/// Mock arrival provider serving canned responses.
#[derive(Debug, Default)]
pub struct MockEtaProvider {
    etas: HashMap<FeedRequest, Canned<Vec<RawEta>>>,
    stop_names: HashMap<(Company, String), Canned<String>>,
    route_names: HashMap<(Company, String, Direction), Canned<RouteNames>>,
}

impl MockEtaProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Can a successful arrival response for a request.
    pub fn with_eta(mut self, request: FeedRequest, entries: Vec<RawEta>) -> Self {
        self.etas.insert(request, Ok(entries));
        self
    }

    /// Can a failing arrival response for a request.
    pub fn with_eta_failure(mut self, request: FeedRequest, message: impl Into<String>) -> Self {
        self.etas.insert(request, Err(message.into()));
        self
    }

    /// Can a stop name.
    pub fn with_stop_name(
        mut self,
        company: Company,
        stop_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.stop_names
            .insert((company, stop_id.into()), Ok(name.into()));
        self
    }

    /// Can a failing stop name lookup.
    pub fn with_stop_name_failure(
        mut self,
        company: Company,
        stop_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.stop_names
            .insert((company, stop_id.into()), Err(message.into()));
        self
    }

    /// Can terminus names for one direction of a route.
    pub fn with_route_names(
        mut self,
        company: Company,
        route_number: impl Into<String>,
        direction: Direction,
        origin: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        self.route_names.insert(
            (company, route_number.into(), direction),
            Ok(RouteNames {
                origin: origin.into(),
                destination: destination.into(),
            }),
        );
        self
    }

    /// Can a failing route metadata lookup.
    pub fn with_route_names_failure(
        mut self,
        company: Company,
        route_number: impl Into<String>,
        direction: Direction,
        message: impl Into<String>,
    ) -> Self {
        self.route_names
            .insert((company, route_number.into(), direction), Err(message.into()));
        self
    }

    fn canned_failure(message: &str) -> EtaError {
        EtaError::Api {
            status: 503,
            message: message.to_string(),
        }
    }

    fn not_canned(what: &str) -> EtaError {
        EtaError::Api {
            status: 404,
            message: format!("no canned response for {what}"),
        }
    }
}

impl EtaProvider for MockEtaProvider {
    async fn fetch_eta(&self, request: &FeedRequest) -> Result<Vec<RawEta>, EtaError> {
        match self.etas.get(request) {
            Some(Ok(entries)) => Ok(entries.clone()),
            Some(Err(message)) => Err(Self::canned_failure(message)),
            None => Err(Self::not_canned(&format!(
                "{} {} at {} variant {:?}",
                request.company, request.route_number, request.stop_id, request.variant
            ))),
        }
    }

    async fn fetch_stop_name(&self, company: Company, stop_id: &str) -> Result<String, EtaError> {
        match self.stop_names.get(&(company, stop_id.to_string())) {
            Some(Ok(name)) => Ok(name.clone()),
            Some(Err(message)) => Err(Self::canned_failure(message)),
            None => Err(Self::not_canned(&format!("stop {stop_id}"))),
        }
    }

    async fn fetch_route_names(
        &self,
        company: Company,
        route_number: &str,
        direction: Direction,
    ) -> Result<RouteNames, EtaError> {
        match self
            .route_names
            .get(&(company, route_number.to_string(), direction))
        {
            Some(Ok(names)) => Ok(names.clone()),
            Some(Err(message)) => Err(Self::canned_failure(message)),
            None => Err(Self::not_canned(&format!(
                "route {route_number} {direction}"
            ))),
        }
    }
}
