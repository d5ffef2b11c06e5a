//! HTTP client for the Hong Kong bus arrival feeds.
//!
//! Talks to two public feed families: the Citybus/NWFB endpoints under
//! `rt.data.gov.hk` and the KMB endpoints under `data.etabus.gov.hk`.
//! Neither requires authentication. A semaphore caps concurrent requests
//! so a burst of selections cannot flood the feeds.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::domain::{Company, Direction};

use super::aggregate::EtaProvider;
use super::error::EtaError;
use super::types::{
    EtaEnvelope, FeedRequest, RawEta, RouteInfoEnvelope, RouteNames, StopInfoEnvelope,
};

/// Default base URL for the Citybus/NWFB feed.
const DEFAULT_CITYBUS_BASE_URL: &str = "https://rt.data.gov.hk/v2/transport/citybus";

/// Default base URL for the KMB feed.
const DEFAULT_KMB_BASE_URL: &str = "https://data.etabus.gov.hk/v1/transport/kmb";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for the arrival feed client.
#[derive(Debug, Clone)]
pub struct EtaConfig {
    /// Base URL for the Citybus/NWFB feed
    pub citybus_base_url: String,
    /// Base URL for the KMB feed
    pub kmb_base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl EtaConfig {
    /// Create a config pointing at the production feeds.
    pub fn new() -> Self {
        Self {
            citybus_base_url: DEFAULT_CITYBUS_BASE_URL.to_string(),
            kmb_base_url: DEFAULT_KMB_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom Citybus/NWFB base URL (for testing).
    pub fn with_citybus_base_url(mut self, url: impl Into<String>) -> Self {
        self.citybus_base_url = url.into();
        self
    }

    /// Set a custom KMB base URL (for testing).
    pub fn with_kmb_base_url(mut self, url: impl Into<String>) -> Self {
        self.kmb_base_url = url.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for EtaConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Arrival feed API client.
///
/// Provides methods for fetching arrival entries and stop/route metadata.
/// Uses a semaphore to limit concurrent requests and avoid rate limiting.
#[derive(Debug, Clone)]
pub struct EtaClient {
    http: reqwest::Client,
    citybus_base_url: String,
    kmb_base_url: String,
    semaphore: Arc<Semaphore>,
}

impl EtaClient {
    /// Create a new feed client with the given configuration.
    pub fn new(config: EtaConfig) -> Result<Self, EtaError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            citybus_base_url: config.citybus_base_url,
            kmb_base_url: config.kmb_base_url,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
        })
    }

    /// URL for an arrival request.
    ///
    /// Citybus routes carry the company code in the path; KMB routes carry
    /// the service type variant instead.
    fn eta_url(&self, request: &FeedRequest) -> String {
        match request.company {
            Company::Ctb | Company::Nwfb => format!(
                "{}/eta/{}/{}/{}",
                self.citybus_base_url,
                request.company.as_str(),
                request.stop_id,
                request.route_number
            ),
            Company::Kmb => format!(
                "{}/eta/{}/{}/{}",
                self.kmb_base_url,
                request.stop_id,
                request.route_number,
                request.variant.unwrap_or(1)
            ),
        }
    }

    fn stop_url(&self, company: Company, stop_id: &str) -> String {
        match company {
            Company::Ctb | Company::Nwfb => format!("{}/stop/{}", self.citybus_base_url, stop_id),
            Company::Kmb => format!("{}/stop/{}", self.kmb_base_url, stop_id),
        }
    }

    fn route_url(&self, company: Company, route_number: &str, direction: Direction) -> String {
        match company {
            Company::Ctb | Company::Nwfb => format!(
                "{}/route/{}/{}",
                self.citybus_base_url,
                company.as_str(),
                route_number
            ),
            Company::Kmb => format!(
                "{}/route/{}/{}/1",
                self.kmb_base_url,
                route_number,
                direction.as_str()
            ),
        }
    }
}

impl EtaProvider for EtaClient {
    async fn fetch_eta(&self, request: &FeedRequest) -> Result<Vec<RawEta>, EtaError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| EtaError::Api {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let url = self.eta_url(request);
        let response = self.http.get(&url).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(EtaError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EtaError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        let envelope: EtaEnvelope = serde_json::from_str(&body).map_err(|e| EtaError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })?;

        Ok(envelope.data)
    }

    async fn fetch_stop_name(&self, company: Company, stop_id: &str) -> Result<String, EtaError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| EtaError::Api {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let url = self.stop_url(company, stop_id);
        let response = self.http.get(&url).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(EtaError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EtaError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        let envelope: StopInfoEnvelope =
            serde_json::from_str(&body).map_err(|e| EtaError::Json {
                message: e.to_string(),
                body: Some(body.chars().take(500).collect()),
            })?;

        Ok(envelope.data.name_tc)
    }

    async fn fetch_route_names(
        &self,
        company: Company,
        route_number: &str,
        direction: Direction,
    ) -> Result<RouteNames, EtaError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| EtaError::Api {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let url = self.route_url(company, route_number, direction);
        let response = self.http.get(&url).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(EtaError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EtaError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        let envelope: RouteInfoEnvelope =
            serde_json::from_str(&body).map_err(|e| EtaError::Json {
                message: e.to_string(),
                body: Some(body.chars().take(500).collect()),
            })?;

        Ok(RouteNames {
            origin: envelope.data.orig_tc,
            destination: envelope.data.dest_tc,
        })
    }
}
