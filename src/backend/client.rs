//! HTTP client for the enrolment analytics backend.
//!
//! Uses reqwest with per-request timeouts. Filter and stats routes live under
//! the configured API prefix; the recommendation route under the insight
//! prefix.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::{
    classify_transport_error, is_transient_status, retry_after, DashboardBackend, Endpoint,
    RetryPolicy,
};
use crate::error::BackendError;
use crate::latency;
use crate::state::DashboardConfig;
use crate::types::{Recommendation, StatsQuery, StatsSnapshot};

pub struct BackendClient {
    client: reqwest::Client,
    api_root: String,
    insight_root: String,
    request_timeout: Duration,
    insight_timeout: Duration,
    retry: RetryPolicy,
}

impl BackendClient {
    pub fn new(config: &DashboardConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("enrolment-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_root: config.api_root(),
            insight_root: config.insight_root(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            insight_timeout: Duration::from_secs(config.insight_timeout_secs),
            retry: config.retry.clone(),
        })
    }

    fn url(root: &str, path: &str) -> Result<url::Url, BackendError> {
        let raw = format!("{}/{}", root, path);
        url::Url::parse(&raw).map_err(|e| BackendError::InvalidUrl(format!("{}: {}", raw, e)))
    }

    /// Issue a GET and decode a JSON body, recording latency for `endpoint`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        url: url::Url,
        query: &[(&str, &str)],
        timeout: Duration,
        retry: Option<&RetryPolicy>,
    ) -> Result<T, BackendError> {
        let started = Instant::now();
        let result = self.get_json_inner(endpoint, url, query, timeout, retry).await;
        latency::record_request(endpoint, started.elapsed(), result.is_ok());
        if let Err(ref e) = result {
            log::debug!("{} request failed: {}", endpoint.name(), e);
        }
        result
    }

    async fn get_json_inner<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        url: url::Url,
        query: &[(&str, &str)],
        timeout: Duration,
        retry: Option<&RetryPolicy>,
    ) -> Result<T, BackendError> {
        let request = self.client.get(url).query(query).timeout(timeout);
        let resp = Self::send(endpoint, request, timeout, retry).await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(BackendError::from_response_body(status.as_u16(), &text));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| classify_transport_error(e, timeout))?;

        serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }

    /// Send `request`, re-sending on transient statuses and on connect or
    /// timeout failures while `retry` allows. The last response is returned
    /// even when its status is an error, so its body can be read.
    async fn send(
        endpoint: Endpoint,
        request: reqwest::RequestBuilder,
        timeout: Duration,
        retry: Option<&RetryPolicy>,
    ) -> Result<reqwest::Response, BackendError> {
        let max_attempts = retry.map_or(1, |policy| policy.max_attempts.max(1));
        let mut attempt = 1;
        loop {
            let Some(attempt_request) = request.try_clone() else {
                return request
                    .send()
                    .await
                    .map_err(|e| classify_transport_error(e, timeout));
            };
            let outcome = attempt_request.send().await;

            let wait = match (retry, &outcome) {
                (Some(_), _) if attempt >= max_attempts => None,
                (Some(policy), Ok(resp)) if is_transient_status(resp.status().as_u16()) => {
                    Some(retry_after(resp.headers()).unwrap_or_else(|| policy.backoff(attempt)))
                }
                (Some(policy), Err(e)) if e.is_timeout() || e.is_connect() => {
                    Some(policy.backoff(attempt))
                }
                _ => None,
            };
            let Some(wait) = wait else {
                return outcome.map_err(|e| classify_transport_error(e, timeout));
            };

            match &outcome {
                Ok(resp) => log::warn!(
                    "Backend client: {} returned {} (attempt {}/{}), retrying in {:?}",
                    endpoint.name(),
                    resp.status(),
                    attempt,
                    max_attempts,
                    wait
                ),
                Err(e) => log::warn!(
                    "Backend client: {} failed: {} (attempt {}/{}), retrying in {:?}",
                    endpoint.name(),
                    e,
                    attempt,
                    max_attempts,
                    wait
                ),
            }
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl DashboardBackend for BackendClient {
    async fn fetch_states(&self) -> Result<Vec<String>, BackendError> {
        let url = Self::url(&self.api_root, "filters/states")?;
        self.get_json(Endpoint::States, url, &[], self.request_timeout, Some(&self.retry))
            .await
    }

    async fn fetch_districts(&self, state: &str) -> Result<Vec<String>, BackendError> {
        let url = Self::url(&self.api_root, "filters/districts")?;
        self.get_json(
            Endpoint::Districts,
            url,
            &[("state_name", state)],
            self.request_timeout,
            Some(&self.retry),
        )
        .await
    }

    async fn fetch_pincodes(&self, district: &str) -> Result<Vec<String>, BackendError> {
        let url = Self::url(&self.api_root, "filters/pincodes")?;
        self.get_json(
            Endpoint::Pincodes,
            url,
            &[("district_name", district)],
            self.request_timeout,
            Some(&self.retry),
        )
        .await
    }

    async fn fetch_stats(&self, query: &StatsQuery) -> Result<StatsSnapshot, BackendError> {
        let url = Self::url(&self.api_root, "dashboard-stats")?;
        self.get_json(
            Endpoint::Stats,
            url,
            &[
                ("state", query.state.as_str()),
                ("district", query.district.as_str()),
                ("pincode", query.pincode.as_str()),
                ("year", query.year.as_str()),
            ],
            self.request_timeout,
            Some(&self.retry),
        )
        .await
    }

    async fn fetch_recommendation(&self, pincode: &str) -> Result<Recommendation, BackendError> {
        let url = Self::url(&self.insight_root, "predict-resource-needs")?;
        self.get_json(
            Endpoint::Recommendation,
            url,
            &[("pincode", pincode)],
            self.insight_timeout,
            None,
        )
        .await
    }
}
