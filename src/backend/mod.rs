//! Access to the enrolment analytics backend.
//!
//! Modules:
//! - client: reqwest implementation of [`DashboardBackend`]
//!
//! All endpoints are read-only GETs. Option-list and stats requests are
//! re-sent on transient failures per [`RetryPolicy`]; the recommendation
//! request is sent once and bounded by its own timeout instead.

pub mod client;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::types::{Recommendation, StatsQuery, StatsSnapshot};

pub use client::BackendClient;

/// Read-only query interface the dashboard session consumes.
#[async_trait]
pub trait DashboardBackend: Send + Sync {
    /// `GET /filters/states`
    async fn fetch_states(&self) -> Result<Vec<String>, BackendError>;

    /// `GET /filters/districts?state_name=`
    async fn fetch_districts(&self, state: &str) -> Result<Vec<String>, BackendError>;

    /// `GET /filters/pincodes?district_name=`
    async fn fetch_pincodes(&self, district: &str) -> Result<Vec<String>, BackendError>;

    /// `GET /dashboard-stats?state=&district=&pincode=&year=`
    async fn fetch_stats(&self, query: &StatsQuery) -> Result<StatsSnapshot, BackendError>;

    /// `GET /predict-resource-needs?pincode=`
    async fn fetch_recommendation(&self, pincode: &str) -> Result<Recommendation, BackendError>;
}

/// Endpoint identity, used for latency rollups and log prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    States,
    Districts,
    Pincodes,
    Stats,
    Recommendation,
}

impl Endpoint {
    pub const ALL: [Endpoint; 5] = [
        Endpoint::States,
        Endpoint::Districts,
        Endpoint::Pincodes,
        Endpoint::Stats,
        Endpoint::Recommendation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Endpoint::States => "filters/states",
            Endpoint::Districts => "filters/districts",
            Endpoint::Pincodes => "filters/pincodes",
            Endpoint::Stats => "dashboard-stats",
            Endpoint::Recommendation => "predict-resource-needs",
        }
    }

    /// Latency budget in milliseconds for rollup violation counts.
    pub fn budget_ms(self) -> u128 {
        match self {
            Endpoint::States | Endpoint::Districts | Endpoint::Pincodes => 300,
            Endpoint::Stats => 800,
            Endpoint::Recommendation => 5_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 250,
            max_backoff_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    /// Delay before re-sending after failed attempt number `attempt` (1-based):
    /// exponential from `initial_backoff_ms`, capped at `max_backoff_ms`, plus
    /// up to 10% jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
        let base = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| u64::from(d.subsec_nanos()))
            .unwrap_or(0);
        Duration::from_millis(base + nanos % (base / 10 + 1))
    }
}

/// Statuses worth re-sending: request timeout, rate limiting, server errors.
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}

/// Server-requested wait from a `Retry-After: <seconds>` header, capped at 30 s.
pub fn retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    let secs = headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()?;
    Some(Duration::from_secs(secs.min(30)))
}

/// Map a reqwest failure onto the backend error taxonomy.
///
/// Timeouts and connect failures mean no response was received.
pub(crate) fn classify_transport_error(err: reqwest::Error, timeout: Duration) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout(timeout.as_secs())
    } else if err.is_connect() {
        BackendError::Unreachable(err.to_string())
    } else if err.is_decode() {
        BackendError::Decode(err.to_string())
    } else {
        BackendError::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient_status(503));
        assert!(is_transient_status(500));
        assert!(is_transient_status(429));
        assert!(is_transient_status(408));
        assert!(!is_transient_status(404));
        assert!(!is_transient_status(422));
        assert!(!is_transient_status(200));
    }

    #[test]
    fn test_retry_after_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("3"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(3)));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("600"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(30)));

        // HTTP-date form is not honored; the policy backoff applies instead.
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2026 07:28:00 GMT"),
        );
        assert_eq!(retry_after(&headers), None);
    }

    #[test]
    fn test_backoff_grows_and_is_capped() {
        let policy = RetryPolicy::default();
        let first = policy.backoff(1);
        assert!(first >= Duration::from_millis(250) && first <= Duration::from_millis(275));

        let second = policy.backoff(2);
        assert!(second >= Duration::from_millis(500) && second <= Duration::from_millis(550));

        let late = policy.backoff(40);
        assert!(late >= Duration::from_millis(2_000) && late <= Duration::from_millis(2_200));
    }
}
