//! In-memory latency rollups per backend endpoint.
//!
//! Every request the client makes is recorded here, successful or not, so
//! the `latency` command can show p50/p95 and degraded endpoints without
//! any persistent storage.

use std::collections::{HashMap, VecDeque};
use std::sync::OnceLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::backend::Endpoint;

const MAX_SAMPLES_PER_ENDPOINT: usize = 256;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointLatencyRollup {
    pub endpoint: &'static str,
    pub sample_count: usize,
    pub p50_ms: u128,
    pub p95_ms: u128,
    pub max_ms: u128,
    pub budget_ms: u128,
    pub budget_violations: u64,
    pub failure_count: u64,
    /// True when the most recent request to this endpoint failed.
    pub degraded: bool,
    pub last_recorded_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyRollupsPayload {
    pub generated_at: String,
    pub endpoints: Vec<EndpointLatencyRollup>,
}

#[derive(Debug, Default)]
struct SampleWindow {
    samples_ms: VecDeque<u128>,
    budget_violations: u64,
    failure_count: u64,
    last_failed: bool,
    last_recorded_at: Option<DateTime<Utc>>,
}

impl SampleWindow {
    fn push(&mut self, elapsed_ms: u128, budget_ms: u128, ok: bool) {
        if self.samples_ms.len() == MAX_SAMPLES_PER_ENDPOINT {
            self.samples_ms.pop_front();
        }
        self.samples_ms.push_back(elapsed_ms);
        if elapsed_ms > budget_ms {
            self.budget_violations += 1;
        }
        if !ok {
            self.failure_count += 1;
        }
        self.last_failed = !ok;
        self.last_recorded_at = Some(Utc::now());
    }

    fn rollup(&self, endpoint: Endpoint) -> EndpointLatencyRollup {
        let mut sorted: Vec<u128> = self.samples_ms.iter().copied().collect();
        sorted.sort_unstable();
        EndpointLatencyRollup {
            endpoint: endpoint.name(),
            sample_count: sorted.len(),
            p50_ms: percentile(&sorted, 50.0),
            p95_ms: percentile(&sorted, 95.0),
            max_ms: sorted.last().copied().unwrap_or(0),
            budget_ms: endpoint.budget_ms(),
            budget_violations: self.budget_violations,
            failure_count: self.failure_count,
            degraded: self.last_failed,
            last_recorded_at: self.last_recorded_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Nearest-rank percentile over an ascending slice; 0 when empty.
fn percentile(sorted: &[u128], p: f64) -> u128 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

#[derive(Default)]
pub struct LatencyRecorder {
    windows: Mutex<HashMap<Endpoint, SampleWindow>>,
}

impl LatencyRecorder {
    fn global() -> &'static Self {
        static RECORDER: OnceLock<LatencyRecorder> = OnceLock::new();
        RECORDER.get_or_init(Self::default)
    }

    pub fn record(&self, endpoint: Endpoint, elapsed: Duration, ok: bool) {
        self.windows
            .lock()
            .entry(endpoint)
            .or_default()
            .push(elapsed.as_millis(), endpoint.budget_ms(), ok);
    }

    /// Rollups for every endpoint that has been called, in endpoint order.
    pub fn rollups(&self) -> LatencyRollupsPayload {
        let windows = self.windows.lock();
        let endpoints = Endpoint::ALL
            .iter()
            .filter_map(|endpoint| windows.get(endpoint).map(|w| w.rollup(*endpoint)))
            .collect();
        LatencyRollupsPayload {
            generated_at: Utc::now().to_rfc3339(),
            endpoints,
        }
    }
}

/// Record one finished request against the process-wide recorder.
pub fn record_request(endpoint: Endpoint, elapsed: Duration, ok: bool) {
    LatencyRecorder::global().record(endpoint, elapsed, ok);
}

pub fn get_rollups() -> LatencyRollupsPayload {
    LatencyRecorder::global().rollups()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_percentile_nearest_rank() {
        assert_eq!(percentile(&[], 95.0), 0);
        assert_eq!(percentile(&[10, 20, 30], 50.0), 20);
        assert_eq!(percentile(&[10, 20, 30], 95.0), 30);
        assert_eq!(percentile(&[7], 0.0), 7);
    }

    #[test]
    fn test_window_keeps_latest_samples() {
        let recorder = LatencyRecorder::default();
        for n in 1..=300 {
            recorder.record(Endpoint::Stats, ms(n), true);
        }
        let payload = recorder.rollups();
        let stats = &payload.endpoints[0];
        assert_eq!(stats.endpoint, "dashboard-stats");
        assert_eq!(stats.sample_count, MAX_SAMPLES_PER_ENDPOINT);
        assert_eq!(stats.max_ms, 300);
        // Samples 45..=300 remain.
        assert_eq!(stats.p50_ms, 172);
    }

    #[test]
    fn test_budget_violations_and_failures() {
        let recorder = LatencyRecorder::default();
        recorder.record(Endpoint::States, ms(300), true);
        recorder.record(Endpoint::States, ms(301), false);
        recorder.record(Endpoint::States, ms(900), true);

        let rollup = &recorder.rollups().endpoints[0];
        assert_eq!(rollup.budget_ms, 300);
        assert_eq!(rollup.budget_violations, 2);
        assert_eq!(rollup.failure_count, 1);
        assert!(!rollup.degraded);
    }

    #[test]
    fn test_degraded_follows_last_request() {
        let recorder = LatencyRecorder::default();
        recorder.record(Endpoint::Recommendation, ms(40), true);
        recorder.record(Endpoint::Recommendation, ms(15_000), false);
        assert!(recorder.rollups().endpoints[0].degraded);
    }

    #[test]
    fn test_rollups_follow_endpoint_order() {
        let recorder = LatencyRecorder::default();
        recorder.record(Endpoint::Recommendation, ms(5), true);
        recorder.record(Endpoint::States, ms(5), true);

        let names: Vec<&str> = recorder.rollups().endpoints.iter().map(|r| r.endpoint).collect();
        assert_eq!(names, vec!["filters/states", "predict-resource-needs"]);
    }
}
