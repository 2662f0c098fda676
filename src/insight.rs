//! Per-pincode recommendation fetcher.
//!
//! Each dispatched request carries the generation that was current when it
//! was issued. Selecting a different pincode (or clearing it) bumps the
//! generation first, so a response that arrives for an older generation is
//! dropped without being displayed or reported.

use crate::error::{BackendError, InsightError};
use crate::types::{is_sentinel_for, Recommendation, ALL_PINCODES};

#[derive(Debug, Clone, PartialEq)]
pub enum InsightState {
    Idle,
    Loading {
        pincode: String,
    },
    Ready {
        pincode: String,
        recommendation: Recommendation,
    },
    Failed {
        pincode: String,
        error: InsightError,
    },
}

impl InsightState {
    /// The pincode this state belongs to, if any.
    pub fn pincode(&self) -> Option<&str> {
        match self {
            InsightState::Idle => None,
            InsightState::Loading { pincode }
            | InsightState::Ready { pincode, .. }
            | InsightState::Failed { pincode, .. } => Some(pincode),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, InsightState::Loading { .. })
    }
}

/// Handle for one dispatched recommendation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightTicket {
    pub generation: u64,
    pub pincode: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    Ready,
    Failed,
    Superseded,
}

#[derive(Debug, Clone)]
pub struct InsightFetcher {
    state: InsightState,
    generation: u64,
}

impl Default for InsightFetcher {
    fn default() -> Self {
        Self {
            state: InsightState::Idle,
            generation: 0,
        }
    }
}

impl InsightFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &InsightState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// React to the selected pincode. Returns a ticket when a new request
    /// must be dispatched. Re-selecting the current key is a no-op.
    pub fn select(&mut self, pincode: &str) -> Option<InsightTicket> {
        if is_sentinel_for(ALL_PINCODES, pincode) {
            if self.state != InsightState::Idle {
                self.invalidate();
            }
            return None;
        }

        if self.state.pincode() == Some(pincode) {
            return None;
        }

        self.generation += 1;
        self.state = InsightState::Loading {
            pincode: pincode.to_string(),
        };
        Some(InsightTicket {
            generation: self.generation,
            pincode: pincode.to_string(),
        })
    }

    /// Drop any in-flight request and return to Idle.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.state = InsightState::Idle;
    }

    pub fn is_current(&self, ticket: &InsightTicket) -> bool {
        ticket.generation == self.generation && self.state.pincode() == Some(&ticket.pincode)
    }

    /// Apply a completion for `ticket`. Superseded completions change nothing.
    pub fn resolve(
        &mut self,
        ticket: &InsightTicket,
        result: Result<Recommendation, BackendError>,
    ) -> ResolveOutcome {
        if !self.is_current(ticket) {
            log::debug!(
                "Insight fetcher: discarding superseded response for {} (gen {} != {})",
                ticket.pincode,
                ticket.generation,
                self.generation
            );
            return ResolveOutcome::Superseded;
        }

        match result {
            Ok(recommendation) => {
                self.state = InsightState::Ready {
                    pincode: ticket.pincode.clone(),
                    recommendation,
                };
                ResolveOutcome::Ready
            }
            Err(e) => {
                let error = InsightError::from(&e);
                log::warn!(
                    "Insight fetcher: request for {} failed: {}",
                    ticket.pincode,
                    e
                );
                self.state = InsightState::Failed {
                    pincode: ticket.pincode.clone(),
                    error,
                };
                ResolveOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ALL_PINCODES;

    fn rec(pincode: &str) -> Recommendation {
        Recommendation {
            pincode: Some(pincode.to_string()),
            priority: "High".into(),
            predicted_workload_hours: 12.4,
            required_counters: 2.0,
            anomaly_status: "Normal Flow".into(),
            ai_insights: vec![format!("Workload for {pincode} requires 2 counters.")],
        }
    }

    #[test]
    fn test_idle_to_loading_to_ready() {
        let mut fetcher = InsightFetcher::new();
        assert_eq!(fetcher.state(), &InsightState::Idle);

        let ticket = fetcher.select("411001").unwrap();
        assert!(fetcher.state().is_loading());

        assert_eq!(fetcher.resolve(&ticket, Ok(rec("411001"))), ResolveOutcome::Ready);
        match fetcher.state() {
            InsightState::Ready { pincode, recommendation } => {
                assert_eq!(pincode, "411001");
                assert_eq!(recommendation.pincode.as_deref(), Some("411001"));
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn test_superseded_response_is_never_shown() {
        let mut fetcher = InsightFetcher::new();
        let a = fetcher.select("411001").unwrap();
        let b = fetcher.select("411002").unwrap();
        assert!(b.generation > a.generation);

        assert_eq!(fetcher.resolve(&a, Ok(rec("411001"))), ResolveOutcome::Superseded);
        assert_eq!(
            fetcher.state(),
            &InsightState::Loading {
                pincode: "411002".into()
            }
        );

        fetcher.resolve(&b, Ok(rec("411002")));
        assert_eq!(fetcher.state().pincode(), Some("411002"));
    }

    #[test]
    fn test_superseded_failure_is_silent() {
        let mut fetcher = InsightFetcher::new();
        let a = fetcher.select("411001").unwrap();
        let _b = fetcher.select("411002").unwrap();

        let outcome = fetcher.resolve(&a, Err(BackendError::Timeout(15)));
        assert_eq!(outcome, ResolveOutcome::Superseded);
        assert!(fetcher.state().is_loading());
    }

    #[test]
    fn test_revert_to_sentinel_goes_idle_and_drops_in_flight() {
        let mut fetcher = InsightFetcher::new();
        let a = fetcher.select("411001").unwrap();
        assert!(fetcher.select(ALL_PINCODES).is_none());
        assert_eq!(fetcher.state(), &InsightState::Idle);

        assert_eq!(fetcher.resolve(&a, Ok(rec("411001"))), ResolveOutcome::Superseded);
        assert_eq!(fetcher.state(), &InsightState::Idle);
    }

    #[test]
    fn test_a_b_a_does_not_resurrect_first_request() {
        let mut fetcher = InsightFetcher::new();
        let first_a = fetcher.select("411001").unwrap();
        fetcher.select("411002").unwrap();
        let second_a = fetcher.select("411001").unwrap();

        assert_eq!(
            fetcher.resolve(&first_a, Ok(rec("411001"))),
            ResolveOutcome::Superseded
        );
        assert_eq!(
            fetcher.resolve(&second_a, Ok(rec("411001"))),
            ResolveOutcome::Ready
        );
    }

    #[test]
    fn test_reselecting_current_pincode_is_noop() {
        let mut fetcher = InsightFetcher::new();
        let ticket = fetcher.select("411001").unwrap();
        assert!(fetcher.select("411001").is_none());
        assert!(fetcher.is_current(&ticket));
    }

    #[test]
    fn test_failure_is_classified() {
        let mut fetcher = InsightFetcher::new();
        let ticket = fetcher.select("411001").unwrap();
        let err = BackendError::from_response_body(500, r#"{"detail":"model crashed"}"#);
        assert_eq!(fetcher.resolve(&ticket, Err(err)), ResolveOutcome::Failed);

        match fetcher.state() {
            InsightState::Failed { error, .. } => {
                assert_eq!(error.to_string(), "API Error (500): model crashed");
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn test_new_pincode_after_failure_reloads() {
        let mut fetcher = InsightFetcher::new();
        let a = fetcher.select("411001").unwrap();
        fetcher.resolve(&a, Err(BackendError::Unreachable("refused".into())));

        let b = fetcher.select("411002");
        assert!(b.is_some());
        assert!(fetcher.state().is_loading());
    }
}
