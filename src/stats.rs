//! Aggregate stats synchronizer.
//!
//! Watches the `{state, district, pincode, year}` tuple and issues a stats
//! request whenever it changes. A failed request never clears the snapshot
//! on display. Responses are sequenced so an older request that completes
//! late cannot overwrite a newer snapshot.

use crate::error::BackendError;
use crate::types::{FilterSelection, StatsQuery, StatsSnapshot};

/// A stats request to dispatch, tagged with its issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsTicket {
    pub seq: u64,
    pub query: StatsQuery,
}

#[derive(Debug, Clone, Default)]
pub struct StatsSync {
    snapshot: StatsSnapshot,
    loaded: bool,
    observed: Option<StatsQuery>,
    next_seq: u64,
    applied_seq: Option<u64>,
    last_error: Option<String>,
}

impl StatsSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// The snapshot on display. Zeroed placeholders until the first success.
    pub fn snapshot(&self) -> &StatsSnapshot {
        &self.snapshot
    }

    /// True once any fetch has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Message of the most recent failure, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Compare the selection's stats tuple against the last observed one and
    /// return a request if it changed. The first call always issues one.
    pub fn observe(&mut self, selection: &FilterSelection) -> Option<StatsTicket> {
        let query = selection.stats_query();
        if self.observed.as_ref() == Some(&query) {
            return None;
        }
        self.observed = Some(query.clone());
        self.next_seq += 1;
        Some(StatsTicket {
            seq: self.next_seq,
            query,
        })
    }

    /// Apply a completion. Returns true if the snapshot was replaced.
    pub fn apply(
        &mut self,
        ticket: &StatsTicket,
        result: Result<StatsSnapshot, BackendError>,
    ) -> bool {
        match result {
            Ok(snapshot) => {
                if self.applied_seq.is_some_and(|seq| seq > ticket.seq) {
                    log::debug!(
                        "Stats sync: ignoring response #{} older than applied #{}",
                        ticket.seq,
                        self.applied_seq.unwrap_or_default()
                    );
                    return false;
                }
                self.snapshot = snapshot;
                self.loaded = true;
                self.applied_seq = Some(ticket.seq);
                self.last_error = None;
                true
            }
            Err(e) => {
                log::warn!("Stats sync: fetch #{} failed, keeping previous snapshot: {}", ticket.seq, e);
                self.last_error = Some(e.to_string());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(total: u64) -> StatsSnapshot {
        StatsSnapshot {
            total_enrolments: total,
            growth_rate: "+12.5%".into(),
            high_priority_regions: 3,
            predicted_enrolments: total / 10,
        }
    }

    #[test]
    fn test_initial_observe_issues_request() {
        let mut sync = StatsSync::new();
        let ticket = sync.observe(&FilterSelection::default()).unwrap();
        assert_eq!(ticket.seq, 1);
        assert_eq!(ticket.query.state, "All States");
        assert_eq!(ticket.query.year, "2025");
    }

    #[test]
    fn test_unchanged_tuple_does_not_refetch() {
        let mut sync = StatsSync::new();
        let mut sel = FilterSelection::default();
        assert!(sync.observe(&sel).is_some());

        // Month is not part of the stats tuple.
        sel.month = "March".into();
        assert!(sync.observe(&sel).is_none());

        sel.year = "2024".into();
        assert!(sync.observe(&sel).is_some());
    }

    #[test]
    fn test_failure_keeps_previous_snapshot() {
        let mut sync = StatsSync::new();
        let first = sync.observe(&FilterSelection::default()).unwrap();
        assert!(sync.apply(&first, Ok(snapshot(125_000))));

        let sel = FilterSelection {
            state: "Goa".into(),
            ..FilterSelection::default()
        };
        let second = sync.observe(&sel).unwrap();
        assert!(!sync.apply(&second, Err(BackendError::Timeout(10))));

        assert_eq!(sync.snapshot().total_enrolments, 125_000);
        assert!(sync.is_loaded());
        assert!(sync.last_error().is_some());
    }

    #[test]
    fn test_failure_before_first_success_keeps_placeholder() {
        let mut sync = StatsSync::new();
        let ticket = sync.observe(&FilterSelection::default()).unwrap();
        sync.apply(&ticket, Err(BackendError::Unreachable("refused".into())));
        assert!(!sync.is_loaded());
        assert_eq!(sync.snapshot(), &StatsSnapshot::default());
    }

    #[test]
    fn test_late_older_response_does_not_overwrite_newer() {
        let mut sync = StatsSync::new();
        let older = sync.observe(&FilterSelection::default()).unwrap();
        let sel = FilterSelection {
            state: "Goa".into(),
            ..FilterSelection::default()
        };
        let newer = sync.observe(&sel).unwrap();

        assert!(sync.apply(&newer, Ok(snapshot(900))));
        assert!(!sync.apply(&older, Ok(snapshot(125_000))));
        assert_eq!(sync.snapshot().total_enrolments, 900);
    }

    #[test]
    fn test_success_clears_last_error() {
        let mut sync = StatsSync::new();
        let a = sync.observe(&FilterSelection::default()).unwrap();
        sync.apply(&a, Err(BackendError::Timeout(10)));
        assert!(sync.last_error().is_some());

        let sel = FilterSelection::with_year("2023");
        let b = sync.observe(&sel).unwrap();
        sync.apply(&b, Ok(snapshot(5)));
        assert!(sync.last_error().is_none());
    }
}
