//! Dashboard session: the single event loop that owns all filter, stats and
//! insight state.
//!
//! User events are applied synchronously. Each transition may emit backend
//! requests, which run as spawned tasks and report back through a channel.
//! Completions are applied one at a time by [`DashboardSession::next_completion`],
//! so every mutation happens on the loop that owns the session.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backend::DashboardBackend;
use crate::error::BackendError;
use crate::filters::{FilterCascade, OptionFetch};
use crate::insight::{InsightFetcher, InsightTicket};
use crate::presets::TrendView;
use crate::state::DashboardConfig;
use crate::stats::{StatsSync, StatsTicket};
use crate::types::{FilterSelection, OptionLists, Recommendation, StatsSnapshot};

/// An interaction from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserEvent {
    SelectState(String),
    SelectDistrict(String),
    SelectPincode(String),
    SetYear(String),
    SetMonth(String),
    SetAgeGroup(String),
    SetEnrolmentType(String),
    SetTrendView(TrendView),
    Reset,
}

#[derive(Debug)]
enum Completion {
    Options {
        fetch: OptionFetch,
        result: Result<Vec<String>, BackendError>,
    },
    Stats {
        ticket: StatsTicket,
        result: Result<StatsSnapshot, BackendError>,
    },
    Insight {
        ticket: InsightTicket,
        result: Result<Recommendation, BackendError>,
    },
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub default_year: String,
    pub insight_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&DashboardConfig::default())
    }
}

impl From<&DashboardConfig> for SessionOptions {
    fn from(config: &DashboardConfig) -> Self {
        Self {
            default_year: config.default_year.clone(),
            insight_timeout: Duration::from_secs(config.insight_timeout_secs),
        }
    }
}

pub struct DashboardSession {
    backend: Arc<dyn DashboardBackend>,
    options: SessionOptions,
    cascade: FilterCascade,
    stats: StatsSync,
    insight: InsightFetcher,
    trend_view: TrendView,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    /// Option-list and stats requests not yet applied.
    in_flight: usize,
    insight_task: Option<JoinHandle<()>>,
}

impl DashboardSession {
    pub fn new(backend: Arc<dyn DashboardBackend>, options: SessionOptions) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            backend,
            cascade: FilterCascade::new(&options.default_year),
            options,
            stats: StatsSync::new(),
            insight: InsightFetcher::new(),
            trend_view: TrendView::default(),
            tx,
            rx,
            in_flight: 0,
            insight_task: None,
        }
    }

    /// Initial load: the state list and the all-India stats snapshot.
    /// Must be called from within a tokio runtime.
    pub fn mount(&mut self) {
        log::info!("Dashboard session: mounting");
        let fetch = self.cascade.load_states();
        self.spawn_options(fetch);
        self.sync_dependents();
    }

    pub fn selection(&self) -> &FilterSelection {
        self.cascade.selection()
    }

    pub fn option_lists(&self) -> &OptionLists {
        self.cascade.options()
    }

    pub fn stats(&self) -> &StatsSync {
        &self.stats
    }

    pub fn insight(&self) -> &InsightFetcher {
        &self.insight
    }

    pub fn trend_view(&self) -> TrendView {
        self.trend_view
    }

    /// True when no request this session cares about is outstanding.
    pub fn is_settled(&self) -> bool {
        self.in_flight == 0 && !self.insight.state().is_loading()
    }

    /// Apply a user event. Clears happen before any request is dispatched.
    pub fn dispatch(&mut self, event: UserEvent) {
        log::debug!("Dashboard session: {:?}", event);
        match event {
            UserEvent::SelectState(state) => {
                if let Some(fetch) = self.cascade.on_state_change(&state) {
                    self.spawn_options(fetch);
                }
            }
            UserEvent::SelectDistrict(district) => {
                if let Some(fetch) = self.cascade.on_district_change(&district) {
                    self.spawn_options(fetch);
                }
            }
            UserEvent::SelectPincode(pincode) => {
                self.cascade.on_pincode_change(&pincode);
            }
            UserEvent::SetYear(year) => self.cascade.set_year(&year),
            UserEvent::SetMonth(month) => self.cascade.set_month(&month),
            UserEvent::SetAgeGroup(age_group) => self.cascade.set_age_group(&age_group),
            UserEvent::SetEnrolmentType(kind) => self.cascade.set_enrolment_type(&kind),
            UserEvent::SetTrendView(view) => self.trend_view = view,
            UserEvent::Reset => {
                self.cascade.reset();
                // The state dropdown would otherwise stay empty after a reset.
                let fetch = self.cascade.load_states();
                self.spawn_options(fetch);
            }
        }
        self.sync_dependents();
    }

    /// Wait for and apply one completion. Returns false if nothing is pending.
    pub async fn next_completion(&mut self) -> bool {
        if self.is_settled() {
            return false;
        }
        let Some(completion) = self.rx.recv().await else {
            return false;
        };
        self.apply(completion);
        true
    }

    /// Apply completions until nothing is outstanding.
    pub async fn settle(&mut self) {
        while self.next_completion().await {}
    }

    /// Cancel the in-flight recommendation request and drop its slot.
    pub fn shutdown(&mut self) {
        self.abort_insight_task();
        self.insight.invalidate();
    }

    fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Options { fetch, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.cascade.apply_options(&fetch, result);
            }
            Completion::Stats { ticket, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.stats.apply(&ticket, result);
            }
            Completion::Insight { ticket, result } => {
                self.insight.resolve(&ticket, result);
            }
        }
    }

    /// Bring stats and insight in line with the current selection.
    fn sync_dependents(&mut self) {
        if let Some(ticket) = self.stats.observe(self.cascade.selection()) {
            self.spawn_stats(ticket);
        }

        let pincode = self.cascade.selection().pincode.clone();
        match self.insight.select(&pincode) {
            Some(ticket) => {
                self.abort_insight_task();
                self.spawn_insight(ticket);
            }
            None => {
                if !self.insight.state().is_loading() {
                    self.abort_insight_task();
                }
            }
        }
    }

    fn spawn_options(&mut self, fetch: OptionFetch) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = match &fetch {
                OptionFetch::States => backend.fetch_states().await,
                OptionFetch::Districts { state } => backend.fetch_districts(state).await,
                OptionFetch::Pincodes { district, .. } => backend.fetch_pincodes(district).await,
            };
            let _ = tx.send(Completion::Options { fetch, result });
        });
    }

    fn spawn_stats(&mut self, ticket: StatsTicket) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = backend.fetch_stats(&ticket.query).await;
            let _ = tx.send(Completion::Stats { ticket, result });
        });
    }

    fn spawn_insight(&mut self, ticket: InsightTicket) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        let timeout = self.options.insight_timeout;
        log::info!(
            "Insight fetcher: requesting recommendation for {} (gen {})",
            ticket.pincode,
            ticket.generation
        );
        self.insight_task = Some(tokio::spawn(async move {
            let result =
                match tokio::time::timeout(timeout, backend.fetch_recommendation(&ticket.pincode))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(BackendError::Timeout(timeout.as_secs())),
                };
            let _ = tx.send(Completion::Insight { ticket, result });
        }));
    }

    fn abort_insight_task(&mut self) {
        if let Some(handle) = self.insight_task.take() {
            handle.abort();
        }
    }
}

impl Drop for DashboardSession {
    fn drop(&mut self) {
        self.abort_insight_task();
    }
}
