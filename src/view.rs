//! Read-only snapshot of everything the dashboard shows, composed from a
//! session. Serializable for the `json` command; `render_text` is the
//! terminal rendering.

use std::fmt::Write as _;

use serde::Serialize;

use crate::error::PanelError;
use crate::geo::{self, Coordinate, Viewport};
use crate::insight::InsightState;
use crate::presets::{self, InsightCard, PriorityBand, TrendPoint, TrendView};
use crate::session::DashboardSession;
use crate::types::{FilterSelection, OptionLists, Recommendation, StatsSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricCard {
    pub title: String,
    pub value: String,
    pub subtitle: String,
}

/// What the recommendation panel shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RecommendationPanel {
    /// No pincode selected.
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
        error: PanelError,
    },
}

impl From<&InsightState> for RecommendationPanel {
    fn from(state: &InsightState) -> Self {
        match state {
            InsightState::Idle => RecommendationPanel::Idle,
            InsightState::Loading { pincode } => RecommendationPanel::Loading {
                pincode: pincode.clone(),
            },
            InsightState::Ready {
                pincode,
                recommendation,
            } => RecommendationPanel::Ready {
                pincode: pincode.clone(),
                recommendation: recommendation.clone(),
            },
            InsightState::Failed { pincode, error } => RecommendationPanel::Failed {
                pincode: pincode.clone(),
                error: PanelError::from(error),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub filters: FilterSelection,
    pub active_chips: Vec<String>,
    pub options: OptionLists,
    pub metrics: Vec<MetricCard>,
    pub stats_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats_error: Option<String>,
    pub viewing_label: String,
    pub viewport: Viewport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Coordinate>,
    pub recommendation: RecommendationPanel,
    pub trend_view: TrendView,
    pub trend: Vec<TrendPoint>,
    pub insights: Vec<InsightCard>,
}

impl DashboardView {
    pub fn compose(session: &DashboardSession) -> Self {
        let filters = session.selection().clone();
        let trend_view = session.trend_view();
        Self {
            active_chips: filters.active_chips(),
            options: session.option_lists().clone(),
            metrics: metric_cards(session.stats().snapshot(), &filters.year),
            stats_loaded: session.stats().is_loaded(),
            stats_error: session.stats().last_error().map(str::to_string),
            viewing_label: geo::viewing_label(&filters.state).to_string(),
            viewport: geo::viewport_for(&filters.state),
            marker: geo::pin_marker(&filters.state, &filters.pincode),
            recommendation: RecommendationPanel::from(session.insight().state()),
            trend_view,
            trend: presets::trend_series(trend_view).to_vec(),
            insights: presets::insight_cards().to_vec(),
            filters,
        }
    }
}

pub fn metric_cards(snapshot: &StatsSnapshot, year: &str) -> Vec<MetricCard> {
    vec![
        MetricCard {
            title: "Total Enrolments".into(),
            value: format_thousands(snapshot.total_enrolments),
            subtitle: format!("Selected Period ({year})"),
        },
        MetricCard {
            title: "Growth Rate".into(),
            value: snapshot.growth_rate.clone(),
            subtitle: "Year-over-Year".into(),
        },
        MetricCard {
            title: "High-Priority Regions".into(),
            value: snapshot.high_priority_regions.to_string(),
            subtitle: "Filtered Locations".into(),
        },
        MetricCard {
            title: "Predicted Demand".into(),
            value: format_thousands(snapshot.predicted_enrolments),
            subtitle: "Next Quarter Forecast".into(),
        },
    ]
}

/// `1250000` -> `"1,250,000"`
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn band_label(band: Option<PriorityBand>) -> &'static str {
    match band {
        Some(PriorityBand::High) => "high",
        Some(PriorityBand::Medium) => "medium",
        Some(PriorityBand::Low) => "low",
        None => "-",
    }
}

/// Plain-text rendering for the terminal.
pub fn render_text(view: &DashboardView) -> String {
    let mut out = String::new();
    let f = &view.filters;

    let _ = writeln!(
        out,
        "Filters: {} / {} / {} | {} {} | {} | {}",
        f.state, f.district, f.pincode, f.year, f.month, f.age_group, f.enrolment_type
    );
    if view.active_chips.is_empty() {
        let _ = writeln!(out, "Active filters: none");
    } else {
        let _ = writeln!(out, "Active filters: {}", view.active_chips.join(" > "));
    }
    let _ = writeln!(
        out,
        "Options: {} states, {} districts, {} pincodes",
        view.options.states.len(),
        view.options.districts.len(),
        view.options.pincodes.len()
    );

    out.push('\n');
    for card in &view.metrics {
        let _ = writeln!(out, "  {:<22} {:>14}  {}", card.title, card.value, card.subtitle);
    }
    if let Some(err) = &view.stats_error {
        let _ = writeln!(out, "  (stats refresh failed: {err})");
    }

    out.push('\n');
    let _ = writeln!(
        out,
        "Viewing region: {} (center {:.4}, {:.4}, zoom {})",
        view.viewing_label, view.viewport.center.lng, view.viewport.center.lat, view.viewport.zoom
    );
    if let Some(pin) = view.marker {
        let _ = writeln!(out, "Marker: {:.4}, {:.4}", pin.lng, pin.lat);
    }

    out.push('\n');
    match &view.recommendation {
        RecommendationPanel::Idle => {
            let _ = writeln!(out, "Recommendation: select a pincode");
        }
        RecommendationPanel::Loading { pincode } => {
            let _ = writeln!(out, "Recommendation for {pincode}: loading...");
        }
        RecommendationPanel::Ready {
            pincode,
            recommendation,
        } => {
            let _ = writeln!(out, "Recommendation for {pincode}:");
            let _ = writeln!(out, "  Priority:        {}", recommendation.priority);
            let _ = writeln!(
                out,
                "  Workload:        {:.1} h",
                recommendation.predicted_workload_hours
            );
            let _ = writeln!(out, "  Counters:        {}", recommendation.required_counters);
            if !recommendation.anomaly_status.is_empty() {
                let _ = writeln!(out, "  Status:          {}", recommendation.anomaly_status);
            }
            for line in &recommendation.ai_insights {
                let _ = writeln!(out, "  - {line}");
            }
        }
        RecommendationPanel::Failed { pincode, error } => {
            let _ = writeln!(out, "Recommendation for {pincode} failed: {}", error.message);
            let _ = writeln!(out, "  {}", error.recovery_suggestion);
        }
    }

    out.push('\n');
    let label = match view.trend_view {
        TrendView::Monthly => "monthly",
        TrendView::Quarterly => "quarterly",
    };
    let _ = writeln!(out, "Enrolment trend ({label}):");
    for point in &view.trend {
        match (point.historical, point.predicted) {
            (Some(v), _) => {
                let _ = writeln!(out, "  {:<8} {:>10}", point.label, format_thousands(v));
            }
            (None, Some(v)) => {
                let _ = writeln!(out, "  {:<8} {:>10} (forecast)", point.label, format_thousands(v));
            }
            (None, None) => {}
        }
    }

    out.push('\n');
    let _ = writeln!(out, "Insights:");
    for card in &view.insights {
        let _ = writeln!(out, "  [{}] {}", band_label(card.priority_band()), card.text);
    }
    out
}
