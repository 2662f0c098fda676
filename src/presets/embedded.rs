use std::sync::OnceLock;

use super::schema::{InsightCard, TrendPoint, TrendSeries, TrendView};

const TRENDS_PRESET: &str = include_str!("../../presets/trends.json");
const INSIGHTS_PRESET: &str = include_str!("../../presets/insights.json");

fn trends() -> &'static TrendSeries {
    static TRENDS: OnceLock<TrendSeries> = OnceLock::new();
    TRENDS.get_or_init(|| {
        serde_json::from_str(TRENDS_PRESET).unwrap_or_else(|e| {
            log::warn!("Embedded trend preset is invalid: {}", e);
            TrendSeries::default()
        })
    })
}

/// Trend series for the chart, by granularity.
pub fn trend_series(view: TrendView) -> &'static [TrendPoint] {
    match view {
        TrendView::Monthly => &trends().monthly,
        TrendView::Quarterly => &trends().quarterly,
    }
}

/// Canned insight cards in display order.
pub fn insight_cards() -> &'static [InsightCard] {
    static CARDS: OnceLock<Vec<InsightCard>> = OnceLock::new();
    CARDS.get_or_init(|| {
        serde_json::from_str(INSIGHTS_PRESET).unwrap_or_else(|e| {
            log::warn!("Embedded insight preset is invalid: {}", e);
            Vec::new()
        })
    })
}
