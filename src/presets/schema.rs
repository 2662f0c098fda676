use serde::{Deserialize, Serialize};

/// One point of a trend series. Historical and predicted halves of the
/// chart never overlap, so exactly one of the values is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub label: String,
    pub historical: Option<u64>,
    pub predicted: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSeries {
    pub monthly: Vec<TrendPoint>,
    pub quarterly: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrendView {
    #[default]
    Monthly,
    Quarterly,
}

impl TrendView {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "monthly" | "month" => Some(TrendView::Monthly),
            "quarterly" | "quarter" => Some(TrendView::Quarterly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InsightKind {
    Primary,
    Warning,
    Info,
}

/// A canned, region-level insight card shown alongside the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightCard {
    pub text: String,
    pub kind: InsightKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_score: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PriorityBand {
    High,
    Medium,
    Low,
}

impl InsightCard {
    pub fn priority_band(&self) -> Option<PriorityBand> {
        self.priority_score.map(|score| match score {
            80.. => PriorityBand::High,
            60..=79 => PriorityBand::Medium,
            _ => PriorityBand::Low,
        })
    }
}
