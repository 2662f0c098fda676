//! Core data model shared by the cascade, stats sync, insight fetcher and view.

use serde::{Deserialize, Serialize};

pub const ALL_STATES: &str = "All States";
pub const ALL_DISTRICTS: &str = "All Districts";
pub const ALL_PINCODES: &str = "All Pincodes";
pub const ALL_MONTHS: &str = "All Months";
pub const ALL_AGE_GROUPS: &str = "All Age Groups";
pub const ALL_TYPES: &str = "All Types";

pub const DEFAULT_YEAR: &str = "2025";

/// Year options offered by the year selector, newest first.
pub const YEAR_OPTIONS: &[&str] = &["2025", "2024", "2023"];

/// Returns true when `value` is `sentinel`, the "unconstrained" token of its
/// dimension, or empty (which the backend treats the same way). Only the
/// dimension's own token counts, so a real name starting with "All " is
/// still a constraint.
pub fn is_sentinel_for(sentinel: &str, value: &str) -> bool {
    value.is_empty() || value == sentinel
}

/// The user's filter tuple. Lives for the session only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSelection {
    pub year: String,
    pub month: String,
    pub state: String,
    pub district: String,
    pub pincode: String,
    pub age_group: String,
    pub enrolment_type: String,
}

impl FilterSelection {
    pub fn with_year(year: &str) -> Self {
        Self {
            year: year.to_string(),
            ..Self::default()
        }
    }

    pub fn has_state(&self) -> bool {
        !is_sentinel_for(ALL_STATES, &self.state)
    }

    pub fn has_district(&self) -> bool {
        !is_sentinel_for(ALL_DISTRICTS, &self.district)
    }

    pub fn has_pincode(&self) -> bool {
        !is_sentinel_for(ALL_PINCODES, &self.pincode)
    }

    /// Non-sentinel geographic filters, coarse to fine, for the
    /// "Active Filters" chip row.
    pub fn active_chips(&self) -> Vec<String> {
        [
            (ALL_STATES, &self.state),
            (ALL_DISTRICTS, &self.district),
            (ALL_PINCODES, &self.pincode),
        ]
        .into_iter()
        .filter(|(sentinel, v)| !is_sentinel_for(sentinel, v))
        .map(|(_, v)| v.clone())
        .collect()
    }

    /// The subset of the selection that drives the stats endpoint.
    pub fn stats_query(&self) -> StatsQuery {
        StatsQuery {
            state: self.state.clone(),
            district: self.district.clone(),
            pincode: self.pincode.clone(),
            year: self.year.clone(),
        }
    }
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self {
            year: DEFAULT_YEAR.to_string(),
            month: ALL_MONTHS.to_string(),
            state: ALL_STATES.to_string(),
            district: ALL_DISTRICTS.to_string(),
            pincode: ALL_PINCODES.to_string(),
            age_group: ALL_AGE_GROUPS.to_string(),
            enrolment_type: ALL_TYPES.to_string(),
        }
    }
}

/// Option lists for the three cascading dropdowns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionLists {
    pub states: Vec<String>,
    pub districts: Vec<String>,
    pub pincodes: Vec<String>,
}

/// Parameters of a `/dashboard-stats` request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatsQuery {
    pub state: String,
    pub district: String,
    pub pincode: String,
    pub year: String,
}

/// Aggregate metrics for the current filter tuple.
///
/// Field names match the backend payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    #[serde(default)]
    pub total_enrolments: u64,
    #[serde(default = "default_growth_rate")]
    pub growth_rate: String,
    #[serde(default)]
    pub high_priority_regions: u64,
    #[serde(default)]
    pub predicted_enrolments: u64,
}

fn default_growth_rate() -> String {
    "0%".to_string()
}

impl Default for StatsSnapshot {
    fn default() -> Self {
        Self {
            total_enrolments: 0,
            growth_rate: default_growth_rate(),
            high_priority_regions: 0,
            predicted_enrolments: 0,
        }
    }
}

/// Resource recommendation for one pincode, as returned by
/// `/predict-resource-needs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default)]
    pub pincode: Option<String>,
    pub priority: String,
    #[serde(default)]
    pub predicted_workload_hours: f64,
    #[serde(default)]
    pub required_counters: f64,
    // The backend omits this key for pincodes without history and reports
    // `status` instead.
    #[serde(default, alias = "status")]
    pub anomaly_status: String,
    #[serde(default)]
    pub ai_insights: Vec<String>,
}

impl Recommendation {
    pub fn is_critical(&self) -> bool {
        self.priority.eq_ignore_ascii_case("critical")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_selection_is_unconstrained() {
        let sel = FilterSelection::default();
        assert!(!sel.has_state());
        assert!(!sel.has_district());
        assert!(!sel.has_pincode());
        assert_eq!(sel.year, "2025");
        assert!(sel.active_chips().is_empty());
    }

    #[test]
    fn test_sentinel_detection() {
        assert!(is_sentinel_for(ALL_STATES, ALL_STATES));
        assert!(is_sentinel_for(ALL_PINCODES, ALL_PINCODES));
        assert!(is_sentinel_for(ALL_DISTRICTS, ""));
        assert!(!is_sentinel_for(ALL_STATES, "Maharashtra"));
        assert!(!is_sentinel_for(ALL_PINCODES, "411001"));
    }

    #[test]
    fn test_sentinel_is_per_dimension() {
        // A real place name that happens to start with "All ".
        assert!(!is_sentinel_for(ALL_DISTRICTS, "All Saints"));
        assert!(!is_sentinel_for(ALL_DISTRICTS, ALL_STATES));

        let sel = FilterSelection {
            state: "Kerala".into(),
            district: "All Saints".into(),
            ..FilterSelection::default()
        };
        assert!(sel.has_district());
        assert_eq!(sel.active_chips(), vec!["Kerala", "All Saints"]);
    }

    #[test]
    fn test_active_chips_in_hierarchy_order() {
        let sel = FilterSelection {
            state: "Maharashtra".into(),
            district: "Pune".into(),
            ..FilterSelection::default()
        };
        assert_eq!(sel.active_chips(), vec!["Maharashtra", "Pune"]);
    }

    #[test]
    fn test_recommendation_parses_no_data_payload() {
        let json = r#"{
            "pincode": "999999",
            "status": "No Data",
            "priority": "Low",
            "predicted_workload_hours": 0,
            "required_counters": 0,
            "ai_insights": ["Data unavailable for this pincode."]
        }"#;
        let rec: Recommendation = serde_json::from_str(json).unwrap();
        assert_eq!(rec.anomaly_status, "No Data");
        assert_eq!(rec.ai_insights.len(), 1);
        assert!(!rec.is_critical());
    }

    #[test]
    fn test_stats_snapshot_parses_backend_payload() {
        let json = r#"{
            "total_enrolments": 125000,
            "growth_rate": "+12.5%",
            "high_priority_regions": 42,
            "predicted_enrolments": 18750
        }"#;
        let stats: StatsSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(stats.total_enrolments, 125_000);
        assert_eq!(stats.growth_rate, "+12.5%");
        assert_eq!(stats.high_priority_regions, 42);
    }
}
