//! State → District → Pincode filter cascade.
//!
//! Every transition is a synchronous mutation that returns the option-list
//! fetch (if any) the caller must dispatch. Descendant selections and lists
//! are cleared before the fetch is returned, so a list belonging to the old
//! parent is never visible under the new one. Completions carry the parent
//! key they were issued for and are dropped if that key is no longer current.

use serde::Serialize;

use crate::error::BackendError;
use crate::types::{
    is_sentinel_for, FilterSelection, OptionLists, ALL_DISTRICTS, ALL_PINCODES, ALL_STATES,
};

/// An option-list request produced by a cascade transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "level", rename_all = "camelCase")]
pub enum OptionFetch {
    States,
    Districts { state: String },
    Pincodes { state: String, district: String },
}

/// Outcome of applying an option-list completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Failed,
    Stale,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCascade {
    selection: FilterSelection,
    options: OptionLists,
}

impl FilterCascade {
    pub fn new(year: &str) -> Self {
        Self {
            selection: FilterSelection::with_year(year),
            options: OptionLists::default(),
        }
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn options(&self) -> &OptionLists {
        &self.options
    }

    /// Request for the top-level list, issued at mount and after reset.
    pub fn load_states(&self) -> OptionFetch {
        OptionFetch::States
    }

    /// Select a state. Always resets district and pincode and clears both
    /// child lists, even when `new_state` equals the current state.
    pub fn on_state_change(&mut self, new_state: &str) -> Option<OptionFetch> {
        self.selection.state = new_state.to_string();
        self.selection.district = ALL_DISTRICTS.to_string();
        self.selection.pincode = ALL_PINCODES.to_string();
        self.options.districts.clear();
        self.options.pincodes.clear();

        if is_sentinel_for(ALL_STATES, new_state) {
            return None;
        }
        Some(OptionFetch::Districts {
            state: new_state.to_string(),
        })
    }

    /// Select a district. Resets pincode and clears the pincode list.
    /// Ignored while no state is selected.
    pub fn on_district_change(&mut self, new_district: &str) -> Option<OptionFetch> {
        if !self.selection.has_state() {
            log::warn!(
                "Filter cascade: ignoring district {:?} with no state selected",
                new_district
            );
            return None;
        }

        self.selection.district = new_district.to_string();
        self.selection.pincode = ALL_PINCODES.to_string();
        self.options.pincodes.clear();

        if is_sentinel_for(ALL_DISTRICTS, new_district) {
            return None;
        }
        Some(OptionFetch::Pincodes {
            state: self.selection.state.clone(),
            district: new_district.to_string(),
        })
    }

    /// Select a pincode. Leaf level: no cascade, no fetch. Ignored while no
    /// district is selected. Returns whether the selection was applied.
    pub fn on_pincode_change(&mut self, new_pincode: &str) -> bool {
        if !self.selection.has_district() {
            log::warn!(
                "Filter cascade: ignoring pincode {:?} with no district selected",
                new_pincode
            );
            return false;
        }
        self.selection.pincode = new_pincode.to_string();
        true
    }

    /// Restore state/district/pincode to sentinel and empty all option lists.
    pub fn reset(&mut self) {
        self.selection.state = ALL_STATES.to_string();
        self.selection.district = ALL_DISTRICTS.to_string();
        self.selection.pincode = ALL_PINCODES.to_string();
        self.options = OptionLists::default();
    }

    pub fn set_year(&mut self, year: &str) {
        self.selection.year = year.to_string();
    }

    pub fn set_month(&mut self, month: &str) {
        self.selection.month = month.to_string();
    }

    pub fn set_age_group(&mut self, age_group: &str) {
        self.selection.age_group = age_group.to_string();
    }

    pub fn set_enrolment_type(&mut self, enrolment_type: &str) {
        self.selection.enrolment_type = enrolment_type.to_string();
    }

    /// Whether a completion for `fetch` still belongs to the current parent.
    pub fn is_current(&self, fetch: &OptionFetch) -> bool {
        match fetch {
            OptionFetch::States => true,
            OptionFetch::Districts { state } => {
                self.selection.has_state() && self.selection.state == *state
            }
            OptionFetch::Pincodes { state, district } => {
                self.selection.has_district()
                    && self.selection.state == *state
                    && self.selection.district == *district
            }
        }
    }

    /// Apply an option-list completion. Stale completions are dropped;
    /// failures leave the affected list empty.
    pub fn apply_options(
        &mut self,
        fetch: &OptionFetch,
        result: Result<Vec<String>, BackendError>,
    ) -> ApplyOutcome {
        if !self.is_current(fetch) {
            log::debug!("Filter cascade: dropping stale {:?} completion", fetch);
            return ApplyOutcome::Stale;
        }

        let list = match fetch {
            OptionFetch::States => &mut self.options.states,
            OptionFetch::Districts { .. } => &mut self.options.districts,
            OptionFetch::Pincodes { .. } => &mut self.options.pincodes,
        };

        match result {
            Ok(values) => {
                *list = values;
                ApplyOutcome::Applied
            }
            Err(e) => {
                list.clear();
                log::warn!("Filter cascade: failed to fetch {:?}: {}", fetch, e);
                ApplyOutcome::Failed
            }
        }
    }
}
