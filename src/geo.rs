//! Static map geometry: per-state centers and zoom levels, plus the
//! approximate pin position used for a selected pincode.

use serde::Serialize;

use crate::types::{is_sentinel_for, ALL_DISTRICTS, ALL_PINCODES, ALL_STATES};

/// National view: center of India at zoom 1.
pub const INDIA_CENTER: Coordinate = Coordinate {
    lng: 78.9629,
    lat: 22.5937,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub lng: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub center: Coordinate,
    pub zoom: f64,
}

impl Viewport {
    pub const NATIONAL: Viewport = Viewport {
        center: INDIA_CENTER,
        zoom: 1.0,
    };
}

/// (state, lng, lat, zoom)
const STATE_CENTERS: &[(&str, f64, f64, f64)] = &[
    ("Andhra Pradesh", 79.74, 15.91, 4.0),
    ("Arunachal Pradesh", 94.72, 28.21, 5.0),
    ("Assam", 92.93, 26.20, 5.0),
    ("Bihar", 85.31, 25.09, 5.0),
    ("Chhattisgarh", 81.86, 21.27, 5.0),
    ("Delhi", 77.10, 28.70, 10.0),
    ("Goa", 74.12, 15.29, 8.0),
    ("Gujarat", 71.19, 22.25, 5.0),
    ("Haryana", 76.08, 29.05, 6.0),
    ("Himachal Pradesh", 77.17, 31.10, 6.0),
    ("Jammu and Kashmir", 76.57, 33.77, 5.0),
    ("Jharkhand", 85.32, 23.61, 5.0),
    ("Karnataka", 75.71, 15.31, 5.0),
    ("Kerala", 76.27, 10.85, 6.0),
    ("Madhya Pradesh", 78.65, 22.97, 5.0),
    ("Maharashtra", 75.71, 19.75, 5.0),
    ("Manipur", 93.90, 24.66, 6.0),
    ("Meghalaya", 91.36, 25.46, 6.0),
    ("Mizoram", 92.93, 23.16, 6.0),
    ("Nagaland", 94.56, 26.15, 6.0),
    ("Odisha", 85.09, 20.95, 5.0),
    ("Punjab", 75.34, 31.14, 6.0),
    ("Rajasthan", 74.21, 27.02, 5.0),
    ("Sikkim", 88.51, 27.53, 7.0),
    ("Tamil Nadu", 78.65, 11.12, 5.0),
    ("Telangana", 79.01, 18.11, 5.0),
    ("Tripura", 91.98, 23.94, 7.0),
    ("Uttar Pradesh", 80.94, 26.84, 5.0),
    ("Uttarakhand", 79.01, 30.06, 6.0),
    ("West Bengal", 87.85, 22.98, 5.0),
];

/// Look up a state's map viewport.
pub fn state_viewport(state: &str) -> Option<Viewport> {
    STATE_CENTERS
        .iter()
        .find(|(name, ..)| *name == state)
        .map(|&(_, lng, lat, zoom)| Viewport {
            center: Coordinate { lng, lat },
            zoom,
        })
}

/// Viewport for the current state selection; national view for the
/// sentinel or an unknown state.
pub fn viewport_for(state: &str) -> Viewport {
    if is_sentinel_for(ALL_STATES, state) {
        return Viewport::NATIONAL;
    }
    state_viewport(state).unwrap_or(Viewport::NATIONAL)
}

/// Approximate marker position for a pincode, offset from its state's
/// center by a deterministic function of the pincode digits. Not a geocode.
pub fn pin_marker(state: &str, pincode: &str) -> Option<Coordinate> {
    if is_sentinel_for(ALL_STATES, state) || is_sentinel_for(ALL_PINCODES, pincode) {
        return None;
    }
    let base = state_viewport(state)?.center;

    let digits: String = pincode.chars().filter(|c| c.is_ascii_digit()).collect();
    let n = digits.parse::<u64>().unwrap_or(0) as f64;

    let lat_offset = (n % 50.0) * 0.02 - 0.5;
    let lng_offset = ((n / 50.0) % 50.0) * 0.02 - 0.5;
    Some(Coordinate {
        lng: base.lng + lng_offset,
        lat: base.lat + lat_offset,
    })
}

/// How a boundary region is shaded given the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RegionShade {
    /// No state selected; every region looks the same.
    Neutral,
    /// Outside the selected state.
    Dimmed,
    StateSelected,
    DistrictSelected,
}

pub fn region_shade(
    selected_state: &str,
    selected_district: &str,
    region_state: &str,
    region_district: &str,
) -> RegionShade {
    if is_sentinel_for(ALL_STATES, selected_state) {
        return RegionShade::Neutral;
    }
    if region_state != selected_state {
        return RegionShade::Dimmed;
    }
    if !is_sentinel_for(ALL_DISTRICTS, selected_district) && region_district == selected_district {
        RegionShade::DistrictSelected
    } else {
        RegionShade::StateSelected
    }
}

/// Caption for the map's "Viewing Region" label.
pub fn viewing_label(state: &str) -> &str {
    if is_sentinel_for(ALL_STATES, state) {
        "Entire India"
    } else {
        state
    }
}
