//! Static chart and insight data embedded at build time.
//!
//! The JSON lives under `presets/` at the crate root and is parsed once on
//! first use.

pub mod embedded;
pub mod schema;

pub use embedded::{insight_cards, trend_series};
pub use schema::{InsightCard, InsightKind, PriorityBand, TrendPoint, TrendView};
