//! Enrolment analytics dashboard core: the State → District → Pincode filter
//! cascade, the aggregate stats synchronizer, the per-pincode recommendation
//! fetcher, and the HTTP client for the analytics backend.

pub mod backend;
pub mod console;
pub mod error;
pub mod filters;
pub mod geo;
pub mod insight;
pub mod latency;
pub mod presets;
pub mod session;
pub mod state;
pub mod stats;
pub mod types;
pub mod view;

pub use backend::{BackendClient, DashboardBackend};
pub use error::{BackendError, InsightError, PanelError};
pub use session::{DashboardSession, SessionOptions, UserEvent};
pub use state::DashboardConfig;
pub use view::DashboardView;
