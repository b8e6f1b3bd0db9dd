//! Domain types for drip

pub mod observation;
pub mod portfolio;

pub use observation::Observation;
pub use portfolio::{PortfolioPoint, SummaryMetrics};
