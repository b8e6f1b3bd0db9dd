//! drip core: domain types, history adapter, data providers, reinvestment simulator.
//!
//! This crate contains the calculation itself:
//! - Domain types (observations, portfolio points, summary metrics)
//! - History providers (Yahoo Finance, CSV import, synthetic) behind `DataProvider`
//! - The time-series adapter that turns raw provider rows into observations
//! - The dividend reinvestment simulator
//!
//! Nothing here renders, rounds, or persists results; that is the caller's job.

pub mod data;
pub mod domain;
pub mod engine;

pub use data::{normalize, DataError, DataProvider, HistoryError, LookbackWindow, RawHistory};
pub use domain::{Observation, PortfolioPoint, SummaryMetrics};
pub use engine::{simulate, SimulationError, SimulationResult};
