//! Reinvestment simulator.
//!
//! Consumes the adapter's observation series and folds it, one trading day at
//! a time, into a share count and a per-day portfolio value:
//!
//! 1. Buy `initial_investment / first.close` shares on the first day.
//! 2. On every day with a dividend, convert `shares * dividend` cash into
//!    shares at that day's close.
//! 3. Value the position at the close and emit a point.
//!
//! Same-day reinvestment (step 2 before step 3, at the same close) is the
//! intended policy and is relied on for output parity.

pub mod reinvest;
pub mod state;

use chrono::NaiveDate;
use thiserror::Error;

pub use reinvest::{simulate, SimulationResult};
pub use state::SimulationState;

/// Simulation failures. Any of these aborts the run with no partial output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("no observations to simulate")]
    EmptyHistory,

    #[error("initial investment must be a positive amount, got {0}")]
    InvalidInvestment(f64),

    /// Raised where shares would be bought at a zero or negative close
    /// (the first day, or any dividend day).
    #[error("non-positive close {close} on {date}; cannot buy shares at that price")]
    NonPositivePrice { date: NaiveDate, close: f64 },
}
