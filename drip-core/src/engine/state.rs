//! Running share count for one simulation.

use chrono::NaiveDate;

use super::SimulationError;
use crate::domain::{Observation, PortfolioPoint};

/// Fold accumulator for the reinvestment simulation.
///
/// Owned by exactly one run. `shares_held` only ever grows: there is no sell
/// or withdraw step, only dividend reinvestment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationState {
    shares_held: f64,
}

impl SimulationState {
    /// Buy the opening position: all of `initial_investment` at `first.close`.
    pub fn open(initial_investment: f64, first: &Observation) -> Result<Self, SimulationError> {
        let price = positive_price(first.date, first.close)?;
        Ok(Self {
            shares_held: initial_investment / price,
        })
    }

    pub fn shares_held(&self) -> f64 {
        self.shares_held
    }

    /// Advance one trading day and return that day's point.
    ///
    /// A dividend is converted to shares at the same day's close *before* the
    /// day is valued.
    pub fn step(&mut self, obs: &Observation) -> Result<PortfolioPoint, SimulationError> {
        let mut reinvested_shares = 0.0;
        if obs.pays_dividend() {
            let cash = self.shares_held * obs.dividend_per_share;
            reinvested_shares = cash / positive_price(obs.date, obs.close)?;
            self.shares_held += reinvested_shares;
        }
        Ok(PortfolioPoint {
            date: obs.date,
            total_value: self.shares_held * obs.close,
            shares_held: self.shares_held,
            reinvested_shares,
        })
    }
}

fn positive_price(date: NaiveDate, close: f64) -> Result<f64, SimulationError> {
    if close > 0.0 {
        Ok(close)
    } else {
        Err(SimulationError::NonPositivePrice { date, close })
    }
}
