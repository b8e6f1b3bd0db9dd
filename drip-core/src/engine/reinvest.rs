//! The reinvestment simulation: a single pass over the observations.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{SimulationError, SimulationState};
use crate::domain::{Observation, PortfolioPoint, SummaryMetrics};

/// Growth curve plus headline metrics for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// One point per observation, same order.
    pub points: Vec<PortfolioPoint>,
    pub summary: SummaryMetrics,
}

impl SimulationResult {
    pub fn final_shares(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.shares_held)
    }

    pub fn reinvestment_count(&self) -> usize {
        self.points.iter().filter(|p| p.reinvested_shares > 0.0).count()
    }
}

/// Simulate buying `initial_investment` worth of shares at the first close
/// and reinvesting every dividend at its payment day's close.
///
/// `observations` must come from the adapter: non-empty and strictly ordered
/// by date. Either the full curve is returned or an error; never a prefix.
pub fn simulate(
    observations: &[Observation],
    initial_investment: f64,
) -> Result<SimulationResult, SimulationError> {
    if !(initial_investment.is_finite() && initial_investment > 0.0) {
        return Err(SimulationError::InvalidInvestment(initial_investment));
    }
    let first = observations.first().ok_or(SimulationError::EmptyHistory)?;

    let mut state = SimulationState::open(initial_investment, first)?;
    let mut points = Vec::with_capacity(observations.len());
    for obs in observations {
        let point = state.step(obs)?;
        if point.reinvested_shares > 0.0 {
            trace!(
                date = %point.date,
                dividend = obs.dividend_per_share,
                close = obs.close,
                extra_shares = point.reinvested_shares,
                shares = point.shares_held,
                "reinvested dividend"
            );
        }
        points.push(point);
    }

    // Non-empty input always yields at least one point.
    let final_value = points.last().map_or(initial_investment, |p| p.total_value);
    let summary = SummaryMetrics::from_final_value(initial_investment, final_value);
    debug!(
        days = points.len(),
        final_shares = state.shares_held(),
        final_value,
        percent_return = summary.percent_return,
        "simulation complete"
    );

    Ok(SimulationResult { points, summary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn obs(d: u32, close: f64, div: f64) -> Observation {
        Observation::new(NaiveDate::from_ymd_opt(2024, 6, d).unwrap(), close, div)
    }

    #[test]
    fn three_day_reference_scenario() {
        let series = [obs(3, 100.0, 0.0), obs(4, 110.0, 2.0), obs(5, 120.0, 0.0)];
        let result = simulate(&series, 1000.0).unwrap();

        let values: Vec<f64> = result.points.iter().map(|p| p.total_value).collect();
        assert!((values[0] - 1000.0).abs() < 1e-9);
        assert!((values[1] - 1120.0).abs() < 1e-9);
        assert!((values[2] - 1221.818_181_818).abs() < 1e-6);

        assert!((result.summary.final_value - 1221.818_181_818).abs() < 1e-6);
        assert!((result.summary.absolute_gain - 221.818_181_818).abs() < 1e-6);
        assert!((result.summary.percent_return - 22.181_818_18).abs() < 1e-6);
        assert_eq!(result.reinvestment_count(), 1);
    }

    #[test]
    fn first_day_dividend_is_reinvested() {
        let result = simulate(&[obs(3, 50.0, 1.0)], 1000.0).unwrap();
        // 20 shares + 20*1/50 = 20.4 shares
        assert!((result.final_shares() - 20.4).abs() < 1e-12);
        assert!((result.summary.final_value - 1020.0).abs() < 1e-9);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(simulate(&[], 1000.0), Err(SimulationError::EmptyHistory));
    }

    #[test]
    fn invalid_investment_is_rejected() {
        let series = [obs(3, 100.0, 0.0)];
        assert!(matches!(
            simulate(&series, 0.0),
            Err(SimulationError::InvalidInvestment(_))
        ));
        assert!(matches!(
            simulate(&series, -5.0),
            Err(SimulationError::InvalidInvestment(_))
        ));
        assert!(matches!(
            simulate(&series, f64::NAN),
            Err(SimulationError::InvalidInvestment(_))
        ));
    }

    #[test]
    fn zero_close_on_reinvestment_day_aborts_run() {
        let series = [obs(3, 100.0, 0.0), obs(4, 0.0, 1.0), obs(5, 100.0, 0.0)];
        let err = simulate(&series, 1000.0).unwrap_err();
        assert_eq!(
            err,
            SimulationError::NonPositivePrice {
                date: NaiveDate::from_ymd_opt(2024, 6, 4).unwrap(),
                close: 0.0
            }
        );
    }

    #[test]
    fn zero_close_without_dividend_is_valued_at_zero() {
        let series = [obs(3, 100.0, 0.0), obs(4, 0.0, 0.0), obs(5, 100.0, 0.0)];
        let result = simulate(&series, 1000.0).unwrap();
        assert_eq!(result.points[1].total_value, 0.0);
        assert_eq!(result.summary.final_value, 1000.0);
    }
}
