//! Extended metrics: pure functions over a finished simulation.
//!
//! The headline triple (final value, gain, percent return) lives in
//! `drip_core::SummaryMetrics`. Everything here is derived from the same
//! growth curve and never feeds back into it.

use chrono::NaiveDate;
use drip_core::{Observation, SimulationResult};
use serde::{Deserialize, Serialize};

const DAYS_PER_YEAR: f64 = 365.25;

/// Secondary statistics shown alongside the headline summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtendedMetrics {
    /// Compound annual growth rate as a fraction, calendar-day basis.
    pub cagr: f64,
    /// Most negative peak-to-trough move as a fraction (0.0 or below).
    pub max_drawdown: f64,
    pub reinvestment_count: usize,
    /// Total dividend cash converted into shares.
    pub dividend_cash_reinvested: f64,
    pub final_shares: f64,
    /// What the position would be worth without reinvesting anything.
    pub price_only_final_value: f64,
    pub price_only_percent_return: f64,
}

impl ExtendedMetrics {
    /// `observations` must be the series `result` was simulated from.
    pub fn compute(observations: &[Observation], result: &SimulationResult) -> Self {
        let initial = result.summary.initial_investment;
        let values: Vec<f64> = result.points.iter().map(|p| p.total_value).collect();
        let (first_date, last_date) = match (result.points.first(), result.points.last()) {
            (Some(f), Some(l)) => (f.date, l.date),
            _ => return Self::empty(initial),
        };
        let price_only = price_only_final_value(observations, initial);

        Self {
            cagr: cagr(initial, result.summary.final_value, first_date, last_date),
            max_drawdown: max_drawdown(&values),
            reinvestment_count: result.reinvestment_count(),
            dividend_cash_reinvested: dividend_cash_reinvested(observations, result),
            final_shares: result.final_shares(),
            price_only_final_value: price_only,
            price_only_percent_return: (price_only / initial - 1.0) * 100.0,
        }
    }

    fn empty(initial: f64) -> Self {
        Self {
            cagr: 0.0,
            max_drawdown: 0.0,
            reinvestment_count: 0,
            dividend_cash_reinvested: 0.0,
            final_shares: 0.0,
            price_only_final_value: initial,
            price_only_percent_return: 0.0,
        }
    }

    /// Percentage points contributed by reinvestment over price alone.
    pub fn reinvestment_uplift(&self, percent_return: f64) -> f64 {
        percent_return - self.price_only_percent_return
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Compound annual growth rate between two dated values.
///
/// Returns 0.0 for same-day spans and non-positive values.
pub fn cagr(initial: f64, final_value: f64, start: NaiveDate, end: NaiveDate) -> f64 {
    let days = (end - start).num_days();
    if days <= 0 || initial <= 0.0 || final_value <= 0.0 {
        return 0.0;
    }
    let years = days as f64 / DAYS_PER_YEAR;
    (final_value / initial).powf(1.0 / years) - 1.0
}

/// Maximum drawdown as a negative fraction (e.g., -0.25 for a 25% drawdown).
pub fn max_drawdown(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mut peak = values[0];
    let mut max_dd = 0.0_f64;

    for &v in values {
        if v > peak {
            peak = v;
        }
        if peak > 0.0 {
            let dd = (v - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Sum of the cash each dividend paid before it was converted to shares.
pub fn dividend_cash_reinvested(observations: &[Observation], result: &SimulationResult) -> f64 {
    observations
        .iter()
        .zip(&result.points)
        .map(|(obs, point)| point.reinvested_shares * obs.close)
        .sum()
}

/// Buy-and-hold value with dividends taken as nothing: `initial * last / first`.
pub fn price_only_final_value(observations: &[Observation], initial: f64) -> f64 {
    match (observations.first(), observations.last()) {
        (Some(first), Some(last)) if first.close > 0.0 => initial * last.close / first.close,
        _ => initial,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drip_core::simulate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── CAGR ──

    #[test]
    fn cagr_doubling_over_one_year() {
        let c = cagr(100.0, 200.0, date(2020, 1, 1), date(2021, 1, 1));
        // 366 days in 2020, so slightly under 100%
        assert!((c - (2.0_f64.powf(365.25 / 366.0) - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn cagr_same_day_is_zero() {
        assert_eq!(cagr(100.0, 150.0, date(2020, 1, 1), date(2020, 1, 1)), 0.0);
    }

    #[test]
    fn cagr_non_positive_final_is_zero() {
        assert_eq!(cagr(100.0, 0.0, date(2020, 1, 1), date(2022, 1, 1)), 0.0);
    }

    // ── Max drawdown ──

    #[test]
    fn max_drawdown_finds_worst_trough() {
        let dd = max_drawdown(&[100.0, 120.0, 90.0, 130.0, 117.0]);
        assert!((dd - (-0.25)).abs() < 1e-12);
    }

    #[test]
    fn max_drawdown_monotonic_rise_is_zero() {
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(max_drawdown(&[5.0]), 0.0);
    }

    // ── Dividend accounting ──

    #[test]
    fn extended_metrics_for_reference_scenario() {
        let obs = vec![
            Observation::new(date(2024, 1, 2), 100.0, 0.0),
            Observation::new(date(2024, 1, 3), 110.0, 2.0),
            Observation::new(date(2024, 1, 4), 120.0, 0.0),
        ];
        let result = simulate(&obs, 1000.0).unwrap();
        let m = ExtendedMetrics::compute(&obs, &result);

        assert_eq!(m.reinvestment_count, 1);
        assert!((m.dividend_cash_reinvested - 20.0).abs() < 1e-9);
        assert!((m.final_shares - (10.0 + 20.0 / 110.0)).abs() < 1e-12);
        assert!((m.price_only_final_value - 1200.0).abs() < 1e-9);
        assert!((m.price_only_percent_return - 20.0).abs() < 1e-9);
        assert!(m.reinvestment_uplift(result.summary.percent_return) > 2.0);
        assert_eq!(m.max_drawdown, 0.0);
    }
}
