//! Simulator outputs: the per-day growth curve and the headline summary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One point on the total-return growth curve.
///
/// `total_value` is the share count after the day's reinvestment (if any)
/// multiplied by that day's close. `shares_held` and `reinvested_shares` are
/// trace data carried for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioPoint {
    pub date: NaiveDate,
    pub total_value: f64,
    pub shares_held: f64,
    /// Shares bought with that day's dividend cash (0.0 on non-dividend days).
    pub reinvested_shares: f64,
}

/// Headline statistics derived once from the finished growth curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub initial_investment: f64,
    pub final_value: f64,
    pub absolute_gain: f64,
    /// Percent, not fraction: 22.18 means +22.18%.
    pub percent_return: f64,
}

impl SummaryMetrics {
    pub fn from_final_value(initial_investment: f64, final_value: f64) -> Self {
        Self {
            initial_investment,
            final_value,
            absolute_gain: final_value - initial_investment,
            percent_return: (final_value / initial_investment - 1.0) * 100.0,
        }
    }

    pub fn is_gain(&self) -> bool {
        self.absolute_gain > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_formulas() {
        let s = SummaryMetrics::from_final_value(1000.0, 1250.0);
        assert_eq!(s.final_value, 1250.0);
        assert_eq!(s.absolute_gain, 250.0);
        assert!((s.percent_return - 25.0).abs() < 1e-12);
        assert!(s.is_gain());
    }

    #[test]
    fn summary_reports_losses() {
        let s = SummaryMetrics::from_final_value(1000.0, 800.0);
        assert_eq!(s.absolute_gain, -200.0);
        assert!((s.percent_return + 20.0).abs() < 1e-12);
        assert!(!s.is_gain());
    }
}
