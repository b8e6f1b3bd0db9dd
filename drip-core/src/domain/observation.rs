//! Observation: one trading day of price and dividend data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Closing price and dividend-per-share for a single symbol on a single day.
///
/// Produced by the time-series adapter (`data::normalize`), which guarantees
/// that a `Vec<Observation>` is non-empty and strictly ordered by date. The
/// close is *not* checked for positivity there; the simulator rejects
/// non-positive closes only where it has to divide by them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub close: f64,
    pub dividend_per_share: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, close: f64, dividend_per_share: f64) -> Self {
        Self {
            date,
            close,
            dividend_per_share,
        }
    }

    /// True if a distribution was paid on this day.
    pub fn pays_dividend(&self) -> bool {
        self.dividend_per_share > 0.0
    }

    /// Dividend yield of this day's distribution relative to the close.
    ///
    /// Returns 0.0 on non-dividend days and on non-positive closes.
    pub fn dividend_yield(&self) -> f64 {
        if !self.pays_dividend() || self.close <= 0.0 {
            return 0.0;
        }
        self.dividend_per_share / self.close
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn zero_dividend_is_not_a_payment() {
        let obs = Observation::new(day(1), 100.0, 0.0);
        assert!(!obs.pays_dividend());
        assert_eq!(obs.dividend_yield(), 0.0);
    }

    #[test]
    fn dividend_yield_uses_same_day_close() {
        let obs = Observation::new(day(4), 110.0, 2.2);
        assert!(obs.pays_dividend());
        assert!((obs.dividend_yield() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn dividend_yield_guards_zero_close() {
        let obs = Observation::new(day(5), 0.0, 1.0);
        assert_eq!(obs.dividend_yield(), 0.0);
    }

    #[test]
    fn observation_serialization_roundtrip() {
        let obs = Observation::new(day(6), 101.25, 0.24);
        let json = serde_json::to_string(&obs).unwrap();
        let deser: Observation = serde_json::from_str(&json).unwrap();
        assert_eq!(obs, deser);
    }
}
