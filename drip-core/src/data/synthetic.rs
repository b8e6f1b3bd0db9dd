//! Synthetic history for offline demos and tests.
//!
//! Produces a weekday-only random walk from 100.0 with a quarterly dividend
//! (first trading day of Feb, May, Aug, Nov). The walk is seeded from the
//! symbol name plus an optional user seed, so the same request always yields
//! the same series. Results built on it are tagged `DataSource::Synthetic`.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

use super::provider::{
    DataError, DataProvider, DataSource, LookbackWindow, RawHistory, RawObservation,
};

const START_PRICE: f64 = 100.0;
const DIVIDEND_MONTHS: [u32; 4] = [2, 5, 8, 11];

pub struct SyntheticProvider {
    seed: u64,
    /// Per-payment dividend as a fraction of the close.
    quarterly_yield: f64,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            quarterly_yield: 0.005,
        }
    }

    pub fn with_quarterly_yield(mut self, quarterly_yield: f64) -> Self {
        self.quarterly_yield = quarterly_yield.max(0.0);
        self
    }

    fn rng_for(&self, symbol: &str) -> StdRng {
        let mut hasher = blake3::Hasher::new();
        hasher.update(symbol.as_bytes());
        hasher.update(&self.seed.to_le_bytes());
        StdRng::from_seed(*hasher.finalize().as_bytes())
    }

    pub fn generate(&self, symbol: &str, window: LookbackWindow) -> Vec<RawObservation> {
        let mut rng = self.rng_for(symbol);
        let mut rows = Vec::new();
        let mut price = START_PRICE;
        let mut paid_month: Option<(i32, u32)> = None;
        let mut current = window.start;

        while current <= window.end {
            if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                current += Duration::days(1);
                continue;
            }

            let daily_return: f64 = rng.gen_range(-0.02..0.021);
            price *= 1.0 + daily_return;

            let month = (current.year(), current.month());
            let dividend = if DIVIDEND_MONTHS.contains(&current.month())
                && paid_month != Some(month)
            {
                paid_month = Some(month);
                price * self.quarterly_yield
            } else {
                0.0
            };

            rows.push(RawObservation::new(current, price, dividend));
            current += Duration::days(1);
        }
        rows
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, symbol: &str, window: LookbackWindow) -> Result<RawHistory, DataError> {
        warn!(symbol, "generating synthetic data; results will be tagged as synthetic");
        Ok(RawHistory::new(
            symbol,
            self.generate(symbol, window),
            DataSource::Synthetic,
        ))
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> LookbackWindow {
        LookbackWindow::new(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn same_symbol_and_seed_is_deterministic() {
        let p = SyntheticProvider::new(7);
        assert_eq!(p.generate("SPY", window()), p.generate("SPY", window()));
    }

    #[test]
    fn different_symbols_diverge() {
        let p = SyntheticProvider::new(7);
        assert_ne!(p.generate("SPY", window()), p.generate("QQQ", window()));
    }

    #[test]
    fn skips_weekends_and_pays_four_dividends_a_year() {
        let rows = SyntheticProvider::new(1).generate("SPY", window());
        assert!(rows
            .iter()
            .all(|r| !matches!(r.date.unwrap().weekday(), Weekday::Sat | Weekday::Sun)));
        let payments = rows.iter().filter(|r| r.dividends.unwrap() > 0.0).count();
        assert_eq!(payments, 4);
        assert!(rows.iter().all(|r| r.close.unwrap() > 0.0));
    }

    #[test]
    fn fetch_tags_history_as_synthetic() {
        let history = SyntheticProvider::new(0).fetch("ABC", window()).unwrap();
        assert!(history.source.is_synthetic());
        assert_eq!(history.symbol, "ABC");
    }
}
