//! Property tests for simulator invariants.
//!
//! Uses proptest to verify:
//! 1. Share count never decreases, and grows exactly on dividend days
//! 2. Without dividends, value is the initial investment scaled by price
//! 3. Summary metrics are consistent with the final point
//! 4. A zero close on a dividend day aborts the whole run

use chrono::NaiveDate;
use drip_core::engine::{simulate, SimulationError};
use drip_core::Observation;
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_close() -> impl Strategy<Value = f64> {
    (1.0..500.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_dividend() -> impl Strategy<Value = f64> {
    prop_oneof![
        3 => Just(0.0),
        1 => (0.01..5.0_f64).prop_map(|d| (d * 100.0).round() / 100.0),
    ]
}

fn arb_investment() -> impl Strategy<Value = f64> {
    1.0..1_000_000.0_f64
}

fn arb_series(with_dividends: bool) -> impl Strategy<Value = Vec<Observation>> {
    let dividend = if with_dividends {
        arb_dividend().boxed()
    } else {
        Just(0.0).boxed()
    };
    let day = (arb_close(), dividend);
    prop::collection::vec(day, 1..120).prop_map(|rows| {
        let start = NaiveDate::from_ymd_opt(2015, 1, 2).unwrap();
        rows.into_iter()
            .enumerate()
            .map(|(i, (close, div))| {
                Observation::new(start + chrono::Duration::days(i as i64), close, div)
            })
            .collect()
    })
}

// ── 1. Monotonic shares ──────────────────────────────────────────────

proptest! {
    #[test]
    fn shares_never_decrease(obs in arb_series(true), initial in arb_investment()) {
        let result = simulate(&obs, initial).unwrap();
        for i in 1..result.points.len() {
            let prev = result.points[i - 1].shares_held;
            let cur = result.points[i].shares_held;
            prop_assert!(cur >= prev);
            if obs[i].dividend_per_share > 0.0 {
                prop_assert!(cur > prev, "dividend day {} did not add shares", i);
            } else {
                prop_assert_eq!(cur, prev);
            }
        }
    }
}

// ── 2. No-dividend identity ──────────────────────────────────────────

proptest! {
    #[test]
    fn no_dividend_value_is_price_ratio(obs in arb_series(false), initial in arb_investment()) {
        let result = simulate(&obs, initial).unwrap();
        let c0 = obs[0].close;
        for (p, o) in result.points.iter().zip(&obs) {
            let expected = initial * (o.close / c0);
            prop_assert!((p.total_value - expected).abs() <= 1e-9 * expected.abs().max(1.0));
        }
    }
}

// ── 3. Summary consistency ───────────────────────────────────────────

proptest! {
    #[test]
    fn summary_matches_final_point(obs in arb_series(true), initial in arb_investment()) {
        let result = simulate(&obs, initial).unwrap();
        let s = result.summary;
        let last = result.points.last().unwrap();
        prop_assert_eq!(s.final_value, last.total_value);
        prop_assert_eq!(s.absolute_gain, s.final_value - initial);
        prop_assert_eq!(s.percent_return, (s.final_value / initial - 1.0) * 100.0);
    }
}

// ── 4. Zero-price rejection ──────────────────────────────────────────

proptest! {
    #[test]
    fn zero_close_on_dividend_day_aborts(
        mut obs in arb_series(true),
        pick in any::<prop::sample::Index>(),
        initial in arb_investment(),
    ) {
        let i = pick.index(obs.len());
        obs[i].close = 0.0;
        obs[i].dividend_per_share = 1.0;
        let result = simulate(&obs, initial);
        prop_assert!(
            matches!(result, Err(SimulationError::NonPositivePrice { .. })),
            "expected NonPositivePrice, got {:?}",
            result
        );
    }
}
