//! Property tests for scoring invariants.
//!
//! Uses proptest to verify:
//! 1. Momentum is positive on rising series and strictly increasing in the gain
//! 2. Effective composite weights sum to one whenever a factor is available
//! 3. RSI is exactly 100 when the window has no losing period
//! 4. Ranking does not depend on input order
//! 5. Every factor score stays finite and inside [0, 1]

use chrono::NaiveDate;
use proptest::prelude::*;
use quantrank_core::factors::{raw_momentum, score_momentum, Mapping, PreferenceBand};
use quantrank_core::indicators::{Indicator, Rsi, RsiMethod};
use quantrank_core::ranker::rank_scores;
use quantrank_core::{
    combine, score_ticker, CompositeScore, EffectiveWeights, FactorScore, FundamentalMetric,
    FundamentalSnapshot, PriceBar, PriceSeries, ScoringConfig, ScoringIssue, TickerData, Weights,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn bars_from(closes: &[f64]) -> Vec<PriceBar> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            date: base + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
        })
        .collect()
}

/// Strictly increasing closes from 100 reaching `100 * (1 + gain)` after `window` steps.
fn rising_series(window: usize, gain: f64) -> PriceSeries {
    let closes: Vec<f64> = (0..=window)
        .map(|i| 100.0 * (1.0 + gain).powf(i as f64 / window as f64))
        .collect();
    PriceSeries::new("PROP", bars_from(&closes)).unwrap()
}

fn arb_factor() -> impl Strategy<Value = FactorScore> {
    prop_oneof![
        (0.0..=1.0_f64).prop_map(|v| FactorScore::from_value(v, "prop")),
        Just(FactorScore::unavailable(ScoringIssue::NoFundamentalMetrics)),
    ]
}

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..1000.0_f64, 0..260)
}

// ── 1. Momentum monotonicity ─────────────────────────────────────────

proptest! {
    #[test]
    fn momentum_positive_and_strictly_increasing(
        window in 1usize..60,
        gain in 0.001..1.0_f64,
        delta in 0.001..0.5_f64,
    ) {
        let mapping = Mapping::Logistic { scale: 0.10 };
        let low = rising_series(window, gain);
        let high = rising_series(window, gain + delta);

        let raw = raw_momentum(low.closes(), window).unwrap();
        prop_assert!(raw > 0.0);

        let s_low = score_momentum(&low, window, &mapping).score.value().unwrap();
        let s_high = score_momentum(&high, window, &mapping).score.value().unwrap();
        prop_assert!(s_high > s_low, "gain {gain} -> {s_low}, {} -> {s_high}", gain + delta);
    }

    #[test]
    fn clamped_mapping_never_decreases(a in -1.0..1.0_f64, b in -1.0..1.0_f64, cap in 0.01..0.5_f64) {
        let m = Mapping::Clamped { cap };
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(m.apply(lo) <= m.apply(hi));
    }
}

// ── 2. Effective weights ─────────────────────────────────────────────

proptest! {
    #[test]
    fn effective_weights_sum_to_one(
        raw in (0.0..1.0_f64, 0.0..1.0_f64, 0.0..1.0_f64),
        m in arb_factor(),
        t in arb_factor(),
        f in arb_factor(),
    ) {
        prop_assume!(raw.0 + raw.1 + raw.2 > 1e-6);
        let weights = Weights::new(raw.0, raw.1, raw.2).normalized().unwrap();
        match combine(&m, &t, &f, &weights) {
            Ok(c) => {
                prop_assert!((c.weights.sum() - 1.0).abs() < 1e-9);
                prop_assert!((0.0..=1.0).contains(&c.value));
            }
            Err(issue) => {
                prop_assert_eq!(issue, ScoringIssue::NoAvailableFactors);
                let usable = [(&m, weights.momentum), (&t, weights.technical), (&f, weights.fundamental)]
                    .iter()
                    .any(|(s, w)| s.is_available() && *w > 0.0);
                prop_assert!(!usable);
            }
        }
    }
}

// ── 3. RSI edge case ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_is_100_without_losses(
        steps in prop::collection::vec(0.01..5.0_f64, 14..40),
        wilder in any::<bool>(),
    ) {
        let mut closes = vec![50.0];
        for step in &steps {
            let last = closes[closes.len() - 1];
            closes.push(last + step);
        }
        let method = if wilder { RsiMethod::Wilder } else { RsiMethod::Simple };
        let rsi = Rsi::new(14, method).compute(&closes);
        prop_assert_eq!(rsi[rsi.len() - 1], 100.0);
    }
}

// ── 4. Ranking order independence ────────────────────────────────────

proptest! {
    #[test]
    fn ranking_ignores_input_order(
        values in prop::collection::vec(0.0..1.0_f64, 1..40),
        rotate in 0usize..40,
        top_n in 1usize..50,
    ) {
        // Coarse values force plenty of ties
        let scored: Vec<(String, CompositeScore)> = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                (
                    format!("T{i:02}"),
                    CompositeScore {
                        value: (v * 10.0).round() / 10.0,
                        weights: EffectiveWeights { momentum: 1.0, technical: 0.0, fundamental: 0.0 },
                    },
                )
            })
            .collect();
        let mut shuffled = scored.clone();
        shuffled.reverse();
        let k = rotate % shuffled.len();
        shuffled.rotate_left(k);

        let a = rank_scores(scored, top_n);
        let b = rank_scores(shuffled, top_n);
        prop_assert_eq!(&a, &b);
        prop_assert!(a.len() <= top_n);
        for pair in a.entries.windows(2) {
            let ordered = pair[0].composite.value > pair[1].composite.value
                || (pair[0].composite.value == pair[1].composite.value && pair[0].ticker < pair[1].ticker);
            prop_assert!(ordered);
        }
    }
}

// ── 5. Bounded, finite outputs ───────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn factor_scores_bounded_for_any_path(
        closes in arb_closes(),
        pe in prop::option::of(-50.0..200.0_f64),
        yield_pct in prop::option::of(0.0..20.0_f64),
        roe in prop::option::of(-100.0..100.0_f64),
    ) {
        let mut fundamentals = FundamentalSnapshot::new();
        if let Some(v) = pe { fundamentals.insert(FundamentalMetric::PeRatio, v); }
        if let Some(v) = yield_pct { fundamentals.insert(FundamentalMetric::DividendYield, v); }
        if let Some(v) = roe { fundamentals.insert(FundamentalMetric::ReturnOnEquity, v); }

        let data = TickerData::new("PROP", bars_from(&closes), fundamentals);
        let scored = score_ticker(&data, &ScoringConfig::default()).unwrap();

        for factor in [&scored.momentum, &scored.technical, &scored.fundamental] {
            if let Some(v) = factor.value() {
                prop_assert!(v.is_finite() && (0.0..=1.0).contains(&v));
            }
        }
        if let Some(c) = scored.composite {
            prop_assert!(c.value.is_finite() && (0.0..=1.0).contains(&c.value));
        }
    }

    #[test]
    fn band_scores_bounded(x in -1e6..1e6_f64, low in -100.0..100.0_f64, width in 0.0..50.0_f64, tol in 0.0..50.0_f64) {
        let band = PreferenceBand::new(low, low + width, tol, tol);
        let s = band.score(x);
        prop_assert!((0.0..=1.0).contains(&s));
        if x >= low && x <= low + width {
            prop_assert_eq!(s, 1.0);
        }
    }
}
