//! End-to-end ranking scenarios through the public `rank` entry point.
//!
//! 1. Rising momentum outranks flat momentum with equal fundamentals
//! 2. Price-only ticker: fundamental weight redistributed to momentum/technical
//! 3. top_n larger than the scorable set returns everything, unpadded
//! 4. Malformed tickers are isolated; the batch still ranks
//! 5. Batch size and order do not change a ticker's score
//! 6. Repeated runs are identical, ties included

use chrono::NaiveDate;
use quantrank_core::data::SyntheticProvider;
use quantrank_core::{
    rank, score_ticker, FundamentalMetric, FundamentalSnapshot, PriceBar, RankError, ScoringConfig,
    ScoringIssue, TickerData,
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
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 10_000,
        })
        .collect()
}

/// 10 flat closes at 100, then 30 closes rising 1 per day.
fn flat_then_rising() -> Vec<f64> {
    (0..40)
        .map(|i| if i < 10 { 100.0 } else { 100.0 + (i - 9) as f64 })
        .collect()
}

fn ideal_fundamentals() -> FundamentalSnapshot {
    FundamentalSnapshot::new()
        .with(FundamentalMetric::PeRatio, 18.0)
        .with(FundamentalMetric::DividendYield, 4.0)
        .with(FundamentalMetric::PriceToBook, 2.0)
        .with(FundamentalMetric::ReturnOnEquity, 25.0)
}

fn synthetic_universe(n: usize) -> Vec<TickerData> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
    (0..n)
        .map(|i| {
            let ticker = format!("T{i:04}");
            TickerData::new(
                ticker.as_str(),
                SyntheticProvider::generate_bars(&ticker, start, end),
                SyntheticProvider::generate_fundamentals(&ticker),
            )
        })
        .collect()
}

// ── 1. Momentum decides between otherwise ideal tickers ──────────────

#[test]
fn rising_ticker_outranks_flat_ticker() {
    let aaa = TickerData::new("AAA", bars_from(&flat_then_rising()), ideal_fundamentals());
    let bbb = TickerData::new("BBB", bars_from(&[100.0; 40]), ideal_fundamentals());

    let report = rank(&[bbb, aaa], &ScoringConfig::default()).unwrap();
    assert_eq!(report.ranked.tickers(), vec!["AAA", "BBB"]);

    let aaa = report.scored_ticker("AAA").unwrap();
    let bbb = report.scored_ticker("BBB").unwrap();
    assert!((aaa.raw_momentum.unwrap() - 0.30).abs() < 1e-12);
    assert_eq!(bbb.raw_momentum, Some(0.0));
    assert!(aaa.momentum.value().unwrap() > bbb.momentum.value().unwrap());
    assert_eq!(aaa.fundamental.value(), Some(1.0));
    assert_eq!(report.ranked.entries[0].rank, 1);
}

// ── 2. Missing fundamentals renormalize the weights ──────────────────

#[test]
fn price_only_ticker_uses_renormalized_weights() {
    let data = TickerData::new("PRICE", bars_from(&flat_then_rising()), FundamentalSnapshot::new());
    let scored = score_ticker(&data, &ScoringConfig::default()).unwrap();

    let composite = scored.composite.unwrap();
    assert!((composite.weights.momentum - 0.40 / 0.75).abs() < 1e-12);
    assert!((composite.weights.technical - 0.35 / 0.75).abs() < 1e-12);
    assert_eq!(composite.weights.fundamental, 0.0);
    assert!((composite.weights.sum() - 1.0).abs() < 1e-12);

    let expected = scored.momentum.value().unwrap() * 0.40 / 0.75
        + scored.technical.value().unwrap() * 0.35 / 0.75;
    assert!((composite.value - expected).abs() < 1e-12);
    assert!(scored.issues.contains(&ScoringIssue::NoFundamentalMetrics));
}

// ── 3. top_n boundary ────────────────────────────────────────────────

#[test]
fn top_n_beyond_scorable_returns_all_without_padding() {
    let config = ScoringConfig {
        top_n: 10,
        ..ScoringConfig::default()
    };
    let batch = vec![
        TickerData::new("A", bars_from(&flat_then_rising()), FundamentalSnapshot::new()),
        TickerData::new("B", bars_from(&[100.0; 40]), FundamentalSnapshot::new()),
        // Excluded: nothing scorable
        TickerData::new("C", bars_from(&[100.0; 3]), FundamentalSnapshot::new()),
    ];
    let report = rank(&batch, &config).unwrap();
    assert_eq!(report.ranked.len(), 2);
    assert_eq!(report.universe_size, 3);
    let excluded: Vec<&str> = report.excluded().map(|d| d.ticker.as_str()).collect();
    assert_eq!(excluded, vec!["C"]);
}

#[test]
fn top_n_truncates() {
    let config = ScoringConfig {
        top_n: 5,
        ..ScoringConfig::default()
    };
    let report = rank(&synthetic_universe(20), &config).unwrap();
    assert_eq!(report.ranked.len(), 5);
    let values: Vec<f64> = report.ranked.entries.iter().map(|e| e.composite.value).collect();
    assert!(values.windows(2).all(|w| w[0] >= w[1]));
}

// ── 4. Failure isolation ─────────────────────────────────────────────

#[test]
fn malformed_tickers_do_not_abort_batch() {
    let mut duplicate_dates = bars_from(&flat_then_rising());
    duplicate_dates[5].date = duplicate_dates[4].date;
    let mut reversed = bars_from(&flat_then_rising());
    reversed.reverse();

    let batch = vec![
        TickerData::new("GOOD", bars_from(&flat_then_rising()), ideal_fundamentals()),
        TickerData::new("DUPDATE", duplicate_dates, ideal_fundamentals()),
        TickerData::new("BACKWARD", reversed, ideal_fundamentals()),
    ];
    let report = rank(&batch, &ScoringConfig::default()).unwrap();

    assert_eq!(report.ranked.tickers(), vec!["GOOD"]);
    for name in ["DUPDATE", "BACKWARD"] {
        let diag = report.diagnostics.iter().find(|d| d.ticker == name).unwrap();
        assert!(diag.excluded);
        assert!(matches!(diag.issues[0], ScoringIssue::MalformedInput { .. }));
    }
}

#[test]
fn empty_universe_is_the_only_batch_failure() {
    assert!(matches!(
        rank(&[], &ScoringConfig::default()),
        Err(RankError::EmptyUniverse)
    ));
    let all_bad = vec![TickerData::new("X", vec![], FundamentalSnapshot::new())];
    let report = rank(&all_bad, &ScoringConfig::default()).unwrap();
    assert!(report.ranked.is_empty());
    assert!(report.diagnostics[0].issues.contains(&ScoringIssue::NoAvailableFactors));
}

// ── 5. No cross-ticker interference ──────────────────────────────────

#[test]
fn scores_identical_alone_and_in_large_batch() {
    let universe = synthetic_universe(1000);
    let config = ScoringConfig {
        top_n: 1000,
        ..ScoringConfig::default()
    };

    let batch = rank(&universe, &config).unwrap();
    for probe in [0, 499, 999] {
        let alone = rank(&universe[probe..=probe], &config).unwrap();
        assert_eq!(alone.scored[0], batch.scored[probe]);
    }

    let mut reversed = universe.clone();
    reversed.reverse();
    let reordered = rank(&reversed, &config).unwrap();
    assert_eq!(reordered.ranked, batch.ranked);
}

// ── 6. Determinism ───────────────────────────────────────────────────

#[test]
fn repeated_runs_are_identical_including_ties() {
    let closes = flat_then_rising();
    let mut batch = synthetic_universe(50);
    // Identical inputs under different names tie exactly
    for name in ["TIE_C", "TIE_A", "TIE_B"] {
        batch.push(TickerData::new(name, bars_from(&closes), ideal_fundamentals()));
    }
    let config = ScoringConfig {
        top_n: 53,
        ..ScoringConfig::default()
    };

    let first = rank(&batch, &config).unwrap();
    let second = rank(&batch, &config).unwrap();
    assert_eq!(first, second);

    let tie_order: Vec<&str> = first
        .ranked
        .tickers()
        .into_iter()
        .filter(|t| t.starts_with("TIE_"))
        .collect();
    assert_eq!(tie_order, vec!["TIE_A", "TIE_B", "TIE_C"]);
}

#[test]
fn every_reported_number_is_finite() {
    let report = rank(&synthetic_universe(25), &ScoringConfig::default()).unwrap();
    for scored in &report.scored {
        let values = [scored.momentum.value(), scored.technical.value(), scored.fundamental.value()];
        for v in values.into_iter().flatten() {
            assert!(v.is_finite() && (0.0..=1.0).contains(&v), "{}: {v}", scored.ticker);
        }
        if let Some(c) = scored.composite {
            assert!(c.value.is_finite());
            assert!((c.weights.sum() - 1.0).abs() < 1e-9);
        }
    }
}
