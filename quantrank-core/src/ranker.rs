//! Top-N selection over composite scores.
//!
//! Ordered by composite descending; ties broken by ticker ascending so the
//! output is fully deterministic. Never pads when fewer than N are scorable.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::composite::CompositeScore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// 1-based; rank 1 has the highest composite.
    pub rank: usize,
    pub ticker: String,
    pub composite: CompositeScore,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub entries: Vec<RankedEntry>,
}

impl RankedResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tickers(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.ticker.as_str()).collect()
    }

    pub fn get(&self, ticker: &str) -> Option<&RankedEntry> {
        self.entries.iter().find(|e| e.ticker == ticker)
    }
}

fn by_score_then_ticker(a: &(String, CompositeScore), b: &(String, CompositeScore)) -> Ordering {
    b.1.value
        .total_cmp(&a.1.value)
        .then_with(|| a.0.cmp(&b.0))
}

pub fn rank_scores(mut scored: Vec<(String, CompositeScore)>, top_n: usize) -> RankedResult {
    scored.sort_by(by_score_then_ticker);
    let entries = scored
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(i, (ticker, composite))| RankedEntry {
            rank: i + 1,
            ticker,
            composite,
        })
        .collect();
    RankedResult { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::EffectiveWeights;

    fn score(ticker: &str, value: f64) -> (String, CompositeScore) {
        (
            ticker.to_string(),
            CompositeScore {
                value,
                weights: EffectiveWeights {
                    momentum: 1.0,
                    technical: 0.0,
                    fundamental: 0.0,
                },
            },
        )
    }

    #[test]
    fn sorted_best_first_with_ranks() {
        let ranked = rank_scores(vec![score("B", 0.2), score("A", 0.9), score("C", 0.5)], 10);
        assert_eq!(ranked.tickers(), vec!["A", "C", "B"]);
        let ranks: Vec<usize> = ranked.entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn ties_break_by_ticker_ascending() {
        let ranked = rank_scores(
            vec![score("ZED", 0.5), score("ABC", 0.5), score("MID", 0.5)],
            3,
        );
        assert_eq!(ranked.tickers(), vec!["ABC", "MID", "ZED"]);
    }

    #[test]
    fn truncates_to_top_n() {
        let ranked = rank_scores(vec![score("A", 0.1), score("B", 0.2), score("C", 0.3)], 2);
        assert_eq!(ranked.tickers(), vec!["C", "B"]);
    }

    #[test]
    fn top_n_larger_than_input_returns_all_without_padding() {
        let ranked = rank_scores(vec![score("A", 0.1)], 5);
        assert_eq!(ranked.len(), 1);
        assert!(rank_scores(vec![], 5).is_empty());
    }
}
