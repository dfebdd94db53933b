//! Reporting and export: JSON, CSV, and Markdown artifacts.
//!
//! - **JSON**: full round-trip serialization of a `RankRun` with schema versioning
//! - **CSV**: the ranked table and the per-ticker diagnostics
//! - **Markdown**: human-readable summary of one run
//!
//! Persisted runs carry a `schema_version`; newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use quantrank_core::{FactorScore, RankingReport};

use crate::runner::{RankRun, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(run: &RankRun) -> Result<String> {
    serde_json::to_string_pretty(run).context("failed to serialize RankRun to JSON")
}

pub fn import_json(json: &str) -> Result<RankRun> {
    let run: RankRun = serde_json::from_str(json).context("failed to deserialize RankRun from JSON")?;
    if run.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            run.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(run)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn opt(v: Option<f64>, precision: usize) -> String {
    v.map(|x| format!("{x:.precision$}")).unwrap_or_default()
}

fn score(f: &FactorScore) -> String {
    opt(f.value(), 4)
}

/// Ranked table, one row per ranked ticker.
///
/// Columns: rank, ticker, composite, momentum_pct, momentum, technical,
/// fundamental, w_momentum, w_technical, w_fundamental. Unavailable factors
/// are left blank.
pub fn export_ranked_csv(report: &RankingReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "rank",
        "ticker",
        "composite",
        "momentum_pct",
        "momentum",
        "technical",
        "fundamental",
        "w_momentum",
        "w_technical",
        "w_fundamental",
    ])?;

    for entry in &report.ranked.entries {
        let scored = report
            .scored_ticker(&entry.ticker)
            .with_context(|| format!("ranked ticker {} missing from scored set", entry.ticker))?;
        let w = &entry.composite.weights;
        wtr.write_record([
            entry.rank.to_string(),
            entry.ticker.clone(),
            format!("{:.4}", entry.composite.value),
            opt(scored.raw_momentum.map(|m| m * 100.0), 2),
            score(&scored.momentum),
            score(&scored.technical),
            score(&scored.fundamental),
            format!("{:.4}", w.momentum),
            format!("{:.4}", w.technical),
            format!("{:.4}", w.fundamental),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// One row per issue: ticker, excluded, issue.
pub fn export_diagnostics_csv(report: &RankingReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["ticker", "excluded", "issue"])?;
    for diag in &report.diagnostics {
        for issue in &diag.issues {
            wtr.write_record([diag.ticker.clone(), diag.excluded.to_string(), issue.to_string()])?;
        }
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Markdown report ────────────────────────────────────────────────

pub fn generate_report(run: &RankRun) -> String {
    let mut md = String::with_capacity(2048);
    let report = &run.report;

    md.push_str("# Ranking Report\n\n");
    md.push_str("| Field | Value |\n| --- | --- |\n");
    if let Some(market) = run.market {
        md.push_str(&format!("| Market | {} ({}) |\n", market.index_name(), market.exchange()));
    }
    md.push_str(&format!("| As of | {} |\n", run.as_of));
    md.push_str(&format!("| History from | {} |\n", run.start_date));
    md.push_str(&format!("| Provider | {} |\n", run.provider));
    md.push_str(&format!(
        "| Tickers | {} requested, {} fetched, {} ranked |\n",
        run.tickers_requested,
        report.universe_size,
        report.ranked.len()
    ));
    md.push_str(&format!("| Config hash | `{}` |\n\n", &report.config_hash[..report.config_hash.len().min(16)]));

    md.push_str("## Top Picks\n\n");
    if report.ranked.is_empty() {
        md.push_str("_No ticker could be scored._\n\n");
    } else {
        md.push_str("| Rank | Ticker | Composite | Momentum | Technical | Fundamental |\n");
        md.push_str("| ---: | --- | ---: | ---: | ---: | ---: |\n");
        for entry in &report.ranked.entries {
            let Some(s) = report.scored_ticker(&entry.ticker) else {
                continue;
            };
            let cell = |f: &FactorScore| f.value().map_or("n/a".to_string(), |v| format!("{v:.3}"));
            md.push_str(&format!(
                "| {} | {} | {:.3} | {} | {} | {} |\n",
                entry.rank,
                entry.ticker,
                entry.composite.value,
                s.raw_momentum.map_or("n/a".to_string(), |m| format!("{:+.2}%", m * 100.0)),
                cell(&s.technical),
                cell(&s.fundamental),
            ));
        }
        md.push('\n');
    }

    let excluded: Vec<_> = report.excluded().collect();
    if !excluded.is_empty() || !run.fetch_failures.is_empty() {
        md.push_str("## Excluded\n\n");
        for f in &run.fetch_failures {
            md.push_str(&format!("- **{}**: no data ({})\n", f.ticker, f.error));
        }
        for d in excluded {
            let reasons: Vec<String> = d.issues.iter().map(|i| i.to_string()).collect();
            md.push_str(&format!("- **{}**: {}\n", d.ticker, reasons.join("; ")));
        }
        md.push('\n');
    }
    md
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `run.json`, `ranked.csv`, `diagnostics.csv` and `report.md` into a
/// new `rank_{timestamp}/` directory under `output_dir`.
pub fn save_artifacts(run: &RankRun, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!("rank_{}", run.generated_at.format("%Y%m%d_%H%M%S"));
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("run.json"), export_json(run)?)?;
    std::fs::write(run_dir.join("ranked.csv"), export_ranked_csv(&run.report)?)?;
    std::fs::write(run_dir.join("diagnostics.csv"), export_diagnostics_csv(&run.report)?)?;
    std::fs::write(run_dir.join("report.md"), generate_report(run))?;

    Ok(run_dir)
}

pub fn load_artifacts(dir: &Path) -> Result<RankRun> {
    let path = dir.join("run.json");
    let json = std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
