//! QuantRank CLI: rank, markets, and config commands.
//!
//! Commands:
//! - `rank`: load a universe, score every ticker, and print the top N
//! - `markets`: list the built-in market universes
//! - `config`: print the default run configuration as TOML

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

use quantrank_core::{FactorScore, Weights};
use quantrank_runner::export::save_artifacts;
use quantrank_runner::{
    build_provider, init_logging, run_ranking, LogFormat, Market, ProviderKind, RankRun,
    RunConfig,
};

#[derive(Parser)]
#[command(
    name = "quantrank",
    about = "QuantRank CLI: multi-factor stock ranking"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a universe of tickers and print the top N.
    Rank(RankArgs),
    /// List the built-in markets and their ticker counts.
    Markets,
    /// Print the default run configuration as TOML.
    Config,
}

#[derive(clap::Args)]
struct RankArgs {
    /// Path to a TOML run config. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Built-in market universe: UK or MY.
    #[arg(long)]
    market: Option<Market>,

    /// Explicit tickers (e.g., HSBA.L BP.L). Takes precedence over --market.
    #[arg(long, num_args = 1..)]
    tickers: Vec<String>,

    /// Data provider: yahoo, alpha_vantage, csv, or synthetic.
    #[arg(long)]
    provider: Option<ProviderKind>,

    /// Alpha Vantage API key. Defaults to ALPHA_VANTAGE_API_KEY.
    #[arg(long)]
    api_key: Option<String>,

    /// Directory of per-ticker CSV files (csv provider).
    #[arg(long)]
    csv_dir: Option<PathBuf>,

    /// Momentum window in trading days.
    #[arg(long)]
    window: Option<usize>,

    /// Number of tickers to return.
    #[arg(long)]
    top_n: Option<usize>,

    /// Factor weights as momentum,technical,fundamental. Rescaled to sum to 1.
    #[arg(long)]
    weights: Option<String>,

    /// Calendar days of history to request.
    #[arg(long)]
    lookback_days: Option<u32>,

    /// Write run artifacts (JSON, CSV, Markdown) under this directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Also print indicator readings and fundamentals for one ticker.
    #[arg(long)]
    detail: Option<String>,

    /// Print the full run as JSON instead of a table.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log format: pretty or json.
    #[arg(long, default_value = "pretty")]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Rank(args) => run_rank_cmd(args),
        Commands::Markets => {
            print_markets();
            Ok(())
        }
        Commands::Config => {
            print!("{}", RunConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn run_rank_cmd(args: RankArgs) -> Result<()> {
    init_logging(&args.log_level, args.log_format);

    let config = build_run_config(&args)?;
    let provider = build_provider(&config.data)?;
    let as_of = chrono::Local::now().date_naive();

    let run = run_ranking(&config, provider.as_ref(), as_of)?;
    let run_dir = args
        .output_dir
        .as_deref()
        .map(|dir| save_artifacts(&run, dir))
        .transpose()?;

    if args.json {
        return write_json(&run, run_dir.as_deref(), &mut io::stdout(), &mut io::stderr());
    }

    print_ranking(&run);
    if let Some(ticker) = &args.detail {
        match format_detail(&run, ticker) {
            Some(detail) => print!("{detail}"),
            None => bail!("{ticker} was not part of this run"),
        }
    }
    if let Some(dir) = run_dir {
        println!("Artifacts saved to: {}", dir.display());
    }
    Ok(())
}

/// `out` receives only the JSON document; notices go to `notices`.
fn write_json(
    run: &RankRun,
    run_dir: Option<&Path>,
    out: &mut impl Write,
    notices: &mut impl Write,
) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(run)?)?;
    if let Some(dir) = run_dir {
        writeln!(notices, "Artifacts saved to: {}", dir.display())?;
    }
    Ok(())
}

fn build_run_config(args: &RankArgs) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RunConfig::default(),
    };

    if args.market.is_some() {
        config.universe.market = args.market;
    }
    if !args.tickers.is_empty() {
        config.universe.tickers = args.tickers.clone();
    }
    if let Some(provider) = args.provider {
        config.data.provider = provider;
    }
    if let Some(key) = &args.api_key {
        config.data.api_key = Some(key.clone());
    }
    if let Some(dir) = &args.csv_dir {
        config.data.csv_dir = Some(dir.clone());
        if args.provider.is_none() {
            config.data.provider = ProviderKind::Csv;
        }
    }
    if let Some(days) = args.lookback_days {
        config.data.lookback_days = days;
    }
    if let Some(window) = args.window {
        config.scoring.momentum_window = window;
    }
    if let Some(top_n) = args.top_n {
        config.scoring.top_n = top_n;
    }
    if let Some(raw) = &args.weights {
        config.scoring.weights = parse_weights(raw)?;
    }

    config.validate()?;
    Ok(config)
}

fn parse_weights(raw: &str) -> Result<Weights> {
    let parts: Vec<f64> = raw
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<f64>()
                .with_context(|| format!("invalid weight '{}'", p.trim()))
        })
        .collect::<Result<_>>()?;
    let [momentum, technical, fundamental] = parts[..] else {
        bail!("--weights expects three values: momentum,technical,fundamental");
    };

    let given = Weights::new(momentum, technical, fundamental);
    let normalized = given.normalized()?;
    if normalized != given {
        warn!(
            sum = given.sum(),
            momentum = normalized.momentum,
            technical = normalized.technical,
            fundamental = normalized.fundamental,
            "weights rescaled to sum to 1"
        );
    }
    Ok(normalized)
}

fn print_markets() {
    println!(
        "{:<4} {:<6} {:<30} {:<9} {:>7}",
        "Code", "Exch", "Index", "Currency", "Tickers"
    );
    println!("{}", "-".repeat(60));
    for market in Market::ALL {
        println!(
            "{:<4} {:<6} {:<30} {:<9} {:>7}",
            market.code(),
            market.exchange(),
            market.index_name(),
            market.currency(),
            market.tickers().len()
        );
    }
}

fn fmt_score(score: &FactorScore) -> String {
    score
        .value()
        .map(|v| format!("{v:.3}"))
        .unwrap_or_else(|| "-".into())
}

fn print_ranking(run: &RankRun) {
    let report = &run.report;

    println!();
    match run.market {
        Some(market) => println!("=== Top {} | {} ===", report.ranked.len(), market.index_name()),
        None => println!("=== Top {} ===", report.ranked.len()),
    }
    println!(
        "As of {} | provider {} | {} requested, {} scored",
        run.as_of,
        run.provider,
        run.tickers_requested,
        report.universe_size
    );
    println!();
    println!(
        "{:>4}  {:<14} {:>9} {:>10} {:>9} {:>9} {:>11}",
        "Rank", "Ticker", "Composite", "Momentum%", "Momentum", "Technical", "Fundamental"
    );
    println!("{}", "-".repeat(74));
    for entry in &report.ranked.entries {
        let scored = report.scored_ticker(&entry.ticker);
        let momentum_pct = scored
            .and_then(|s| s.raw_momentum)
            .map(|r| format!("{:+.2}", r * 100.0))
            .unwrap_or_else(|| "-".into());
        let (m, t, f) = scored
            .map(|s| {
                (
                    fmt_score(&s.momentum),
                    fmt_score(&s.technical),
                    fmt_score(&s.fundamental),
                )
            })
            .unwrap_or_else(|| ("-".into(), "-".into(), "-".into()));
        println!(
            "{:>4}  {:<14} {:>9.4} {:>10} {:>9} {:>9} {:>11}",
            entry.rank, entry.ticker, entry.composite.value, momentum_pct, m, t, f
        );
    }

    let excluded: Vec<_> = report.excluded().collect();
    if !excluded.is_empty() || !run.fetch_failures.is_empty() {
        println!();
        println!("Excluded:");
        for failure in &run.fetch_failures {
            println!("  {:<14} {}", failure.ticker, failure.error);
        }
        for diag in excluded {
            let reason = diag
                .issues
                .last()
                .map(|i| i.to_string())
                .unwrap_or_default();
            println!("  {:<14} {}", diag.ticker, reason);
        }
    }
    println!();
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{v:.precision$}"))
        .unwrap_or_else(|| "-".into())
}

/// Indicator readings, sub-signal scores and fundamentals for one ticker.
fn format_detail(run: &RankRun, ticker: &str) -> Option<String> {
    use std::fmt::Write;

    let scored = run.report.scored_ticker(ticker)?;
    let mut out = String::new();

    let status = match run.report.ranked.get(ticker) {
        Some(entry) => format!("rank {}", entry.rank),
        None if scored.composite.is_some() => "scored, outside top N".to_string(),
        None => "excluded".to_string(),
    };
    let _ = writeln!(out, "=== {ticker} ({status}) ===");
    let _ = writeln!(
        out,
        "Composite {}  Momentum {}%",
        fmt_opt(scored.composite.map(|c| c.value), 4),
        fmt_opt(scored.raw_momentum.map(|r| r * 100.0), 2)
    );

    if let Some(snapshot) = &scored.indicators {
        let _ = writeln!(out, "\nIndicators (close {})", fmt_opt(snapshot.close, 2));
        for reading in snapshot.readings() {
            let _ = writeln!(out, "  {:<16} {:>12}", reading.name, fmt_opt(reading.value, 4));
        }
    }

    let b = &scored.technical_breakdown;
    let _ = writeln!(out, "\nTechnical sub-signals");
    for (name, value) in [
        ("price_vs_sma", b.price_vs_sma),
        ("ema_crossover", b.ema_crossover),
        ("rsi", b.rsi),
        ("macd", b.macd),
    ] {
        let _ = writeln!(out, "  {:<16} {:>12}", name, fmt_opt(value, 3));
    }

    let _ = writeln!(out, "\nFundamentals");
    if scored.fundamentals.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for (metric, value) in scored.fundamentals.iter() {
        let _ = writeln!(
            out,
            "  {:<16} {:>12.2}  score {}",
            metric.key(),
            value,
            fmt_opt(scored.fundamental_metrics.get(&metric).copied(), 3)
        );
    }

    if !scored.issues.is_empty() {
        let _ = writeln!(out, "\nIssues");
        for issue in &scored.issues {
            let _ = writeln!(out, "  {issue}");
        }
    }
    out.push('\n');
    Some(out)
}
