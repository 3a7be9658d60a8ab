//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_archive_adapter::JsonArchiveAdapter;
use crate::domain::audit::AuditPass;
use crate::domain::config_validation::{
    read_level_override, validate_analysis_config, validate_config,
};
use crate::domain::error::StockwatchError;
use crate::domain::pipeline::{
    evaluate_instrument, record_recommendations, run_audit_pass, run_report_pass, AnalysisBundle,
};
use crate::domain::recommendation::ArchiveStatistics;
use crate::domain::scoring::RankedEntry;
use crate::domain::settings::{AnalysisConfig, PathsConfig, ScoringConfig, Settings};
use crate::domain::watchlist::{check_watchlist, parse_tickers, unwatched_tickers, SkipReason};
use crate::ports::archive_port::ArchiveStore;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceSource;

/// Exit code when some instruments in a pass failed and others succeeded.
pub const PARTIAL_FAILURE: u8 = 4;

/// Exit code when every instrument or record in a pass failed.
pub const ALL_FAILED: u8 = 5;

#[derive(Parser, Debug)]
#[command(
    name = "stockwatch",
    about = "Equity analysis, BUY recommendations and their audit"
)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyse and rank the watchlist, then emit BUY recommendations
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        /// Analyse a single ticker instead of the watchlist
        #[arg(long)]
        ticker: Option<String>,
        /// Print the ranking without touching the archive
        #[arg(long)]
        dry_run: bool,
    },
    /// Audit every active recommendation against fresh prices
    Audit {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print archive statistics
    Stats {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range and the full analysis for one ticker
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: String,
    },
    /// Validate a configuration file and the watchlist's price data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Analyze {
            config,
            ticker,
            dry_run,
        } => run_analyze(&config, ticker.as_deref(), dry_run),
        Command::Audit { config } => run_audit(&config),
        Command::Stats { config } => run_stats(&config),
        Command::Info { config, ticker } => run_info(&config, &ticker),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = StockwatchError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn usize_setting(adapter: &dyn ConfigPort, section: &str, key: &str, default: usize) -> usize {
    let value = adapter.get_int(section, key, default as i64);
    usize::try_from(value).unwrap_or(default)
}

fn i32_setting(adapter: &dyn ConfigPort, section: &str, key: &str, default: i32) -> i32 {
    let value = adapter.get_int(section, key, i64::from(default));
    i32::try_from(value).unwrap_or(default)
}

pub fn build_settings(adapter: &dyn ConfigPort) -> Result<Settings, StockwatchError> {
    validate_analysis_config(adapter)?;

    let defaults = PathsConfig::default();
    let paths = PathsConfig {
        data_dir: adapter
            .get_string("paths", "data_dir")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir),
        archive_file: adapter
            .get_string("paths", "archive_file")
            .map(PathBuf::from)
            .unwrap_or(defaults.archive_file),
    };

    let d = AnalysisConfig::default();
    let analysis = AnalysisConfig {
        rsi_period: usize_setting(adapter, "analysis", "rsi_period", d.rsi_period),
        adx_short_period: usize_setting(adapter, "analysis", "adx_short_period", d.adx_short_period),
        adx_long_period: usize_setting(adapter, "analysis", "adx_long_period", d.adx_long_period),
        volume_bins: usize_setting(adapter, "analysis", "volume_bins", d.volume_bins),
        sr_window: usize_setting(adapter, "analysis", "sr_window", d.sr_window),
        min_trend_bars: usize_setting(adapter, "analysis", "min_trend_bars", d.min_trend_bars),
        min_recovery_bars: usize_setting(
            adapter,
            "analysis",
            "min_recovery_bars",
            d.min_recovery_bars,
        ),
        divergence_lookback: usize_setting(
            adapter,
            "analysis",
            "divergence_lookback",
            d.divergence_lookback,
        ),
    };

    let s = ScoringConfig::default();
    let scoring = ScoringConfig {
        buy_threshold: i32_setting(adapter, "scoring", "buy_threshold", s.buy_threshold),
        sell_threshold: i32_setting(adapter, "scoring", "sell_threshold", s.sell_threshold),
    };

    let watchlist = match adapter.get_string("watchlist", "tickers") {
        Some(t) if !t.trim().is_empty() => parse_tickers(&t)?,
        _ => Vec::new(),
    };

    let mut levels = HashMap::new();
    for ticker in &watchlist {
        if let Some(o) = read_level_override(adapter, ticker)? {
            levels.insert(ticker.clone(), o);
        }
    }

    Ok(Settings {
        paths,
        analysis,
        scoring,
        watchlist,
        levels,
    })
}

/// A `--ticker` override replaces the watchlist; its level override is
/// loaded on demand when the ticker is not watched.
pub fn resolve_tickers(
    ticker: Option<&str>,
    adapter: &dyn ConfigPort,
    settings: &mut Settings,
) -> Result<Vec<String>, StockwatchError> {
    let Some(t) = ticker else {
        return Ok(settings.watchlist.clone());
    };
    let t = t.trim().to_uppercase();
    if !settings.levels.contains_key(&t) {
        if let Some(o) = read_level_override(adapter, &t)? {
            settings.levels.insert(t.clone(), o);
        }
    }
    Ok(vec![t])
}

fn load_settings(config_path: &Path) -> Result<(FileConfigAdapter, Settings), ExitCode> {
    let adapter = load_config(config_path)?;
    match build_settings(&adapter) {
        Ok(settings) => Ok((adapter, settings)),
        Err(e) => {
            eprintln!("error: {e}");
            Err((&e).into())
        }
    }
}

fn run_analyze(config_path: &Path, ticker: Option<&str>, dry_run: bool) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let (adapter, mut settings) = match load_settings(config_path) {
        Ok(v) => v,
        Err(code) => return code,
    };

    let tickers = match resolve_tickers(ticker, &adapter, &mut settings) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if tickers.is_empty() {
        eprintln!("error: no tickers configured (set [watchlist] tickers or use --ticker)");
        return ExitCode::from(2);
    }

    let source = CsvAdapter::new(settings.paths.data_dir.clone());
    let issued_at = chrono::Local::now().naive_local();
    eprintln!("Analysing {} tickers...", tickers.len());
    let pass = run_report_pass(&tickers, &source, &settings, issued_at);

    print_ranking(&pass.ranking);
    for failure in &pass.failures {
        eprintln!("  skipped {}: {}", failure.ticker, failure.reason);
    }

    if dry_run {
        eprintln!(
            "\nDry run: {} recommendation(s) not recorded",
            pass.drafts.len()
        );
    } else if !pass.drafts.is_empty() {
        let store = JsonArchiveAdapter::new(settings.paths.archive_file.clone());
        match record_recommendations(&store, pass.drafts.clone()) {
            Ok(added) => eprintln!(
                "\n{} new recommendation(s) recorded in {}",
                added,
                store.path().display()
            ),
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        }
    }

    eprintln!(
        "\nAnalysed {} of {} tickers ({} failed)",
        pass.succeeded(),
        tickers.len(),
        pass.failures.len()
    );
    if pass.failures.is_empty() {
        ExitCode::SUCCESS
    } else if pass.analyses.is_empty() {
        ExitCode::from(ALL_FAILED)
    } else {
        ExitCode::from(PARTIAL_FAILURE)
    }
}

fn run_audit(config_path: &Path) -> ExitCode {
    let (_, settings) = match load_settings(config_path) {
        Ok(v) => v,
        Err(code) => return code,
    };

    let store = JsonArchiveAdapter::new(settings.paths.archive_file.clone());
    let source = CsvAdapter::new(settings.paths.data_dir.clone());
    let pass = match run_audit_pass(&store, &source) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    print_audit(&pass);
    match store.load() {
        Ok(archive) => print_statistics(&archive.statistics()),
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }

    if pass.skipped == 0 {
        ExitCode::SUCCESS
    } else if pass.audited == 0 {
        ExitCode::from(ALL_FAILED)
    } else {
        ExitCode::from(PARTIAL_FAILURE)
    }
}

fn run_stats(config_path: &Path) -> ExitCode {
    let (_, settings) = match load_settings(config_path) {
        Ok(v) => v,
        Err(code) => return code,
    };
    let store = JsonArchiveAdapter::new(settings.paths.archive_file.clone());
    match store.load() {
        Ok(archive) => {
            print_statistics(&archive.statistics());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_info(config_path: &Path, ticker: &str) -> ExitCode {
    let (adapter, mut settings) = match load_settings(config_path) {
        Ok(v) => v,
        Err(code) => return code,
    };
    let ticker = match resolve_tickers(Some(ticker), &adapter, &mut settings) {
        Ok(t) => t.into_iter().next().unwrap_or_default(),
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let source = CsvAdapter::new(settings.paths.data_dir.clone());
    match source.get_data_range(&ticker) {
        Ok(Some((from, to, count))) => println!("{}: {} bars, {} to {}", ticker, count, from, to),
        Ok(None) => {
            eprintln!("{}: no data found", ticker);
            return ExitCode::from(5);
        }
        Err(e) => {
            eprintln!("error querying {}: {}", ticker, e);
            return (&e).into();
        }
    }

    let analysis = match source
        .fetch_bars(&ticker)
        .and_then(|bars| evaluate_instrument(&ticker, &bars, &settings))
    {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    print_bundle(&analysis.bundle);
    println!(
        "\nScore: {} ({})",
        analysis.score.value, analysis.score.signal
    );
    for factor in &analysis.score.factors {
        println!("  - {}", factor);
    }
    if let Some(verdict) = &analysis.false_recovery {
        println!(
            "False recovery: {}",
            if verdict.is_false_recovery { "yes" } else { "no" }
        );
        for reason in &verdict.reasons {
            println!("  - {}", reason);
        }
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    let settings = match build_settings(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nWatchlist: {}", settings.watchlist.join(", "));
    for (ticker, o) in &settings.levels {
        eprintln!(
            "  levels {}: support {:?}, resistance {:?}",
            ticker, o.support, o.resistance
        );
    }

    let source = CsvAdapter::new(settings.paths.data_dir.clone());
    let check = check_watchlist(
        &source,
        &settings.watchlist,
        settings.analysis.min_trend_bars,
    );
    eprintln!("\nPrice data in {}:", settings.paths.data_dir.display());
    for (ticker, bars) in &check.ready {
        eprintln!("  {}: {} bars [OK]", ticker, bars);
    }
    for skipped in &check.skipped {
        match &skipped.reason {
            SkipReason::NoData(reason) => eprintln!("  {}: {}", skipped.ticker, reason),
            SkipReason::InsufficientBars { bars } => eprintln!(
                "  {}: only {} bars, minimum {}",
                skipped.ticker, bars, settings.analysis.min_trend_bars
            ),
        }
    }

    match unwatched_tickers(&source, &settings.watchlist) {
        Ok(extra) if !extra.is_empty() => {
            eprintln!("  not on the watchlist: {}", extra.join(", "));
        }
        Ok(_) => {}
        Err(e) => eprintln!("  cannot list {}: {}", settings.paths.data_dir.display(), e),
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.*}", precision, v))
}

pub fn print_ranking(ranking: &[RankedEntry]) {
    println!(
        "{:>4}  {:<8} {:>6}  {:<5} {:>12} {:>8} {:>6}  {:<9}",
        "Rank", "Ticker", "Score", "Sig", "Price", "Chg%", "RSI", "Trend"
    );
    for e in ranking {
        println!(
            "{:>4}  {:<8} {:>6}  {:<5} {:>12.2} {:>+8.2} {:>6}  {:<9}{}",
            e.rank,
            e.ticker,
            e.score,
            e.signal,
            e.price,
            e.change_pct,
            fmt_opt(e.rsi, 1),
            e.trend,
            if e.is_excluded { "  EXCLUDED" } else { "" }
        );
        if let Some(reason) = &e.excluded_reason {
            println!("        excluded: {}", reason);
        }
    }
}

pub fn print_audit(pass: &AuditPass) {
    for r in &pass.results {
        match &r.message {
            Some(message) => println!("{:<8} {:<12} {}", r.ticker, r.status, message),
            None => println!(
                "{:<8} {:<12} result {:>7}%  max {}  min {}  days {}",
                r.ticker,
                r.status,
                fmt_opt(r.result_pct, 2),
                fmt_opt(r.max_price, 2),
                fmt_opt(r.min_price, 2),
                r.days_passed
            ),
        }
    }
    eprintln!(
        "\nAudited {} ({} skipped): {} completed, {} failed",
        pass.audited, pass.skipped, pass.completed, pass.failed
    );
}

pub fn print_statistics(stats: &ArchiveStatistics) {
    println!("\n=== Recommendation Statistics ===");
    println!("Total:        {}", stats.total);
    println!("Active:       {}", stats.active);
    println!("Completed:    {}", stats.completed);
    println!("Failed:       {}", stats.failed);
    println!("Success Rate: {:.2}%", stats.success_rate);
    println!("Avg Result:   {}%", fmt_opt(stats.avg_result, 2));
    println!("Max Result:   {}%", fmt_opt(stats.max_result, 2));
    println!("Min Result:   {}%", fmt_opt(stats.min_result, 2));
}

pub fn print_bundle(b: &AnalysisBundle) {
    println!("\n=== {} ===", b.ticker);
    println!(
        "Price: {:.2} ({:+.2}, {:+.2}%) over {} bars, {} to {}",
        b.current_price, b.price_change, b.price_change_pct, b.data_points, b.date_from, b.date_to
    );

    let i = &b.indicators;
    println!("\nIndicators:");
    println!(
        "  EMA 20/50/200:  {} / {} / {}",
        fmt_opt(i.ema_20, 2),
        fmt_opt(i.ema_50, 2),
        fmt_opt(i.ema_200, 2)
    );
    println!(
        "  RSI:            {} ({})",
        fmt_opt(i.rsi, 1),
        i.rsi_zone.map_or("n/a", |z| z.as_str())
    );
    println!(
        "  ADX short/long: {} / {}",
        fmt_opt(i.adx_short, 1),
        fmt_opt(i.adx_long, 1)
    );
    println!(
        "  MACD:           {} signal {} hist {}",
        fmt_opt(i.macd_line, 3),
        fmt_opt(i.macd_signal, 3),
        fmt_opt(i.macd_histogram, 3)
    );
    println!("  OBV:            {}", fmt_opt(i.obv, 0));
    println!(
        "  Bollinger:      {} / {} / {}",
        fmt_opt(i.bollinger_upper, 2),
        fmt_opt(i.bollinger_middle, 2),
        fmt_opt(i.bollinger_lower, 2)
    );

    let t = &b.trend;
    println!("\nTrend: {} ({})", t.direction, t.strength);
    println!(
        "  MA 20/50/200: {} / {} / {}   slope(30d) {}",
        fmt_opt(t.ma_20, 2),
        fmt_opt(t.ma_50, 2),
        fmt_opt(t.ma_200, 2),
        fmt_opt(t.slope_30d, 3)
    );

    let sr = &b.support_resistance;
    println!(
        "\nSupport {} [{}], resistance {} [{}]",
        fmt_opt(sr.support, 2),
        sr.support_source,
        fmt_opt(sr.resistance, 2),
        sr.resistance_source
    );
    if let Some(notes) = &sr.notes {
        println!("  notes: {}", notes);
    }

    if let Some(vp) = &b.volume_profile {
        println!(
            "\nVolume: total {}, avg {:.0}, max {}, min {}, {} | POC {:.2}",
            vp.total_volume,
            vp.avg_volume,
            vp.max_volume,
            vp.min_volume,
            vp.volume_trend.as_str(),
            vp.poc
        );
    }
}
