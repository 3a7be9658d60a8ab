//! Analysis, ranking and archive passes.
//!
//! A pass loads the archive once, applies every mutation in memory and saves
//! once. Instrument-level failures are collected and never abort the batch.

use crate::domain::audit::{audit_all, AuditPass};
use crate::domain::error::StockwatchError;
use crate::domain::false_recovery::{detect_false_recovery, FalseRecoveryVerdict};
use crate::domain::indicator::volume_profile::{calculate_volume_profile, VolumeProfile};
use crate::domain::indicator_set::{IndicatorSet, IndicatorSnapshot};
use crate::domain::levels::{detect_levels, LevelOverride, SupportResistance};
use crate::domain::ohlcv::PriceBar;
use crate::domain::recommendation::{synthesize_recommendation, Recommendation};
use crate::domain::scoring::{rank, score_instrument, RankedEntry, Score, Signal};
use crate::domain::settings::{AnalysisConfig, Settings};
use crate::domain::trend::{assess_trend, TrendAssessment};
use crate::ports::archive_port::ArchiveStore;
use crate::ports::data_port::PriceSource;
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisBundle {
    pub ticker: String,
    pub current_price: f64,
    pub price_change: f64,
    pub price_change_pct: f64,
    pub data_points: usize,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub indicators: IndicatorSnapshot,
    pub trend: TrendAssessment,
    pub support_resistance: SupportResistance,
    pub volume_profile: Option<VolumeProfile>,
}

/// Bundle plus its score and, for BUY candidates, the false-recovery verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentAnalysis {
    pub bundle: AnalysisBundle,
    pub score: Score,
    pub false_recovery: Option<FalseRecoveryVerdict>,
}

impl InstrumentAnalysis {
    pub fn is_excluded(&self) -> bool {
        self.false_recovery
            .as_ref()
            .is_some_and(|v| v.is_false_recovery)
    }

    pub fn ranked_entry(&self) -> RankedEntry {
        let excluded_reason = self
            .false_recovery
            .as_ref()
            .filter(|v| v.is_false_recovery)
            .map(|v| v.reasons.join("; "));
        RankedEntry {
            ticker: self.bundle.ticker.clone(),
            score: self.score.value,
            signal: self.score.signal,
            rank: 0,
            factors: self.score.factors.clone(),
            is_excluded: excluded_reason.is_some(),
            excluded_reason,
            price: self.bundle.current_price,
            change_pct: self.bundle.price_change_pct,
            rsi: self.bundle.indicators.rsi,
            trend: self.bundle.trend.direction,
        }
    }

    /// The recommendation this analysis would emit: only non-excluded BUYs.
    pub fn draft_recommendation(&self, issued_at: NaiveDateTime) -> Option<Recommendation> {
        if self.score.signal != Signal::Buy || self.is_excluded() {
            return None;
        }
        let b = &self.bundle;
        Some(synthesize_recommendation(
            &b.ticker,
            b.current_price,
            b.support_resistance.support,
            b.support_resistance.resistance,
            b.indicators.rsi,
            b.trend.direction,
            &self.score.factors,
            issued_at,
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentFailure {
    pub ticker: String,
    pub reason: String,
}

fn analyze_with_set(
    ticker: &str,
    bars: &[PriceBar],
    config: &AnalysisConfig,
    level_override: Option<&LevelOverride>,
) -> Result<(AnalysisBundle, IndicatorSet), StockwatchError> {
    let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
        return Err(StockwatchError::NoData {
            ticker: ticker.to_string(),
        });
    };
    let indicators = IndicatorSet::compute(bars, config)?;

    let price_change = last.close - first.close;
    let price_change_pct = if first.close != 0.0 {
        (last.close / first.close - 1.0) * 100.0
    } else {
        0.0
    };

    let bundle = AnalysisBundle {
        ticker: ticker.to_string(),
        current_price: last.close,
        price_change,
        price_change_pct,
        data_points: bars.len(),
        date_from: first.date,
        date_to: last.date,
        indicators: indicators.snapshot(),
        trend: assess_trend(bars, &indicators, config),
        support_resistance: detect_levels(bars, config.sr_window, level_override),
        volume_profile: calculate_volume_profile(bars, config.volume_bins),
    };
    Ok((bundle, indicators))
}

pub fn analyze_instrument(
    ticker: &str,
    bars: &[PriceBar],
    config: &AnalysisConfig,
    level_override: Option<&LevelOverride>,
) -> Result<AnalysisBundle, StockwatchError> {
    analyze_with_set(ticker, bars, config, level_override).map(|(bundle, _)| bundle)
}

/// Analyse, score and, for BUY candidates, run the false-recovery filter.
pub fn evaluate_instrument(
    ticker: &str,
    bars: &[PriceBar],
    settings: &Settings,
) -> Result<InstrumentAnalysis, StockwatchError> {
    let (bundle, indicators) = analyze_with_set(
        ticker,
        bars,
        &settings.analysis,
        settings.level_override(ticker),
    )?;
    let score = score_instrument(
        &bundle.trend,
        bundle.indicators.rsi,
        bundle.volume_profile.as_ref().map(|p| p.volume_trend),
        &settings.scoring,
    );

    let false_recovery = if score.signal == Signal::Buy {
        let verdict = detect_false_recovery(bars, &indicators, &settings.analysis);
        if verdict.is_false_recovery {
            info!(ticker, reasons = ?verdict.reasons, "BUY excluded as false recovery");
        }
        Some(verdict)
    } else {
        None
    };

    Ok(InstrumentAnalysis {
        bundle,
        score,
        false_recovery,
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportPass {
    pub ranking: Vec<RankedEntry>,
    pub analyses: Vec<InstrumentAnalysis>,
    pub drafts: Vec<Recommendation>,
    pub failures: Vec<InstrumentFailure>,
}

impl ReportPass {
    pub fn succeeded(&self) -> usize {
        self.analyses.len()
    }
}

/// Analyse and rank `tickers`. Drafts hold the recommendations to emit; the
/// archive is not touched here.
pub fn run_report_pass(
    tickers: &[String],
    source: &dyn PriceSource,
    settings: &Settings,
    issued_at: NaiveDateTime,
) -> ReportPass {
    let mut pass = ReportPass::default();

    for ticker in tickers {
        let outcome = source
            .fetch_bars(ticker)
            .and_then(|bars| evaluate_instrument(ticker, &bars, settings));
        match outcome {
            Ok(analysis) => {
                debug!(
                    ticker = %ticker,
                    score = analysis.score.value,
                    signal = %analysis.score.signal,
                    "analysed"
                );
                pass.analyses.push(analysis);
            }
            Err(e) => {
                warn!(ticker = %ticker, "skipping instrument: {e}");
                pass.failures.push(InstrumentFailure {
                    ticker: ticker.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    pass.ranking = rank(pass.analyses.iter().map(|a| a.ranked_entry()).collect());
    pass.drafts = pass
        .analyses
        .iter()
        .filter_map(|a| a.draft_recommendation(issued_at))
        .collect();

    info!(
        analysed = pass.analyses.len(),
        failed = pass.failures.len(),
        drafts = pass.drafts.len(),
        "report pass finished"
    );
    pass
}

/// Load, add every draft (same-day duplicates are skipped), save once.
/// Returns how many were stored.
pub fn record_recommendations(
    store: &dyn ArchiveStore,
    drafts: Vec<Recommendation>,
) -> Result<usize, StockwatchError> {
    let mut archive = store.load()?;
    let mut added = 0;
    for draft in drafts {
        let id = draft.id();
        if archive.add(draft) {
            added += 1;
        } else {
            debug!(id = %id, "duplicate recommendation skipped");
        }
    }
    store.save(&archive)?;
    info!(added, total = archive.len(), "archive saved");
    Ok(added)
}

/// Load, audit all ACTIVE records, save once.
pub fn run_audit_pass(
    store: &dyn ArchiveStore,
    source: &dyn PriceSource,
) -> Result<AuditPass, StockwatchError> {
    let mut archive = store.load()?;
    let pass = audit_all(&mut archive, source);
    store.save(&archive)?;
    Ok(pass)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(count: usize) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..count)
            .map(|i| {
                let close = 100.0 + i as f64;
                PriceBar {
                    date: start + chrono::Duration::days(i as i64),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1000,
                }
            })
            .collect()
    }

    #[test]
    fn bundle_reports_price_change_and_range() {
        let bars = make_bars(60);
        let bundle = analyze_instrument("SBER", &bars, &AnalysisConfig::default(), None).unwrap();
        assert_eq!(bundle.data_points, 60);
        assert!((bundle.current_price - 159.0).abs() < f64::EPSILON);
        assert!((bundle.price_change - 59.0).abs() < f64::EPSILON);
        assert!((bundle.price_change_pct - 59.0).abs() < 1e-9);
        assert_eq!(bundle.date_from, bars[0].date);
        assert_eq!(bundle.date_to, bars[59].date);
        assert!(bundle.volume_profile.is_some());
    }

    #[test]
    fn empty_series_is_no_data() {
        assert!(matches!(
            analyze_instrument("SBER", &[], &AnalysisConfig::default(), None),
            Err(StockwatchError::NoData { .. })
        ));
    }

    #[test]
    fn short_series_still_analyses_with_unknowns() {
        let bundle =
            analyze_instrument("SBER", &make_bars(10), &AnalysisConfig::default(), None).unwrap();
        assert_eq!(bundle.trend, TrendAssessment::unknown());
        assert!(bundle.indicators.rsi.is_none());
    }

    #[test]
    fn non_buy_skips_filter_and_draft() {
        let analysis = evaluate_instrument("SBER", &make_bars(10), &Settings::default()).unwrap();
        assert_ne!(analysis.score.signal, Signal::Buy);
        assert!(analysis.false_recovery.is_none());
        let issued = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert!(analysis.draft_recommendation(issued).is_none());
        assert!(!analysis.ranked_entry().is_excluded);
    }
}
