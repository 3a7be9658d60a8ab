//! Retroactive audit of BUY recommendations against the price path that
//! followed them.
//!
//! Only bars dated strictly after the issue day are scanned. Each threshold
//! flips once, on its first touch. Resolution precedence is stop-loss, then
//! target2, then target1, otherwise the position is still in progress.

use crate::domain::error::StockwatchError;
use crate::domain::ohlcv::PriceBar;
use crate::domain::recommendation::{round2, Archive, Recommendation, RecommendationStatus};
use crate::domain::scoring::Signal;
use crate::ports::data_port::PriceSource;
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    Target1Hit,
    Target2Hit,
    StoppedOut,
    InProgress,
    NoData,
    Error,
    NotApplicable,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Target1Hit => "TARGET1_HIT",
            AuditStatus::Target2Hit => "TARGET2_HIT",
            AuditStatus::StoppedOut => "STOPPED_OUT",
            AuditStatus::InProgress => "IN_PROGRESS",
            AuditStatus::NoData => "NO_DATA",
            AuditStatus::Error => "ERROR",
            AuditStatus::NotApplicable => "N/A",
        }
    }

    /// NO_DATA and ERROR outcomes leave the stored record untouched.
    pub fn is_skipped(&self) -> bool {
        matches!(self, AuditStatus::NoData | AuditStatus::Error)
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditResult {
    pub ticker: String,
    pub signal: Signal,
    pub status: AuditStatus,
    pub entry_price: Option<f64>,
    pub current_price: Option<f64>,
    pub actual_entry_price: Option<f64>,
    pub hit_target1: bool,
    pub hit_target2: bool,
    pub hit_stop_loss: bool,
    pub target1_date: Option<NaiveDate>,
    pub target2_date: Option<NaiveDate>,
    pub stop_loss_date: Option<NaiveDate>,
    pub result_pct: Option<f64>,
    pub max_price: Option<f64>,
    pub min_price: Option<f64>,
    pub days_passed: usize,
    pub message: Option<String>,
}

impl AuditResult {
    fn skipped(rec: &Recommendation, status: AuditStatus, message: String) -> Self {
        Self {
            ticker: rec.ticker.clone(),
            signal: rec.signal,
            status,
            entry_price: rec.entry_price,
            current_price: None,
            actual_entry_price: None,
            hit_target1: false,
            hit_target2: false,
            hit_stop_loss: false,
            target1_date: None,
            target2_date: None,
            stop_loss_date: None,
            result_pct: None,
            max_price: None,
            min_price: None,
            days_passed: 0,
            message: Some(message),
        }
    }

    pub fn error(rec: &Recommendation, err: &StockwatchError) -> Self {
        Self::skipped(rec, AuditStatus::Error, err.to_string())
    }
}

/// First bar on or after the issue date within the same calendar year.
pub fn reference_bar(bars: &[PriceBar], issue_date: NaiveDate) -> Option<&PriceBar> {
    bars.iter()
        .find(|b| b.date >= issue_date && b.date.year() == issue_date.year())
}

pub fn audit_recommendation(rec: &Recommendation, bars: &[PriceBar]) -> AuditResult {
    let issue_date = rec.issue_date();
    let after: Vec<&PriceBar> = bars.iter().filter(|b| b.date > issue_date).collect();
    let Some(latest) = after.last() else {
        return AuditResult::skipped(
            rec,
            AuditStatus::NoData,
            format!("no bars after {}", issue_date),
        );
    };

    let mut result = AuditResult::skipped(rec, AuditStatus::NotApplicable, String::new());
    result.message = None;
    result.current_price = Some(latest.close);
    result.actual_entry_price = reference_bar(bars, issue_date).map(|b| b.close);
    result.days_passed = after.len();
    result.max_price = Some(round2(
        after.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max),
    ));
    result.min_price = Some(round2(
        after.iter().map(|b| b.low).fold(f64::INFINITY, f64::min),
    ));

    if rec.signal != Signal::Buy {
        result.result_pct = Some(0.0);
        return result;
    }

    let levels = match rec.trade_levels() {
        Ok(levels) => levels,
        Err(e) => return AuditResult::error(rec, &e),
    };

    for bar in &after {
        if !result.hit_target1 && bar.high >= levels.target1 {
            result.hit_target1 = true;
            result.target1_date = Some(bar.date);
        }
        if !result.hit_target2 && bar.high >= levels.target2 {
            result.hit_target2 = true;
            result.target2_date = Some(bar.date);
        }
        if !result.hit_stop_loss && bar.low <= levels.stop_loss {
            result.hit_stop_loss = true;
            result.stop_loss_date = Some(bar.date);
        }
    }

    let (status, exit_price) = if result.hit_stop_loss {
        (AuditStatus::StoppedOut, levels.stop_loss)
    } else if result.hit_target2 {
        (AuditStatus::Target2Hit, levels.target2)
    } else if result.hit_target1 {
        (AuditStatus::Target1Hit, levels.target1)
    } else {
        (AuditStatus::InProgress, latest.close)
    };
    result.status = status;
    result.result_pct = Some(round2(
        (exit_price - levels.entry_price) / levels.entry_price * 100.0,
    ));
    result
}

/// Terminal transitions only: TARGET2_HIT completes, STOPPED_OUT fails.
/// Returns the new status when the record changed.
pub fn apply_outcome(
    rec: &mut Recommendation,
    result: &AuditResult,
) -> Option<RecommendationStatus> {
    let new_status = match result.status {
        AuditStatus::Target2Hit => RecommendationStatus::Completed,
        AuditStatus::StoppedOut => RecommendationStatus::Failed,
        _ => return None,
    };
    rec.status = new_status;
    rec.result_pct = result.result_pct;
    Some(new_status)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditPass {
    pub results: Vec<AuditResult>,
    pub audited: usize,
    pub skipped: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Audit every ACTIVE recommendation in place. Price series are fetched once
/// per ticker; a ticker whose data cannot be read yields ERROR results for its
/// records and the pass moves on.
pub fn audit_all(archive: &mut Archive, source: &dyn PriceSource) -> AuditPass {
    let mut pass = AuditPass::default();
    let mut series: HashMap<String, Result<Vec<PriceBar>, StockwatchError>> = HashMap::new();

    for rec in archive
        .recommendations
        .iter_mut()
        .filter(|r| r.status == RecommendationStatus::Active)
    {
        let bars = series
            .entry(rec.ticker.clone())
            .or_insert_with(|| source.fetch_bars(&rec.ticker));

        let result = match bars {
            Ok(bars) => audit_recommendation(rec, bars),
            Err(e) => AuditResult::error(rec, e),
        };

        if result.status.is_skipped() {
            warn!(
                ticker = %rec.ticker,
                status = %result.status,
                "audit skipped: {}",
                result.message.as_deref().unwrap_or("")
            );
            pass.skipped += 1;
        } else {
            pass.audited += 1;
            match apply_outcome(rec, &result) {
                Some(RecommendationStatus::Completed) => pass.completed += 1,
                Some(RecommendationStatus::Failed) => pass.failed += 1,
                _ => {}
            }
            debug!(ticker = %rec.ticker, status = %result.status, "audited");
        }
        pass.results.push(result);
    }

    info!(
        audited = pass.audited,
        skipped = pass.skipped,
        completed = pass.completed,
        failed = pass.failed,
        "audit pass finished"
    );
    pass
}
