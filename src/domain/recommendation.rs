//! Recommendation records, the archive that owns them, and aggregate
//! statistics over it.

use crate::domain::error::StockwatchError;
use crate::domain::scoring::Signal;
use crate::domain::trend::TrendDirection;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Support default below entry when no support level is known.
pub const DEFAULT_SUPPORT_RATIO: f64 = 0.98;
/// Resistance default above entry when no resistance level is known.
pub const DEFAULT_RESISTANCE_RATIO: f64 = 1.05;
pub const STOP_BELOW_SUPPORT: f64 = 0.98;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecommendationStatus {
    #[default]
    Active,
    Completed,
    Failed,
}

impl fmt::Display for RecommendationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendationStatus::Active => write!(f, "ACTIVE"),
            RecommendationStatus::Completed => write!(f, "COMPLETED"),
            RecommendationStatus::Failed => write!(f, "FAILED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub issued_at: NaiveDateTime,
    pub ticker: String,
    pub signal: Signal,
    #[serde(default)]
    pub entry_price: Option<f64>,
    #[serde(default)]
    pub target1: Option<f64>,
    #[serde(default)]
    pub target2: Option<f64>,
    #[serde(default)]
    pub stop_loss: Option<f64>,
    #[serde(default)]
    pub rsi_at_issue: Option<f64>,
    #[serde(default)]
    pub trend_at_issue: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub status: RecommendationStatus,
    #[serde(default)]
    pub result_pct: Option<f64>,
}

/// The numeric fields an audit needs, all present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeLevels {
    pub entry_price: f64,
    pub target1: f64,
    pub target2: f64,
    pub stop_loss: f64,
}

impl Recommendation {
    pub fn issue_date(&self) -> NaiveDate {
        self.issued_at.date()
    }

    /// Identity used for duplicate suppression.
    pub fn id(&self) -> String {
        format!("{}_{}_{}", self.ticker, self.issue_date(), self.signal)
    }

    pub fn is_same_issue(&self, other: &Recommendation) -> bool {
        self.ticker == other.ticker
            && self.signal == other.signal
            && self.issue_date() == other.issue_date()
    }

    pub fn trade_levels(&self) -> Result<TradeLevels, StockwatchError> {
        let field = |value: Option<f64>, name: &str| {
            value.ok_or_else(|| StockwatchError::MalformedRecommendation {
                ticker: self.ticker.clone(),
                field: name.to_string(),
            })
        };
        Ok(TradeLevels {
            entry_price: field(self.entry_price, "entry_price")?,
            target1: field(self.target1, "target1")?,
            target2: field(self.target2, "target2")?,
            stop_loss: field(self.stop_loss, "stop_loss")?,
        })
    }
}

/// Build a BUY recommendation from the current price and detected levels.
pub fn synthesize_recommendation(
    ticker: &str,
    price: f64,
    support: Option<f64>,
    resistance: Option<f64>,
    rsi: Option<f64>,
    trend: TrendDirection,
    factors: &[String],
    issued_at: NaiveDateTime,
) -> Recommendation {
    let support = support.unwrap_or(price * DEFAULT_SUPPORT_RATIO);
    let resistance = resistance.unwrap_or(price * DEFAULT_RESISTANCE_RATIO);
    let range = resistance - support;

    Recommendation {
        issued_at,
        ticker: ticker.to_string(),
        signal: Signal::Buy,
        entry_price: Some(price),
        target1: Some(price + 0.5 * range),
        target2: Some(price + range),
        stop_loss: Some(STOP_BELOW_SUPPORT * support),
        rsi_at_issue: rsi,
        trend_at_issue: trend.as_str().to_uppercase(),
        comment: factors.first().cloned().unwrap_or_default(),
        status: RecommendationStatus::Active,
        result_pct: None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Archive {
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveStatistics {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub active: usize,
    pub success_rate: f64,
    pub avg_result: Option<f64>,
    pub max_result: Option<f64>,
    pub min_result: Option<f64>,
}

impl Archive {
    pub fn len(&self) -> usize {
        self.recommendations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }

    /// Returns false and stores nothing when the same ticker already has a
    /// recommendation with this signal on the same calendar day.
    pub fn add(&mut self, recommendation: Recommendation) -> bool {
        if self
            .recommendations
            .iter()
            .any(|r| r.is_same_issue(&recommendation))
        {
            return false;
        }
        self.recommendations.push(recommendation);
        true
    }

    pub fn active(&self) -> impl Iterator<Item = &Recommendation> {
        self.recommendations
            .iter()
            .filter(|r| r.status == RecommendationStatus::Active)
    }

    pub fn statistics(&self) -> ArchiveStatistics {
        let total = self.recommendations.len();
        let count = |status| {
            self.recommendations
                .iter()
                .filter(|r| r.status == status)
                .count()
        };
        let completed = count(RecommendationStatus::Completed);
        let failed = count(RecommendationStatus::Failed);
        let active = count(RecommendationStatus::Active);

        let results: Vec<f64> = self
            .recommendations
            .iter()
            .filter_map(|r| r.result_pct)
            .collect();
        let (avg_result, max_result, min_result) = if results.is_empty() {
            (None, None, None)
        } else {
            let avg = results.iter().sum::<f64>() / results.len() as f64;
            let max = results.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let min = results.iter().copied().fold(f64::INFINITY, f64::min);
            (Some(round2(avg)), Some(round2(max)), Some(round2(min)))
        };

        ArchiveStatistics {
            total,
            completed,
            failed,
            active,
            success_rate: if total == 0 {
                0.0
            } else {
                round2(completed as f64 / total as f64 * 100.0)
            },
            avg_result,
            max_result,
            min_result,
        }
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
