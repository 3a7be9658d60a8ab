//! Additive instrument scoring, signal classification and ranking.

use crate::domain::indicator::volume_profile::VolumeTrend;
use crate::domain::settings::ScoringConfig;
use crate::domain::trend::{TrendAssessment, TrendDirection, TrendStrength};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Hold,
    Sell,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Hold => "HOLD",
            Signal::Sell => "SELL",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub value: i32,
    pub signal: Signal,
    pub factors: Vec<String>,
}

/// Score >= buy threshold is BUY, <= sell threshold is SELL, HOLD between.
pub fn classify(score: i32, config: &ScoringConfig) -> Signal {
    if score >= config.buy_threshold {
        Signal::Buy
    } else if score <= config.sell_threshold {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

pub fn score_instrument(
    trend: &TrendAssessment,
    rsi: Option<f64>,
    volume_trend: Option<VolumeTrend>,
    config: &ScoringConfig,
) -> Score {
    let mut value = 0;
    let mut factors = Vec::new();

    match (trend.direction, trend.strength) {
        (TrendDirection::Up, TrendStrength::Strong) => {
            value += 40;
            factors.push("Strong uptrend (+40)".to_string());
        }
        (TrendDirection::Up, _) => {
            value += 25;
            factors.push("Uptrend (+25)".to_string());
        }
        (TrendDirection::Down, TrendStrength::Strong) => {
            value -= 20;
            factors.push("Strong downtrend (-20)".to_string());
        }
        _ => {}
    }

    if let Some(rsi) = rsi {
        if rsi < 30.0 {
            value += 30;
            factors.push(format!("RSI oversold at {:.1} (+30)", rsi));
        } else if rsi > 70.0 {
            value -= 15;
            factors.push(format!("RSI overbought at {:.1} (-15)", rsi));
        } else if rsi > 30.0 && rsi < 70.0 {
            value += 20;
            factors.push(format!("RSI neutral at {:.1} (+20)", rsi));
        }
    }

    if trend.above_ma20 && trend.above_ma50 {
        value += 20;
        factors.push("Price above MA20 and MA50 (+20)".to_string());
    }

    if volume_trend == Some(VolumeTrend::Increasing) {
        value += 10;
        factors.push("Volume increasing (+10)".to_string());
    }

    Score {
        value,
        signal: classify(value, config),
        factors,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub ticker: String,
    pub score: i32,
    pub signal: Signal,
    pub rank: usize,
    pub factors: Vec<String>,
    pub is_excluded: bool,
    pub excluded_reason: Option<String>,
    pub price: f64,
    pub change_pct: f64,
    pub rsi: Option<f64>,
    pub trend: TrendDirection,
}

/// Sort by score descending, keeping input order among equal scores, and
/// number the result 1..K.
pub fn rank(mut entries: Vec<RankedEntry>) -> Vec<RankedEntry> {
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i + 1;
    }
    entries
}
