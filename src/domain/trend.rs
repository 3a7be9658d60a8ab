//! Trend classification from short-horizon ADX and moving averages.

use crate::domain::indicator_set::IndicatorSet;
use crate::domain::ohlcv::PriceBar;
use crate::domain::settings::AnalysisConfig;
use std::fmt;

pub const STRONG_ADX: f64 = 25.0;
pub const MODERATE_ADX: f64 = 20.0;
pub const SLOPE_WINDOW: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Up,
    Down,
    Sideways,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendStrength {
    Strong,
    Moderate,
    Weak,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
            TrendDirection::Sideways => "sideways",
        }
    }
}

impl TrendStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendStrength::Strong => "strong",
            TrendStrength::Moderate => "moderate",
            TrendStrength::Weak => "weak",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for TrendStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendAssessment {
    pub direction: TrendDirection,
    pub strength: TrendStrength,
    pub adx_value: Option<f64>,
    pub ma_20: Option<f64>,
    pub ma_50: Option<f64>,
    pub ma_200: Option<f64>,
    pub above_ma20: bool,
    pub above_ma50: bool,
    pub slope_30d: Option<f64>,
}

impl TrendAssessment {
    /// Result for histories too short to classify.
    pub fn unknown() -> Self {
        Self {
            direction: TrendDirection::Sideways,
            strength: TrendStrength::Weak,
            adx_value: None,
            ma_20: None,
            ma_50: None,
            ma_200: None,
            above_ma20: false,
            above_ma50: false,
            slope_30d: None,
        }
    }
}

/// First match wins: ADX > 25 strong, 20 < ADX <= 25 moderate, otherwise
/// weak and sideways. Direction for strong/moderate is close vs MA50.
pub fn assess_trend(
    bars: &[PriceBar],
    indicators: &IndicatorSet,
    config: &AnalysisConfig,
) -> TrendAssessment {
    let Some(last) = bars.last() else {
        return TrendAssessment::unknown();
    };
    if bars.len() < config.min_trend_bars {
        return TrendAssessment::unknown();
    }

    let close = last.close;
    let adx_value = indicators.adx_short.last_primary();
    let ma_20 = indicators.sma_20.last_primary();
    let ma_50 = indicators.sma_50.last_primary();
    let ma_200 = indicators.sma_200.last_primary();

    let strength = match adx_value {
        Some(adx) if adx > STRONG_ADX => TrendStrength::Strong,
        Some(adx) if adx > MODERATE_ADX => TrendStrength::Moderate,
        _ => TrendStrength::Weak,
    };
    let direction = match (strength, ma_50) {
        (TrendStrength::Weak, _) | (_, None) => TrendDirection::Sideways,
        (_, Some(ma)) if close > ma => TrendDirection::Up,
        _ => TrendDirection::Down,
    };

    TrendAssessment {
        direction,
        strength,
        adx_value,
        ma_20,
        ma_50,
        ma_200,
        above_ma20: ma_20.is_some_and(|ma| close > ma),
        above_ma50: ma_50.is_some_and(|ma| close > ma),
        slope_30d: closing_slope(bars, SLOPE_WINDOW),
    }
}

/// Least-squares slope of the last `window` closes, price units per bar.
pub fn closing_slope(bars: &[PriceBar], window: usize) -> Option<f64> {
    let n = window.min(bars.len());
    if n < 2 {
        return None;
    }
    let tail = &bars[bars.len() - n..];
    let mean_x = (n - 1) as f64 / 2.0;
    let mean_y = tail.iter().map(|b| b.close).sum::<f64>() / n as f64;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, bar) in tail.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (bar.close - mean_y);
        den += dx * dx;
    }
    Some(num / den)
}
