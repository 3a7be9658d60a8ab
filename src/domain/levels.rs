//! Support and resistance detection from local price extrema, with
//! per-side manual overrides.

use crate::domain::ohlcv::PriceBar;
use std::fmt;

/// Number of nearest candidates averaged into a level.
pub const NEAREST_CANDIDATES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSource {
    Auto,
    Manual,
}

impl fmt::Display for LevelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelSource::Auto => write!(f, "auto"),
            LevelSource::Manual => write!(f, "manual"),
        }
    }
}

/// Operator-supplied levels for one ticker. An empty list leaves that side
/// to the detector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelOverride {
    pub support: Vec<f64>,
    pub resistance: Vec<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SupportResistance {
    pub support: Option<f64>,
    pub resistance: Option<f64>,
    pub support_source: LevelSource,
    pub resistance_source: LevelSource,
    pub support_candidates: usize,
    pub resistance_candidates: usize,
    pub notes: Option<String>,
}

impl SupportResistance {
    /// Manual when either side came from an override.
    pub fn source(&self) -> LevelSource {
        if self.support_source == LevelSource::Manual
            || self.resistance_source == LevelSource::Manual
        {
            LevelSource::Manual
        } else {
            LevelSource::Auto
        }
    }
}

pub fn detect_levels(
    bars: &[PriceBar],
    window: usize,
    level_override: Option<&LevelOverride>,
) -> SupportResistance {
    let auto = find_auto_levels(bars, window);
    match level_override {
        Some(o) => apply_override(auto, o),
        None => auto,
    }
}

/// A bar inside the `window` margin is a resistance candidate when its high
/// is the maximum of the inclusive +/-window neighborhood and above the last
/// close; support mirrors this with lows below the last close.
pub fn find_auto_levels(bars: &[PriceBar], window: usize) -> SupportResistance {
    let mut result = SupportResistance {
        support: None,
        resistance: None,
        support_source: LevelSource::Auto,
        resistance_source: LevelSource::Auto,
        support_candidates: 0,
        resistance_candidates: 0,
        notes: None,
    };
    let Some(last) = bars.last() else {
        return result;
    };
    let current = last.close;

    let mut resistances = Vec::new();
    let mut supports = Vec::new();
    if bars.len() > 2 * window {
        for i in window..bars.len() - window {
            let neighborhood = &bars[i - window..=i + window];
            let max_high = neighborhood
                .iter()
                .map(|b| b.high)
                .fold(f64::NEG_INFINITY, f64::max);
            let min_low = neighborhood
                .iter()
                .map(|b| b.low)
                .fold(f64::INFINITY, f64::min);

            if bars[i].high == max_high && bars[i].high > current {
                resistances.push(bars[i].high);
            }
            if bars[i].low == min_low && bars[i].low < current {
                supports.push(bars[i].low);
            }
        }
    }

    result.resistance_candidates = resistances.len();
    result.support_candidates = supports.len();

    resistances.sort_by(|a, b| a.total_cmp(b));
    supports.sort_by(|a, b| b.total_cmp(a));

    result.resistance = nearest_mean(&resistances).or_else(|| {
        bars.iter()
            .map(|b| b.high)
            .filter(|&h| h > current)
            .min_by(|a, b| a.total_cmp(b))
    });
    result.support = nearest_mean(&supports).or_else(|| {
        bars.iter()
            .map(|b| b.low)
            .filter(|&l| l < current)
            .max_by(|a, b| a.total_cmp(b))
    });

    result
}

/// Each side with a non-empty override list is replaced by that list's mean.
pub fn apply_override(mut levels: SupportResistance, o: &LevelOverride) -> SupportResistance {
    if let Some(mean) = mean(&o.support) {
        levels.support = Some(mean);
        levels.support_source = LevelSource::Manual;
    }
    if let Some(mean) = mean(&o.resistance) {
        levels.resistance = Some(mean);
        levels.resistance_source = LevelSource::Manual;
    }
    if levels.source() == LevelSource::Manual {
        levels.notes = o.notes.clone();
    }
    levels
}

// Input is sorted nearest-first.
fn nearest_mean(sorted: &[f64]) -> Option<f64> {
    mean(&sorted[..sorted.len().min(NEAREST_CANDIDATES)])
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
