//! Volume profile: traded volume bucketed by close price.
//!
//! The observed close range is split into `bins` equal-width buckets; the
//! maximum close lands in the last bucket. The Point of Control is the
//! midpoint of the first bucket holding the most volume.

use crate::domain::ohlcv::PriceBar;

pub const DEFAULT_BINS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeTrend {
    Increasing,
    Decreasing,
}

impl VolumeTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            VolumeTrend::Increasing => "increasing",
            VolumeTrend::Decreasing => "decreasing",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceLevelVolume {
    pub price_level: f64,
    pub volume: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeProfile {
    pub total_volume: i64,
    pub avg_volume: f64,
    pub max_volume: i64,
    pub min_volume: i64,
    pub volume_trend: VolumeTrend,
    pub levels: Vec<PriceLevelVolume>,
    pub poc: f64,
}

/// Returns `None` for an empty series or zero bins.
pub fn calculate_volume_profile(bars: &[PriceBar], bins: usize) -> Option<VolumeProfile> {
    let last = bars.last()?;
    if bins == 0 {
        return None;
    }

    let total_volume: i64 = bars.iter().map(|b| b.volume).sum();
    let avg_volume = total_volume as f64 / bars.len() as f64;
    let max_volume = bars.iter().map(|b| b.volume).max().unwrap_or(0);
    let min_volume = bars.iter().map(|b| b.volume).min().unwrap_or(0);
    let volume_trend = if last.volume as f64 > avg_volume {
        VolumeTrend::Increasing
    } else {
        VolumeTrend::Decreasing
    };

    let lo = bars.iter().map(|b| b.close).fold(f64::INFINITY, f64::min);
    let hi = bars.iter().map(|b| b.close).fold(f64::NEG_INFINITY, f64::max);

    let levels = if hi > lo {
        let width = (hi - lo) / bins as f64;
        let mut volumes = vec![0i64; bins];
        for bar in bars {
            let idx = (((bar.close - lo) / width) as usize).min(bins - 1);
            volumes[idx] += bar.volume;
        }
        volumes
            .into_iter()
            .enumerate()
            .map(|(i, volume)| PriceLevelVolume {
                price_level: lo + width * (i as f64 + 0.5),
                volume,
            })
            .collect()
    } else {
        vec![PriceLevelVolume {
            price_level: lo,
            volume: total_volume,
        }]
    };

    let mut poc_idx = 0;
    for (i, level) in levels.iter().enumerate() {
        if level.volume > levels[poc_idx].volume {
            poc_idx = i;
        }
    }
    let poc = levels[poc_idx].price_level;

    Some(VolumeProfile {
        total_volume,
        avg_volume,
        max_volume,
        min_volume,
        volume_trend,
        levels,
        poc,
    })
}
