//! Explicit configuration value objects handed to the analysis passes.

use crate::domain::levels::LevelOverride;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub rsi_period: usize,
    pub adx_short_period: usize,
    pub adx_long_period: usize,
    pub volume_bins: usize,
    pub sr_window: usize,
    pub min_trend_bars: usize,
    pub min_recovery_bars: usize,
    pub divergence_lookback: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            adx_short_period: 14,
            adx_long_period: 50,
            volume_bins: 20,
            sr_window: 20,
            min_trend_bars: 50,
            min_recovery_bars: 50,
            divergence_lookback: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringConfig {
    pub buy_threshold: i32,
    pub sell_threshold: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            buy_threshold: 60,
            sell_threshold: -10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub archive_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("stock_data"),
            archive_file: PathBuf::from("recommendations_archive.json"),
        }
    }
}

/// Everything one invocation needs, resolved up front from the config file.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub paths: PathsConfig,
    pub analysis: AnalysisConfig,
    pub scoring: ScoringConfig,
    pub watchlist: Vec<String>,
    pub levels: HashMap<String, LevelOverride>,
}

impl Settings {
    pub fn level_override(&self, ticker: &str) -> Option<&LevelOverride> {
        self.levels.get(&ticker.to_uppercase())
    }
}
