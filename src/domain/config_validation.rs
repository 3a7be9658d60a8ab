//! Configuration validation.
//!
//! Validates every section before an analysis or audit pass runs.

use crate::domain::error::StockwatchError;
use crate::domain::levels::LevelOverride;
use crate::domain::watchlist::parse_tickers;
use crate::ports::config_port::ConfigPort;

const PERIOD_KEYS: [&str; 7] = [
    "rsi_period",
    "adx_short_period",
    "adx_long_period",
    "sr_window",
    "min_trend_bars",
    "min_recovery_bars",
    "divergence_lookback",
];

/// Trend direction compares the close with the 50-bar SMA, so neither
/// history guard may go below it.
pub const MIN_HISTORY_BARS: i64 = 50;

const HISTORY_KEYS: [&str; 2] = ["min_trend_bars", "min_recovery_bars"];

/// Full check used by `validate` and `analyze`: analysis parameters, a
/// non-empty watchlist and every watched ticker's level override.
pub fn validate_config(config: &dyn ConfigPort) -> Result<(), StockwatchError> {
    validate_analysis_config(config)?;
    let tickers = validate_watchlist(config)?;
    for ticker in &tickers {
        read_level_override(config, ticker)?;
    }
    Ok(())
}

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), StockwatchError> {
    validate_periods(config)?;
    validate_history_minimums(config)?;
    validate_volume_bins(config)?;
    validate_thresholds(config)?;
    Ok(())
}

fn validate_periods(config: &dyn ConfigPort) -> Result<(), StockwatchError> {
    for key in PERIOD_KEYS {
        if config.get_int("analysis", key, 1) < 1 {
            return Err(StockwatchError::ConfigInvalid {
                section: "analysis".to_string(),
                key: key.to_string(),
                reason: format!("{} must be at least 1", key),
            });
        }
    }
    Ok(())
}

fn validate_history_minimums(config: &dyn ConfigPort) -> Result<(), StockwatchError> {
    for key in HISTORY_KEYS {
        let bars = config.get_int("analysis", key, MIN_HISTORY_BARS);
        if bars < MIN_HISTORY_BARS {
            return Err(StockwatchError::ConfigInvalid {
                section: "analysis".to_string(),
                key: key.to_string(),
                reason: format!("{} must be at least {}, got {}", key, MIN_HISTORY_BARS, bars),
            });
        }
    }
    Ok(())
}

fn validate_volume_bins(config: &dyn ConfigPort) -> Result<(), StockwatchError> {
    if config.get_int("analysis", "volume_bins", 20) < 1 {
        return Err(StockwatchError::ConfigInvalid {
            section: "analysis".to_string(),
            key: "volume_bins".to_string(),
            reason: "volume_bins must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_thresholds(config: &dyn ConfigPort) -> Result<(), StockwatchError> {
    let buy = config.get_int("scoring", "buy_threshold", 60);
    let sell = config.get_int("scoring", "sell_threshold", -10);
    if sell >= buy {
        return Err(StockwatchError::ConfigInvalid {
            section: "scoring".to_string(),
            key: "sell_threshold".to_string(),
            reason: "sell_threshold must be below buy_threshold".to_string(),
        });
    }
    Ok(())
}

/// The parsed watchlist; missing or empty is an error.
pub fn validate_watchlist(config: &dyn ConfigPort) -> Result<Vec<String>, StockwatchError> {
    match config.get_string("watchlist", "tickers") {
        Some(s) if !s.trim().is_empty() => Ok(parse_tickers(&s)?),
        _ => Err(StockwatchError::ConfigMissing {
            section: "watchlist".to_string(),
            key: "tickers".to_string(),
        }),
    }
}

/// `[levels.TICKER]` as an override, `None` when the section sets no levels.
pub fn read_level_override(
    config: &dyn ConfigPort,
    ticker: &str,
) -> Result<Option<LevelOverride>, StockwatchError> {
    let section = format!("levels.{}", ticker.to_lowercase());
    let support = parse_level_list(config, &section, "support")?;
    let resistance = parse_level_list(config, &section, "resistance")?;
    if support.is_empty() && resistance.is_empty() {
        return Ok(None);
    }
    Ok(Some(LevelOverride {
        support,
        resistance,
        notes: config
            .get_string(&section, "notes")
            .filter(|n| !n.trim().is_empty()),
    }))
}

fn parse_level_list(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Vec<f64>, StockwatchError> {
    let Some(items) = config.get_list(section, key) else {
        return Ok(Vec::new());
    };
    items
        .iter()
        .map(|s| {
            s.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v > 0.0)
                .ok_or_else(|| StockwatchError::ConfigInvalid {
                    section: section.to_string(),
                    key: key.to_string(),
                    reason: format!("{:?} is not a positive price", s),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn minimal_config_passes() {
        let config = make_config("[watchlist]\ntickers = SBER,GAZP\n");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn analysis_config_does_not_need_watchlist() {
        let config = make_config("[paths]\narchive_file = a.json\n");
        assert!(validate_analysis_config(&config).is_ok());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn missing_watchlist_fails() {
        let config = make_config("[analysis]\nrsi_period = 14\n");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, StockwatchError::ConfigMissing { key, .. } if key == "tickers"));
    }

    #[test]
    fn duplicate_ticker_fails() {
        let config = make_config("[watchlist]\ntickers = SBER,sber\n");
        assert!(matches!(
            validate_config(&config).unwrap_err(),
            StockwatchError::ConfigInvalid { section, .. } if section == "watchlist"
        ));
    }

    #[test]
    fn zero_period_fails() {
        let config = make_config("[watchlist]\ntickers = SBER\n[analysis]\nadx_long_period = 0\n");
        let err = validate_config(&config).unwrap_err();
        assert!(
            matches!(err, StockwatchError::ConfigInvalid { key, .. } if key == "adx_long_period")
        );
    }

    #[test]
    fn zero_bins_fails() {
        let config = make_config("[watchlist]\ntickers = SBER\n[analysis]\nvolume_bins = 0\n");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, StockwatchError::ConfigInvalid { key, .. } if key == "volume_bins"));
    }

    #[test]
    fn inverted_thresholds_fail() {
        let config = make_config(
            "[watchlist]\ntickers = SBER\n[scoring]\nbuy_threshold = 10\nsell_threshold = 10\n",
        );
        let err = validate_config(&config).unwrap_err();
        assert!(
            matches!(err, StockwatchError::ConfigInvalid { key, .. } if key == "sell_threshold")
        );
    }

    #[test]
    fn level_override_parsed() {
        let config = make_config(
            "[levels.SBER]\nsupport = 280.5, 290\nresistance = 320\nnotes = weekly\n",
        );
        let o = read_level_override(&config, "SBER").unwrap().unwrap();
        assert_eq!(o.support, vec![280.5, 290.0]);
        assert_eq!(o.resistance, vec![320.0]);
        assert_eq!(o.notes.as_deref(), Some("weekly"));
        assert_eq!(read_level_override(&config, "GAZP").unwrap(), None);
    }

    #[test]
    fn bad_level_fails() {
        let config = make_config("[watchlist]\ntickers = SBER\n[levels.sber]\nsupport = abc\n");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, StockwatchError::ConfigInvalid { key, .. } if key == "support"));
    }

    #[test]
    fn short_history_guards_fail() {
        for key in ["min_trend_bars", "min_recovery_bars"] {
            let config = make_config(&format!("[analysis]\n{} = 20\n", key));
            let err = validate_analysis_config(&config).unwrap_err();
            assert!(
                matches!(err, StockwatchError::ConfigInvalid { key: ref k, .. } if k == key),
                "{key} accepted below the minimum"
            );
        }
    }

    #[test]
    fn longer_history_guards_pass() {
        let config = make_config("[analysis]\nmin_trend_bars = 50\nmin_recovery_bars = 120\n");
        assert!(validate_analysis_config(&config).is_ok());
    }
}
