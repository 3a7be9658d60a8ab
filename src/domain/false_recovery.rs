//! Dead-cat bounce filter.
//!
//! Five independent checks each trigger, stay clear, or abstain when an
//! indicator they need is undefined. The rise is flagged as a false recovery
//! once at least [`MIN_TRIGGERED`] checks trigger.

use crate::domain::indicator::bollinger::band_position;
use crate::domain::indicator::sma::rolling_mean;
use crate::domain::indicator::IndicatorValue;
use crate::domain::indicator_set::IndicatorSet;
use crate::domain::ohlcv::PriceBar;
use crate::domain::settings::AnalysisConfig;

pub const MIN_TRIGGERED: usize = 2;

const WEAK_LONG_ADX: f64 = 15.0;
const STRONG_SHORT_ADX: f64 = 25.0;
const TRENDLESS_LONG_ADX: f64 = 20.0;
const EXHAUSTED_RSI: f64 = 80.0;
const UPPER_BAND_POSITION: f64 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    Triggered(String),
    Clear,
    Abstain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryCheck {
    pub name: &'static str,
    pub outcome: CheckOutcome,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FalseRecoveryVerdict {
    pub is_false_recovery: bool,
    pub reasons: Vec<String>,
    pub checks: Vec<RecoveryCheck>,
}

impl FalseRecoveryVerdict {
    pub fn abstained(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.outcome == CheckOutcome::Abstain)
            .count()
    }
}

/// The 2-of-5 rule over explicit outcomes.
pub fn compose_verdict(checks: Vec<RecoveryCheck>) -> FalseRecoveryVerdict {
    let reasons: Vec<String> = checks
        .iter()
        .filter_map(|c| match &c.outcome {
            CheckOutcome::Triggered(reason) => Some(reason.clone()),
            _ => None,
        })
        .collect();

    FalseRecoveryVerdict {
        is_false_recovery: reasons.len() >= MIN_TRIGGERED,
        reasons,
        checks,
    }
}

/// Below `min_recovery_bars` nothing is evaluated and the verdict is clear.
pub fn detect_false_recovery(
    bars: &[PriceBar],
    indicators: &IndicatorSet,
    config: &AnalysisConfig,
) -> FalseRecoveryVerdict {
    if bars.is_empty() || bars.len() < config.min_recovery_bars {
        return FalseRecoveryVerdict::default();
    }

    let last = bars.len() - 1;
    let close = bars[last].close;
    let lookback = config.divergence_lookback;
    let prior = last.checked_sub(lookback);
    let price_rose = prior.map(|p| close > bars[p].close);

    let adx_long = indicators.adx_long.last_primary();
    let adx_short = indicators.adx_short.last_primary();

    compose_verdict(vec![
        RecoveryCheck {
            name: "adx_divergence",
            outcome: check_adx_divergence(adx_long, adx_short),
        },
        RecoveryCheck {
            name: "macd_divergence",
            outcome: check_macd_divergence(indicators, price_rose, prior, lookback),
        },
        RecoveryCheck {
            name: "obv_confirmation",
            outcome: check_obv(indicators, price_rose, lookback),
        },
        RecoveryCheck {
            name: "rsi_exhaustion",
            outcome: check_rsi_exhaustion(indicators.rsi.last_primary(), adx_long),
        },
        RecoveryCheck {
            name: "bollinger_extreme",
            outcome: check_bollinger(indicators, close, adx_long),
        },
    ])
}

fn check_adx_divergence(adx_long: Option<f64>, adx_short: Option<f64>) -> CheckOutcome {
    let (Some(long), Some(short)) = (adx_long, adx_short) else {
        return CheckOutcome::Abstain;
    };
    if long < WEAK_LONG_ADX && short > STRONG_SHORT_ADX {
        CheckOutcome::Triggered(format!(
            "ADX divergence: long-horizon ADX {:.1} shows no sustained trend while short-horizon ADX is {:.1}",
            long, short
        ))
    } else {
        CheckOutcome::Clear
    }
}

fn check_macd_divergence(
    indicators: &IndicatorSet,
    price_rose: Option<bool>,
    prior: Option<usize>,
    lookback: usize,
) -> CheckOutcome {
    let (Some(rose), Some(prior)) = (price_rose, prior) else {
        return CheckOutcome::Abstain;
    };
    let (Some(now), Some(then)) = (
        indicators.macd.last_primary(),
        indicators.macd.primary_at(prior),
    ) else {
        return CheckOutcome::Abstain;
    };
    if rose && now < then {
        CheckOutcome::Triggered(format!(
            "MACD divergence: price is higher than {} bars ago but MACD fell from {:.3} to {:.3}",
            lookback, then, now
        ))
    } else {
        CheckOutcome::Clear
    }
}

fn check_obv(indicators: &IndicatorSet, price_rose: Option<bool>, lookback: usize) -> CheckOutcome {
    let Some(rose) = price_rose else {
        return CheckOutcome::Abstain;
    };
    let obv: Vec<f64> = indicators
        .obv
        .values
        .iter()
        .map(|p| p.value.map_or(0.0, |v| v.primary()))
        .collect();
    let means = rolling_mean(&obv, lookback);
    let (Some(&current), Some(&Some(average))) = (obv.last(), means.last()) else {
        return CheckOutcome::Abstain;
    };
    if rose && current < average {
        CheckOutcome::Triggered(format!(
            "OBV non-confirmation: price rose but OBV {:.0} is below its {}-bar average {:.0}",
            current, lookback, average
        ))
    } else {
        CheckOutcome::Clear
    }
}

fn check_rsi_exhaustion(rsi: Option<f64>, adx_long: Option<f64>) -> CheckOutcome {
    let (Some(rsi), Some(long)) = (rsi, adx_long) else {
        return CheckOutcome::Abstain;
    };
    if rsi > EXHAUSTED_RSI && long < TRENDLESS_LONG_ADX {
        CheckOutcome::Triggered(format!(
            "RSI exhaustion: RSI {:.1} is overbought without a long-horizon trend (ADX {:.1})",
            rsi, long
        ))
    } else {
        CheckOutcome::Clear
    }
}

fn check_bollinger(indicators: &IndicatorSet, close: f64, adx_long: Option<f64>) -> CheckOutcome {
    let Some(long) = adx_long else {
        return CheckOutcome::Abstain;
    };
    let Some(IndicatorValue::Bollinger { upper, lower, .. }) = indicators.bollinger.last_value()
    else {
        return CheckOutcome::Abstain;
    };
    let position = band_position(close, upper, lower);
    if position > UPPER_BAND_POSITION && long < TRENDLESS_LONG_ADX {
        CheckOutcome::Triggered(format!(
            "Bollinger extreme: price sits at {:.0}% of the band range without a long-horizon trend",
            position * 100.0
        ))
    } else {
        CheckOutcome::Clear
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn check(name: &'static str, outcome: CheckOutcome) -> RecoveryCheck {
        RecoveryCheck { name, outcome }
    }

    fn make_bars(closes: &[f64], half_range: f64) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close + half_range,
                low: close - half_range,
                close,
                volume: 1000,
            })
            .collect()
    }

    fn verdict_for(bars: &[PriceBar]) -> FalseRecoveryVerdict {
        let config = AnalysisConfig::default();
        let set = IndicatorSet::compute(bars, &config).unwrap();
        detect_false_recovery(bars, &set, &config)
    }

    #[test]
    fn single_trigger_is_not_false_recovery() {
        let verdict = compose_verdict(vec![
            check("a", CheckOutcome::Triggered("one".into())),
            check("b", CheckOutcome::Clear),
            check("c", CheckOutcome::Abstain),
            check("d", CheckOutcome::Clear),
            check("e", CheckOutcome::Clear),
        ]);
        assert!(!verdict.is_false_recovery);
        assert_eq!(verdict.reasons, vec!["one".to_string()]);
        assert_eq!(verdict.abstained(), 1);
    }

    #[test]
    fn two_triggers_flag() {
        let verdict = compose_verdict(vec![
            check("a", CheckOutcome::Triggered("one".into())),
            check("b", CheckOutcome::Triggered("two".into())),
            check("c", CheckOutcome::Clear),
        ]);
        assert!(verdict.is_false_recovery);
        assert_eq!(verdict.reasons.len(), 2);
    }

    #[test]
    fn abstentions_never_count() {
        let verdict = compose_verdict(vec![
            check("a", CheckOutcome::Abstain),
            check("b", CheckOutcome::Abstain),
            check("c", CheckOutcome::Abstain),
        ]);
        assert!(!verdict.is_false_recovery);
        assert!(verdict.reasons.is_empty());
    }

    #[test]
    fn insufficient_history_never_flags() {
        let closes: Vec<f64> = (0..49).map(|i| 100.0 + i as f64).collect();
        let verdict = verdict_for(&make_bars(&closes, 1.0));
        assert!(!verdict.is_false_recovery);
        assert!(verdict.reasons.is_empty());
        assert!(verdict.checks.is_empty());
    }

    #[test]
    fn undefined_long_adx_abstains() {
        // 60 bars: ADX(50) needs 100, so every check depending on it abstains.
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let verdict = verdict_for(&make_bars(&closes, 1.0));
        assert_eq!(verdict.checks.len(), 5);
        let abstaining: Vec<&str> = verdict
            .checks
            .iter()
            .filter(|c| c.outcome == CheckOutcome::Abstain)
            .map(|c| c.name)
            .collect();
        assert_eq!(
            abstaining,
            vec!["adx_divergence", "rsi_exhaustion", "bollinger_extreme"]
        );
    }

    #[test]
    fn steady_uptrend_is_genuine() {
        let closes: Vec<f64> = (0..150).map(|i| 100.0 + i as f64).collect();
        let verdict = verdict_for(&make_bars(&closes, 1.0));
        assert!(!verdict.is_false_recovery);
    }

    #[test]
    fn individual_checks() {
        assert!(matches!(
            check_adx_divergence(Some(10.0), Some(30.0)),
            CheckOutcome::Triggered(_)
        ));
        assert_eq!(check_adx_divergence(Some(16.0), Some(30.0)), CheckOutcome::Clear);
        assert_eq!(check_adx_divergence(None, Some(30.0)), CheckOutcome::Abstain);

        assert!(matches!(
            check_rsi_exhaustion(Some(85.0), Some(12.0)),
            CheckOutcome::Triggered(_)
        ));
        assert_eq!(check_rsi_exhaustion(Some(85.0), Some(25.0)), CheckOutcome::Clear);
        assert_eq!(check_rsi_exhaustion(None, Some(12.0)), CheckOutcome::Abstain);
    }

    /// Closes climb on thin volume and slip back on heavy volume.
    fn distribution_rally(count: usize) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut close = 100.0;
        (0..count)
            .map(|i| {
                let volume = if i == 0 {
                    1000
                } else if i % 2 == 1 {
                    close += 2.0;
                    100
                } else {
                    close -= 1.0;
                    1000
                };
                PriceBar {
                    date: start + chrono::Duration::days(i as i64),
                    open: close,
                    high: close + 0.5,
                    low: close - 0.5,
                    close,
                    volume,
                }
            })
            .collect()
    }

    #[test]
    fn obv_below_its_average_triggers_on_rising_price() {
        let bars = distribution_rally(60);
        let set = IndicatorSet::compute(&bars, &AnalysisConfig::default()).unwrap();

        match check_obv(&set, Some(true), 30) {
            CheckOutcome::Triggered(reason) => assert!(reason.contains("30-bar average")),
            other => panic!("expected trigger, got {:?}", other),
        }
        assert_eq!(check_obv(&set, Some(false), 30), CheckOutcome::Clear);
        assert_eq!(check_obv(&set, None, 30), CheckOutcome::Abstain);
    }

    #[test]
    fn obv_shorter_than_lookback_abstains() {
        let bars = distribution_rally(10);
        let set = IndicatorSet::compute(&bars, &AnalysisConfig::default()).unwrap();
        assert_eq!(check_obv(&set, Some(true), 30), CheckOutcome::Abstain);
    }
}
