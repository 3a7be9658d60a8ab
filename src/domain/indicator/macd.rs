//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! The line is defined once both EMAs are; signal and histogram need a
//! further (signal - 1) line values.

use crate::domain::indicator::ema::ema_values;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PriceBar;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    bars: &[PriceBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };
    if bars.is_empty() || fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries::empty(indicator_type);
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ema_fast = ema_values(&closes, fast);
    let ema_slow = ema_values(&closes, slow);

    let macd_line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let mut signal_line: Vec<Option<f64>> = vec![None; bars.len()];
    if let Some(start) = macd_line.iter().position(Option::is_some) {
        let defined: Vec<f64> = macd_line[start..].iter().flatten().copied().collect();
        for (offset, v) in ema_values(&defined, signal_period).into_iter().enumerate() {
            signal_line[start + offset] = v;
        }
    }

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| IndicatorPoint {
            date: bar.date,
            value: macd_line[i].map(|line| IndicatorValue::Macd {
                line,
                signal: signal_line[i],
                histogram: signal_line[i].map(|s| line - s),
            }),
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

pub fn calculate_macd_default(bars: &[PriceBar]) -> IndicatorSeries {
    calculate_macd(bars, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
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
                    high: close,
                    low: close,
                    close,
                    volume: 1000,
                }
            })
            .collect()
    }

    #[test]
    fn macd_line_warmup_default() {
        let series = calculate_macd_default(&make_bars(40));

        assert_eq!(series.len(), 40);
        assert!(series.value_at(DEFAULT_SLOW - 2).is_none());
        assert!(series.value_at(DEFAULT_SLOW - 1).is_some());
    }

    #[test]
    fn macd_signal_warmup_default() {
        let series = calculate_macd_default(&make_bars(40));
        let signal_at = |i: usize| match series.value_at(i) {
            Some(IndicatorValue::Macd { signal, .. }) => signal,
            _ => None,
        };

        let first_signal = DEFAULT_SLOW - 1 + DEFAULT_SIGNAL - 1;
        assert!(signal_at(first_signal - 1).is_none());
        assert!(signal_at(first_signal).is_some());
    }

    #[test]
    fn macd_histogram_equals_line_minus_signal() {
        let series = calculate_macd_default(&make_bars(60));
        for point in &series.values {
            if let Some(IndicatorValue::Macd {
                line,
                signal: Some(signal),
                histogram: Some(histogram),
            }) = point.value
            {
                assert!((histogram - (line - signal)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn macd_rising_prices_positive_line() {
        let series = calculate_macd_default(&make_bars(80));
        assert!(series.last_primary().unwrap() > 0.0);
    }

    #[test]
    fn macd_line_is_ema_fast_minus_ema_slow() {
        let bars = make_bars(10);
        let series = calculate_macd(&bars, 3, 5, 2);
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let fast = ema_values(&closes, 3);
        let slow = ema_values(&closes, 5);

        for i in 4..10 {
            let expected = fast[i].unwrap() - slow[i].unwrap();
            assert!((series.primary_at(i).unwrap() - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn macd_zero_period_or_empty() {
        let bars = make_bars(3);
        assert!(calculate_macd(&bars, 0, 26, 9).is_empty());
        assert!(calculate_macd(&bars, 12, 0, 9).is_empty());
        assert!(calculate_macd(&bars, 12, 26, 0).is_empty());
        assert!(calculate_macd_default(&[]).is_empty());
    }

    #[test]
    fn macd_type_carries_parameters() {
        let series = calculate_macd(&make_bars(3), 5, 10, 3);
        assert_eq!(
            series.indicator_type,
            IndicatorType::Macd {
                fast: 5,
                slow: 10,
                signal: 3
            }
        );
    }
}
