//! Full indicator set for one instrument, recomputed on every analysis call.

use crate::domain::error::StockwatchError;
use crate::domain::indicator::rsi::RsiZone;
use crate::domain::indicator::{
    bollinger, calculate_adx, calculate_bollinger, calculate_ema, calculate_macd_default,
    calculate_obv, calculate_rsi, calculate_sma, IndicatorSeries, IndicatorValue,
};
use crate::domain::ohlcv::{validate_series, PriceBar};
use crate::domain::settings::AnalysisConfig;

#[derive(Debug, Clone)]
pub struct IndicatorSet {
    pub ema_20: IndicatorSeries,
    pub ema_50: IndicatorSeries,
    pub ema_200: IndicatorSeries,
    pub sma_20: IndicatorSeries,
    pub sma_50: IndicatorSeries,
    pub sma_200: IndicatorSeries,
    pub rsi: IndicatorSeries,
    pub adx_short: IndicatorSeries,
    pub adx_long: IndicatorSeries,
    pub macd: IndicatorSeries,
    pub obv: IndicatorSeries,
    pub bollinger: IndicatorSeries,
}

/// Latest value of every indicator, `None` where the history is too short.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSnapshot {
    pub ema_20: Option<f64>,
    pub ema_50: Option<f64>,
    pub ema_200: Option<f64>,
    pub rsi: Option<f64>,
    pub rsi_zone: Option<RsiZone>,
    pub adx_short: Option<f64>,
    pub adx_long: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub obv: Option<f64>,
    pub bollinger_upper: Option<f64>,
    pub bollinger_middle: Option<f64>,
    pub bollinger_lower: Option<f64>,
}

impl IndicatorSet {
    /// Rejects series that still carry duplicate dates, unsorted dates or
    /// non-positive volume.
    pub fn compute(bars: &[PriceBar], config: &AnalysisConfig) -> Result<Self, StockwatchError> {
        validate_series(bars)?;

        Ok(Self {
            ema_20: calculate_ema(bars, 20),
            ema_50: calculate_ema(bars, 50),
            ema_200: calculate_ema(bars, 200),
            sma_20: calculate_sma(bars, 20),
            sma_50: calculate_sma(bars, 50),
            sma_200: calculate_sma(bars, 200),
            rsi: calculate_rsi(bars, config.rsi_period),
            adx_short: calculate_adx(bars, config.adx_short_period),
            adx_long: calculate_adx(bars, config.adx_long_period),
            macd: calculate_macd_default(bars),
            obv: calculate_obv(bars),
            bollinger: calculate_bollinger(
                bars,
                bollinger::DEFAULT_PERIOD,
                bollinger::DEFAULT_MULT_X100,
            ),
        })
    }

    pub fn snapshot(&self) -> IndicatorSnapshot {
        let rsi = self.rsi.last_primary();
        let (macd_line, macd_signal, macd_histogram) = match self.macd.last_value() {
            Some(IndicatorValue::Macd {
                line,
                signal,
                histogram,
            }) => (Some(line), signal, histogram),
            _ => (None, None, None),
        };
        let (bollinger_upper, bollinger_middle, bollinger_lower) =
            match self.bollinger.last_value() {
                Some(IndicatorValue::Bollinger {
                    upper,
                    middle,
                    lower,
                }) => (Some(upper), Some(middle), Some(lower)),
                _ => (None, None, None),
            };

        IndicatorSnapshot {
            ema_20: self.ema_20.last_primary(),
            ema_50: self.ema_50.last_primary(),
            ema_200: self.ema_200.last_primary(),
            rsi,
            rsi_zone: rsi.map(RsiZone::classify),
            adx_short: self.adx_short.last_primary(),
            adx_long: self.adx_long.last_primary(),
            macd_line,
            macd_signal,
            macd_histogram,
            obv: self.obv.last_primary(),
            bollinger_upper,
            bollinger_middle,
            bollinger_lower,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(count: usize) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        (0..count)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.2;
                PriceBar {
                    date: start + chrono::Duration::days(i as i64),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1000 + (i as i64 % 7) * 100,
                }
            })
            .collect()
    }

    #[test]
    fn every_series_aligned_with_bars() {
        let bars = make_bars(120);
        let set = IndicatorSet::compute(&bars, &AnalysisConfig::default()).unwrap();
        for series in [
            &set.ema_20,
            &set.ema_50,
            &set.ema_200,
            &set.sma_20,
            &set.sma_50,
            &set.sma_200,
            &set.rsi,
            &set.adx_short,
            &set.adx_long,
            &set.macd,
            &set.obv,
            &set.bollinger,
        ] {
            assert_eq!(series.len(), bars.len(), "{}", series.indicator_type);
            for (point, bar) in series.values.iter().zip(&bars) {
                assert_eq!(point.date, bar.date);
            }
        }
    }

    #[test]
    fn short_history_leaves_long_windows_undefined() {
        let bars = make_bars(120);
        let snapshot = IndicatorSet::compute(&bars, &AnalysisConfig::default())
            .unwrap()
            .snapshot();
        assert!(snapshot.ema_200.is_none());
        // ADX(50) needs 100 bars
        assert!(snapshot.adx_long.is_some());
        assert!(snapshot.rsi.is_some());
        assert!(snapshot.rsi_zone.is_some());
        assert!(snapshot.macd_signal.is_some());
        assert!(snapshot.bollinger_upper.unwrap() >= snapshot.bollinger_lower.unwrap());
    }

    #[test]
    fn rejects_duplicate_dates() {
        let mut bars = make_bars(10);
        bars[5].date = bars[4].date;
        assert!(matches!(
            IndicatorSet::compute(&bars, &AnalysisConfig::default()),
            Err(StockwatchError::InvalidSeries { .. })
        ));
    }
}
