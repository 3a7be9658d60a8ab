//! On-balance volume.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PriceBar;
use std::cmp::Ordering;

/// Running volume total signed by close direction. The first bar seeds the
/// total with its own volume and an unchanged close carries it forward, so
/// every point is defined.
pub fn calculate_obv(bars: &[PriceBar]) -> IndicatorSeries {
    let mut total = 0.0;
    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let volume = bar.volume as f64;
            let direction = i
                .checked_sub(1)
                .map(|prev| bar.close.partial_cmp(&bars[prev].close));
            total = match direction {
                None => volume,
                Some(Some(Ordering::Greater)) => total + volume,
                Some(Some(Ordering::Less)) => total - volume,
                Some(_) => total,
            };
            IndicatorPoint {
                date: bar.date,
                value: Some(IndicatorValue::Simple(total)),
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Obv,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn session(day: u32, close: f64, volume: i64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    #[test]
    fn seeded_with_first_volume() {
        let series = calculate_obv(&[session(1, 250.0, 1_200)]);
        assert_eq!(series.primary_at(0), Some(1_200.0));
    }

    #[test]
    fn signed_by_close_direction() {
        let bars = [
            session(1, 250.0, 1_200),
            session(4, 255.5, 800),
            session(5, 249.0, 300),
            session(6, 249.0, 5_000),
            session(7, 251.0, 100),
        ];
        let series = calculate_obv(&bars);
        assert_eq!(
            series.defined_primaries(),
            vec![1_200.0, 2_000.0, 1_700.0, 1_700.0, 1_800.0]
        );
        assert_eq!(series.indicator_type, IndicatorType::Obv);
    }

    #[test]
    fn empty_input() {
        assert!(calculate_obv(&[]).is_empty());
    }
}
