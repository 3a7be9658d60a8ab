//! ADX (Average Directional Index) indicator, Wilder's formulation.
//!
//! +DM = H[i]-H[i-1] when it exceeds L[i-1]-L[i] and is positive, else 0 (and
//! symmetrically for -DM). TR, +DM and -DM are Wilder-smoothed over n:
//! first value is the sum of the first n, then S = S - S/n + x.
//! +DI = 100 * S(+DM)/S(TR), -DI = 100 * S(-DM)/S(TR),
//! DX = 100 * |+DI - -DI| / (+DI + -DI).
//! ADX seeds with the mean of the first n DX values, then ADX = (ADX*(n-1) + DX)/n.
//!
//! Warmup: first (2n-1) bars are undefined.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_adx(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let mut values: Vec<IndicatorPoint> = bars
        .iter()
        .map(|b| IndicatorPoint {
            date: b.date,
            value: None,
        })
        .collect();

    if period == 0 || bars.len() < 2 * period {
        return IndicatorSeries {
            indicator_type: IndicatorType::Adx(period),
            values,
        };
    }

    let n = period as f64;
    let mut tr = vec![0.0; bars.len()];
    let mut plus_dm = vec![0.0; bars.len()];
    let mut minus_dm = vec![0.0; bars.len()];

    for i in 1..bars.len() {
        let up = bars[i].high - bars[i - 1].high;
        let down = bars[i - 1].low - bars[i].low;
        tr[i] = bars[i].true_range(bars[i - 1].close);
        plus_dm[i] = if up > down && up > 0.0 { up } else { 0.0 };
        minus_dm[i] = if down > up && down > 0.0 { down } else { 0.0 };
    }

    let mut s_tr: f64 = tr[1..=period].iter().sum();
    let mut s_plus: f64 = plus_dm[1..=period].iter().sum();
    let mut s_minus: f64 = minus_dm[1..=period].iter().sum();

    let mut dx = vec![0.0; bars.len()];
    let mut plus_di = vec![0.0; bars.len()];
    let mut minus_di = vec![0.0; bars.len()];

    for i in period..bars.len() {
        if i > period {
            s_tr = s_tr - s_tr / n + tr[i];
            s_plus = s_plus - s_plus / n + plus_dm[i];
            s_minus = s_minus - s_minus / n + minus_dm[i];
        }
        let (pdi, mdi) = if s_tr > 0.0 {
            (100.0 * s_plus / s_tr, 100.0 * s_minus / s_tr)
        } else {
            (0.0, 0.0)
        };
        plus_di[i] = pdi;
        minus_di[i] = mdi;
        dx[i] = if pdi + mdi > 0.0 {
            100.0 * (pdi - mdi).abs() / (pdi + mdi)
        } else {
            0.0
        };
    }

    let first = 2 * period - 1;
    let mut adx = dx[period..=first].iter().sum::<f64>() / n;
    values[first].value = Some(IndicatorValue::Adx {
        adx,
        plus_di: plus_di[first],
        minus_di: minus_di[first],
    });

    for i in (first + 1)..bars.len() {
        adx = (adx * (n - 1.0) + dx[i]) / n;
        values[i].value = Some(IndicatorValue::Adx {
            adx,
            plus_di: plus_di[i],
            minus_di: minus_di[i],
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Adx(period),
        values,
    }
}
