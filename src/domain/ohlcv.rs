//! Daily price bar representation and series hygiene.

use crate::domain::error::StockwatchError;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl PriceBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Ingestion cleaning: drop non-trading days (volume <= 0), collapse dual
/// sessions on the same date to the larger-volume one, sort ascending.
pub fn clean_series(mut bars: Vec<PriceBar>) -> Vec<PriceBar> {
    bars.retain(|b| b.volume > 0);
    // Same date: larger volume first, so dedup keeps the primary session.
    bars.sort_by(|a, b| a.date.cmp(&b.date).then(b.volume.cmp(&a.volume)));
    bars.dedup_by_key(|b| b.date);
    bars
}

/// Reject a series that was not cleaned: dates must be strictly increasing
/// and every bar must carry positive volume.
pub fn validate_series(bars: &[PriceBar]) -> Result<(), StockwatchError> {
    for (i, bar) in bars.iter().enumerate() {
        if bar.volume <= 0 {
            return Err(StockwatchError::InvalidSeries {
                reason: format!("non-positive volume on {}", bar.date),
            });
        }
        if i > 0 {
            let prev = bars[i - 1].date;
            if bar.date == prev {
                return Err(StockwatchError::InvalidSeries {
                    reason: format!("duplicate date {}", bar.date),
                });
            }
            if bar.date < prev {
                return Err(StockwatchError::InvalidSeries {
                    reason: format!("date {} follows {}", bar.date, prev),
                });
            }
        }
    }
    Ok(())
}
