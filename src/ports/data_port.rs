//! Price-series provider port.

use crate::domain::error::StockwatchError;
use crate::domain::ohlcv::PriceBar;
use chrono::NaiveDate;

pub trait PriceSource {
    /// Cleaned, ascending daily bars. A ticker with no series is `NoData`.
    fn fetch_bars(&self, ticker: &str) -> Result<Vec<PriceBar>, StockwatchError>;

    fn list_tickers(&self) -> Result<Vec<String>, StockwatchError>;

    /// First date, last date and bar count, or `None` when there is no series.
    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, StockwatchError>;
}
