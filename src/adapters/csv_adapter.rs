//! Per-ticker CSV price files: `<data_dir>/<TICKER>_full.csv`.

use crate::domain::error::StockwatchError;
use crate::domain::ohlcv::{clean_series, PriceBar};
use crate::ports::data_port::PriceSource;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

const FILE_SUFFIX: &str = "_full.csv";
const COLUMNS: [&str; 6] = ["DATE", "OPEN", "HIGH", "LOW", "CLOSE", "VOLUME"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path
            .join(format!("{}{}", ticker.to_uppercase(), FILE_SUFFIX))
    }
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    idx: usize,
    name: &str,
    line: u64,
) -> Result<T, StockwatchError>
where
    T::Err: std::fmt::Display,
{
    let raw = record.get(idx).ok_or_else(|| StockwatchError::DataSource {
        reason: format!("line {}: missing {} value", line, name),
    })?;
    raw.trim().parse().map_err(|e| StockwatchError::DataSource {
        reason: format!("line {}: invalid {} value {:?}: {}", line, name, raw, e),
    })
}

fn parse_volume(record: &csv::StringRecord, idx: usize, line: u64) -> Result<i64, StockwatchError> {
    parse_field::<i64>(record, idx, "VOLUME", line)
        .or_else(|_| parse_field::<f64>(record, idx, "VOLUME", line).map(|v| v as i64))
}

impl PriceSource for CsvAdapter {
    fn fetch_bars(&self, ticker: &str) -> Result<Vec<PriceBar>, StockwatchError> {
        let path = self.csv_path(ticker);
        if !path.exists() {
            return Err(StockwatchError::NoData {
                ticker: ticker.to_string(),
            });
        }

        let mut rdr = csv::Reader::from_path(&path).map_err(|e| StockwatchError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let headers = rdr
            .headers()
            .map_err(|e| StockwatchError::DataSource {
                reason: format!("{}: {}", path.display(), e),
            })?
            .clone();
        let mut idx = [0usize; 6];
        for (slot, column) in idx.iter_mut().zip(COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(column))
                .ok_or_else(|| StockwatchError::DataSource {
                    reason: format!("{}: missing {} column", path.display(), column),
                })?;
        }

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| StockwatchError::DataSource {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            let line = record.position().map_or(0, |p| p.line());

            let date_str = record.get(idx[0]).unwrap_or("").trim();
            // Tolerate timestamps such as "2024-01-15 00:00:00".
            let date_part = date_str.get(..10).unwrap_or(date_str);
            let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|e| {
                StockwatchError::DataSource {
                    reason: format!("line {}: invalid date {:?}: {}", line, date_str, e),
                }
            })?;

            bars.push(PriceBar {
                date,
                open: parse_field(&record, idx[1], "OPEN", line)?,
                high: parse_field(&record, idx[2], "HIGH", line)?,
                low: parse_field(&record, idx[3], "LOW", line)?,
                close: parse_field(&record, idx[4], "CLOSE", line)?,
                volume: parse_volume(&record, idx[5], line)?,
            });
        }

        let bars = clean_series(bars);
        if bars.is_empty() {
            return Err(StockwatchError::NoData {
                ticker: ticker.to_string(),
            });
        }
        Ok(bars)
    }

    fn list_tickers(&self) -> Result<Vec<String>, StockwatchError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| StockwatchError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StockwatchError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(ticker) = name_str.strip_suffix(FILE_SUFFIX) {
                tickers.push(ticker.to_string());
            }
        }

        tickers.sort();
        Ok(tickers)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, StockwatchError> {
        match self.fetch_bars(ticker) {
            Ok(bars) => Ok(bars
                .first()
                .zip(bars.last())
                .map(|(first, last)| (first.date, last.date, bars.len()))),
            Err(StockwatchError::NoData { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
