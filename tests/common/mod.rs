#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::cell::RefCell;
use std::collections::HashMap;
use stockwatch::domain::error::StockwatchError;
pub use stockwatch::domain::ohlcv::PriceBar;
use stockwatch::domain::recommendation::{Archive, Recommendation, RecommendationStatus};
use stockwatch::domain::scoring::Signal;
use stockwatch::ports::archive_port::ArchiveStore;
use stockwatch::ports::data_port::PriceSource;

pub struct MockPriceSource {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl PriceSource for MockPriceSource {
    fn fetch_bars(&self, ticker: &str) -> Result<Vec<PriceBar>, StockwatchError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(StockwatchError::DataSource {
                reason: reason.clone(),
            });
        }
        match self.data.get(ticker) {
            Some(bars) if !bars.is_empty() => Ok(bars.clone()),
            _ => Err(StockwatchError::NoData {
                ticker: ticker.to_string(),
            }),
        }
    }

    fn list_tickers(&self) -> Result<Vec<String>, StockwatchError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, StockwatchError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(StockwatchError::DataSource {
                reason: reason.clone(),
            });
        }
        match self.data.get(ticker) {
            Some(bars) if !bars.is_empty() => Ok(Some((
                bars[0].date,
                bars[bars.len() - 1].date,
                bars.len(),
            ))),
            _ => Ok(None),
        }
    }
}

/// In-memory archive; counts saves so tests can check one save per pass.
#[derive(Default)]
pub struct MemoryArchive {
    pub archive: RefCell<Archive>,
    pub saves: RefCell<usize>,
}

impl MemoryArchive {
    pub fn with(archive: Archive) -> Self {
        Self {
            archive: RefCell::new(archive),
            saves: RefCell::new(0),
        }
    }

    pub fn snapshot(&self) -> Archive {
        self.archive.borrow().clone()
    }
}

impl ArchiveStore for MemoryArchive {
    fn load(&self) -> Result<Archive, StockwatchError> {
        Ok(self.archive.borrow().clone())
    }

    fn save(&self, archive: &Archive) -> Result<(), StockwatchError> {
        *self.archive.borrow_mut() = archive.clone();
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

pub fn make_bar(d: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: i64) -> PriceBar {
    PriceBar {
        date: d,
        open,
        high,
        low,
        close,
        volume,
    }
}

/// Two steps forward, one back: +2.0 on odd bars, -1.3333 on even bars,
/// heavier volume on up days. Every +DM is positive and no -DM appears, so
/// ADX is saturated and the series scores as a strong uptrend.
pub fn zigzag_uptrend(count: usize, start: NaiveDate) -> Vec<PriceBar> {
    let mut bars = Vec::with_capacity(count);
    let mut prev = 100.0;
    for i in 0..count {
        let close = if i == 0 {
            100.0
        } else if i % 2 == 1 {
            prev + 2.0
        } else {
            prev - 1.3333
        };
        let up = i == 0 || close > prev;
        bars.push(PriceBar {
            date: start + chrono::Duration::days(i as i64),
            open: prev,
            high: close.max(prev) + 0.1,
            low: close.min(prev) - 0.1,
            close,
            volume: if up { 1500 } else { 1000 },
        });
        prev = close;
    }
    bars
}

/// Steady decline with constant volume.
pub fn downtrend(count: usize, start: NaiveDate) -> Vec<PriceBar> {
    (0..count)
        .map(|i| {
            let close = 300.0 - i as f64 * 0.5;
            PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: close + 0.5,
                high: close + 0.7,
                low: close - 0.2,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Daily bars from explicit (high, low, close) triples.
pub fn bars_from(start: &str, hlc: &[(f64, f64, f64)]) -> Vec<PriceBar> {
    let start = date(start);
    hlc.iter()
        .enumerate()
        .map(|(i, &(high, low, close))| PriceBar {
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high,
            low,
            close,
            volume: 1000,
        })
        .collect()
}

pub fn buy_record(
    ticker: &str,
    issued_at: &str,
    entry: f64,
    t1: f64,
    t2: f64,
    stop: f64,
) -> Recommendation {
    Recommendation {
        issued_at: datetime(issued_at),
        ticker: ticker.to_string(),
        signal: Signal::Buy,
        entry_price: Some(entry),
        target1: Some(t1),
        target2: Some(t2),
        stop_loss: Some(stop),
        rsi_at_issue: Some(45.0),
        trend_at_issue: "UP".to_string(),
        comment: "Strong uptrend (+40)".to_string(),
        status: RecommendationStatus::Active,
        result_pct: None,
    }
}
