//! Watchlist parsing and data-availability checks.

use crate::domain::error::StockwatchError;
use crate::ports::data_port::PriceSource;
use std::collections::HashSet;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WatchlistError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
}

impl From<WatchlistError> for StockwatchError {
    fn from(err: WatchlistError) -> Self {
        StockwatchError::ConfigInvalid {
            section: "watchlist".to_string(),
            key: "tickers".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Comma-separated tickers, trimmed and upper-cased, order preserved.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, WatchlistError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(WatchlistError::EmptyToken);
        }
        let ticker = trimmed.to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(WatchlistError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData(String),
    InsufficientBars { bars: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchlistCheck {
    pub ready: Vec<(String, usize)>,
    pub skipped: Vec<SkippedTicker>,
}

/// Which tickers have at least `minimum_bars` of history.
pub fn check_watchlist(
    source: &dyn PriceSource,
    tickers: &[String],
    minimum_bars: usize,
) -> WatchlistCheck {
    let mut check = WatchlistCheck::default();

    for ticker in tickers {
        match source.get_data_range(ticker) {
            Ok(Some((_, _, bars))) if bars >= minimum_bars => {
                check.ready.push((ticker.clone(), bars));
            }
            Ok(Some((_, _, bars))) => {
                warn!(ticker = %ticker, bars, minimum_bars, "insufficient history");
                check.skipped.push(SkippedTicker {
                    ticker: ticker.clone(),
                    reason: SkipReason::InsufficientBars { bars },
                });
            }
            Ok(None) => {
                warn!(ticker = %ticker, "no price data");
                check.skipped.push(SkippedTicker {
                    ticker: ticker.clone(),
                    reason: SkipReason::NoData("no price file".to_string()),
                });
            }
            Err(e) => {
                warn!(ticker = %ticker, "unreadable price data: {e}");
                check.skipped.push(SkippedTicker {
                    ticker: ticker.clone(),
                    reason: SkipReason::NoData(e.to_string()),
                });
            }
        }
    }

    check
}

/// Tickers the source has data for that are not on the watchlist, sorted.
pub fn unwatched_tickers(
    source: &dyn PriceSource,
    watchlist: &[String],
) -> Result<Vec<String>, StockwatchError> {
    let watched: HashSet<&str> = watchlist.iter().map(String::as_str).collect();
    let mut extra: Vec<String> = source
        .list_tickers()?
        .into_iter()
        .map(|t| t.to_uppercase())
        .filter(|t| !watched.contains(t.as_str()))
        .collect();
    extra.sort();
    extra.dedup();
    Ok(extra)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_and_whitespace() {
        assert_eq!(
            parse_tickers("  sber , GAZP ,lkoh").unwrap(),
            vec!["SBER", "GAZP", "LKOH"]
        );
        assert_eq!(parse_tickers("NVTK").unwrap(), vec!["NVTK"]);
    }

    #[test]
    fn parse_empty_token() {
        assert_eq!(parse_tickers("SBER,,GAZP"), Err(WatchlistError::EmptyToken));
        assert_eq!(parse_tickers(""), Err(WatchlistError::EmptyToken));
    }

    #[test]
    fn parse_duplicate_is_case_insensitive() {
        assert_eq!(
            parse_tickers("SBER,GAZP,sber"),
            Err(WatchlistError::DuplicateTicker("SBER".into()))
        );
    }

    #[test]
    fn converts_to_config_error() {
        let err: StockwatchError = WatchlistError::EmptyToken.into();
        assert!(matches!(
            err,
            StockwatchError::ConfigInvalid { ref section, .. } if section == "watchlist"
        ));
    }

    struct Listing(Vec<&'static str>);

    impl PriceSource for Listing {
        fn fetch_bars(
            &self,
            ticker: &str,
        ) -> Result<Vec<crate::domain::ohlcv::PriceBar>, StockwatchError> {
            Err(StockwatchError::NoData {
                ticker: ticker.to_string(),
            })
        }

        fn list_tickers(&self) -> Result<Vec<String>, StockwatchError> {
            Ok(self.0.iter().map(|t| t.to_string()).collect())
        }

        fn get_data_range(
            &self,
            _ticker: &str,
        ) -> Result<Option<(chrono::NaiveDate, chrono::NaiveDate, usize)>, StockwatchError>
        {
            Ok(None)
        }
    }

    #[test]
    fn unwatched_files_are_reported() {
        let source = Listing(vec!["TATN", "SBER", "gazp", "NVTK"]);
        let watchlist = vec!["SBER".to_string(), "GAZP".to_string(), "LKOH".to_string()];
        assert_eq!(
            unwatched_tickers(&source, &watchlist).unwrap(),
            vec!["NVTK", "TATN"]
        );
        assert!(unwatched_tickers(&Listing(vec![]), &watchlist)
            .unwrap()
            .is_empty());
    }
}
