//! Core domain types and logic.

pub mod audit;
pub mod config_validation;
pub mod error;
pub mod false_recovery;
pub mod indicator;
pub mod indicator_set;
pub mod levels;
pub mod ohlcv;
pub mod pipeline;
pub mod recommendation;
pub mod scoring;
pub mod settings;
pub mod trend;
pub mod watchlist;
