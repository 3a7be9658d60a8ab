//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series, `None` while
//!   the indicator is still warming up
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values, one point per bar

pub mod adx;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod obv;
pub mod rsi;
pub mod sma;
pub mod volume_profile;

pub use adx::calculate_adx;
pub use bollinger::calculate_bollinger;
pub use ema::calculate_ema;
pub use macd::{calculate_macd, calculate_macd_default};
pub use obv::calculate_obv;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use volume_profile::calculate_volume_profile;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: Option<IndicatorValue>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: Option<f64>,
        histogram: Option<f64>,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
    Adx {
        adx: f64,
        plus_di: f64,
        minus_di: f64,
    },
}

impl IndicatorValue {
    /// The headline number of the value: the MACD line, the ADX, the
    /// Bollinger middle band.
    pub fn primary(&self) -> f64 {
        match *self {
            IndicatorValue::Simple(v) => v,
            IndicatorValue::Macd { line, .. } => line,
            IndicatorValue::Bollinger { middle, .. } => middle,
            IndicatorValue::Adx { adx, .. } => adx,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Adx(usize),
    Obv,
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn empty(indicator_type: IndicatorType) -> Self {
        Self {
            indicator_type,
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value_at(&self, index: usize) -> Option<IndicatorValue> {
        self.values.get(index).and_then(|p| p.value)
    }

    pub fn primary_at(&self, index: usize) -> Option<f64> {
        self.value_at(index).map(|v| v.primary())
    }

    pub fn last_value(&self) -> Option<IndicatorValue> {
        self.values.last().and_then(|p| p.value)
    }

    pub fn last_primary(&self) -> Option<f64> {
        self.last_value().map(|v| v.primary())
    }

    /// Primary values with warmup points dropped.
    pub fn defined_primaries(&self) -> Vec<f64> {
        self.values
            .iter()
            .filter_map(|p| p.value.map(|v| v.primary()))
            .collect()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Adx(period) => write!(f, "ADX({})", period),
            IndicatorType::Obv => write!(f, "OBV"),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}
