//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorValue`: a tagged value, either defined or undefined (warm-up,
//!   zero-range window)
//! - `IndicatorPoint`: a single dated point in an indicator time series
//! - `SeriesKey`: series identity, used as the map key and as the textual name
//!   in crossover configuration
//! - `IndicatorSeries`: a time series aligned 1:1 with the price bars
//! - `IndicatorSet`: every series produced by one engine run
//! - `IndicatorConfig`: which indicator kinds to compute and their parameters

pub mod bollinger;
pub mod ema;
pub mod kdj;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod window;

use crate::domain::error::ConfigurationError;
use crate::domain::ohlcv::PriceBar;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub use bollinger::calculate_bollinger;
pub use ema::calculate_ema;
pub use kdj::calculate_kdj;
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum IndicatorValue {
    Defined(f64),
    #[default]
    Undefined,
}

impl IndicatorValue {
    pub fn is_defined(self) -> bool {
        matches!(self, IndicatorValue::Defined(_))
    }

    pub fn value(self) -> Option<f64> {
        match self {
            IndicatorValue::Defined(v) => Some(v),
            IndicatorValue::Undefined => None,
        }
    }
}

impl From<Option<f64>> for IndicatorValue {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) => IndicatorValue::Defined(v),
            None => IndicatorValue::Undefined,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SeriesKey {
    Sma(usize),
    Macd,
    MacdSignal,
    MacdHist,
    Rsi(usize),
    BollUpper,
    BollMiddle,
    BollLower,
    KdjK,
    KdjD,
    KdjJ,
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesKey::Sma(period) => write!(f, "SMA{}", period),
            SeriesKey::Macd => write!(f, "MACD"),
            SeriesKey::MacdSignal => write!(f, "MACD_Signal"),
            SeriesKey::MacdHist => write!(f, "MACD_Hist"),
            SeriesKey::Rsi(period) => write!(f, "RSI{}", period),
            SeriesKey::BollUpper => write!(f, "BOLL_Upper"),
            SeriesKey::BollMiddle => write!(f, "BOLL_Middle"),
            SeriesKey::BollLower => write!(f, "BOLL_Lower"),
            SeriesKey::KdjK => write!(f, "KDJ_K"),
            SeriesKey::KdjD => write!(f, "KDJ_D"),
            SeriesKey::KdjJ => write!(f, "KDJ_J"),
        }
    }
}

impl FromStr for SeriesKey {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_uppercase();
        let unknown = || ConfigurationError::UnknownSeries {
            name: s.trim().to_string(),
        };

        let key = match name.as_str() {
            "MACD" => SeriesKey::Macd,
            "MACD_SIGNAL" => SeriesKey::MacdSignal,
            "MACD_HIST" => SeriesKey::MacdHist,
            "BOLL_UPPER" => SeriesKey::BollUpper,
            "BOLL_MIDDLE" => SeriesKey::BollMiddle,
            "BOLL_LOWER" => SeriesKey::BollLower,
            "KDJ_K" => SeriesKey::KdjK,
            "KDJ_D" => SeriesKey::KdjD,
            "KDJ_J" => SeriesKey::KdjJ,
            other => {
                let (prefix, digits) = if let Some(rest) = other.strip_prefix("SMA") {
                    ("SMA", rest)
                } else if let Some(rest) = other.strip_prefix("RSI") {
                    ("RSI", rest)
                } else {
                    return Err(unknown());
                };
                let period: usize = digits.parse().map_err(|_| unknown())?;
                if period == 0 {
                    return Err(unknown());
                }
                if prefix == "SMA" {
                    SeriesKey::Sma(period)
                } else {
                    SeriesKey::Rsi(period)
                }
            }
        };
        Ok(key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub key: SeriesKey,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Zip computed values with bar dates. `values` must be bar-aligned.
    pub fn from_values(key: SeriesKey, bars: &[PriceBar], values: Vec<IndicatorValue>) -> Self {
        debug_assert_eq!(bars.len(), values.len());
        IndicatorSeries {
            key,
            values: bars
                .iter()
                .zip(values)
                .map(|(bar, value)| IndicatorPoint {
                    date: bar.date,
                    value,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value_at(&self, index: usize) -> IndicatorValue {
        self.values
            .get(index)
            .map(|p| p.value)
            .unwrap_or(IndicatorValue::Undefined)
    }

    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|p| p.value.is_defined()).count()
    }
}

/// All series computed for one price series, keyed by [`SeriesKey`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndicatorSet {
    pub bar_count: usize,
    pub dates: Vec<NaiveDate>,
    pub series: HashMap<SeriesKey, IndicatorSeries>,
}

impl IndicatorSet {
    pub fn new(bars: &[PriceBar]) -> Self {
        IndicatorSet {
            bar_count: bars.len(),
            dates: bars.iter().map(|b| b.date).collect(),
            series: HashMap::new(),
        }
    }

    pub fn insert(&mut self, series: IndicatorSeries) {
        self.series.insert(series.key, series);
    }

    pub fn get(&self, key: &SeriesKey) -> Option<&IndicatorSeries> {
        self.series.get(key)
    }

    pub fn contains(&self, key: &SeriesKey) -> bool {
        self.series.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Keys in stable display order.
    pub fn keys(&self) -> Vec<SeriesKey> {
        let mut keys: Vec<SeriesKey> = self.series.keys().copied().collect();
        keys.sort();
        keys
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        MacdParams {
            fast: macd::DEFAULT_FAST,
            slow: macd::DEFAULT_SLOW,
            signal: macd::DEFAULT_SIGNAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerParams {
    pub period: usize,
    pub k: f64,
}

impl Default for BollingerParams {
    fn default() -> Self {
        BollingerParams {
            period: bollinger::DEFAULT_PERIOD,
            k: bollinger::DEFAULT_K,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KdjParams {
    pub fastk: usize,
    pub slowk: usize,
    pub slowd: usize,
}

impl Default for KdjParams {
    fn default() -> Self {
        KdjParams {
            fastk: kdj::DEFAULT_FASTK,
            slowk: kdj::DEFAULT_SLOWK,
            slowd: kdj::DEFAULT_SLOWD,
        }
    }
}

/// Indicator kinds to compute. A `None` or empty entry disables that kind.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub sma: Vec<usize>,
    pub macd: Option<MacdParams>,
    pub rsi: Vec<usize>,
    pub bollinger: Option<BollingerParams>,
    pub kdj: Option<KdjParams>,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        IndicatorConfig {
            sma: vec![5, 10, 20, 60],
            macd: Some(MacdParams::default()),
            rsi: vec![6, 12, 24],
            bollinger: Some(BollingerParams::default()),
            kdj: Some(KdjParams::default()),
        }
    }
}

impl IndicatorConfig {
    /// Config with every kind disabled.
    pub fn empty() -> Self {
        IndicatorConfig {
            sma: Vec::new(),
            macd: None,
            rsi: Vec::new(),
            bollinger: None,
            kdj: None,
        }
    }

    /// Reject zero periods, an inverted MACD pair and a negative band width.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        fn positive(indicator: &str, period: usize) -> Result<(), ConfigurationError> {
            if period == 0 {
                return Err(ConfigurationError::NonPositivePeriod {
                    indicator: indicator.to_string(),
                });
            }
            Ok(())
        }

        for &p in &self.sma {
            positive("SMA", p)?;
        }
        for &p in &self.rsi {
            positive("RSI", p)?;
        }
        if let Some(m) = self.macd {
            positive("MACD fast", m.fast)?;
            positive("MACD slow", m.slow)?;
            positive("MACD signal", m.signal)?;
            if m.fast >= m.slow {
                return Err(ConfigurationError::InvalidParameter {
                    name: "MACD".to_string(),
                    reason: format!("fast period {} must be below slow period {}", m.fast, m.slow),
                });
            }
        }
        if let Some(b) = self.bollinger {
            positive("BOLLINGER", b.period)?;
            if !b.k.is_finite() || b.k < 0.0 {
                return Err(ConfigurationError::InvalidParameter {
                    name: "BOLLINGER k".to_string(),
                    reason: "band multiplier must be a non-negative number".to_string(),
                });
            }
        }
        if let Some(k) = self.kdj {
            positive("KDJ fastk", k.fastk)?;
            positive("KDJ slowk", k.slowk)?;
            positive("KDJ slowd", k.slowd)?;
        }
        Ok(())
    }

    /// Series keys this config produces.
    pub fn series_keys(&self) -> Vec<SeriesKey> {
        let mut keys: Vec<SeriesKey> = self.sma.iter().map(|&p| SeriesKey::Sma(p)).collect();
        if self.macd.is_some() {
            keys.extend([SeriesKey::Macd, SeriesKey::MacdSignal, SeriesKey::MacdHist]);
        }
        keys.extend(self.rsi.iter().map(|&p| SeriesKey::Rsi(p)));
        if self.bollinger.is_some() {
            keys.extend([
                SeriesKey::BollUpper,
                SeriesKey::BollMiddle,
                SeriesKey::BollLower,
            ]);
        }
        if self.kdj.is_some() {
            keys.extend([SeriesKey::KdjK, SeriesKey::KdjD, SeriesKey::KdjJ]);
        }
        keys.sort();
        keys.dedup();
        keys
    }

    /// Bars needed before every configured series has its first defined value.
    pub fn warmup_bars(&self) -> usize {
        let sma = self.sma.iter().copied().max().unwrap_or(0);
        let macd = self
            .macd
            .map(|m| m.slow.saturating_add(m.signal).saturating_sub(1))
            .unwrap_or(0);
        let rsi = self.rsi.iter().map(|&p| p.saturating_add(1)).max().unwrap_or(0);
        let boll = self.bollinger.map(|b| b.period).unwrap_or(0);
        let kdj = self
            .kdj
            .map(|k| k.fastk.saturating_add(k.slowk).saturating_add(k.slowd).saturating_sub(2))
            .unwrap_or(0);
        [sma, macd, rsi, boll, kdj].into_iter().max().unwrap_or(0)
    }
}
