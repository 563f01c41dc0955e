//! Crossover detection and composite signal generation.
//!
//! For each configured pair (short, long), diff[i] = short[i] - long[i]
//! wherever both sides are defined.
//!
//! - Golden cross (+1) at i: diff[i-1] <= 0 < diff[i]
//! - Death cross (-1) at i: diff[i-1] >= 0 > diff[i]
//! - Otherwise, or when either diff is undefined: no event
//!
//! Crossings are edge-triggered: a pair reports at most one event per sign
//! flip. Per-bar events are summed across pairs and thresholded to a
//! ternary signal; opposite crosses on the same bar cancel to Flat.

use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::domain::error::{ConfigurationError, StockquantError};
use crate::domain::indicator::{IndicatorSeries, IndicatorSet, IndicatorValue, SeriesKey};
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrossoverEvent {
    Death,
    NoEvent,
    Golden,
}

impl CrossoverEvent {
    pub fn value(self) -> i32 {
        match self {
            CrossoverEvent::Death => -1,
            CrossoverEvent::NoEvent => 0,
            CrossoverEvent::Golden => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Signal {
    Sell,
    #[default]
    Flat,
    Buy,
}

impl Signal {
    /// Unit position quantity this signal stands for.
    pub fn quantity(self) -> i64 {
        match self {
            Signal::Sell => -1,
            Signal::Flat => 0,
            Signal::Buy => 1,
        }
    }

    fn from_sum(sum: i32) -> Self {
        match sum.signum() {
            1 => Signal::Buy,
            -1 => Signal::Sell,
            _ => Signal::Flat,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalPoint {
    pub date: NaiveDate,
    pub signal: Signal,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignalSeries {
    pub points: Vec<SignalPoint>,
}

impl SignalSeries {
    /// Build from plain signals with the given dates.
    pub fn from_signals(dates: &[NaiveDate], signals: &[Signal]) -> Self {
        SignalSeries {
            points: dates
                .iter()
                .zip(signals)
                .map(|(&date, &signal)| SignalPoint { date, signal })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn signal_at(&self, index: usize) -> Signal {
        self.points.get(index).map(|p| p.signal).unwrap_or_default()
    }

    /// Number of non-flat bars.
    pub fn active_count(&self) -> usize {
        self.points.iter().filter(|p| p.signal != Signal::Flat).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossoverPair {
    pub short: SeriesKey,
    pub long: SeriesKey,
}

impl fmt::Display for CrossoverPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.short, self.long)
    }
}

impl FromStr for CrossoverPair {
    type Err = ConfigurationError;

    /// Parses `SHORT:LONG`, e.g. `SMA5:SMA20`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (short, long) = s.split_once(':').ok_or_else(|| ConfigurationError::InvalidParameter {
            name: "crossover pair".to_string(),
            reason: format!("expected SHORT:LONG, got '{}'", s.trim()),
        })?;
        Ok(CrossoverPair {
            short: short.parse()?,
            long: long.parse()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossoverConfig {
    pub pairs: Vec<CrossoverPair>,
}

impl Default for CrossoverConfig {
    fn default() -> Self {
        CrossoverConfig {
            pairs: vec![
                CrossoverPair {
                    short: SeriesKey::Sma(5),
                    long: SeriesKey::Sma(20),
                },
                CrossoverPair {
                    short: SeriesKey::Macd,
                    long: SeriesKey::MacdSignal,
                },
            ],
        }
    }
}

impl CrossoverConfig {
    /// Parse a comma-separated pair list such as `SMA5:SMA20, MACD:MACD_Signal`.
    pub fn parse(list: &str) -> Result<Self, ConfigurationError> {
        let pairs = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<CrossoverPair>, _>>()?;
        Ok(CrossoverConfig { pairs })
    }
}

fn diff_at(short: &IndicatorSeries, long: &IndicatorSeries, index: usize) -> Option<f64> {
    match (short.value_at(index), long.value_at(index)) {
        (IndicatorValue::Defined(s), IndicatorValue::Defined(l)) => Some(s - l),
        _ => None,
    }
}

/// Per-bar crossover events of `short` against `long`, in one left-to-right
/// scan.
pub fn detect_crossovers(short: &IndicatorSeries, long: &IndicatorSeries) -> Vec<CrossoverEvent> {
    let len = short.len().min(long.len());
    let mut events = vec![CrossoverEvent::NoEvent; len];
    let mut prev = if len > 0 { diff_at(short, long, 0) } else { None };

    for (i, event) in events.iter_mut().enumerate().skip(1) {
        let curr = diff_at(short, long, i);
        if let (Some(p), Some(c)) = (prev, curr) {
            if p <= 0.0 && c > 0.0 {
                *event = CrossoverEvent::Golden;
            } else if p >= 0.0 && c < 0.0 {
                *event = CrossoverEvent::Death;
            }
        }
        prev = curr;
    }
    events
}

/// Combine the crossover events of every configured pair into one signal per
/// bar. Every pair is resolved against `indicators` before any scan runs.
pub fn generate_signals(
    indicators: &IndicatorSet,
    config: &CrossoverConfig,
) -> Result<SignalSeries, StockquantError> {
    let resolved = config
        .pairs
        .iter()
        .map(|pair| {
            let lookup = |key: &SeriesKey| {
                indicators
                    .get(key)
                    .ok_or_else(|| ConfigurationError::UnknownSeries {
                        name: key.to_string(),
                    })
            };
            Ok((lookup(&pair.short)?, lookup(&pair.long)?))
        })
        .collect::<Result<Vec<_>, ConfigurationError>>()?;

    let per_pair: Vec<Vec<CrossoverEvent>> = resolved
        .par_iter()
        .map(|(short, long)| detect_crossovers(short, long))
        .collect();

    let mut sums = vec![0i32; indicators.bar_count];
    for events in &per_pair {
        for (sum, event) in sums.iter_mut().zip(events) {
            *sum += event.value();
        }
    }

    let signals: Vec<Signal> = sums.into_iter().map(Signal::from_sum).collect();
    let series = SignalSeries::from_signals(&indicators.dates, &signals);
    debug!(
        pairs = config.pairs.len(),
        active = series.active_count(),
        "generated signals"
    );
    Ok(series)
}
