//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: the line is defined from index slow-1, signal and histogram from
//! slow-1 + signal-1.

use crate::domain::indicator::ema::{calculate_ema, ema_over};
use crate::domain::indicator::{IndicatorSeries, IndicatorValue, MacdParams, SeriesKey};
use crate::domain::ohlcv::PriceBar;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

/// Returns `[MACD, MACD_Signal, MACD_Hist]`.
pub fn calculate_macd(bars: &[PriceBar], params: MacdParams) -> [IndicatorSeries; 3] {
    let ema_fast = calculate_ema(bars, params.fast);
    let ema_slow = calculate_ema(bars, params.slow);

    let line: Vec<IndicatorValue> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(fast, slow)| match (fast, slow) {
            (IndicatorValue::Defined(f), IndicatorValue::Defined(s)) => IndicatorValue::Defined(f - s),
            _ => IndicatorValue::Undefined,
        })
        .collect();

    let signal = ema_over(&line, params.signal);

    let histogram: Vec<IndicatorValue> = line
        .iter()
        .zip(&signal)
        .map(|(l, s)| match (l, s) {
            (IndicatorValue::Defined(l), IndicatorValue::Defined(s)) => IndicatorValue::Defined(l - s),
            _ => IndicatorValue::Undefined,
        })
        .collect();

    [
        IndicatorSeries::from_values(SeriesKey::Macd, bars, line),
        IndicatorSeries::from_values(SeriesKey::MacdSignal, bars, signal),
        IndicatorSeries::from_values(SeriesKey::MacdHist, bars, histogram),
    ]
}

pub fn calculate_macd_default(bars: &[PriceBar]) -> [IndicatorSeries; 3] {
    calculate_macd(bars, MacdParams::default())
}
