//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]), summed per window.
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::window::rolling_mean_f64;
use crate::domain::indicator::{IndicatorSeries, SeriesKey};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_sma(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    IndicatorSeries::from_values(SeriesKey::Sma(period), bars, rolling_mean_f64(&closes, period))
}
