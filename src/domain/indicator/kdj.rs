//! Stochastic KDJ indicator.
//!
//! K_raw[i] = 100 × (C[i] - min(L, fastk)) / (max(H, fastk) - min(L, fastk))
//! K = SMA(K_raw, slowk), D = SMA(K, slowd), J = 3K - 2D
//!
//! A zero high-low range leaves K_raw undefined for that bar, and every
//! smoothing window touching it stays undefined. J is not bounded to [0, 100].
//!
//! Default parameters: fastk=9, slowk=3, slowd=3

use crate::domain::indicator::window::{rolling_max, rolling_mean, rolling_min};
use crate::domain::indicator::{IndicatorSeries, IndicatorValue, KdjParams, SeriesKey};
use crate::domain::ohlcv::PriceBar;

pub const DEFAULT_FASTK: usize = 9;
pub const DEFAULT_SLOWK: usize = 3;
pub const DEFAULT_SLOWD: usize = 3;

/// Returns `[KDJ_K, KDJ_D, KDJ_J]`.
pub fn calculate_kdj(bars: &[PriceBar], params: KdjParams) -> [IndicatorSeries; 3] {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let max_high = rolling_max(&highs, params.fastk);
    let min_low = rolling_min(&lows, params.fastk);

    let raw_k: Vec<IndicatorValue> = bars
        .iter()
        .zip(max_high.iter().zip(&min_low))
        .map(|(bar, window)| match window {
            (Some(hh), Some(ll)) if hh - ll > 0.0 => {
                IndicatorValue::Defined(100.0 * (bar.close - ll) / (hh - ll))
            }
            _ => IndicatorValue::Undefined,
        })
        .collect();

    let k = rolling_mean(&raw_k, params.slowk);
    let d = rolling_mean(&k, params.slowd);
    let j: Vec<IndicatorValue> = k
        .iter()
        .zip(&d)
        .map(|(k, d)| match (k, d) {
            (IndicatorValue::Defined(k), IndicatorValue::Defined(d)) => {
                IndicatorValue::Defined(3.0 * k - 2.0 * d)
            }
            _ => IndicatorValue::Undefined,
        })
        .collect();

    [
        IndicatorSeries::from_values(SeriesKey::KdjK, bars, k),
        IndicatorSeries::from_values(SeriesKey::KdjD, bars, d),
        IndicatorSeries::from_values(SeriesKey::KdjJ, bars, j),
    ]
}
