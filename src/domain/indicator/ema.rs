//! Exponential Moving Average.
//!
//! α = 2/(n+1), seeded with the SMA of the first n defined inputs, then
//! EMA[i] = EMA[i-1] + α·(x[i] - EMA[i-1]). The increment form keeps a
//! constant input exactly constant.
//! Warmup: the first (n-1) defined inputs produce undefined output.

use crate::domain::indicator::IndicatorValue;
use crate::domain::ohlcv::PriceBar;

/// EMA of the closing prices.
pub fn calculate_ema(bars: &[PriceBar], period: usize) -> Vec<IndicatorValue> {
    let closes: Vec<IndicatorValue> = bars.iter().map(|b| IndicatorValue::Defined(b.close)).collect();
    ema_over(&closes, period)
}

/// EMA of an arbitrary tagged series. An undefined input resets the
/// recurrence; the next seed is taken from the following n defined inputs.
pub fn ema_over(inputs: &[IndicatorValue], period: usize) -> Vec<IndicatorValue> {
    let mut out = Vec::with_capacity(inputs.len());
    if period == 0 {
        out.resize(inputs.len(), IndicatorValue::Undefined);
        return out;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut ema: Option<f64> = None;
    let mut seed_sum = 0.0;
    let mut seed_count = 0usize;

    for input in inputs {
        let value = match (*input, ema) {
            (IndicatorValue::Undefined, _) => {
                ema = None;
                seed_sum = 0.0;
                seed_count = 0;
                IndicatorValue::Undefined
            }
            (IndicatorValue::Defined(x), Some(prev)) => {
                let next = prev + alpha * (x - prev);
                ema = Some(next);
                IndicatorValue::Defined(next)
            }
            (IndicatorValue::Defined(x), None) => {
                seed_sum += x;
                seed_count += 1;
                if seed_count == period {
                    let seed = seed_sum / period as f64;
                    ema = Some(seed);
                    IndicatorValue::Defined(seed)
                } else {
                    IndicatorValue::Undefined
                }
            }
        };
        out.push(value);
    }
    out
}
