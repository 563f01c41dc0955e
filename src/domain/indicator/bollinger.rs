//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (k × StdDev)
//! - Lower: Middle - (k × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1),
//! computed two-pass per window so it is never negative.
//!
//! Default parameters: period=20, k=2.0
//! Warmup: first (period-1) bars are undefined.

use crate::domain::indicator::window::mean_and_population_stddev;
use crate::domain::indicator::{BollingerParams, IndicatorSeries, IndicatorValue, SeriesKey};
use crate::domain::ohlcv::PriceBar;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_K: f64 = 2.0;

/// Returns `[BOLL_Upper, BOLL_Middle, BOLL_Lower]`.
pub fn calculate_bollinger(bars: &[PriceBar], params: BollingerParams) -> [IndicatorSeries; 3] {
    let period = params.period;
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let mut upper = vec![IndicatorValue::Undefined; bars.len()];
    let mut middle = vec![IndicatorValue::Undefined; bars.len()];
    let mut lower = vec![IndicatorValue::Undefined; bars.len()];

    if period > 0 {
        for i in (period - 1)..bars.len() {
            let (mean, stddev) = mean_and_population_stddev(&closes[i + 1 - period..=i]);
            let width = params.k * stddev;
            upper[i] = IndicatorValue::Defined(mean + width);
            middle[i] = IndicatorValue::Defined(mean);
            lower[i] = IndicatorValue::Defined(mean - width);
        }
    }

    [
        IndicatorSeries::from_values(SeriesKey::BollUpper, bars, upper),
        IndicatorSeries::from_values(SeriesKey::BollMiddle, bars, middle),
        IndicatorSeries::from_values(SeriesKey::BollLower, bars, lower),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<PriceBar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                PriceBar::flat(NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(), close)
            })
            .collect()
    }

    fn params(period: usize, k: f64) -> BollingerParams {
        BollingerParams { period, k }
    }

    fn bands_at(series: &[IndicatorSeries; 3], i: usize) -> (f64, f64, f64) {
        (
            series[0].value_at(i).value().unwrap(),
            series[1].value_at(i).value().unwrap(),
            series[2].value_at(i).value().unwrap(),
        )
    }

    #[test]
    fn bollinger_warmup() {
        let series = calculate_bollinger(&make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]), params(3, 2.0));

        for band in &series {
            assert!(!band.value_at(0).is_defined());
            assert!(!band.value_at(1).is_defined());
            assert!(band.value_at(2).is_defined());
            assert!(band.value_at(4).is_defined());
        }
    }

    #[test]
    fn bollinger_constant_values() {
        let series = calculate_bollinger(&make_bars(&[100.0; 5]), params(3, 2.0));
        let (upper, middle, lower) = bands_at(&series, 2);
        assert_eq!(middle, 100.0);
        assert_eq!(upper, 100.0);
        assert_eq!(lower, 100.0);
    }

    #[test]
    fn bollinger_basic_calculation() {
        let series = calculate_bollinger(&make_bars(&[10.0, 20.0, 30.0]), params(3, 2.0));
        let (upper, middle, lower) = bands_at(&series, 2);

        let expected_middle: f64 = 20.0;
        let variance: f64 = (100.0 + 0.0 + 100.0) / 3.0;
        let stddev = variance.sqrt();

        assert_abs_diff_eq!(middle, expected_middle, epsilon = 1e-10);
        assert_abs_diff_eq!(upper, expected_middle + 2.0 * stddev, epsilon = 1e-10);
        assert_abs_diff_eq!(lower, expected_middle - 2.0 * stddev, epsilon = 1e-10);
    }

    #[test]
    fn bollinger_multiplier_variations() {
        let series = calculate_bollinger(&make_bars(&[10.0, 20.0, 30.0]), params(3, 1.0));
        let (upper, _, lower) = bands_at(&series, 2);
        let stddev = (200.0_f64 / 3.0).sqrt();
        assert_abs_diff_eq!(upper, 20.0 + stddev, epsilon = 1e-10);
        assert_abs_diff_eq!(lower, 20.0 - stddev, epsilon = 1e-10);
    }

    #[test]
    fn bollinger_symmetry_and_ordering() {
        let series = calculate_bollinger(&make_bars(&[10.0, 25.0, 30.0, 12.0]), params(3, 2.0));
        for i in 2..4 {
            let (upper, middle, lower) = bands_at(&series, i);
            assert!(lower <= middle && middle <= upper);
            assert_abs_diff_eq!(upper - middle, middle - lower, epsilon = 1e-10);
        }
    }

    #[test]
    fn bollinger_series_keys() {
        let series = calculate_bollinger(&make_bars(&[10.0]), BollingerParams::default());
        assert_eq!(series[0].key, SeriesKey::BollUpper);
        assert_eq!(series[1].key, SeriesKey::BollMiddle);
        assert_eq!(series[2].key, SeriesKey::BollLower);
        assert_eq!(series[1].defined_count(), 0);
    }
}
