//! Rolling-window primitives shared by the indicator scans.
//!
//! Every function returns a vector the same length as its input. A window
//! that is not yet full, or that contains an undefined input, is undefined.

use crate::domain::indicator::IndicatorValue;

/// Trailing mean over tagged inputs.
///
/// Each full window is summed afresh, left to right, so the result is the
/// plain window mean with no rounding carried between windows. Only the
/// count of defined inputs slides.
pub fn rolling_mean(inputs: &[IndicatorValue], period: usize) -> Vec<IndicatorValue> {
    let mut out = vec![IndicatorValue::Undefined; inputs.len()];
    if period == 0 {
        return out;
    }

    let mut defined_in_window = 0usize;

    for i in 0..inputs.len() {
        if inputs[i].is_defined() {
            defined_in_window += 1;
        }
        if i >= period && inputs[i - period].is_defined() {
            defined_in_window -= 1;
        }
        if i + 1 >= period && defined_in_window == period {
            let sum: f64 = inputs[i + 1 - period..=i]
                .iter()
                .filter_map(|v| v.value())
                .sum();
            out[i] = IndicatorValue::Defined(sum / period as f64);
        }
    }
    out
}

/// Sliding mean over plain values.
pub fn rolling_mean_f64(inputs: &[f64], period: usize) -> Vec<IndicatorValue> {
    let tagged: Vec<IndicatorValue> = inputs.iter().map(|&v| IndicatorValue::Defined(v)).collect();
    rolling_mean(&tagged, period)
}

/// Two-pass population mean and standard deviation of a full window.
pub fn mean_and_population_stddev(window: &[f64]) -> (f64, f64) {
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;
    (mean, variance.sqrt())
}

/// Lowest value of each trailing window of `period` entries.
pub fn rolling_min(inputs: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling_extreme(inputs, period, f64::min)
}

/// Highest value of each trailing window of `period` entries.
pub fn rolling_max(inputs: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling_extreme(inputs, period, f64::max)
}

fn rolling_extreme(inputs: &[f64], period: usize, pick: fn(f64, f64) -> f64) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; inputs.len()];
    }
    (0..inputs.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            inputs[i + 1 - period..=i].iter().copied().reduce(pick)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn defined(values: &[f64]) -> Vec<IndicatorValue> {
        values.iter().map(|&v| IndicatorValue::Defined(v)).collect()
    }

    #[test]
    fn rolling_mean_warmup_and_values() {
        let out = rolling_mean(&defined(&[1.0, 2.0, 3.0, 4.0]), 3);
        assert_eq!(out[0], IndicatorValue::Undefined);
        assert_eq!(out[1], IndicatorValue::Undefined);
        assert_eq!(out[2], IndicatorValue::Defined(2.0));
        assert_eq!(out[3], IndicatorValue::Defined(3.0));
    }

    #[test]
    fn rolling_mean_skips_windows_with_gaps() {
        let inputs = vec![
            IndicatorValue::Defined(1.0),
            IndicatorValue::Undefined,
            IndicatorValue::Defined(3.0),
            IndicatorValue::Defined(5.0),
            IndicatorValue::Defined(7.0),
        ];
        let out = rolling_mean(&inputs, 2);
        assert_eq!(out[1], IndicatorValue::Undefined);
        assert_eq!(out[2], IndicatorValue::Undefined);
        assert_eq!(out[3], IndicatorValue::Defined(4.0));
        assert_eq!(out[4], IndicatorValue::Defined(6.0));
    }

    #[test]
    fn rolling_mean_leading_undefined() {
        let mut inputs = vec![IndicatorValue::Undefined; 3];
        inputs.extend(defined(&[2.0, 4.0, 6.0]));
        let out = rolling_mean(&inputs, 3);
        assert!(out[..5].iter().all(|v| !v.is_defined()));
        assert_eq!(out[5], IndicatorValue::Defined(4.0));
    }

    #[test]
    fn rolling_mean_carries_no_rounding_between_windows() {
        let out = rolling_mean_f64(&[1e17, 0.1, 0.2, 0.3], 2);
        assert_eq!(out[3], IndicatorValue::Defined((0.2 + 0.3) / 2.0));
        assert_eq!(out[2], IndicatorValue::Defined((0.1 + 0.2) / 2.0));
    }

    #[test]
    fn rolling_mean_period_zero_is_all_undefined() {
        let out = rolling_mean_f64(&[1.0, 2.0], 0);
        assert!(out.iter().all(|v| !v.is_defined()));
    }

    #[test]
    fn population_stddev_divides_by_n() {
        let (mean, sd) = mean_and_population_stddev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_relative_eq!(mean, 5.0);
        assert_relative_eq!(sd, 2.0);
    }

    #[test]
    fn rolling_extremes() {
        let lows = rolling_min(&[5.0, 3.0, 4.0, 6.0], 2);
        let highs = rolling_max(&[5.0, 3.0, 4.0, 6.0], 2);
        assert_eq!(lows, vec![None, Some(3.0), Some(3.0), Some(4.0)]);
        assert_eq!(highs, vec![None, Some(5.0), Some(4.0), Some(6.0)]);
    }
}
