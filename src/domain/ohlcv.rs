//! Daily price bar representation and the provider data contract.

use crate::domain::error::DataContractViolation;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl PriceBar {
    /// Flat bar where every price equals `close`.
    pub fn flat(date: NaiveDate, close: f64) -> Self {
        PriceBar {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
        }
    }
}

/// Check the provider contract: strictly increasing dates, finite prices,
/// `high >= low`, non-negative volume. Reports the first offending bar.
pub fn validate_bars(bars: &[PriceBar]) -> Result<(), DataContractViolation> {
    for (index, bar) in bars.iter().enumerate() {
        for (field, value) in [
            ("open", bar.open),
            ("high", bar.high),
            ("low", bar.low),
            ("close", bar.close),
        ] {
            if !value.is_finite() {
                return Err(DataContractViolation::NonFinite {
                    index,
                    date: bar.date,
                    field,
                });
            }
        }

        if bar.high < bar.low {
            return Err(DataContractViolation::InvertedRange {
                index,
                date: bar.date,
                high: bar.high,
                low: bar.low,
            });
        }

        if bar.volume < 0 {
            return Err(DataContractViolation::NegativeVolume {
                index,
                date: bar.date,
                volume: bar.volume,
            });
        }

        if index > 0 {
            let previous = bars[index - 1].date;
            if bar.date <= previous {
                return Err(DataContractViolation::NonMonotonicDate {
                    index,
                    date: bar.date,
                    previous,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar(day: u32) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000,
        }
    }

    #[test]
    fn valid_series_passes() {
        let bars = vec![sample_bar(1), sample_bar(2), sample_bar(3)];
        assert!(validate_bars(&bars).is_ok());
    }

    #[test]
    fn empty_series_passes() {
        assert!(validate_bars(&[]).is_ok());
    }

    #[test]
    fn duplicate_date_rejected() {
        let bars = vec![sample_bar(1), sample_bar(2), sample_bar(2)];
        let err = validate_bars(&bars).unwrap_err();
        assert!(matches!(
            err,
            DataContractViolation::NonMonotonicDate { index: 2, .. }
        ));
    }

    #[test]
    fn out_of_order_date_rejected() {
        let bars = vec![sample_bar(3), sample_bar(2)];
        let err = validate_bars(&bars).unwrap_err();
        assert!(matches!(
            err,
            DataContractViolation::NonMonotonicDate { index: 1, .. }
        ));
    }

    #[test]
    fn nan_close_rejected() {
        let mut bar = sample_bar(1);
        bar.close = f64::NAN;
        let err = validate_bars(&[bar]).unwrap_err();
        assert!(matches!(
            err,
            DataContractViolation::NonFinite { field: "close", .. }
        ));
    }

    #[test]
    fn inverted_range_rejected() {
        let mut bar = sample_bar(1);
        bar.high = 80.0;
        let err = validate_bars(&[bar]).unwrap_err();
        assert!(matches!(err, DataContractViolation::InvertedRange { .. }));
    }

    #[test]
    fn negative_volume_rejected() {
        let mut bar = sample_bar(1);
        bar.volume = -1;
        let err = validate_bars(&[bar]).unwrap_err();
        assert!(matches!(
            err,
            DataContractViolation::NegativeVolume { volume: -1, .. }
        ));
    }

    #[test]
    fn flat_bar_has_equal_prices() {
        let bar = PriceBar::flat(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 42.0);
        assert_eq!(bar.open, 42.0);
        assert_eq!(bar.high, 42.0);
        assert_eq!(bar.low, 42.0);
        assert_eq!(bar.close, 42.0);
    }
}
