//! Domain error types.
//!
//! Fatal conditions are split in two families: configuration errors (the
//! caller asked for something impossible) and data-contract violations (the
//! price series itself is malformed). Both are detected by a validation pass
//! before any series is built, so partially computed results never escape.

use chrono::NaiveDate;

/// Invalid run configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("signal series has {signals} entries but price series has {bars} bars")]
    LengthMismatch { bars: usize, signals: usize },

    #[error("unknown indicator series: {name}")]
    UnknownSeries { name: String },

    #[error("{indicator} period must be positive")]
    NonPositivePeriod { indicator: String },

    #[error("invalid {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
}

/// A price series that breaks the provider contract. The engine never repairs
/// these; it reports the first offending bar.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataContractViolation {
    #[error("bar {index} dated {date} does not follow {previous}")]
    NonMonotonicDate {
        index: usize,
        date: NaiveDate,
        previous: NaiveDate,
    },

    #[error("bar {index} dated {date} has non-finite {field}")]
    NonFinite {
        index: usize,
        date: NaiveDate,
        field: &'static str,
    },

    #[error("bar {index} dated {date} has high {high} below low {low}")]
    InvertedRange {
        index: usize,
        date: NaiveDate,
        high: f64,
        low: f64,
    },

    #[error("bar {index} dated {date} has negative volume {volume}")]
    NegativeVolume {
        index: usize,
        date: NaiveDate,
        volume: i64,
    },
}

/// Top-level error type for stockquant.
#[derive(Debug, thiserror::Error)]
pub enum StockquantError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    DataContract(#[from] DataContractViolation),

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no data for {code}")]
    NoData { code: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&StockquantError> for std::process::ExitCode {
    fn from(err: &StockquantError) -> Self {
        let code: u8 = match err {
            StockquantError::Io(_) | StockquantError::Report { .. } => 1,
            StockquantError::Configuration(_)
            | StockquantError::ConfigParse { .. }
            | StockquantError::ConfigMissing { .. }
            | StockquantError::ConfigInvalid { .. } => 2,
            StockquantError::DataSource { .. } => 3,
            StockquantError::NoData { .. } | StockquantError::DataContract(_) => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_mismatch_message() {
        let err = ConfigurationError::LengthMismatch {
            bars: 10,
            signals: 9,
        };
        assert_eq!(
            err.to_string(),
            "signal series has 9 entries but price series has 10 bars"
        );
    }

    #[test]
    fn violation_converts_transparently() {
        let violation = DataContractViolation::NonFinite {
            index: 3,
            date: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            field: "close",
        };
        let err: StockquantError = violation.clone().into();
        assert_eq!(err.to_string(), violation.to_string());
        assert!(matches!(err, StockquantError::DataContract(_)));
    }

    #[test]
    fn unknown_series_is_configuration_error() {
        let err: StockquantError = ConfigurationError::UnknownSeries {
            name: "SMA7".into(),
        }
        .into();
        assert_eq!(err.to_string(), "unknown indicator series: SMA7");
    }
}
