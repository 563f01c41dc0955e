//! Code lists for multi-series runs.
//!
//! Parses code lists from configuration and loads the price history of each
//! code through a [`DataPort`], skipping codes that yield nothing.

use crate::domain::error::StockquantError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    FetchFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoData => write!(f, "no data in range"),
            SkipReason::FetchFailed(reason) => write!(f, "{}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedCode {
    pub code: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub struct LoadedUniverse {
    pub series: Vec<(String, Vec<PriceBar>)>,
    pub skipped: Vec<SkippedCode>,
}

/// Fetch every code in order. Fails only when no code produced any bars.
pub fn load_universe(
    data_port: &dyn DataPort,
    codes: &[String],
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<LoadedUniverse, StockquantError> {
    let mut series = Vec::new();
    let mut skipped = Vec::new();

    for code in codes {
        match data_port.fetch_bars(code, start_date, end_date) {
            Ok(bars) if bars.is_empty() => {
                warn!(code = %code, "skipping code: no data in range");
                skipped.push(SkippedCode {
                    code: code.clone(),
                    reason: SkipReason::NoData,
                });
            }
            Ok(bars) => {
                info!(code = %code, bars = bars.len(), "loaded price history");
                series.push((code.clone(), bars));
            }
            Err(e) => {
                warn!(code = %code, error = %e, "skipping code");
                skipped.push(SkippedCode {
                    code: code.clone(),
                    reason: SkipReason::FetchFailed(e.to_string()),
                });
            }
        }
    }

    if series.is_empty() {
        return Err(StockquantError::NoData {
            code: codes.join(","),
        });
    }

    Ok(LoadedUniverse { series, skipped })
}
