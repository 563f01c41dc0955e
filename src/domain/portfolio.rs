//! Portfolio simulation over a signal series.
//!
//! One state per bar. With `Δ = q[i] - q[i-1]` (and `q[-1] = 0`), a bar with
//! `Δ != 0` trades `|Δ|` units at the close and pays `|Δ|·close·rate`
//! commission. Open positions are not closed out at the end.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use super::backtest::BacktestConfig;
use super::error::{ConfigurationError, StockquantError};
use super::ohlcv::{validate_bars, PriceBar};
use super::signal::{Signal, SignalSeries};

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    pub date: NaiveDate,
    pub position_quantity: i64,
    pub cash: f64,
    pub stock_value: f64,
    pub total_equity: f64,
}

/// How a signal maps to the held quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionModel {
    /// Quantity equals the signal on every bar.
    #[default]
    SignalTracking,
    /// Buy/Sell set the quantity to ±1; Flat keeps the previous quantity.
    Hold,
}

impl PositionModel {
    fn next_quantity(self, previous: i64, signal: Signal) -> i64 {
        match (self, signal) {
            (PositionModel::Hold, Signal::Flat) => previous,
            _ => signal.quantity(),
        }
    }
}

impl fmt::Display for PositionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionModel::SignalTracking => write!(f, "signal"),
            PositionModel::Hold => write!(f, "hold"),
        }
    }
}

impl FromStr for PositionModel {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "signal" | "signal_tracking" => Ok(PositionModel::SignalTracking),
            "hold" => Ok(PositionModel::Hold),
            other => Err(ConfigurationError::InvalidParameter {
                name: "position_model".to_string(),
                reason: format!("expected 'signal' or 'hold', got '{other}'"),
            }),
        }
    }
}

/// Run the cash/holdings recurrence for `bars` under `signals`.
///
/// Every input check happens before the first state is produced; on error
/// no partial curve is returned.
pub fn simulate(
    bars: &[PriceBar],
    signals: &SignalSeries,
    config: &BacktestConfig,
) -> Result<Vec<PortfolioState>, StockquantError> {
    if bars.len() != signals.len() {
        return Err(ConfigurationError::LengthMismatch {
            bars: bars.len(),
            signals: signals.len(),
        }
        .into());
    }
    config.validate()?;
    validate_bars(bars)?;

    let rate = config.commission_rate;
    let mut states = Vec::with_capacity(bars.len());
    let mut cash = config.initial_capital;
    let mut quantity = 0i64;

    for (bar, point) in bars.iter().zip(&signals.points) {
        let target = config.position_model.next_quantity(quantity, point.signal);
        let delta = target - quantity;
        if delta != 0 {
            let cost = delta.abs() as f64 * bar.close * rate;
            cash = cash - delta as f64 * bar.close - cost;
        }
        quantity = target;

        let stock_value = quantity as f64 * bar.close;
        states.push(PortfolioState {
            date: bar.date,
            position_quantity: quantity,
            cash,
            stock_value,
            total_equity: cash + stock_value,
        });
    }

    Ok(states)
}

/// Bar indices where the held quantity changed, counting bar 0 against a
/// flat start.
pub fn trade_indices(states: &[PortfolioState]) -> Vec<usize> {
    let mut previous = 0i64;
    let mut indices = Vec::new();
    for (i, state) in states.iter().enumerate() {
        if state.position_quantity != previous {
            indices.push(i);
        }
        previous = state.position_quantity;
    }
    indices
}
