//! Performance metrics over a simulated equity curve.

use super::indicator::IndicatorValue;
use super::portfolio::{trade_indices, PortfolioState};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub cumulative_return: f64,
    /// `returns[i-1]` is the return from bar `i-1` to bar `i`.
    pub returns: Vec<IndicatorValue>,
    pub max_drawdown: f64,
    /// Longest run of consecutive bars below the running peak.
    pub max_drawdown_duration: usize,
    pub trade_count: usize,
    pub win_rate: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub final_equity: f64,
}

impl PerformanceSummary {
    pub fn compute(states: &[PortfolioState], initial_capital: f64, risk_free_rate: f64) -> Self {
        let final_equity = states
            .last()
            .map(|s| s.total_equity)
            .unwrap_or(initial_capital);

        let cumulative_return = if states.is_empty() || initial_capital <= 0.0 {
            0.0
        } else {
            final_equity / initial_capital - 1.0
        };

        let years = states.len() as f64 / TRADING_DAYS_PER_YEAR;
        let annualized_return =
            if years > 0.0 && cumulative_return.is_finite() && cumulative_return > -1.0 {
                (1.0 + cumulative_return).powf(1.0 / years) - 1.0
            } else {
                0.0
            };

        let returns = compute_returns(states);
        let (max_drawdown, max_drawdown_duration) = compute_drawdown(states);

        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let defined: Vec<f64> = returns.iter().filter_map(|r| r.value()).collect();
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(&defined, daily_rf);

        let trades = trade_indices(states);
        let (trade_count, win_rate) = compute_win_rate(&trades, &returns);

        PerformanceSummary {
            cumulative_return,
            returns,
            max_drawdown,
            max_drawdown_duration,
            trade_count,
            win_rate,
            annualized_return,
            sharpe_ratio,
            sortino_ratio,
            final_equity,
        }
    }
}

fn compute_returns(states: &[PortfolioState]) -> Vec<IndicatorValue> {
    states
        .windows(2)
        .map(|w| {
            let prev = w[0].total_equity;
            if prev == 0.0 {
                IndicatorValue::Undefined
            } else {
                IndicatorValue::Defined(w[1].total_equity / prev - 1.0)
            }
        })
        .collect()
}

fn compute_drawdown(states: &[PortfolioState]) -> (f64, usize) {
    let Some(first) = states.first() else {
        return (0.0, 0);
    };

    let mut peak = first.total_equity;
    let mut max_dd = 0.0_f64;
    let mut max_duration = 0usize;
    let mut current_duration = 0usize;

    for state in states {
        let equity = state.total_equity;
        if equity >= peak {
            peak = equity;
            current_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
            current_duration += 1;
            max_duration = max_duration.max(current_duration);
        }
    }

    (max_dd, max_duration)
}

/// A trade at bar `i` wins when the return into bar `i+1` is positive. Trades
/// on the last bar have no next bar and are left out of the denominator.
fn compute_win_rate(trades: &[usize], returns: &[IndicatorValue]) -> (usize, f64) {
    let mut judged = 0usize;
    let mut won = 0usize;
    for &i in trades {
        // returns[i] spans bar i → i+1
        if let Some(r) = returns.get(i) {
            judged += 1;
            if matches!(r, IndicatorValue::Defined(v) if *v > 0.0) {
                won += 1;
            }
        }
    }
    let win_rate = if judged > 0 {
        won as f64 / judged as f64
    } else {
        0.0
    };
    (trades.len(), win_rate)
}

fn compute_risk_adjusted(returns: &[f64], daily_rf: f64) -> (f64, f64) {
    if returns.is_empty() {
        return (0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();
    let excess_return = mean - daily_rf;

    let sharpe = if stddev > 0.0 {
        (excess_return / stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    let downside_sum: f64 = returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum();
    let downside_stddev = (downside_sum / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        (excess_return / downside_stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    (sharpe, sortino)
}
