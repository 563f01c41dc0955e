//! Serialisable run reports.
//!
//! Every float is sanitised on the way in, so undefined indicator values
//! and non-finite results appear as `None`.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use super::backtest::{PipelineConfig, PipelineResult};
use super::indicator::{IndicatorConfig, IndicatorSet};
use super::metrics::PerformanceSummary;
use super::portfolio::PortfolioState;
use super::sanitize::{sanitize, sanitize_value};
use super::signal::SignalSeries;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub cumulative_return: Option<f64>,
    pub annualized_return: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub max_drawdown_duration: usize,
    pub sharpe_ratio: Option<f64>,
    pub sortino_ratio: Option<f64>,
    pub trade_count: usize,
    pub win_rate: Option<f64>,
    pub final_equity: Option<f64>,
    pub returns: Vec<Option<f64>>,
}

impl From<&PerformanceSummary> for SummaryReport {
    fn from(s: &PerformanceSummary) -> Self {
        SummaryReport {
            cumulative_return: sanitize(s.cumulative_return),
            annualized_return: sanitize(s.annualized_return),
            max_drawdown: sanitize(s.max_drawdown),
            max_drawdown_duration: s.max_drawdown_duration,
            sharpe_ratio: sanitize(s.sharpe_ratio),
            sortino_ratio: sanitize(s.sortino_ratio),
            trade_count: s.trade_count,
            win_rate: sanitize(s.win_rate),
            final_equity: sanitize(s.final_equity),
            returns: s.returns.iter().map(|&r| sanitize_value(r)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityRow {
    pub date: NaiveDate,
    pub position_quantity: i64,
    pub cash: Option<f64>,
    pub stock_value: Option<f64>,
    pub total_equity: Option<f64>,
    pub signal: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeReport {
    pub code: String,
    pub bars: usize,
    pub dates: Vec<NaiveDate>,
    pub indicators: BTreeMap<String, Vec<Option<f64>>>,
    pub signals: Vec<i64>,
    pub summary: Option<SummaryReport>,
    pub equity_curve: Vec<EquityRow>,
}

impl CodeReport {
    /// Indicators only, as produced by the `indicators` command.
    pub fn from_indicators(code: &str, indicators: &IndicatorSet) -> Self {
        CodeReport {
            code: code.to_string(),
            bars: indicators.bar_count,
            dates: indicators.dates.clone(),
            indicators: indicator_columns(indicators),
            signals: Vec::new(),
            summary: None,
            equity_curve: Vec::new(),
        }
    }

    pub fn from_pipeline(code: &str, result: &PipelineResult) -> Self {
        CodeReport {
            signals: signal_column(&result.signals),
            summary: Some(SummaryReport::from(&result.backtest.summary)),
            equity_curve: equity_rows(&result.backtest.states, &result.signals),
            ..CodeReport::from_indicators(code, &result.indicators)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestSettings {
    pub initial_capital: f64,
    pub commission_rate: f64,
    pub risk_free_rate: f64,
    pub position_model: String,
}

/// Settings a run actually used. Commands that stop after the indicators
/// leave `pairs` and `backtest` out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigReport {
    pub series: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pairs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backtest: Option<BacktestSettings>,
}

impl From<&IndicatorConfig> for ConfigReport {
    fn from(indicators: &IndicatorConfig) -> Self {
        ConfigReport {
            series: indicators
                .series_keys()
                .iter()
                .map(ToString::to_string)
                .collect(),
            pairs: None,
            backtest: None,
        }
    }
}

impl From<&PipelineConfig> for ConfigReport {
    fn from(config: &PipelineConfig) -> Self {
        ConfigReport {
            pairs: Some(config.crossovers.pairs.iter().map(ToString::to_string).collect()),
            backtest: Some(BacktestSettings {
                initial_capital: config.backtest.initial_capital,
                commission_rate: config.backtest.commission_rate,
                risk_free_rate: config.backtest.risk_free_rate,
                position_model: config.backtest.position_model.to_string(),
            }),
            ..ConfigReport::from(&config.indicators)
        }
    }
}

/// Everything a report writer receives for one invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub config: ConfigReport,
    pub runs: Vec<CodeReport>,
    pub failed: Vec<FailedRun>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedRun {
    pub code: String,
    pub error: String,
}

fn indicator_columns(indicators: &IndicatorSet) -> BTreeMap<String, Vec<Option<f64>>> {
    indicators
        .keys()
        .into_iter()
        .filter_map(|key| indicators.get(&key))
        .map(|series| {
            let values = series.values.iter().map(|p| sanitize_value(p.value)).collect();
            (series.key.to_string(), values)
        })
        .collect()
}

fn signal_column(signals: &SignalSeries) -> Vec<i64> {
    signals.points.iter().map(|p| p.signal.quantity()).collect()
}

fn equity_rows(states: &[PortfolioState], signals: &SignalSeries) -> Vec<EquityRow> {
    states
        .iter()
        .enumerate()
        .map(|(i, s)| EquityRow {
            date: s.date,
            position_quantity: s.position_quantity,
            cash: sanitize(s.cash),
            stock_value: sanitize(s.stock_value),
            total_equity: sanitize(s.total_equity),
            signal: signals.signal_at(i).quantity(),
        })
        .collect()
}
