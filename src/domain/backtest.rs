//! Backtest configuration and pipeline entry points.
//!
//! `run_backtest` simulates a signal series and evaluates it. `run_pipeline`
//! chains indicators, signals and the backtest for one price series, and
//! `run_many` fans independent pipelines out over the rayon pool.

use rayon::prelude::*;
use tracing::{debug, info};

use super::error::{ConfigurationError, StockquantError};
use super::indicator::{IndicatorConfig, IndicatorSet};
use super::indicator_helpers::compute_indicators;
use super::metrics::PerformanceSummary;
use super::ohlcv::PriceBar;
use super::portfolio::{simulate, PortfolioState, PositionModel};
use super::signal::{generate_signals, CrossoverConfig, SignalSeries};

pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;
pub const DEFAULT_COMMISSION_RATE: f64 = 0.0003;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub commission_rate: f64,
    pub position_model: PositionModel,
    /// Annual rate used by the Sharpe and Sortino ratios.
    pub risk_free_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            commission_rate: DEFAULT_COMMISSION_RATE,
            position_model: PositionModel::default(),
            risk_free_rate: 0.0,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(ConfigurationError::InvalidParameter {
                name: "initial_capital".to_string(),
                reason: format!("must be a finite positive number, got {}", self.initial_capital),
            });
        }
        if !self.commission_rate.is_finite() || self.commission_rate <= 0.0 {
            return Err(ConfigurationError::InvalidParameter {
                name: "commission_rate".to_string(),
                reason: format!("must be a finite positive number, got {}", self.commission_rate),
            });
        }
        if !self.risk_free_rate.is_finite() {
            return Err(ConfigurationError::InvalidParameter {
                name: "risk_free_rate".to_string(),
                reason: "must be finite".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub states: Vec<PortfolioState>,
    pub summary: PerformanceSummary,
}

pub fn run_backtest(
    bars: &[PriceBar],
    signals: &SignalSeries,
    config: &BacktestConfig,
) -> Result<BacktestResult, StockquantError> {
    let states = simulate(bars, signals, config)?;
    let summary = PerformanceSummary::compute(&states, config.initial_capital, config.risk_free_rate);
    debug!(
        bars = states.len(),
        trades = summary.trade_count,
        "simulated portfolio"
    );
    Ok(BacktestResult { states, summary })
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineConfig {
    pub indicators: IndicatorConfig,
    pub crossovers: CrossoverConfig,
    pub backtest: BacktestConfig,
}

impl PipelineConfig {
    /// Check every parameter, including that each crossover pair names a
    /// series the indicator config will produce.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.indicators.validate()?;
        self.backtest.validate()?;
        let keys = self.indicators.series_keys();
        for pair in &self.crossovers.pairs {
            for key in [pair.short, pair.long] {
                if !keys.contains(&key) {
                    return Err(ConfigurationError::UnknownSeries {
                        name: key.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    pub indicators: IndicatorSet,
    pub signals: SignalSeries,
    pub backtest: BacktestResult,
}

/// Price series → indicators → signals → equity curve → summary.
pub fn run_pipeline(
    bars: &[PriceBar],
    config: &PipelineConfig,
) -> Result<PipelineResult, StockquantError> {
    config.validate()?;
    let indicators = compute_indicators(bars, &config.indicators)?;
    let signals = generate_signals(&indicators, &config.crossovers)?;
    let backtest = run_backtest(bars, &signals, &config.backtest)?;
    Ok(PipelineResult {
        indicators,
        signals,
        backtest,
    })
}

/// Run one pipeline per labelled series in parallel. Results keep the input
/// order; one failing series does not affect the others.
pub fn run_many<L>(
    inputs: &[(L, Vec<PriceBar>)],
    config: &PipelineConfig,
) -> Vec<(L, Result<PipelineResult, StockquantError>)>
where
    L: Clone + Send + Sync + std::fmt::Display,
{
    inputs
        .par_iter()
        .map(|(label, bars)| {
            let result = run_pipeline(bars, config);
            match &result {
                Ok(r) => info!(
                    code = %label,
                    bars = bars.len(),
                    trades = r.backtest.summary.trade_count,
                    final_equity = r.backtest.summary.final_equity,
                    "backtest complete"
                ),
                Err(e) => info!(code = %label, error = %e, "backtest failed"),
            }
            (label.clone(), result)
        })
        .collect()
}
