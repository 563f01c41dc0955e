//! Indicator engine entry point.
//!
//! `compute_indicators` validates its inputs, then fans the independent
//! indicator kinds out over the rayon pool and joins the results into one
//! [`IndicatorSet`]. Each kind is a sequential scan; nothing is shared
//! between tasks except the borrowed bars.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::domain::error::StockquantError;
use crate::domain::indicator::{
    calculate_bollinger, calculate_kdj, calculate_macd, calculate_rsi, calculate_sma,
    BollingerParams, IndicatorConfig, IndicatorSeries, IndicatorSet, KdjParams, MacdParams,
};
use crate::domain::ohlcv::{validate_bars, PriceBar};

#[derive(Debug, Clone)]
enum IndicatorJob {
    Sma(Vec<usize>),
    Macd(MacdParams),
    Rsi(Vec<usize>),
    Bollinger(BollingerParams),
    Kdj(KdjParams),
}

impl IndicatorJob {
    fn run(&self, bars: &[PriceBar]) -> Vec<IndicatorSeries> {
        match self {
            IndicatorJob::Sma(periods) => periods.iter().map(|&p| calculate_sma(bars, p)).collect(),
            IndicatorJob::Macd(params) => calculate_macd(bars, *params).into(),
            IndicatorJob::Rsi(periods) => periods.iter().map(|&p| calculate_rsi(bars, p)).collect(),
            IndicatorJob::Bollinger(params) => calculate_bollinger(bars, *params).into(),
            IndicatorJob::Kdj(params) => calculate_kdj(bars, *params).into(),
        }
    }
}

fn plan_jobs(config: &IndicatorConfig) -> Vec<IndicatorJob> {
    let mut jobs = Vec::new();
    if !config.sma.is_empty() {
        jobs.push(IndicatorJob::Sma(config.sma.clone()));
    }
    if let Some(params) = config.macd {
        jobs.push(IndicatorJob::Macd(params));
    }
    if !config.rsi.is_empty() {
        jobs.push(IndicatorJob::Rsi(config.rsi.clone()));
    }
    if let Some(params) = config.bollinger {
        jobs.push(IndicatorJob::Bollinger(params));
    }
    if let Some(params) = config.kdj {
        jobs.push(IndicatorJob::Kdj(params));
    }
    jobs
}

/// Compute every configured indicator series for `bars`.
///
/// Fails before any computation on an invalid config or a bar series that
/// breaks the data contract. A series shorter than the longest warm-up is not
/// an error: the affected series simply stay undefined for longer.
pub fn compute_indicators(
    bars: &[PriceBar],
    config: &IndicatorConfig,
) -> Result<IndicatorSet, StockquantError> {
    config.validate()?;
    validate_bars(bars)?;

    let warmup = config.warmup_bars();
    if bars.len() < warmup {
        warn!(
            bars = bars.len(),
            warmup, "insufficient history: some indicator series will have no defined values"
        );
    }

    let jobs = plan_jobs(config);
    debug!(jobs = jobs.len(), bars = bars.len(), "computing indicators");

    let computed: Vec<Vec<IndicatorSeries>> = jobs.par_iter().map(|job| job.run(bars)).collect();

    let mut set = IndicatorSet::new(bars);
    for series in computed.into_iter().flatten() {
        set.insert(series);
    }
    Ok(set)
}
