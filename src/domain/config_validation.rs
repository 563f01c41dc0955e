//! Configuration validation and pipeline config construction.
//!
//! Reads the `[backtest]`, `[indicators]` and `[signals]` sections through a
//! [`ConfigPort`] and checks every field before any run starts. Parse
//! failures are reported with their section and key.

use crate::domain::backtest::{
    BacktestConfig, PipelineConfig, DEFAULT_COMMISSION_RATE, DEFAULT_INITIAL_CAPITAL,
};
use crate::domain::error::StockquantError;
use crate::domain::indicator::{BollingerParams, IndicatorConfig, KdjParams, MacdParams};
use crate::domain::portfolio::PositionModel;
use crate::domain::signal::CrossoverConfig;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::str::FromStr;

const DISABLED: &str = "none";

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> StockquantError {
    StockquantError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn parse_value<T: FromStr>(section: &str, key: &str, raw: &str) -> Result<T, StockquantError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| invalid(section, key, format!("'{}': {}", raw.trim(), e)))
}

fn optional_value<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, StockquantError>
where
    T::Err: std::fmt::Display,
{
    config
        .get_string(section, key)
        .filter(|s| !s.trim().is_empty())
        .map(|raw| parse_value(section, key, &raw))
        .transpose()
}

/// `None` when the key is absent, `Some(empty)` when it is set to `none`.
fn optional_numbers<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<Vec<T>>, StockquantError>
where
    T::Err: std::fmt::Display,
{
    let Some(items) = config.get_list(section, key) else {
        return Ok(None);
    };
    if items.len() == 1 && items[0].eq_ignore_ascii_case(DISABLED) {
        return Ok(Some(Vec::new()));
    }
    items
        .iter()
        .map(|item| parse_value(section, key, item))
        .collect::<Result<Vec<T>, _>>()
        .map(Some)
}

fn fixed_arity<const N: usize>(
    values: Vec<usize>,
    key: &str,
) -> Result<Option<[usize; N]>, StockquantError> {
    if values.is_empty() {
        return Ok(None);
    }
    let len = values.len();
    values
        .try_into()
        .map(Some)
        .map_err(|_| invalid("indicators", key, format!("expected {} values, got {}", N, len)))
}

pub fn build_indicator_config(config: &dyn ConfigPort) -> Result<IndicatorConfig, StockquantError> {
    let defaults = IndicatorConfig::default();

    let sma = optional_numbers::<usize>(config, "indicators", "sma")?.unwrap_or(defaults.sma);
    let rsi = optional_numbers::<usize>(config, "indicators", "rsi")?.unwrap_or(defaults.rsi);

    let macd = match optional_numbers::<usize>(config, "indicators", "macd")? {
        None => defaults.macd,
        Some(values) => fixed_arity::<3>(values, "macd")?.map(|[fast, slow, signal]| MacdParams {
            fast,
            slow,
            signal,
        }),
    };

    let kdj = match optional_numbers::<usize>(config, "indicators", "kdj")? {
        None => defaults.kdj,
        Some(values) => fixed_arity::<3>(values, "kdj")?.map(|[fastk, slowk, slowd]| KdjParams {
            fastk,
            slowk,
            slowd,
        }),
    };

    let bollinger = match optional_numbers::<f64>(config, "indicators", "bollinger")? {
        None => defaults.bollinger,
        Some(values) if values.is_empty() => None,
        Some(values) => match values.as_slice() {
            &[period, k] if period.fract() == 0.0 && period >= 0.0 => Some(BollingerParams {
                period: period as usize,
                k,
            }),
            _ => {
                return Err(invalid(
                    "indicators",
                    "bollinger",
                    "expected '<period>,<k>' with an integer period",
                ))
            }
        },
    };

    let indicators = IndicatorConfig {
        sma,
        macd,
        rsi,
        bollinger,
        kdj,
    };
    indicators.validate()?;
    Ok(indicators)
}

pub fn build_crossover_config(config: &dyn ConfigPort) -> Result<CrossoverConfig, StockquantError> {
    match config.get_string("signals", "pairs") {
        None => Ok(CrossoverConfig::default()),
        Some(list) if list.trim().eq_ignore_ascii_case(DISABLED) => {
            Ok(CrossoverConfig { pairs: Vec::new() })
        }
        Some(list) => Ok(CrossoverConfig::parse(&list)?),
    }
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, StockquantError> {
    let initial_capital = optional_value::<f64>(config, "backtest", "initial_capital")?
        .unwrap_or(DEFAULT_INITIAL_CAPITAL);
    if !initial_capital.is_finite() || initial_capital <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }

    let commission_rate = optional_value::<f64>(config, "backtest", "commission_rate")?
        .unwrap_or(DEFAULT_COMMISSION_RATE);
    if !commission_rate.is_finite() || commission_rate <= 0.0 {
        return Err(invalid(
            "backtest",
            "commission_rate",
            "commission_rate must be positive",
        ));
    }

    let risk_free_rate = optional_value::<f64>(config, "backtest", "risk_free_rate")?.unwrap_or(0.0);
    if !(0.0..1.0).contains(&risk_free_rate) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }

    let position_model =
        optional_value::<PositionModel>(config, "backtest", "position_model")?.unwrap_or_default();

    Ok(BacktestConfig {
        initial_capital,
        commission_rate,
        position_model,
        risk_free_rate,
    })
}

/// Build and cross-check the full pipeline config.
pub fn build_pipeline_config(config: &dyn ConfigPort) -> Result<PipelineConfig, StockquantError> {
    let pipeline = PipelineConfig {
        indicators: build_indicator_config(config)?,
        crossovers: build_crossover_config(config)?,
        backtest: build_backtest_config(config)?,
    };
    pipeline.validate()?;
    Ok(pipeline)
}

/// Optional inclusive date bounds from `start_date` / `end_date`.
pub fn date_range(
    config: &dyn ConfigPort,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>), StockquantError> {
    let start = parse_date(config, "start_date")?;
    let end = parse_date(config, "end_date")?;
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(invalid(
                "backtest",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }
    Ok((start, end))
}

fn parse_date(config: &dyn ConfigPort, field: &str) -> Result<Option<NaiveDate>, StockquantError> {
    match config.get_string("backtest", field) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                invalid(
                    "backtest",
                    field,
                    format!("invalid {} format, expected YYYY-MM-DD", field),
                )
            }),
    }
}

/// Validate everything a backtest run reads from the file.
pub fn validate_config(config: &dyn ConfigPort) -> Result<PipelineConfig, StockquantError> {
    date_range(config)?;
    build_pipeline_config(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use crate::domain::error::ConfigurationError;
    use crate::domain::indicator::SeriesKey;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn empty_file_gives_defaults() {
        let pipeline = validate_config(&make_config("[backtest]\n")).unwrap();
        assert_eq!(pipeline, PipelineConfig::default());
    }

    #[test]
    fn full_config_is_parsed() {
        let config = make_config(
            r#"
[backtest]
initial_capital = 50000
commission_rate = 0.001
risk_free_rate = 0.02
position_model = hold
start_date = 2020-01-01
end_date = 2024-12-31

[indicators]
sma = 10, 30
macd = 8,21,5
rsi = 14
bollinger = 20, 2.5
kdj = none

[signals]
pairs = SMA10:SMA30, MACD:MACD_Signal
"#,
        );
        let pipeline = validate_config(&config).unwrap();
        assert_eq!(pipeline.backtest.initial_capital, 50000.0);
        assert_eq!(pipeline.backtest.commission_rate, 0.001);
        assert_eq!(pipeline.backtest.position_model, PositionModel::Hold);
        assert_eq!(pipeline.indicators.sma, vec![10, 30]);
        assert_eq!(
            pipeline.indicators.macd,
            Some(MacdParams {
                fast: 8,
                slow: 21,
                signal: 5
            })
        );
        assert_eq!(pipeline.indicators.rsi, vec![14]);
        assert_eq!(
            pipeline.indicators.bollinger,
            Some(BollingerParams { period: 20, k: 2.5 })
        );
        assert_eq!(pipeline.indicators.kdj, None);
        assert_eq!(pipeline.crossovers.pairs[0].short, SeriesKey::Sma(10));
        assert_eq!(
            date_range(&config).unwrap(),
            (
                NaiveDate::from_ymd_opt(2020, 1, 1),
                NaiveDate::from_ymd_opt(2024, 12, 31)
            )
        );
    }

    #[test]
    fn initial_capital_must_be_positive() {
        for value in ["0", "-100"] {
            let config = make_config(&format!("[backtest]\ninitial_capital = {value}\n"));
            let err = build_backtest_config(&config).unwrap_err();
            assert!(
                matches!(err, StockquantError::ConfigInvalid { ref key, .. } if key == "initial_capital")
            );
        }
    }

    #[test]
    fn non_numeric_capital_is_reported() {
        let config = make_config("[backtest]\ninitial_capital = lots\n");
        let err = build_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, StockquantError::ConfigInvalid { section, key, .. } if section == "backtest" && key == "initial_capital")
        );
    }

    #[test]
    fn commission_rate_must_be_positive() {
        for value in ["-0.1", "0", "0.0"] {
            let config = make_config(&format!("[backtest]\ncommission_rate = {value}\n"));
            let err = build_backtest_config(&config).unwrap_err();
            assert!(
                matches!(err, StockquantError::ConfigInvalid { key, .. } if key == "commission_rate"),
                "{value}"
            );
        }
    }

    #[test]
    fn risk_free_rate_out_of_range_fails() {
        let config = make_config("[backtest]\nrisk_free_rate = 1.5\n");
        let err = build_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, StockquantError::ConfigInvalid { key, .. } if key == "risk_free_rate")
        );
    }

    #[test]
    fn unknown_position_model_fails() {
        let config = make_config("[backtest]\nposition_model = kelly\n");
        let err = build_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, StockquantError::ConfigInvalid { key, .. } if key == "position_model")
        );
    }

    #[test]
    fn invalid_date_format_fails() {
        let config = make_config("[backtest]\nstart_date = 2020/01/01\n");
        let err = date_range(&config).unwrap_err();
        assert!(matches!(err, StockquantError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn start_after_end_fails() {
        let config = make_config("[backtest]\nstart_date = 2024-12-31\nend_date = 2020-01-01\n");
        assert!(date_range(&config).is_err());
    }

    #[test]
    fn open_ended_range_is_allowed() {
        let config = make_config("[backtest]\nend_date = 2020-01-01\n");
        assert_eq!(
            date_range(&config).unwrap(),
            (None, NaiveDate::from_ymd_opt(2020, 1, 1))
        );
    }

    #[test]
    fn zero_period_is_configuration_error() {
        let config = make_config("[indicators]\nsma = 5, 0\n");
        let err = build_indicator_config(&config).unwrap_err();
        assert!(matches!(
            err,
            StockquantError::Configuration(ConfigurationError::NonPositivePeriod { .. })
        ));
    }

    #[test]
    fn macd_needs_three_values() {
        let config = make_config("[indicators]\nmacd = 12,26\n");
        let err = build_indicator_config(&config).unwrap_err();
        assert!(matches!(err, StockquantError::ConfigInvalid { key, .. } if key == "macd"));
    }

    #[test]
    fn negative_period_is_invalid_value() {
        let config = make_config("[indicators]\nrsi = -6\n");
        let err = build_indicator_config(&config).unwrap_err();
        assert!(matches!(err, StockquantError::ConfigInvalid { key, .. } if key == "rsi"));
    }

    #[test]
    fn bollinger_requires_integer_period() {
        let config = make_config("[indicators]\nbollinger = 20.5, 2\n");
        let err = build_indicator_config(&config).unwrap_err();
        assert!(matches!(err, StockquantError::ConfigInvalid { key, .. } if key == "bollinger"));
    }

    #[test]
    fn pair_on_disabled_indicator_fails() {
        let config = make_config("[indicators]\nmacd = none\n");
        let err = build_pipeline_config(&config).unwrap_err();
        assert!(matches!(
            err,
            StockquantError::Configuration(ConfigurationError::UnknownSeries { ref name }) if name == "MACD"
        ));
    }

    #[test]
    fn unknown_pair_name_fails() {
        let config = make_config("[signals]\npairs = SMA5:WMA20\n");
        let err = build_crossover_config(&config).unwrap_err();
        assert!(matches!(
            err,
            StockquantError::Configuration(ConfigurationError::UnknownSeries { .. })
        ));
    }

    #[test]
    fn pairs_none_disables_signals() {
        let config = make_config("[signals]\npairs = none\n");
        assert!(build_crossover_config(&config).unwrap().pairs.is_empty());
    }
}
