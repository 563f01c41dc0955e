//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::backtest::{run_many, PipelineConfig};
use crate::domain::config_validation::{
    build_indicator_config, build_pipeline_config, date_range, validate_config,
};
use crate::domain::error::StockquantError;
use crate::domain::indicator::IndicatorConfig;
use crate::domain::indicator_helpers::compute_indicators;
use crate::domain::report::{CodeReport, ConfigReport, FailedRun, RunReport};
use crate::domain::universe::{load_universe, parse_codes};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_DATA_DIR: &str = "data";

#[derive(Parser, Debug)]
#[command(name = "stockquant", about = "Technical-indicator signal and backtest engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the crossover backtest for every configured code
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated codes, overriding the config
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// JSON report path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Equity curve CSV path
        #[arg(long)]
        equity_csv: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Compute indicators for one code and write them as JSON
    Indicators {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: String,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for code(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// List codes available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            code,
            data_dir,
            output,
            equity_csv,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, code.as_deref())
            } else {
                run_backtest(
                    &config,
                    code.as_deref(),
                    data_dir.as_deref(),
                    output.as_deref(),
                    equity_csv.as_deref(),
                )
            }
        }
        Command::Indicators {
            config,
            code,
            data_dir,
            output,
        } => run_indicators(&config, &code, data_dir.as_deref(), output.as_deref()),
        Command::Validate { config } => run_dry_run(&config, None),
        Command::Info {
            config,
            code,
            data_dir,
        } => run_info(&config, code.as_deref(), data_dir.as_deref()),
        Command::ListSymbols { config, data_dir } => {
            run_list_symbols(&config, data_dir.as_deref())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, StockquantError> {
    eprintln!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

/// Codes from `--code`, then `[backtest] codes`, then `[backtest] code`.
pub fn resolve_codes(
    config: &dyn ConfigPort,
    code_override: Option<&str>,
) -> Result<Vec<String>, StockquantError> {
    let (key, raw) = match code_override {
        Some(list) => ("code", list.to_string()),
        None => match (
            config.get_string("backtest", "codes"),
            config.get_string("backtest", "code"),
        ) {
            (Some(list), _) if !list.trim().is_empty() => ("codes", list),
            (_, Some(code)) if !code.trim().is_empty() => ("code", code),
            _ => {
                return Err(StockquantError::ConfigMissing {
                    section: "backtest".to_string(),
                    key: "code".to_string(),
                })
            }
        },
    };

    parse_codes(&raw).map_err(|e| StockquantError::ConfigInvalid {
        section: "backtest".to_string(),
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// `--data-dir`, then `[backtest] data_dir`, then `./data`.
pub fn resolve_data_dir(config: &dyn ConfigPort, data_dir_override: Option<&Path>) -> PathBuf {
    data_dir_override
        .map(Path::to_path_buf)
        .or_else(|| {
            config
                .get_string("backtest", "data_dir")
                .filter(|s| !s.trim().is_empty())
                .map(|s| PathBuf::from(s.trim()))
        })
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Load every code, run the pipelines in parallel and collect the report.
pub fn execute_backtest(
    data_port: &dyn DataPort,
    codes: &[String],
    range: (Option<NaiveDate>, Option<NaiveDate>),
    pipeline: &PipelineConfig,
) -> Result<RunReport, StockquantError> {
    let loaded = load_universe(data_port, codes, range.0, range.1)?;

    eprintln!(
        "Running backtest: {} of {} codes",
        loaded.series.len(),
        codes.len()
    );

    let mut runs = Vec::new();
    let mut failed: Vec<FailedRun> = loaded
        .skipped
        .iter()
        .map(|s| FailedRun {
            code: s.code.clone(),
            error: s.reason.to_string(),
        })
        .collect();

    let mut first_error = None;
    for (code, result) in run_many(&loaded.series, pipeline) {
        match result {
            Ok(r) => runs.push(CodeReport::from_pipeline(&code, &r)),
            Err(e) => {
                eprintln!("warning: {} failed ({})", code, e);
                failed.push(FailedRun {
                    code,
                    error: e.to_string(),
                });
                first_error.get_or_insert(e);
            }
        }
    }

    if runs.is_empty() {
        return Err(first_error.unwrap_or_else(|| StockquantError::NoData {
            code: codes.join(","),
        }));
    }

    Ok(RunReport {
        config: ConfigReport::from(pipeline),
        runs,
        failed,
    })
}

fn run_backtest(
    config_path: &Path,
    code_override: Option<&str>,
    data_dir_override: Option<&Path>,
    output_path: Option<&Path>,
    equity_csv_path: Option<&Path>,
) -> Result<(), StockquantError> {
    // Stage 1: Load and validate config
    let adapter = load_config(config_path)?;
    let pipeline = build_pipeline_config(&adapter)?;
    let range = date_range(&adapter)?;
    let codes = resolve_codes(&adapter, code_override)?;
    let data_dir = resolve_data_dir(&adapter, data_dir_override);
    debug!(codes = codes.len(), data_dir = %data_dir.display(), "resolved backtest inputs");

    // Stage 2: Load data and run
    let data_port = CsvAdapter::new(data_dir);
    let report = execute_backtest(&data_port, &codes, range, &pipeline)?;

    // Stage 3: Console summary
    print_summary(&report);

    // Stage 4: Reports
    if let Some(path) = output_path {
        write_report(&JsonReportAdapter::new(true), &report, path)?;
    }
    if let Some(path) = equity_csv_path {
        write_report(&CsvReportAdapter, &report, path)?;
    }
    Ok(())
}

fn write_report(
    writer: &dyn ReportPort,
    report: &RunReport,
    path: &Path,
) -> Result<(), StockquantError> {
    let path_str = path.to_str().ok_or_else(|| StockquantError::Report {
        reason: format!("non UTF-8 output path: {}", path.display()),
    })?;
    writer.write(report, path_str)?;
    eprintln!("Report written to: {}", path.display());
    Ok(())
}

pub fn print_summary(report: &RunReport) {
    let pct = |v: Option<f64>| match v {
        Some(x) => format!("{:.2}%", x * 100.0),
        None => "n/a".to_string(),
    };
    let num = |v: Option<f64>| match v {
        Some(x) => format!("{:.2}", x),
        None => "n/a".to_string(),
    };

    for run in &report.runs {
        let Some(summary) = &run.summary else {
            continue;
        };
        eprintln!("\n=== {} ({} bars) ===", run.code, run.bars);
        eprintln!("Cumulative Return: {}", pct(summary.cumulative_return));
        eprintln!("Annualized:        {}", pct(summary.annualized_return));
        eprintln!("Sharpe Ratio:      {}", num(summary.sharpe_ratio));
        eprintln!("Sortino Ratio:     {}", num(summary.sortino_ratio));
        eprintln!(
            "Max Drawdown:      -{} ({} bars)",
            pct(summary.max_drawdown),
            summary.max_drawdown_duration
        );
        eprintln!("Trades:            {}", summary.trade_count);
        eprintln!("Win Rate:          {}", pct(summary.win_rate));
        eprintln!("Final Equity:      {}", num(summary.final_equity));
    }

    if !report.failed.is_empty() {
        eprintln!("\n=== Skipped ===");
        for f in &report.failed {
            eprintln!("  {}: {}", f.code, f.error);
        }
    }
}

pub fn run_dry_run(config_path: &Path, code_override: Option<&str>) -> Result<(), StockquantError> {
    let adapter = load_config(config_path)?;
    let pipeline = validate_config(&adapter)?;
    eprintln!("Config validated successfully");

    let backtest = &pipeline.backtest;
    eprintln!("\nBacktest:");
    eprintln!("  initial_capital: {}", backtest.initial_capital);
    eprintln!("  commission_rate: {}", backtest.commission_rate);
    eprintln!("  risk_free_rate:  {}", backtest.risk_free_rate);
    eprintln!("  position_model:  {}", backtest.position_model);

    eprintln!("\nIndicators to compute:");
    for key in pipeline.indicators.series_keys() {
        eprintln!("  {}", key);
    }

    eprintln!("\nCrossover pairs:");
    if pipeline.crossovers.pairs.is_empty() {
        eprintln!("  (none)");
    }
    for pair in &pipeline.crossovers.pairs {
        eprintln!("  {}", pair);
    }

    eprintln!("\nUniverse:");
    match resolve_codes(&adapter, code_override) {
        Ok(codes) => eprintln!("  codes: {}", codes.join(", ")),
        Err(StockquantError::ConfigMissing { .. }) => eprintln!("  codes: (none configured)"),
        Err(e) => return Err(e),
    }

    eprintln!("\nDry run complete: configuration is valid");
    Ok(())
}

/// Indicators for one code. The report carries only the indicator settings.
pub fn execute_indicators(
    data_port: &dyn DataPort,
    code: &str,
    range: (Option<NaiveDate>, Option<NaiveDate>),
    indicators: &IndicatorConfig,
) -> Result<RunReport, StockquantError> {
    let code = code.trim().to_uppercase();
    let bars = data_port.fetch_bars(&code, range.0, range.1)?;
    if bars.is_empty() {
        return Err(StockquantError::NoData { code });
    }

    let set = compute_indicators(&bars, indicators)?;
    Ok(RunReport {
        config: ConfigReport::from(indicators),
        runs: vec![CodeReport::from_indicators(&code, &set)],
        failed: Vec::new(),
    })
}

fn run_indicators(
    config_path: &Path,
    code: &str,
    data_dir_override: Option<&Path>,
    output_path: Option<&Path>,
) -> Result<(), StockquantError> {
    let adapter = load_config(config_path)?;
    let indicators = build_indicator_config(&adapter)?;
    let range = date_range(&adapter)?;
    let data_port = CsvAdapter::new(resolve_data_dir(&adapter, data_dir_override));
    let report = execute_indicators(&data_port, code, range, &indicators)?;

    let json_adapter = JsonReportAdapter::new(true);
    match output_path {
        Some(path) => write_report(&json_adapter, &report, path),
        None => {
            println!("{}", json_adapter.render(&report)?);
            Ok(())
        }
    }
}

fn run_info(
    config_path: &Path,
    code: Option<&str>,
    data_dir_override: Option<&Path>,
) -> Result<(), StockquantError> {
    let adapter = load_config(config_path)?;
    let data_port = CsvAdapter::new(resolve_data_dir(&adapter, data_dir_override));

    let codes = match code {
        Some(c) => resolve_codes(&adapter, Some(c))?,
        None => data_port.list_symbols()?,
    };

    for code in &codes {
        match data_port.get_data_range(code)? {
            Some((first, last, count)) => {
                println!("{}: {} bars, {} to {}", code, count, first, last)
            }
            None => println!("{}: no data", code),
        }
    }
    Ok(())
}

fn run_list_symbols(config_path: &Path, data_dir_override: Option<&Path>) -> Result<(), StockquantError> {
    let adapter = load_config(config_path)?;
    let data_dir = resolve_data_dir(&adapter, data_dir_override);
    let symbols = CsvAdapter::new(data_dir.clone()).list_symbols()?;

    if symbols.is_empty() {
        eprintln!("No symbols found in {}", data_dir.display());
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn cli_parses_backtest() {
        let cli = Cli::try_parse_from([
            "stockquant",
            "backtest",
            "-c",
            "run.ini",
            "--code",
            "AAPL",
            "--equity-csv",
            "eq.csv",
            "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Command::Backtest {
                config,
                code,
                equity_csv,
                dry_run,
                output,
                ..
            } => {
                assert_eq!(config, PathBuf::from("run.ini"));
                assert_eq!(code.as_deref(), Some("AAPL"));
                assert_eq!(equity_csv, Some(PathBuf::from("eq.csv")));
                assert!(dry_run);
                assert!(output.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_requires_code_for_indicators() {
        assert!(Cli::try_parse_from(["stockquant", "indicators", "-c", "run.ini"]).is_err());
    }

    #[test]
    fn resolve_codes_precedence() {
        let cfg = config("[backtest]\ncodes = aapl, msft\ncode = GOOG\n");
        assert_eq!(resolve_codes(&cfg, None).unwrap(), vec!["AAPL", "MSFT"]);
        assert_eq!(resolve_codes(&cfg, Some("tsla")).unwrap(), vec!["TSLA"]);

        let cfg = config("[backtest]\ncode = goog\n");
        assert_eq!(resolve_codes(&cfg, None).unwrap(), vec!["GOOG"]);
    }

    #[test]
    fn resolve_codes_missing_and_invalid() {
        let err = resolve_codes(&config("[backtest]\n"), None).unwrap_err();
        assert!(matches!(err, StockquantError::ConfigMissing { key, .. } if key == "code"));

        let err = resolve_codes(&config("[backtest]\ncodes = A,,B\n"), None).unwrap_err();
        assert!(matches!(err, StockquantError::ConfigInvalid { key, .. } if key == "codes"));
    }

    #[test]
    fn resolve_data_dir_precedence() {
        let cfg = config("[backtest]\ndata_dir = /srv/prices\n");
        assert_eq!(resolve_data_dir(&cfg, None), PathBuf::from("/srv/prices"));
        assert_eq!(
            resolve_data_dir(&cfg, Some(Path::new("/tmp/x"))),
            PathBuf::from("/tmp/x")
        );
        assert_eq!(
            resolve_data_dir(&config("[backtest]\n"), None),
            PathBuf::from(DEFAULT_DATA_DIR)
        );
    }
}
