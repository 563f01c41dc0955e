//! Equity-curve CSV writer implementing ReportPort.
//!
//! One row per code and bar. Sanitised values are written as empty cells.

use crate::domain::error::StockquantError;
use crate::domain::report::RunReport;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

fn csv_error(e: csv::Error) -> StockquantError {
    StockquantError::Report {
        reason: format!("CSV write error: {}", e),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &RunReport, output_path: &str) -> Result<(), StockquantError> {
        let mut writer = csv::Writer::from_path(output_path).map_err(|e| match e.into_kind() {
            csv::ErrorKind::Io(io) => StockquantError::Io(io),
            other => StockquantError::Report {
                reason: format!("CSV write error: {:?}", other),
            },
        })?;

        writer
            .write_record([
                "code",
                "date",
                "signal",
                "position_quantity",
                "cash",
                "stock_value",
                "total_equity",
            ])
            .map_err(csv_error)?;

        let cell = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
        for run in &report.runs {
            for row in &run.equity_curve {
                writer
                    .write_record([
                        run.code.clone(),
                        row.date.to_string(),
                        row.signal.to_string(),
                        row.position_quantity.to_string(),
                        cell(row.cash),
                        cell(row.stock_value),
                        cell(row.total_equity),
                    ])
                    .map_err(csv_error)?;
            }
        }

        writer.flush()?;
        Ok(())
    }
}
