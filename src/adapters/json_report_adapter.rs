//! JSON report adapter implementing ReportPort.

use std::fs::File;
use std::io::{BufWriter, Write};

use crate::domain::error::StockquantError;
use crate::domain::report::RunReport;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Default)]
pub struct JsonReportAdapter {
    pretty: bool,
}

impl JsonReportAdapter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    pub fn render(&self, report: &RunReport) -> Result<String, StockquantError> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(report)
        } else {
            serde_json::to_string(report)
        };
        rendered.map_err(|e| StockquantError::Report {
            reason: format!("failed to serialise report: {}", e),
        })
    }

    /// Serialise into `writer` and flush it, so buffered write errors surface.
    pub fn write_to<W: Write>(&self, report: &RunReport, mut writer: W) -> Result<(), StockquantError> {
        let result = if self.pretty {
            serde_json::to_writer_pretty(&mut writer, report)
        } else {
            serde_json::to_writer(&mut writer, report)
        };
        result.map_err(|e| StockquantError::Report {
            reason: format!("failed to serialise report: {}", e),
        })?;
        writer.flush()?;
        Ok(())
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, report: &RunReport, output_path: &str) -> Result<(), StockquantError> {
        let file = File::create(output_path)?;
        self.write_to(report, BufWriter::new(file))
    }
}
