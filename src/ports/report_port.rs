//! Report output port trait.

use crate::domain::error::StockquantError;
use crate::domain::report::RunReport;

/// Port for writing run reports.
pub trait ReportPort {
    fn write(&self, report: &RunReport, output_path: &str) -> Result<(), StockquantError>;
}
