//! Price-history provider port.

use crate::domain::error::StockquantError;
use crate::domain::ohlcv::PriceBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `code`, ascending by date, limited to the inclusive range
    /// when bounds are given.
    fn fetch_bars(
        &self,
        code: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, StockquantError>;

    fn list_symbols(&self) -> Result<Vec<String>, StockquantError>;

    /// First date, last date and bar count, or `None` when the code has no data.
    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, StockquantError>;
}
