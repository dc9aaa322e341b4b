//! Price data port.

use crate::domain::error::ConfluenceError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `code` within the inclusive date range, sorted ascending.
    /// An open bound is unbounded on that side.
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, ConfluenceError>;

    fn list_symbols(&self) -> Result<Vec<String>, ConfluenceError>;
}
