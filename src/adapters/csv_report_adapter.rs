//! Trade log CSV writer.

use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::ConfluenceError;
use crate::domain::position::Trade;
use crate::ports::report_port::ReportPort;

const HEADER: [&str; 10] = [
    "entry_date",
    "exit_date",
    "entry_price",
    "exit_price",
    "size",
    "commission",
    "pnl",
    "is_win",
    "exit_reason",
    "duration_days",
];

/// Writes one row per closed trade. An open position is not a trade and is
/// not written.
#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn row(trade: &Trade) -> [String; 10] {
        [
            trade.entry_date.to_string(),
            trade.exit_date.to_string(),
            format!("{:.4}", trade.entry_price),
            format!("{:.4}", trade.exit_price),
            format!("{:.6}", trade.size),
            format!("{:.4}", trade.commission_paid_total),
            format!("{:.4}", trade.pnl),
            trade.is_win.to_string(),
            trade.exit_reason.to_string(),
            trade.duration_days().to_string(),
        ]
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), ConfluenceError> {
        let mut writer = csv::Writer::from_path(output_path)?;
        writer.write_record(HEADER)?;
        for trade in &result.portfolio.closed_trades {
            writer.write_record(Self::row(trade))?;
        }
        writer.flush()?;
        Ok(())
    }
}
