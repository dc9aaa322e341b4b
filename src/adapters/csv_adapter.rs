//! CSV file data adapter.
//!
//! One file per instrument at `<base_path>/<CODE>.csv`, with a header row
//! `date,open,high,low,close,volume`.

use crate::domain::error::ConfluenceError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

const COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

#[derive(Debug)]
pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{code}.csv"))
    }
}

fn parse_price(value: &str, column: &str, line: u64) -> Result<f64, ConfluenceError> {
    value.trim().parse().map_err(|e| ConfluenceError::Data {
        reason: format!("line {line}: invalid {column} value {value:?}: {e}"),
    })
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, ConfluenceError> {
        let path = self.csv_path(code);
        let content = fs::read_to_string(&path).map_err(|e| ConfluenceError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();
        let mut dropped = 0usize;

        for result in rdr.records() {
            let record = result?;
            let line = record.position().map_or(0, |p| p.line());

            let fields: Vec<&str> = (0..COLUMNS.len())
                .map(|i| record.get(i).unwrap_or("").trim())
                .collect();
            if let Some(blank) = fields.iter().position(|f| f.is_empty()) {
                warn!(code, line, column = COLUMNS[blank], "dropping row with blank field");
                dropped += 1;
                continue;
            }

            let date = NaiveDate::parse_from_str(fields[0], "%Y-%m-%d").map_err(|e| {
                ConfluenceError::Data {
                    reason: format!("line {line}: invalid date {:?}: {e}", fields[0]),
                }
            })?;

            if start_date.is_some_and(|start| date < start)
                || end_date.is_some_and(|end| date > end)
            {
                continue;
            }

            bars.push(OhlcvBar {
                date,
                open: parse_price(fields[1], COLUMNS[1], line)?,
                high: parse_price(fields[2], COLUMNS[2], line)?,
                low: parse_price(fields[3], COLUMNS[3], line)?,
                close: parse_price(fields[4], COLUMNS[4], line)?,
                volume: parse_price(fields[5], COLUMNS[5], line)?,
            });
        }

        if bars.is_empty() {
            return Err(ConfluenceError::NoData {
                code: code.to_string(),
            });
        }

        bars.sort_by_key(|b| b.date);
        debug!(code, bars = bars.len(), dropped, "loaded price data");
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, ConfluenceError> {
        let mut symbols = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        symbols.sort();
        Ok(symbols)
    }
}
