#![allow(dead_code)]

use chrono::NaiveDate;
use confluence::domain::error::ConfluenceError;
pub use confluence::domain::ohlcv::OhlcvBar;
use confluence::ports::data_port::DataPort;
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    /// Date bounds passed to each `fetch_ohlcv` call.
    pub requests: RefCell<Vec<(String, Option<NaiveDate>, Option<NaiveDate>)>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, ConfluenceError> {
        self.requests
            .borrow_mut()
            .push((code.to_string(), start_date, end_date));
        let bars: Vec<OhlcvBar> = self
            .data
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| start_date.is_none_or(|s| b.date >= s))
                    .filter(|b| end_date.is_none_or(|e| b.date <= e))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if bars.is_empty() {
            return Err(ConfluenceError::NoData {
                code: code.to_string(),
            });
        }
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, ConfluenceError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive daily bars from 2024-01-01, volume 1000.
pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    bars_with_volume(closes, &vec![1000.0; closes.len()])
}

pub fn bars_with_volume(closes: &[f64], volumes: &[f64]) -> Vec<OhlcvBar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&close, &volume))| OhlcvBar {
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close + 0.5,
            low: (close - 0.5).max(0.0),
            close,
            volume,
        })
        .collect()
}

/// 55 flat bars at 100 then a close of 101 at index 55: exactly four entry
/// conditions hold there (trend, SMA trend, Bollinger, MACD).
pub fn entry_closes() -> Vec<f64> {
    let mut closes = vec![100.0; 55];
    closes.push(101.0);
    closes
}

/// `entry_closes` followed by `tail`.
pub fn entry_then(tail: &[f64]) -> Vec<OhlcvBar> {
    let mut closes = entry_closes();
    closes.extend_from_slice(tail);
    bars_from_closes(&closes)
}

/// Closes from compounding `returns` on a start price of 100.
pub fn path_from_returns(returns: &[f64]) -> Vec<f64> {
    let mut price = 100.0;
    std::iter::once(price)
        .chain(returns.iter().map(|r| {
            price *= 1.0 + r;
            price
        }))
        .collect()
}

pub fn sample_ini(data_dir: &str) -> String {
    format!(
        r#"
[backtest]
initial_capital = 10000.0
commission_rate = 0.001
risk_free_rate = 0.0
code = SPY
data_dir = {data_dir}

[strategy]
rsi_period = 14
rsi_overbought = 70
rsi_oversold = 30
sma_short = 20
sma_long = 50
stop_loss_pct = 0.05
take_profit_pct = 0.08
entry_condition_threshold = 4
"#
    )
}

pub fn write_price_csv(dir: &std::path::Path, code: &str, bars: &[OhlcvBar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    std::fs::write(dir.join(format!("{code}.csv")), content).unwrap();
}
