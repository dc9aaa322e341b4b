//! Strategy parameters for the confluence entry/exit rules.

use super::indicator::{bollinger, macd};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrategyParams {
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    /// Not used by the entry rule; kept so configs can carry it.
    pub rsi_oversold: f64,
    pub sma_short: usize,
    pub sma_long: usize,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    /// How many entry conditions must hold to open a position.
    pub entry_condition_threshold: usize,

    pub bollinger_period: usize,
    pub bollinger_devfactor: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub volume_sma_period: usize,

    /// Fraction of cash committed on entry.
    pub position_fraction: f64,
    pub rsi_entry_lower: f64,
    pub rsi_entry_upper: f64,
    /// Close must be within this multiple of the lower band.
    pub bollinger_proximity: f64,
    /// Volume must exceed its average by this multiple.
    pub volume_surge: f64,
    /// Minimum open profit before a trend-reversal exit is taken.
    pub trend_exit_min_profit: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            rsi_period: 14,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            sma_short: 20,
            sma_long: 50,
            stop_loss_pct: 0.05,
            take_profit_pct: 0.08,
            entry_condition_threshold: 4,
            bollinger_period: bollinger::DEFAULT_PERIOD,
            bollinger_devfactor: bollinger::DEFAULT_DEVFACTOR,
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            volume_sma_period: 20,
            position_fraction: 0.95,
            rsi_entry_lower: 35.0,
            rsi_entry_upper: 50.0,
            bollinger_proximity: 1.02,
            volume_surge: 1.1,
            trend_exit_min_profit: 0.02,
        }
    }
}

impl StrategyParams {
    /// Number of bars that must be seen before any signal is evaluated.
    pub fn warmup_bars(&self) -> usize {
        self.sma_long
    }
}
