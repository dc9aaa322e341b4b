//! Per-bar indicator snapshots.
//!
//! [`IndicatorSet`] computes every series the strategy reads once, up front.
//! [`IndicatorSet::snapshot`] then reads them at a single bar index.

use super::indicator::{
    calculate_bollinger, calculate_macd, calculate_rsi, calculate_sma, calculate_volume_sma,
    IndicatorSeries, IndicatorValue,
};
use super::ohlcv::OhlcvBar;
use super::strategy::StrategyParams;

/// Indicator values at one bar. Only produced once every value is defined.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub sma_short: f64,
    pub sma_long: f64,
    pub bollinger_upper: f64,
    pub bollinger_middle: f64,
    pub bollinger_lower: f64,
    pub macd_line: f64,
    pub macd_signal_line: f64,
    pub volume_sma: f64,
}

#[derive(Debug, Clone)]
pub struct IndicatorSet {
    warmup: usize,
    rsi: IndicatorSeries,
    sma_short: IndicatorSeries,
    sma_long: IndicatorSeries,
    bollinger: IndicatorSeries,
    macd: IndicatorSeries,
    volume_sma: IndicatorSeries,
}

impl IndicatorSet {
    pub fn compute(bars: &[OhlcvBar], params: &StrategyParams) -> Self {
        IndicatorSet {
            warmup: params.warmup_bars(),
            rsi: calculate_rsi(bars, params.rsi_period),
            sma_short: calculate_sma(bars, params.sma_short),
            sma_long: calculate_sma(bars, params.sma_long),
            bollinger: calculate_bollinger(bars, params.bollinger_period, params.bollinger_devfactor),
            macd: calculate_macd(bars, params.macd_fast, params.macd_slow, params.macd_signal),
            volume_sma: calculate_volume_sma(bars, params.volume_sma_period),
        }
    }

    /// Snapshot at `index`, or `None` while history is insufficient.
    pub fn snapshot(&self, index: usize) -> Option<IndicatorSnapshot> {
        if index + 1 < self.warmup {
            return None;
        }

        let (bollinger_upper, bollinger_middle, bollinger_lower) =
            match self.bollinger.valid_at(index)? {
                IndicatorValue::Bollinger {
                    upper,
                    middle,
                    lower,
                } => (*upper, *middle, *lower),
                _ => return None,
            };
        let (macd_line, macd_signal_line) = match self.macd.valid_at(index)? {
            IndicatorValue::Macd { line, signal, .. } => (*line, *signal),
            _ => return None,
        };

        Some(IndicatorSnapshot {
            rsi: self.rsi.simple_at(index)?,
            sma_short: self.sma_short.simple_at(index)?,
            sma_long: self.sma_long.simple_at(index)?,
            bollinger_upper,
            bollinger_middle,
            bollinger_lower,
            macd_line,
            macd_signal_line,
            volume_sma: self.volume_sma.simple_at(index)?,
        })
    }
}
