//! Entry scoring and exit triggers.
//!
//! When flat, each [`EntryCondition`] is checked against the bar and its
//! indicator snapshot. An entry fires once enough of them hold. When a
//! position is open, exits are checked in [`ExitReason::PRIORITY`] order and
//! the first match wins.

use std::fmt;

use super::ohlcv::OhlcvBar;
use super::portfolio::Portfolio;
use super::position::Position;
use super::snapshot::IndicatorSnapshot;
use super::strategy::StrategyParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntryCondition {
    /// close > long SMA
    TrendUp,
    /// RSI strictly inside the entry band
    RsiGood,
    /// close at or near the lower Bollinger band
    BollingerSignal,
    /// MACD line above its signal line
    MacdSignal,
    /// volume above its average by the surge multiple
    VolumeGood,
    /// short SMA above long SMA
    SmaTrend,
}

impl EntryCondition {
    pub const ALL: [EntryCondition; 6] = [
        EntryCondition::TrendUp,
        EntryCondition::RsiGood,
        EntryCondition::BollingerSignal,
        EntryCondition::MacdSignal,
        EntryCondition::VolumeGood,
        EntryCondition::SmaTrend,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EntryCondition::TrendUp => "trend_up",
            EntryCondition::RsiGood => "rsi_good",
            EntryCondition::BollingerSignal => "bb_signal",
            EntryCondition::MacdSignal => "macd_signal",
            EntryCondition::VolumeGood => "volume_good",
            EntryCondition::SmaTrend => "sma_trend",
        }
    }

    pub fn evaluate(&self, snap: &IndicatorSnapshot, bar: &OhlcvBar, params: &StrategyParams) -> bool {
        match self {
            EntryCondition::TrendUp => bar.close > snap.sma_long,
            EntryCondition::RsiGood => {
                params.rsi_entry_lower < snap.rsi && snap.rsi < params.rsi_entry_upper
            }
            EntryCondition::BollingerSignal => {
                bar.close <= snap.bollinger_lower * params.bollinger_proximity
            }
            EntryCondition::MacdSignal => snap.macd_line > snap.macd_signal_line,
            EntryCondition::VolumeGood => bar.volume > snap.volume_sma * params.volume_surge,
            EntryCondition::SmaTrend => snap.sma_short > snap.sma_long,
        }
    }
}

impl fmt::Display for EntryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    RsiOverbought,
    TrendReversal,
}

impl ExitReason {
    /// Checked in this order; the first trigger wins.
    pub const PRIORITY: [ExitReason; 4] = [
        ExitReason::TakeProfit,
        ExitReason::StopLoss,
        ExitReason::RsiOverbought,
        ExitReason::TrendReversal,
    ];

    fn triggered(&self, snap: &IndicatorSnapshot, close: f64, profit_pct: f64, params: &StrategyParams) -> bool {
        match self {
            ExitReason::TakeProfit => profit_pct >= params.take_profit_pct,
            ExitReason::StopLoss => profit_pct <= -params.stop_loss_pct,
            ExitReason::RsiOverbought => snap.rsi > params.rsi_overbought,
            ExitReason::TrendReversal => {
                close < snap.sma_short
                    && snap.sma_short < snap.sma_long
                    && profit_pct > params.trend_exit_min_profit
            }
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::TakeProfit => write!(f, "take profit"),
            ExitReason::StopLoss => write!(f, "stop loss"),
            ExitReason::RsiOverbought => write!(f, "rsi exit"),
            ExitReason::TrendReversal => write!(f, "trend exit"),
        }
    }
}

/// Per-condition outcome of an entry check.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntryScore {
    pub checks: Vec<(EntryCondition, bool)>,
    pub conditions_met: usize,
}

impl EntryScore {
    pub fn holds(&self, condition: EntryCondition) -> bool {
        self.checks.iter().any(|&(c, ok)| c == condition && ok)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntrySignal {
    pub price: f64,
    pub size: f64,
    pub score: EntryScore,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitSignal {
    pub price: f64,
    pub reason: ExitReason,
    pub profit_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Enter(EntrySignal),
    Exit(ExitSignal),
}

#[derive(Debug, Clone)]
pub struct SignalEvaluator {
    params: StrategyParams,
    conditions: Vec<EntryCondition>,
}

impl SignalEvaluator {
    pub fn new(params: StrategyParams) -> Self {
        Self::with_conditions(params, EntryCondition::ALL.to_vec())
    }

    pub fn with_conditions(params: StrategyParams, conditions: Vec<EntryCondition>) -> Self {
        SignalEvaluator { params, conditions }
    }

    pub fn score_entry(&self, snap: &IndicatorSnapshot, bar: &OhlcvBar) -> EntryScore {
        let checks: Vec<(EntryCondition, bool)> = self
            .conditions
            .iter()
            .map(|c| (*c, c.evaluate(snap, bar, &self.params)))
            .collect();
        let conditions_met = checks.iter().filter(|(_, ok)| *ok).count();
        EntryScore {
            checks,
            conditions_met,
        }
    }

    /// Entry for a flat book holding `cash`, sized at `cash * position_fraction / close`.
    pub fn evaluate_entry(&self, snap: &IndicatorSnapshot, bar: &OhlcvBar, cash: f64) -> Option<EntrySignal> {
        if bar.close <= 0.0 {
            return None;
        }
        let score = self.score_entry(snap, bar);
        if score.conditions_met < self.params.entry_condition_threshold {
            return None;
        }
        Some(EntrySignal {
            price: bar.close,
            size: cash * self.params.position_fraction / bar.close,
            score,
        })
    }

    pub fn evaluate_exit(&self, snap: &IndicatorSnapshot, bar: &OhlcvBar, position: &Position) -> Option<ExitSignal> {
        let profit_pct = position.profit_pct(bar.close);
        ExitReason::PRIORITY
            .into_iter()
            .find(|reason| reason.triggered(snap, bar.close, profit_pct, &self.params))
            .map(|reason| ExitSignal {
                price: bar.close,
                reason,
                profit_pct,
            })
    }

    /// Nothing is evaluated while an order is pending.
    pub fn evaluate(&self, snap: &IndicatorSnapshot, bar: &OhlcvBar, portfolio: &Portfolio) -> Option<Signal> {
        if portfolio.has_pending_order() {
            return None;
        }
        match &portfolio.position {
            None => self.evaluate_entry(snap, bar, portfolio.cash).map(Signal::Enter),
            Some(position) => self.evaluate_exit(snap, bar, position).map(Signal::Exit),
        }
    }
}
