//! Portfolio state and equity tracking.
//!
//! The backtest loop owns one [`Portfolio`]. Cash, the open position and the
//! pending order are only changed through the transitions in
//! [`super::execution`].

use chrono::NaiveDate;

use super::execution::{Order, OrderState};
use super::position::{Position, Trade};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub position: Option<Position>,
    pub pending: Option<Order>,
    pub closed_trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            position: None,
            pending: None,
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }

    pub fn has_pending_order(&self) -> bool {
        self.pending.is_some()
    }

    pub fn order_state(&self) -> OrderState {
        match (&self.position, &self.pending) {
            (None, None) => OrderState::Idle,
            (None, Some(_)) => OrderState::PendingEntry,
            (Some(_), None) => OrderState::Open,
            (Some(_), Some(_)) => OrderState::PendingExit,
        }
    }

    pub fn record_trade(&mut self, trade: Trade) {
        self.closed_trades.push(trade);
    }

    pub fn record_equity(&mut self, date: NaiveDate, equity: f64) {
        self.equity_curve.push(EquityPoint { date, equity });
    }

    /// Cash plus the open position marked at `price`.
    pub fn total_equity(&self, price: f64) -> f64 {
        self.cash
            + self
                .position
                .as_ref()
                .map_or(0.0, |pos| pos.market_value(price))
    }
}
