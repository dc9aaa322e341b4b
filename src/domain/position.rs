//! Open position and closed trade records.

use chrono::NaiveDate;

use super::signal::ExitReason;

/// The single open long position.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub entry_price: f64,
    pub size: f64,
    pub opened_at: NaiveDate,
    /// Commission paid on the entry fill, netted into the trade's P&L on close.
    pub entry_commission: f64,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.size * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.size * (price - self.entry_price)
    }

    /// Fractional move from the entry price, e.g. 0.08 for +8%.
    pub fn profit_pct(&self, price: f64) -> f64 {
        (price - self.entry_price) / self.entry_price
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub size: f64,
    pub entry_commission: f64,
    pub exit_commission: f64,
    pub commission_paid_total: f64,
    /// Price P&L net of both commission legs.
    pub pnl: f64,
    pub is_win: bool,
    pub exit_reason: ExitReason,
}

impl Trade {
    /// Close `position` at `exit_price`, netting both commission legs.
    pub fn close(
        position: &Position,
        exit_price: f64,
        exit_date: NaiveDate,
        exit_commission: f64,
        exit_reason: ExitReason,
    ) -> Self {
        let commission_paid_total = position.entry_commission + exit_commission;
        let pnl = position.unrealized_pnl(exit_price) - commission_paid_total;
        Trade {
            entry_date: position.opened_at,
            exit_date,
            entry_price: position.entry_price,
            exit_price,
            size: position.size,
            entry_commission: position.entry_commission,
            exit_commission,
            commission_paid_total,
            pnl,
            is_win: pnl > 0.0,
            exit_reason,
        }
    }

    pub fn duration_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}
