//! Order/position state machine and fill simulation.
//!
//! One trade cycle walks `Idle -> PendingEntry -> Open -> PendingExit -> Idle`.
//! Orders fill at the requested price (the bar's close) with no slippage.
//! Commission is a rate on notional, charged to cash on each leg's fill and
//! netted into the trade's P&L when the position closes.
//!
//! Submitting from the wrong state is an [`OrderStateError`]. A buy that cash
//! cannot cover is rejected, which is not an error.

use chrono::NaiveDate;
use std::fmt;
use tracing::debug;

use super::error::OrderStateError;
use super::portfolio::Portfolio;
use super::position::{Position, Trade};
use super::signal::ExitReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OrderKind {
    Buy,
    Close,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Buy => write!(f, "buy"),
            OrderKind::Close => write!(f, "close"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    Idle,
    PendingEntry,
    Open,
    PendingExit,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Order {
    pub kind: OrderKind,
    pub size: f64,
    pub price: f64,
    pub requested_at: NaiveDate,
    /// Set on close orders.
    pub exit_reason: Option<ExitReason>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fill {
    pub kind: OrderKind,
    pub date: NaiveDate,
    pub price: f64,
    pub size: f64,
    pub commission: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RejectReason {
    InsufficientCash,
    InvalidSize,
    Cancelled,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InsufficientCash => write!(f, "insufficient cash"),
            RejectReason::InvalidSize => write!(f, "invalid size"),
            RejectReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutcome {
    Filled(Fill),
    Rejected { order: Order, reason: RejectReason },
}

/// Commission on a trade of `trade_value` notional.
pub fn calculate_commission(trade_value: f64, commission_rate: f64) -> f64 {
    trade_value * commission_rate
}

/// `Idle -> PendingEntry`.
pub fn submit_buy(
    portfolio: &mut Portfolio,
    size: f64,
    price: f64,
    date: NaiveDate,
) -> Result<(), OrderStateError> {
    match portfolio.order_state() {
        OrderState::Idle => {}
        OrderState::Open => return Err(OrderStateError::PositionOpen { date }),
        OrderState::PendingEntry | OrderState::PendingExit => {
            return Err(OrderStateError::OrderPending { kind: "buy", date });
        }
    }

    portfolio.pending = Some(Order {
        kind: OrderKind::Buy,
        size,
        price,
        requested_at: date,
        exit_reason: None,
    });
    Ok(())
}

/// `Open -> PendingExit`, for the full position size.
pub fn submit_close(
    portfolio: &mut Portfolio,
    price: f64,
    date: NaiveDate,
    reason: ExitReason,
) -> Result<(), OrderStateError> {
    let size = match (portfolio.order_state(), &portfolio.position) {
        (OrderState::Open, Some(position)) => position.size,
        (OrderState::Idle, _) => return Err(OrderStateError::NoPosition { date }),
        _ => return Err(OrderStateError::OrderPending { kind: "close", date }),
    };

    portfolio.pending = Some(Order {
        kind: OrderKind::Close,
        size,
        price,
        requested_at: date,
        exit_reason: Some(reason),
    });
    Ok(())
}

/// Resolve the pending order at its requested price.
///
/// `PendingEntry -> Open` on a filled buy, `PendingEntry -> Idle` on a
/// rejected one. `PendingExit -> Idle` on a filled close, which also records
/// the [`Trade`].
pub fn fill_pending(
    portfolio: &mut Portfolio,
    commission_rate: f64,
) -> Result<OrderOutcome, OrderStateError> {
    let order = portfolio
        .pending
        .take()
        .ok_or(OrderStateError::NothingPending)?;

    match order.kind {
        OrderKind::Buy => Ok(fill_buy(portfolio, order, commission_rate)),
        OrderKind::Close => fill_close(portfolio, order, commission_rate),
    }
}

/// Drop the pending order without touching cash or the position.
pub fn cancel_pending(portfolio: &mut Portfolio) -> Result<OrderOutcome, OrderStateError> {
    let order = portfolio
        .pending
        .take()
        .ok_or(OrderStateError::NothingPending)?;
    Ok(OrderOutcome::Rejected {
        order,
        reason: RejectReason::Cancelled,
    })
}

fn fill_buy(portfolio: &mut Portfolio, order: Order, commission_rate: f64) -> OrderOutcome {
    if !(order.size > 0.0 && order.size.is_finite()) {
        return OrderOutcome::Rejected {
            order,
            reason: RejectReason::InvalidSize,
        };
    }

    let cost = order.size * order.price;
    let commission = calculate_commission(cost, commission_rate);
    if cost + commission > portfolio.cash {
        return OrderOutcome::Rejected {
            order,
            reason: RejectReason::InsufficientCash,
        };
    }

    portfolio.cash -= cost + commission;
    portfolio.position = Some(Position {
        entry_price: order.price,
        size: order.size,
        opened_at: order.requested_at,
        entry_commission: commission,
    });

    debug!(
        date = %order.requested_at,
        price = order.price,
        size = order.size,
        commission,
        "buy filled"
    );

    OrderOutcome::Filled(Fill {
        kind: OrderKind::Buy,
        date: order.requested_at,
        price: order.price,
        size: order.size,
        commission,
    })
}

fn fill_close(
    portfolio: &mut Portfolio,
    order: Order,
    commission_rate: f64,
) -> Result<OrderOutcome, OrderStateError> {
    let reason = order
        .exit_reason
        .ok_or(OrderStateError::MissingExitReason {
            date: order.requested_at,
        })?;
    let position = portfolio
        .position
        .take()
        .ok_or(OrderStateError::NoPosition {
            date: order.requested_at,
        })?;

    let proceeds = position.size * order.price;
    let commission = calculate_commission(proceeds, commission_rate);
    portfolio.cash += proceeds - commission;

    let trade = Trade::close(&position, order.price, order.requested_at, commission, reason);

    debug!(
        date = %order.requested_at,
        price = order.price,
        pnl = trade.pnl,
        reason = %reason,
        "close filled"
    );
    portfolio.record_trade(trade);

    Ok(OrderOutcome::Filled(Fill {
        kind: OrderKind::Close,
        date: order.requested_at,
        price: order.price,
        size: position.size,
        commission,
    }))
}
