//! Backtest engine and event loop.
//!
//! A single forward pass over the bars. Each bar's snapshot is read from a
//! precomputed [`IndicatorSet`], the evaluator decides, and any order is
//! submitted and filled on the same bar at its close.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::error::ConfluenceError;
use super::execution::{self, Fill, OrderKind, OrderOutcome, RejectReason};
use super::ohlcv::{validate_series, OhlcvBar};
use super::portfolio::Portfolio;
use super::signal::{EntryCondition, ExitReason, Signal, SignalEvaluator};
use super::snapshot::IndicatorSet;
use super::strategy::StrategyParams;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub commission_rate: f64,
    /// Annual rate, used by the Sharpe ratio.
    pub risk_free_rate: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 10_000.0,
            commission_rate: 0.001,
            risk_free_rate: 0.0,
            start_date: None,
            end_date: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BacktestEvent {
    EntrySignal {
        date: NaiveDate,
        price: f64,
        size: f64,
        conditions_met: usize,
        conditions: Vec<(EntryCondition, bool)>,
        rsi: f64,
    },
    ExitSignal {
        date: NaiveDate,
        price: f64,
        reason: ExitReason,
        profit_pct: f64,
    },
    Filled(Fill),
    OrderRejected {
        date: NaiveDate,
        kind: OrderKind,
        reason: RejectReason,
    },
}

impl BacktestEvent {
    pub fn date(&self) -> NaiveDate {
        match self {
            BacktestEvent::EntrySignal { date, .. }
            | BacktestEvent::ExitSignal { date, .. }
            | BacktestEvent::OrderRejected { date, .. } => *date,
            BacktestEvent::Filled(fill) => fill.date,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub portfolio: Portfolio,
    pub events: Vec<BacktestEvent>,
    /// Cash plus any open position marked at the last close.
    pub final_value: f64,
}

/// Run the strategy over `bars`, which must be sorted by date.
///
/// An open position at the end stays open and is counted in
/// [`BacktestResult::final_value`] but not in the trade log.
pub fn run_backtest(
    bars: &[OhlcvBar],
    params: &StrategyParams,
    config: &BacktestConfig,
) -> Result<BacktestResult, ConfluenceError> {
    validate_series(bars)?;

    info!(
        bars = bars.len(),
        initial_capital = config.initial_capital,
        commission_rate = config.commission_rate,
        "starting backtest"
    );

    let indicators = IndicatorSet::compute(bars, params);
    let evaluator = SignalEvaluator::new(params.clone());
    let mut portfolio = Portfolio::new(config.initial_capital);
    let mut events = Vec::new();

    for (index, bar) in bars.iter().enumerate() {
        if let Some(snap) = indicators.snapshot(index) {
            match evaluator.evaluate(&snap, bar, &portfolio) {
                Some(Signal::Enter(entry)) => {
                    debug!(
                        date = %bar.date,
                        price = entry.price,
                        size = entry.size,
                        conditions_met = entry.score.conditions_met,
                        rsi = snap.rsi,
                        "entry signal"
                    );
                    events.push(BacktestEvent::EntrySignal {
                        date: bar.date,
                        price: entry.price,
                        size: entry.size,
                        conditions_met: entry.score.conditions_met,
                        conditions: entry.score.checks,
                        rsi: snap.rsi,
                    });
                    execution::submit_buy(&mut portfolio, entry.size, entry.price, bar.date)?;
                    settle(&mut portfolio, config.commission_rate, &mut events)?;
                }
                Some(Signal::Exit(exit)) => {
                    debug!(
                        date = %bar.date,
                        price = exit.price,
                        reason = %exit.reason,
                        profit_pct = exit.profit_pct,
                        "exit signal"
                    );
                    events.push(BacktestEvent::ExitSignal {
                        date: bar.date,
                        price: exit.price,
                        reason: exit.reason,
                        profit_pct: exit.profit_pct,
                    });
                    execution::submit_close(&mut portfolio, exit.price, bar.date, exit.reason)?;
                    settle(&mut portfolio, config.commission_rate, &mut events)?;
                }
                None => {}
            }
        }

        let equity = portfolio.total_equity(bar.close);
        portfolio.record_equity(bar.date, equity);
    }

    let final_value = bars
        .last()
        .map_or(portfolio.cash, |bar| portfolio.total_equity(bar.close));

    info!(
        trades = portfolio.closed_trades.len(),
        open_position = portfolio.has_position(),
        final_value,
        "backtest finished"
    );

    Ok(BacktestResult {
        portfolio,
        events,
        final_value,
    })
}

fn settle(
    portfolio: &mut Portfolio,
    commission_rate: f64,
    events: &mut Vec<BacktestEvent>,
) -> Result<(), ConfluenceError> {
    match execution::fill_pending(portfolio, commission_rate)? {
        OrderOutcome::Filled(fill) => events.push(BacktestEvent::Filled(fill)),
        OrderOutcome::Rejected { order, reason } => {
            warn!(
                date = %order.requested_at,
                kind = %order.kind,
                size = order.size,
                price = order.price,
                %reason,
                "order rejected"
            );
            events.push(BacktestEvent::OrderRejected {
                date: order.requested_at,
                kind: order.kind,
                reason,
            });
        }
    }
    Ok(())
}
