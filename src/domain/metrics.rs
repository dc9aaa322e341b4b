//! Performance metrics over a finished run.
//!
//! Statistics with no meaningful value (an empty partition, a zero-variance
//! return series) are `None` rather than zero.

use super::portfolio::{EquityPoint, Portfolio};
use super::position::Trade;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
/// Return std at or below this fraction of the mean (floor 1.0) counts as zero.
const DEGENERATE_STD_RATIO: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metrics {
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_return_pct: f64,
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown_pct: f64,
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    /// Percentage of winning trades, 0 with no trades.
    pub win_rate: f64,
    pub profit_factor: Option<f64>,
    pub avg_win: Option<f64>,
    /// Negative amount.
    pub avg_loss: Option<f64>,
    pub largest_win: Option<f64>,
    /// Negative amount.
    pub largest_loss: Option<f64>,
    pub avg_trade_duration: Option<f64>,
}

impl Metrics {
    pub fn compute(portfolio: &Portfolio, final_value: f64, risk_free_rate: f64) -> Self {
        let initial_capital = portfolio.initial_capital;
        let trades = &portfolio.closed_trades;

        let total_return_pct = if initial_capital > 0.0 {
            (final_value - initial_capital) / initial_capital * 100.0
        } else {
            0.0
        };

        let wins: Vec<f64> = trades.iter().map(|t| t.pnl).filter(|&p| p > 0.0).collect();
        let losses: Vec<f64> = trades.iter().map(|t| t.pnl).filter(|&p| p < 0.0).collect();
        let total_trades = trades.len();
        let trades_won = wins.len();
        let trades_lost = losses.len();

        let gross_profit: f64 = wins.iter().sum();
        let gross_loss: f64 = losses.iter().sum();
        let profit_factor = if trades_lost > 0 {
            Some(gross_profit / gross_loss.abs())
        } else {
            None
        };

        Metrics {
            initial_capital,
            final_value,
            total_return_pct,
            sharpe_ratio: sharpe_ratio(&portfolio.equity_curve, risk_free_rate),
            max_drawdown_pct: max_drawdown_pct(&portfolio.equity_curve),
            total_trades,
            trades_won,
            trades_lost,
            trades_breakeven: total_trades - trades_won - trades_lost,
            win_rate: win_rate(trades),
            profit_factor,
            avg_win: mean(&wins),
            avg_loss: mean(&losses),
            largest_win: wins.iter().copied().reduce(f64::max),
            largest_loss: losses.iter().copied().reduce(f64::min),
            avg_trade_duration: mean(
                &trades
                    .iter()
                    .map(|t| t.duration_days() as f64)
                    .collect::<Vec<_>>(),
            ),
        }
    }
}

/// Winning trades as a percentage of all trades, 0 for an empty log.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let won = trades.iter().filter(|t| t.is_win).count();
    won as f64 / trades.len() as f64 * 100.0
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Largest peak-to-trough decline, as a percentage of the peak.
pub fn max_drawdown_pct(equity_curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
        }
    }
    max_dd * 100.0
}

/// Annualized Sharpe ratio of daily equity returns.
///
/// Uses the population standard deviation. `None` with fewer than two
/// returns or zero variance.
pub fn sharpe_ratio(equity_curve: &[EquityPoint], risk_free_rate: f64) -> Option<f64> {
    let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
    let excess: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            let ret = if prev > 0.0 {
                (w[1].equity - prev) / prev
            } else {
                0.0
            };
            ret - daily_rf
        })
        .collect();

    if excess.len() < 2 {
        return None;
    }

    let n = excess.len() as f64;
    let avg = excess.iter().sum::<f64>() / n;
    let std = (excess.iter().map(|r| (r - avg).powi(2)).sum::<f64>() / n).sqrt();
    // Rounding leaves a residue of about 1e-16 on constant returns.
    if !(std > DEGENERATE_STD_RATIO * avg.abs().max(1.0)) {
        return None;
    }

    Some(avg / std * TRADING_DAYS_PER_YEAR.sqrt())
}
