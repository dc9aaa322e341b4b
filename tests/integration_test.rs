//! End-to-end scenarios and engine invariants.
//!
//! Tests cover:
//! - Entry on exactly four of six conditions, sized at 95% of cash
//! - Take-profit, stop-loss and RSI exits with both commission legs netted
//! - Positions left open at the end of the data
//! - Metrics for an empty trade log
//! - Property tests over generated price paths: determinism, warmup,
//!   single-position, commission and win-rate accounting

mod common;

use approx::assert_relative_eq;
use common::*;
use confluence::cli::{run_backtest_pipeline, RunSettings};
use confluence::domain::backtest::{run_backtest, BacktestConfig, BacktestEvent, BacktestResult};
use confluence::domain::execution::OrderKind;
use confluence::domain::metrics::{win_rate, Metrics};
use confluence::domain::signal::{EntryCondition, ExitReason};
use confluence::domain::strategy::StrategyParams;
use proptest::prelude::*;

const RATE: f64 = 0.001;

fn run_default(bars: &[OhlcvBar]) -> BacktestResult {
    run_backtest(bars, &StrategyParams::default(), &BacktestConfig::default()).unwrap()
}

fn fills(result: &BacktestResult) -> Vec<OrderKind> {
    result
        .events
        .iter()
        .filter_map(|e| match e {
            BacktestEvent::Filled(fill) => Some(fill.kind),
            _ => None,
        })
        .collect()
}

mod scenarios {
    use super::*;

    #[test]
    fn four_conditions_open_a_position() {
        let bars = bars_from_closes(&entry_closes());
        let result = run_default(&bars);

        let entry = result
            .events
            .iter()
            .find_map(|e| match e {
                BacktestEvent::EntrySignal {
                    date,
                    price,
                    size,
                    conditions_met,
                    conditions,
                    ..
                } => Some((*date, *price, *size, *conditions_met, conditions.clone())),
                _ => None,
            })
            .expect("entry signal on bar 55");

        assert_eq!(entry.0, bars[55].date);
        assert_eq!(entry.1, 101.0);
        assert_relative_eq!(entry.2, 10_000.0 * 0.95 / 101.0, epsilon = 1e-9);
        assert_eq!(entry.3, 4);

        let held: Vec<EntryCondition> = entry
            .4
            .iter()
            .filter(|(_, ok)| *ok)
            .map(|(c, _)| *c)
            .collect();
        assert_eq!(
            held,
            vec![
                EntryCondition::TrendUp,
                EntryCondition::BollingerSignal,
                EntryCondition::MacdSignal,
                EntryCondition::SmaTrend,
            ]
        );

        assert_eq!(fills(&result), vec![OrderKind::Buy]);
        let position = result.portfolio.position.as_ref().unwrap();
        assert_eq!(position.opened_at, bars[55].date);
        assert_relative_eq!(position.entry_commission, 9.5, epsilon = 1e-9);
        assert_relative_eq!(result.portfolio.cash, 490.5, epsilon = 1e-9);
    }

    #[test]
    fn take_profit_closes_with_net_pnl() {
        let bars = entry_then(&[110.0, 110.0, 110.0, 110.0]);
        let result = run_default(&bars);

        assert_eq!(result.portfolio.closed_trades.len(), 1);
        assert!(result.portfolio.position.is_none());

        let trade = &result.portfolio.closed_trades[0];
        let size = 9_500.0 / 101.0;
        assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
        assert_eq!(trade.entry_date, bars[55].date);
        assert_eq!(trade.exit_date, bars[56].date);
        assert_eq!(trade.exit_price, 110.0);

        let entry_comm = RATE * size * 101.0;
        let exit_comm = RATE * size * 110.0;
        assert_relative_eq!(trade.commission_paid_total, entry_comm + exit_comm, epsilon = 1e-9);
        assert_relative_eq!(
            trade.pnl,
            size * 9.0 - entry_comm - exit_comm,
            epsilon = 1e-9
        );
        assert!(trade.is_win);

        assert!(result.events.iter().any(|e| matches!(
            e,
            BacktestEvent::ExitSignal {
                reason: ExitReason::TakeProfit,
                ..
            }
        )));
        assert_relative_eq!(result.final_value, result.portfolio.cash, epsilon = 1e-9);
        assert_relative_eq!(
            result.final_value,
            10_000.0 + trade.pnl,
            epsilon = 1e-9
        );
    }

    #[test]
    fn stop_loss_closes_at_a_loss() {
        let bars = entry_then(&[95.0]);
        let result = run_default(&bars);

        assert_eq!(result.portfolio.closed_trades.len(), 1);
        let trade = &result.portfolio.closed_trades[0];
        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
        assert!(trade.pnl < 0.0);
        assert!(!trade.is_win);
    }

    #[test]
    fn overbought_rsi_exits_flat_trade() {
        let bars = entry_then(&[101.0]);
        let result = run_default(&bars);

        assert_eq!(result.portfolio.closed_trades.len(), 1);
        let trade = &result.portfolio.closed_trades[0];
        assert_eq!(trade.exit_reason, ExitReason::RsiOverbought);
        // Flat price, two commission legs.
        assert_relative_eq!(trade.pnl, -trade.commission_paid_total, epsilon = 1e-9);
        assert!(!trade.is_win);
    }

    #[test]
    fn open_position_counts_in_final_value_only() {
        let bars = entry_then(&[103.0]);
        let params = StrategyParams {
            // keep the RSI exit out of the way
            rsi_overbought: 100.0,
            ..Default::default()
        };
        let result = run_backtest(&bars, &params, &BacktestConfig::default()).unwrap();

        assert!(result.portfolio.closed_trades.is_empty());
        let position = result.portfolio.position.as_ref().unwrap();
        assert_relative_eq!(
            result.final_value,
            result.portfolio.cash + position.size * 103.0,
            epsilon = 1e-9
        );

        let metrics = Metrics::compute(&result.portfolio, result.final_value, 0.0);
        assert_eq!(metrics.total_trades, 0);
        assert!(metrics.total_return_pct > 0.0);
    }

    #[test]
    fn empty_trade_log_metrics() {
        let bars = bars_from_closes(&[100.0; 80]);
        let result = run_default(&bars);
        let metrics = Metrics::compute(&result.portfolio, result.final_value, 0.0);

        assert!(result.portfolio.closed_trades.is_empty());
        assert_eq!(metrics.win_rate, 0.0);
        assert!(metrics.avg_win.is_none());
        assert!(metrics.avg_loss.is_none());
        assert!(metrics.sharpe_ratio.is_none());
        assert_eq!(metrics.max_drawdown_pct, 0.0);
        assert_eq!(metrics.total_return_pct, 0.0);
    }

    #[test]
    fn equity_curve_marks_to_market_every_bar() {
        let bars = entry_then(&[105.0]);
        let params = StrategyParams {
            rsi_overbought: 100.0,
            ..Default::default()
        };
        let result = run_backtest(&bars, &params, &BacktestConfig::default()).unwrap();
        let curve = &result.portfolio.equity_curve;

        assert_eq!(curve.len(), bars.len());
        assert_relative_eq!(curve[54].equity, 10_000.0);
        // Entry bar: only the commission has left the book.
        assert_relative_eq!(curve[55].equity, 10_000.0 - 9.5, epsilon = 1e-9);
        let size = 9_500.0 / 101.0;
        assert_relative_eq!(curve[56].equity, 490.5 + size * 105.0, epsilon = 1e-9);
    }
}

mod pipeline {
    use super::*;

    fn settings() -> RunSettings {
        RunSettings {
            backtest: BacktestConfig::default(),
            strategy: StrategyParams::default(),
        }
    }

    #[test]
    fn pipeline_matches_direct_run() {
        let bars = entry_then(&[110.0, 110.0]);
        let port = MockDataPort::new().with_bars("SPY", bars.clone());

        let (result, metrics) = run_backtest_pipeline(&port, "SPY", &settings()).unwrap();
        assert_eq!(result, run_default(&bars));
        assert_eq!(metrics.total_trades, 1);
        assert_relative_eq!(metrics.win_rate, 100.0);
    }

    #[test]
    fn pipeline_passes_date_range() {
        let bars = bars_from_closes(&[100.0; 90]);
        let port = MockDataPort::new().with_bars("SPY", bars);
        let mut s = settings();
        s.backtest.start_date = Some(date(2024, 1, 10));
        s.backtest.end_date = Some(date(2024, 2, 10));

        let (result, _) = run_backtest_pipeline(&port, "SPY", &s).unwrap();
        assert_eq!(result.portfolio.equity_curve.len(), 32);
        assert_eq!(
            port.requests.borrow()[0],
            ("SPY".to_string(), Some(date(2024, 1, 10)), Some(date(2024, 2, 10)))
        );
    }

    #[test]
    fn pipeline_surfaces_missing_data() {
        let port = MockDataPort::new();
        let err = run_backtest_pipeline(&port, "NOPE", &settings()).unwrap_err();
        assert!(matches!(
            err,
            confluence::domain::error::ConfluenceError::NoData { .. }
        ));
    }
}

// ── Properties over generated price paths ────────────────────────────

fn arb_path() -> impl Strategy<Value = Vec<OhlcvBar>> {
    (60usize..160)
        .prop_flat_map(|len| {
            (
                prop::collection::vec(-0.04..0.04_f64, len - 1),
                prop::collection::vec(500.0..2000.0_f64, len),
            )
        })
        .prop_map(|(returns, volumes)| bars_with_volume(&path_from_returns(&returns), &volumes))
}

fn arb_params() -> impl Strategy<Value = StrategyParams> {
    (2usize..=5, 0.5..0.99_f64).prop_map(|(threshold, fraction)| StrategyParams {
        entry_condition_threshold: threshold,
        position_fraction: fraction,
        ..Default::default()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn runs_are_deterministic(bars in arb_path(), params in arb_params()) {
        let config = BacktestConfig::default();
        let first = run_backtest(&bars, &params, &config).unwrap();
        let second = run_backtest(&bars, &params, &config).unwrap();
        prop_assert_eq!(&first, &second);

        let m1 = Metrics::compute(&first.portfolio, first.final_value, 0.0);
        let m2 = Metrics::compute(&second.portfolio, second.final_value, 0.0);
        prop_assert_eq!(m1, m2);
    }

    #[test]
    fn nothing_happens_before_warmup(bars in arb_path(), params in arb_params()) {
        let result = run_backtest(&bars, &params, &BacktestConfig::default()).unwrap();
        let first_allowed = bars[params.sma_long - 1].date;
        for event in &result.events {
            prop_assert!(event.date() >= first_allowed);
        }
    }

    #[test]
    fn at_most_one_position(bars in arb_path(), params in arb_params()) {
        let result = run_backtest(&bars, &params, &BacktestConfig::default()).unwrap();
        let kinds = fills(&result);
        for (i, kind) in kinds.iter().enumerate() {
            let expected = if i % 2 == 0 { OrderKind::Buy } else { OrderKind::Close };
            prop_assert_eq!(*kind, expected);
        }
        prop_assert_eq!(result.portfolio.closed_trades.len(), kinds.len() / 2);
        prop_assert_eq!(result.portfolio.position.is_some(), kinds.len() % 2 == 1);
    }

    #[test]
    fn trade_accounting(bars in arb_path(), params in arb_params()) {
        let result = run_backtest(&bars, &params, &BacktestConfig::default()).unwrap();
        for trade in &result.portfolio.closed_trades {
            prop_assert_eq!(trade.is_win, trade.pnl > 0.0);
            prop_assert!(trade.exit_date > trade.entry_date);
            let expected = RATE * trade.size * trade.entry_price + RATE * trade.size * trade.exit_price;
            prop_assert!((trade.commission_paid_total - expected).abs() < 1e-9);
            let gross = trade.size * (trade.exit_price - trade.entry_price);
            prop_assert!((trade.pnl - (gross - expected)).abs() < 1e-6);
        }
        prop_assert!(result.portfolio.cash >= 0.0);
        prop_assert_eq!(result.portfolio.equity_curve.len(), bars.len());
    }

    #[test]
    fn reported_win_rate_matches_recount(bars in arb_path(), params in arb_params()) {
        let result = run_backtest(&bars, &params, &BacktestConfig::default()).unwrap();
        let metrics = Metrics::compute(&result.portfolio, result.final_value, 0.0);
        let trades = &result.portfolio.closed_trades;

        let recount = if trades.is_empty() {
            0.0
        } else {
            trades.iter().filter(|t| t.pnl > 0.0).count() as f64 / trades.len() as f64 * 100.0
        };
        prop_assert!((metrics.win_rate - recount).abs() < 1e-9);
        prop_assert!((win_rate(trades) - recount).abs() < 1e-9);
        prop_assert_eq!(metrics.trades_won + metrics.trades_lost + metrics.trades_breakeven, trades.len());
    }
}
