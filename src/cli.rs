//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{load_backtest_config, load_strategy_params};
use crate::domain::error::ConfluenceError;
use crate::domain::metrics::Metrics;
use crate::domain::strategy::StrategyParams;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_DATA_DIR: &str = "data";

#[derive(Parser, Debug)]
#[command(name = "confluence", about = "Multi-indicator confluence strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory holding <CODE>.csv price files
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        code: Option<String>,
        /// Write the trade log as CSV
        #[arg(long)]
        trades_out: Option<PathBuf>,
    },
    /// Validate a configuration file without running
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List instruments available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            data_dir,
            code,
            trades_out,
        } => run_backtest(&config, data_dir, code.as_deref(), trades_out.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config, data_dir } => run_list_symbols(config.as_deref(), data_dir),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ConfluenceError> {
    eprintln!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

/// Validated run settings read from one config file.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub backtest: BacktestConfig,
    pub strategy: StrategyParams,
}

pub fn load_settings(config: &dyn ConfigPort) -> Result<RunSettings, ConfluenceError> {
    Ok(RunSettings {
        backtest: load_backtest_config(config)?,
        strategy: load_strategy_params(config)?,
    })
}

/// Instrument code, used verbatim as the data file stem.
pub fn resolve_code(
    code_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<String, ConfluenceError> {
    code_override
        .map(str::to_string)
        .or_else(|| config.get_string("backtest", "code"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ConfluenceError::ConfigMissing {
            section: "backtest".into(),
            key: "code".into(),
        })
}

pub fn resolve_data_dir(dir_override: Option<PathBuf>, config: Option<&dyn ConfigPort>) -> PathBuf {
    dir_override
        .or_else(|| config.and_then(|c| c.get_string("backtest", "data_dir")).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Load bars, run and score. Separated from printing so it can be driven by
/// any [`DataPort`].
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    code: &str,
    settings: &RunSettings,
) -> Result<(BacktestResult, Metrics), ConfluenceError> {
    let bars = data_port.fetch_ohlcv(code, settings.backtest.start_date, settings.backtest.end_date)?;
    info!(code, bars = bars.len(), "price data loaded");

    let result = backtest_engine::run_backtest(&bars, &settings.strategy, &settings.backtest)?;
    let metrics = Metrics::compute(
        &result.portfolio,
        result.final_value,
        settings.backtest.risk_free_rate,
    );
    Ok((result, metrics))
}

fn run_backtest(
    config_path: &Path,
    data_dir: Option<PathBuf>,
    code_override: Option<&str>,
    trades_out: Option<&Path>,
) -> Result<(), ConfluenceError> {
    let adapter = load_config(config_path)?;
    let settings = load_settings(&adapter)?;
    let code = resolve_code(code_override, &adapter)?;
    let data_dir = resolve_data_dir(data_dir, Some(&adapter as &dyn ConfigPort));

    eprintln!("Running backtest for {} from {}", code, data_dir.display());
    let data_port = CsvAdapter::new(data_dir);
    let (result, metrics) = run_backtest_pipeline(&data_port, &code, &settings)?;

    print_summary(&code, &result, &metrics);

    if let Some(path) = trades_out {
        CsvReportAdapter::new().write(&result, path)?;
        eprintln!("\nTrade log written to: {}", path.display());
    }
    Ok(())
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.precision$}"))
}

fn print_summary(code: &str, result: &BacktestResult, metrics: &Metrics) {
    eprintln!("\n=== Results: {code} ===");
    eprintln!("Initial Capital:  {:.2}", metrics.initial_capital);
    eprintln!("Final Value:      {:.2}", metrics.final_value);
    eprintln!("Total Return:     {:.2}%", metrics.total_return_pct);
    eprintln!("Sharpe Ratio:     {}", fmt_opt(metrics.sharpe_ratio, 2));
    eprintln!("Max Drawdown:     -{:.2}%", metrics.max_drawdown_pct);
    eprintln!("Total Trades:     {}", metrics.total_trades);
    eprintln!(
        "Won/Lost/Even:    {}/{}/{}",
        metrics.trades_won, metrics.trades_lost, metrics.trades_breakeven
    );
    eprintln!("Win Rate:         {:.1}%", metrics.win_rate);
    eprintln!("Avg Win:          {}", fmt_opt(metrics.avg_win, 2));
    eprintln!("Avg Loss:         {}", fmt_opt(metrics.avg_loss, 2));
    eprintln!("Largest Win:      {}", fmt_opt(metrics.largest_win, 2));
    eprintln!("Largest Loss:     {}", fmt_opt(metrics.largest_loss, 2));
    eprintln!("Profit Factor:    {}", fmt_opt(metrics.profit_factor, 2));
    eprintln!(
        "Avg Duration:     {} days",
        fmt_opt(metrics.avg_trade_duration, 1)
    );

    if let Some(position) = &result.portfolio.position {
        eprintln!(
            "\nOpen position: {:.4} @ {:.2} since {}",
            position.size, position.entry_price, position.opened_at
        );
    }

    if !result.portfolio.closed_trades.is_empty() {
        eprintln!("\n=== Trades ===");
        for trade in &result.portfolio.closed_trades {
            let pnl_sign = if trade.pnl >= 0.0 { "+" } else { "" };
            eprintln!(
                "  {} -> {}  {:.2} -> {:.2}  {}{:.2}  ({})",
                trade.entry_date,
                trade.exit_date,
                trade.entry_price,
                trade.exit_price,
                pnl_sign,
                trade.pnl,
                trade.exit_reason,
            );
        }
    }
}

fn run_validate(config_path: &Path) -> Result<(), ConfluenceError> {
    let adapter = load_config(config_path)?;
    let settings = load_settings(&adapter)?;

    let b = &settings.backtest;
    eprintln!("\nBacktest:");
    eprintln!("  initial_capital:  {}", b.initial_capital);
    eprintln!("  commission_rate:  {}", b.commission_rate);
    eprintln!("  risk_free_rate:   {}", b.risk_free_rate);
    if let Some(start) = b.start_date {
        eprintln!("  start_date:       {start}");
    }
    if let Some(end) = b.end_date {
        eprintln!("  end_date:         {end}");
    }

    let s = &settings.strategy;
    eprintln!("\nStrategy:");
    eprintln!("  rsi:        period {} exit above {}", s.rsi_period, s.rsi_overbought);
    eprintln!("  sma:        {} / {}", s.sma_short, s.sma_long);
    eprintln!(
        "  bollinger:  {} x {}",
        s.bollinger_period, s.bollinger_devfactor
    );
    eprintln!("  macd:       {}/{}/{}", s.macd_fast, s.macd_slow, s.macd_signal);
    eprintln!(
        "  exits:      take profit {:.1}%, stop loss {:.1}%",
        s.take_profit_pct * 100.0,
        s.stop_loss_pct * 100.0
    );
    eprintln!("  threshold:  {} conditions", s.entry_condition_threshold);

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_list_symbols(
    config_path: Option<&Path>,
    data_dir: Option<PathBuf>,
) -> Result<(), ConfluenceError> {
    let adapter = config_path.map(load_config).transpose()?;
    let data_dir = resolve_data_dir(data_dir, adapter.as_ref().map(|a| a as &dyn ConfigPort));

    let symbols = CsvAdapter::new(data_dir.clone()).list_symbols()?;
    if symbols.is_empty() {
        eprintln!("No symbols found in {}", data_dir.display());
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    Ok(())
}
