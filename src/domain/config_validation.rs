//! Configuration loading and validation.
//!
//! Reads `[backtest]` and `[strategy]` through a [`ConfigPort`], filling
//! defaults for absent keys, then range-checks the result before any data is
//! loaded.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::ConfluenceError;
use crate::domain::signal::EntryCondition;
use crate::domain::strategy::StrategyParams;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

const BACKTEST: &str = "backtest";
const STRATEGY: &str = "strategy";

pub fn load_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, ConfluenceError> {
    let defaults = BacktestConfig::default();
    let loaded = BacktestConfig {
        initial_capital: config.get_double(BACKTEST, "initial_capital", defaults.initial_capital)?,
        commission_rate: config.get_double(BACKTEST, "commission_rate", defaults.commission_rate)?,
        risk_free_rate: config.get_double(BACKTEST, "risk_free_rate", defaults.risk_free_rate)?,
        start_date: parse_date(config, "start_date")?,
        end_date: parse_date(config, "end_date")?,
    };
    validate_backtest_config(&loaded)?;
    Ok(loaded)
}

pub fn load_strategy_params(config: &dyn ConfigPort) -> Result<StrategyParams, ConfluenceError> {
    let d = StrategyParams::default();
    let loaded = StrategyParams {
        rsi_period: get_count(config, "rsi_period", d.rsi_period)?,
        rsi_overbought: config.get_double(STRATEGY, "rsi_overbought", d.rsi_overbought)?,
        rsi_oversold: config.get_double(STRATEGY, "rsi_oversold", d.rsi_oversold)?,
        sma_short: get_count(config, "sma_short", d.sma_short)?,
        sma_long: get_count(config, "sma_long", d.sma_long)?,
        stop_loss_pct: config.get_double(STRATEGY, "stop_loss_pct", d.stop_loss_pct)?,
        take_profit_pct: config.get_double(STRATEGY, "take_profit_pct", d.take_profit_pct)?,
        entry_condition_threshold: get_count(
            config,
            "entry_condition_threshold",
            d.entry_condition_threshold,
        )?,
        bollinger_period: get_count(config, "bollinger_period", d.bollinger_period)?,
        bollinger_devfactor: config.get_double(STRATEGY, "bollinger_devfactor", d.bollinger_devfactor)?,
        macd_fast: get_count(config, "macd_fast", d.macd_fast)?,
        macd_slow: get_count(config, "macd_slow", d.macd_slow)?,
        macd_signal: get_count(config, "macd_signal", d.macd_signal)?,
        volume_sma_period: get_count(config, "volume_sma_period", d.volume_sma_period)?,
        position_fraction: config.get_double(STRATEGY, "position_fraction", d.position_fraction)?,
        rsi_entry_lower: config.get_double(STRATEGY, "rsi_entry_lower", d.rsi_entry_lower)?,
        rsi_entry_upper: config.get_double(STRATEGY, "rsi_entry_upper", d.rsi_entry_upper)?,
        bollinger_proximity: config.get_double(STRATEGY, "bollinger_proximity", d.bollinger_proximity)?,
        volume_surge: config.get_double(STRATEGY, "volume_surge", d.volume_surge)?,
        trend_exit_min_profit: config.get_double(
            STRATEGY,
            "trend_exit_min_profit",
            d.trend_exit_min_profit,
        )?,
    };
    validate_strategy_params(&loaded)?;
    Ok(loaded)
}

pub fn validate_backtest_config(config: &BacktestConfig) -> Result<(), ConfluenceError> {
    if !(config.initial_capital > 0.0) {
        return Err(invalid(BACKTEST, "initial_capital", "initial_capital must be positive"));
    }
    if !(0.0..1.0).contains(&config.commission_rate) {
        return Err(invalid(
            BACKTEST,
            "commission_rate",
            "commission_rate must be in [0, 1)",
        ));
    }
    if !(0.0..1.0).contains(&config.risk_free_rate) {
        return Err(invalid(
            BACKTEST,
            "risk_free_rate",
            "risk_free_rate must be in [0, 1)",
        ));
    }
    if let (Some(start), Some(end)) = (config.start_date, config.end_date) {
        if start >= end {
            return Err(invalid(
                BACKTEST,
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }
    Ok(())
}

pub fn validate_strategy_params(params: &StrategyParams) -> Result<(), ConfluenceError> {
    let periods = [
        ("rsi_period", params.rsi_period),
        ("sma_short", params.sma_short),
        ("sma_long", params.sma_long),
        ("bollinger_period", params.bollinger_period),
        ("macd_fast", params.macd_fast),
        ("macd_slow", params.macd_slow),
        ("macd_signal", params.macd_signal),
        ("volume_sma_period", params.volume_sma_period),
    ];
    for (key, value) in periods {
        if value == 0 {
            return Err(invalid(STRATEGY, key, &format!("{key} must be at least 1")));
        }
    }

    if params.sma_short >= params.sma_long {
        return Err(invalid(STRATEGY, "sma_short", "sma_short must be less than sma_long"));
    }
    if params.macd_fast >= params.macd_slow {
        return Err(invalid(STRATEGY, "macd_fast", "macd_fast must be less than macd_slow"));
    }

    let fractions = [
        ("stop_loss_pct", params.stop_loss_pct),
        ("take_profit_pct", params.take_profit_pct),
        ("position_fraction", params.position_fraction),
        ("trend_exit_min_profit", params.trend_exit_min_profit),
    ];
    for (key, value) in fractions {
        if !(value > 0.0 && value < 1.0) {
            return Err(invalid(STRATEGY, key, &format!("{key} must be between 0 and 1")));
        }
    }

    let max_conditions = EntryCondition::ALL.len();
    if !(1..=max_conditions).contains(&params.entry_condition_threshold) {
        return Err(invalid(
            STRATEGY,
            "entry_condition_threshold",
            &format!("entry_condition_threshold must be between 1 and {max_conditions}"),
        ));
    }

    if params.rsi_entry_lower >= params.rsi_entry_upper {
        return Err(invalid(
            STRATEGY,
            "rsi_entry_lower",
            "rsi_entry_lower must be less than rsi_entry_upper",
        ));
    }
    if !(0.0..=100.0).contains(&params.rsi_overbought) {
        return Err(invalid(
            STRATEGY,
            "rsi_overbought",
            "rsi_overbought must be between 0 and 100",
        ));
    }
    if !(params.bollinger_devfactor > 0.0) {
        return Err(invalid(
            STRATEGY,
            "bollinger_devfactor",
            "bollinger_devfactor must be positive",
        ));
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> ConfluenceError {
    ConfluenceError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn get_count(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, ConfluenceError> {
    let value = config.get_int(STRATEGY, key, default as i64)?;
    usize::try_from(value).map_err(|_| invalid(STRATEGY, key, &format!("{key} must not be negative")))
}

fn parse_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, ConfluenceError> {
    match config.get_string(BACKTEST, key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| invalid(BACKTEST, key, &format!("invalid {key} format, expected YYYY-MM-DD"))),
    }
}
