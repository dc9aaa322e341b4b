//! Domain error types.

use chrono::NaiveDate;

/// An order was submitted from a state that cannot accept it.
///
/// The signal evaluator gates submissions on the portfolio state, so seeing
/// one of these means the engine itself is wrong.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderStateError {
    #[error("cannot submit {kind} on {date}: an order is already pending")]
    OrderPending { kind: &'static str, date: NaiveDate },

    #[error("cannot submit buy on {date}: a position is already open")]
    PositionOpen { date: NaiveDate },

    #[error("cannot submit close on {date}: no position is open")]
    NoPosition { date: NaiveDate },

    #[error("close order on {date} carries no exit reason")]
    MissingExitReason { date: NaiveDate },

    #[error("no pending order to resolve")]
    NothingPending,
}

/// Top-level error type for confluence.
#[derive(Debug, thiserror::Error)]
pub enum ConfluenceError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {code}")]
    NoData { code: String },

    #[error("bar dates out of order: {next} does not follow {previous}")]
    DataGap {
        previous: NaiveDate,
        next: NaiveDate,
    },

    #[error("bar on {date} has an unusable {field} value")]
    MissingField { date: NaiveDate, field: &'static str },

    #[error("invalid order state: {0}")]
    InvalidOrderState(#[from] OrderStateError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&ConfluenceError> for std::process::ExitCode {
    fn from(err: &ConfluenceError) -> Self {
        let code: u8 = match err {
            ConfluenceError::Io(_) | ConfluenceError::Csv(_) => 1,
            ConfluenceError::ConfigParse { .. }
            | ConfluenceError::ConfigMissing { .. }
            | ConfluenceError::ConfigInvalid { .. } => 2,
            ConfluenceError::Data { .. }
            | ConfluenceError::DataGap { .. }
            | ConfluenceError::MissingField { .. } => 3,
            ConfluenceError::InvalidOrderState(_) => 4,
            ConfluenceError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
