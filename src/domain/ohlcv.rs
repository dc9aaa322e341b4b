//! OHLCV bar representation and input boundary checks.

use chrono::NaiveDate;

use super::error::ConfluenceError;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// First field that is not a finite, non-negative number.
    fn unusable_field(&self) -> Option<&'static str> {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite() || *v < 0.0)
        .map(|(name, _)| name)
    }
}

/// Reject series the engine cannot consume: dates must strictly increase and
/// every price/volume field must be a finite, non-negative number.
pub fn validate_series(bars: &[OhlcvBar]) -> Result<(), ConfluenceError> {
    for (i, bar) in bars.iter().enumerate() {
        if let Some(field) = bar.unusable_field() {
            return Err(ConfluenceError::MissingField {
                date: bar.date,
                field,
            });
        }
        if i > 0 && bar.date <= bars[i - 1].date {
            return Err(ConfluenceError::DataGap {
                previous: bars[i - 1].date,
                next: bar.date,
            });
        }
    }
    Ok(())
}
