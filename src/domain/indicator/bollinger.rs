//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars are invalid.

use crate::domain::indicator::{
    calculate_sma, calculate_stddev, IndicatorPoint, IndicatorSeries, IndicatorType,
    IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_DEVFACTOR: f64 = 2.0;

pub fn calculate_bollinger(bars: &[OhlcvBar], period: usize, devfactor: f64) -> IndicatorSeries {
    let indicator_type = IndicatorType::Bollinger {
        period,
        stddev_mult_x100: (devfactor * 100.0).round() as u32,
    };

    if period == 0 {
        return IndicatorSeries {
            indicator_type,
            values: Vec::new(),
        };
    }

    let middle = calculate_sma(bars, period);
    let stddev = calculate_stddev(bars, period);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let bands = middle
                .simple_at(i)
                .zip(stddev.simple_at(i))
                .map(|(m, sd)| (m + devfactor * sd, m, m - devfactor * sd));
            let (upper, middle, lower) = bands.unwrap_or((0.0, 0.0, 0.0));

            IndicatorPoint {
                date: bar.date,
                valid: bands.is_some(),
                value: IndicatorValue::Bollinger {
                    upper,
                    middle,
                    lower,
                },
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}
