//! Simple Moving Average over closes or volumes.
//!
//! SMA(n)[i] = sum(X[i-j] for j in 0..n) / n, kept as a running sum.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values: rolling_mean(bars, period, |b| b.close),
    }
}

pub fn calculate_volume_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    IndicatorSeries {
        indicator_type: IndicatorType::VolumeSma(period),
        values: rolling_mean(bars, period, |b| b.volume),
    }
}

fn rolling_mean(bars: &[OhlcvBar], period: usize, field: fn(&OhlcvBar) -> f64) -> Vec<IndicatorPoint> {
    if period == 0 {
        return Vec::new();
    }

    let mut values = Vec::with_capacity(bars.len());
    let mut sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        sum += field(bar);
        if i >= period {
            sum -= field(&bars[i - period]);
        }

        let valid = i + 1 >= period;
        values.push(IndicatorPoint {
            date: bar.date,
            valid,
            value: IndicatorValue::Simple(if valid { sum / period as f64 } else { 0.0 }),
        });
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;

    #[test]
    fn sma_warmup() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0]);
        let series = calculate_sma(&bars, 3);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[3].valid);
    }

    #[test]
    fn sma_rolling_values() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_sma(&bars, 3);

        assert_eq!(series.simple_at(2), Some(20.0));
        assert_eq!(series.simple_at(3), Some(30.0));
        assert_eq!(series.simple_at(4), Some(40.0));
    }

    #[test]
    fn sma_period_1_is_identity() {
        let bars = make_bars(&[10.0, 20.0]);
        let series = calculate_sma(&bars, 1);
        assert_eq!(series.simple_at(0), Some(10.0));
        assert_eq!(series.simple_at(1), Some(20.0));
    }

    #[test]
    fn sma_zero_period() {
        let bars = make_bars(&[10.0, 20.0]);
        assert!(calculate_sma(&bars, 0).values.is_empty());
    }

    #[test]
    fn volume_sma_uses_volume() {
        let mut bars = make_bars(&[10.0, 10.0, 10.0]);
        bars[0].volume = 100.0;
        bars[1].volume = 200.0;
        bars[2].volume = 600.0;

        let series = calculate_volume_sma(&bars, 3);
        assert_eq!(series.indicator_type, IndicatorType::VolumeSma(3));
        assert_eq!(series.simple_at(2), Some(300.0));
    }

    #[test]
    fn sma_matches_window_mean() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + ((i * 7) % 11) as f64).collect();
        let bars = make_bars(&closes);
        let series = calculate_sma(&bars, 5);

        for i in 4..closes.len() {
            let expected = closes[i - 4..=i].iter().sum::<f64>() / 5.0;
            let got = series.simple_at(i).unwrap();
            assert!((got - expected).abs() < 1e-9, "index {i}");
        }
    }
}
