//! Technical indicators over daily bars, computed with `ta`

use super::Bar;
use serde::{Deserialize, Serialize};
use std::fmt;
use ta::{
    Next,
    errors::TaError,
    indicators::{
        ExponentialMovingAverage, Maximum, Minimum, SimpleMovingAverage, StandardDeviation,
    },
};

const VOLUME_HIGHER_RATIO: f64 = 1.1;
const VOLUME_LOWER_RATIO: f64 = 0.9;

/// Latest volume relative to its trailing 20-bar average
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeTrend {
    Higher,
    Average,
    Lower,
}

impl VolumeTrend {
    fn classify(latest: f64, average: f64) -> Self {
        if average <= 0.0 {
            return VolumeTrend::Average;
        }
        let ratio = latest / average;
        if ratio > VOLUME_HIGHER_RATIO {
            VolumeTrend::Higher
        } else if ratio < VOLUME_LOWER_RATIO {
            VolumeTrend::Lower
        } else {
            VolumeTrend::Average
        }
    }
}

impl fmt::Display for VolumeTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VolumeTrend::Higher => "higher than average",
            VolumeTrend::Average => "average",
            VolumeTrend::Lower => "lower than average",
        })
    }
}

/// Indicator values as of the latest bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    pub ema_20: f64,
    pub ema_50: f64,
    /// Rolling 20-bar standard deviation of close
    pub volatility_20: f64,
    pub high_5: f64,
    pub low_5: f64,
    pub high_20: f64,
    pub low_20: f64,
    pub volume_trend: VolumeTrend,
}

/// Run every indicator over `bars` (oldest first) and keep the last value
///
/// With fewer bars than a window the indicator covers what is available.
pub(crate) fn compute(bars: &[Bar]) -> Result<Indicators, TaError> {
    let mut ema_20 = ExponentialMovingAverage::new(20)?;
    let mut ema_50 = ExponentialMovingAverage::new(50)?;
    let mut std_20 = StandardDeviation::new(20)?;
    let mut max_5 = Maximum::new(5)?;
    let mut min_5 = Minimum::new(5)?;
    let mut max_20 = Maximum::new(20)?;
    let mut min_20 = Minimum::new(20)?;
    let mut volume_sma = SimpleMovingAverage::new(20)?;

    let mut out = Indicators {
        ema_20: 0.0,
        ema_50: 0.0,
        volatility_20: 0.0,
        high_5: 0.0,
        low_5: 0.0,
        high_20: 0.0,
        low_20: 0.0,
        volume_trend: VolumeTrend::Average,
    };
    let mut volume_average = 0.0;

    for bar in bars {
        out.ema_20 = ema_20.next(bar.close);
        out.ema_50 = ema_50.next(bar.close);
        out.volatility_20 = std_20.next(bar.close);
        out.high_5 = max_5.next(bar.high);
        out.low_5 = min_5.next(bar.low);
        out.high_20 = max_20.next(bar.high);
        out.low_20 = min_20.next(bar.low);
        volume_average = volume_sma.next(bar.volume as f64);
    }

    if let Some(last) = bars.last() {
        out.volume_trend = VolumeTrend::classify(last.volume as f64, volume_average);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bar(day: i64, high: f64, low: f64, close: f64, volume: u64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap() + Duration::days(day),
            open: close,
            high,
            low,
            close,
            volume,
        }
    }

    fn flat(days: i64, price: f64, volume: u64) -> Vec<Bar> {
        (0..days).map(|d| bar(d, price, price, price, volume)).collect()
    }

    #[test]
    fn test_flat_series() {
        let ind = compute(&flat(60, 2650.0, 1000)).unwrap();
        assert!((ind.ema_20 - 2650.0).abs() < 1e-9);
        assert!((ind.ema_50 - 2650.0).abs() < 1e-9);
        assert!(ind.volatility_20.abs() < 1e-9);
        assert_eq!(ind.volume_trend, VolumeTrend::Average);
    }

    #[test]
    fn test_rolling_ranges_use_windows() {
        // A spike 10 bars back sits inside the 20-bar window but not the 5-bar one
        let mut bars = flat(30, 2600.0, 1000);
        bars[19].high = 2800.0;
        bars[19].low = 2400.0;

        let ind = compute(&bars).unwrap();
        assert!((ind.high_5 - 2600.0).abs() < 1e-9);
        assert!((ind.low_5 - 2600.0).abs() < 1e-9);
        assert!((ind.high_20 - 2800.0).abs() < 1e-9);
        assert!((ind.low_20 - 2400.0).abs() < 1e-9);
    }

    #[test]
    fn test_rising_series_ema_lags_price() {
        let bars: Vec<Bar> = (0..60)
            .map(|d| {
                let close = 2500.0 + d as f64 * 5.0;
                bar(d, close + 1.0, close - 1.0, close, 1000)
            })
            .collect();

        let ind = compute(&bars).unwrap();
        let last_close = bars[59].close;
        assert!(ind.ema_20 < last_close);
        assert!(ind.ema_50 < ind.ema_20);
        assert!(ind.volatility_20 > 0.0);
    }

    #[test]
    fn test_volume_trend_classification() {
        let mut bars = flat(25, 2600.0, 1000);
        bars[24].volume = 2000;
        assert_eq!(compute(&bars).unwrap().volume_trend, VolumeTrend::Higher);

        bars[24].volume = 500;
        assert_eq!(compute(&bars).unwrap().volume_trend, VolumeTrend::Lower);

        bars[24].volume = 1020;
        assert_eq!(compute(&bars).unwrap().volume_trend, VolumeTrend::Average);
    }

    #[test]
    fn test_zero_volume_is_average() {
        let ind = compute(&flat(5, 2600.0, 0)).unwrap();
        assert_eq!(ind.volume_trend, VolumeTrend::Average);
    }
}
