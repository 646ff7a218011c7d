//! Market data: daily bars and derived indicators

pub mod indicators;
pub mod yahoo;

pub use indicators::{Indicators, VolumeTrend};
pub use yahoo::YahooMarketData;

use crate::error::{AnalystError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(test)]
use mockall::automock;

/// Bars shown verbatim in the prompt
const RECENT_BARS_SHOWN: usize = 10;

/// Source of daily market snapshots
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch `lookback_days` of daily bars for `symbol` and compute indicators
    ///
    /// Fails with [`AnalystError::DataUnavailable`] when the symbol is unknown
    /// or the upstream returns no rows.
    async fn fetch(&self, symbol: &str, lookback_days: u32) -> Result<MarketSnapshot>;
}

/// One daily OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Bars for one symbol plus the indicators derived from them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    /// Oldest first
    pub bars: Vec<Bar>,
    pub indicators: Indicators,
}

impl MarketSnapshot {
    /// Build a snapshot, sorting bars by time and computing indicators
    pub fn from_bars(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Result<Self> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(AnalystError::data_unavailable(symbol, "No price data returned"));
        }

        bars.sort_by_key(|bar| bar.timestamp);
        let indicators = indicators::compute(&bars)
            .map_err(|e| AnalystError::data_unavailable(&symbol, format!("Indicator error: {e}")))?;

        Ok(Self {
            symbol,
            bars,
            indicators,
        })
    }

    /// Most recent bar
    pub fn latest(&self) -> Option<&Bar> {
        self.bars.last()
    }
}

impl fmt::Display for MarketSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ind = &self.indicators;
        writeln!(f, "Symbol: {}", self.symbol)?;

        if let (Some(first), Some(last)) = (self.bars.first(), self.bars.last()) {
            writeln!(
                f,
                "Period: {} to {} ({} daily bars)",
                first.timestamp.format("%Y-%m-%d"),
                last.timestamp.format("%Y-%m-%d"),
                self.bars.len()
            )?;
            writeln!(
                f,
                "Last close: {:.2} (open {:.2}, high {:.2}, low {:.2}, volume {})",
                last.close, last.open, last.high, last.low, last.volume
            )?;
        }

        writeln!(f, "EMA20: {:.2} | EMA50: {:.2}", ind.ema_20, ind.ema_50)?;
        writeln!(f, "Volatility (20-day std dev of close): {:.2}", ind.volatility_20)?;
        writeln!(f, "5-day range: {:.2} - {:.2}", ind.low_5, ind.high_5)?;
        writeln!(f, "20-day range: {:.2} - {:.2}", ind.low_20, ind.high_20)?;
        writeln!(f, "Volume trend: {}", ind.volume_trend)?;

        writeln!(f, "Recent bars (date, open, high, low, close, volume):")?;
        let skip = self.bars.len().saturating_sub(RECENT_BARS_SHOWN);
        for bar in self.bars.iter().skip(skip) {
            writeln!(
                f,
                "  {} {:.2} {:.2} {:.2} {:.2} {}",
                bar.timestamp.format("%Y-%m-%d"),
                bar.open,
                bar.high,
                bar.low,
                bar.close,
                bar.volume
            )?;
        }

        Ok(())
    }
}
