//! Yahoo Finance market data source

use super::{Bar, MarketDataSource, MarketSnapshot};
use crate::error::{AnalystError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use time::OffsetDateTime;
use tracing::{debug, instrument};
use yahoo_finance_api as yahoo;

/// Daily bars from the Yahoo Finance chart API (no API key required)
pub struct YahooMarketData {
    connector: yahoo::YahooConnector,
}

impl YahooMarketData {
    /// Create a new Yahoo Finance source
    pub fn new() -> Result<Self> {
        let connector = yahoo::YahooConnector::new()
            .map_err(|e| AnalystError::ConfigError(format!("Yahoo Finance client: {e}")))?;
        Ok(Self { connector })
    }
}

#[async_trait]
impl MarketDataSource for YahooMarketData {
    #[instrument(skip(self))]
    async fn fetch(&self, symbol: &str, lookback_days: u32) -> Result<MarketSnapshot> {
        let end = OffsetDateTime::now_utc();
        let start = end - time::Duration::days(i64::from(lookback_days));

        let response = self
            .connector
            .get_quote_history(symbol, start, end)
            .await
            .map_err(|e| AnalystError::data_unavailable(symbol, e))?;

        let quotes = response
            .quotes()
            .map_err(|e| AnalystError::data_unavailable(symbol, e))?;

        let bars: Vec<Bar> = quotes
            .iter()
            // Yahoo pads holidays and the live session with empty rows
            .filter(|q| q.close.is_finite() && q.close > 0.0)
            .map(|q| Bar {
                timestamp: DateTime::from_timestamp(q.timestamp as i64, 0)
                    .unwrap_or_else(Utc::now),
                open: q.open,
                high: q.high,
                low: q.low,
                close: q.close,
                volume: q.volume,
            })
            .collect();

        debug!(bars = bars.len(), "Fetched daily bars");
        MarketSnapshot::from_bars(symbol, bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires network access to Yahoo Finance"]
    async fn test_fetch_gold_futures() {
        let source = YahooMarketData::new().unwrap();
        let snapshot = source.fetch("GC=F", 60).await.unwrap();

        assert_eq!(snapshot.symbol, "GC=F");
        assert!(!snapshot.bars.is_empty());
        assert!(snapshot.indicators.ema_20 > 0.0);
    }

    #[tokio::test]
    #[ignore = "requires network access to Yahoo Finance"]
    async fn test_unknown_symbol_is_unavailable() {
        let source = YahooMarketData::new().unwrap();
        let err = source.fetch("NOT-A-REAL-TICKER-XYZ", 30).await.unwrap_err();
        assert!(matches!(err, AnalystError::DataUnavailable { .. }));
    }
}
