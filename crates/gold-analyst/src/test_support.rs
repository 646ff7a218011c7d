//! Fixtures and fakes shared by the unit tests.
//!
//! The domain traits are mocked with `mockall`; the LLM provider and the
//! latency tests use the hand-written fakes below because they need to
//! record requests or sleep on the tokio clock.

use crate::error::{AnalystError, Result};
use crate::intelligence::{IntelligenceBrief, IntelligenceSource};
use crate::market::{Bar, MarketDataSource, MarketSnapshot};
use crate::news::{NewsDigest, NewsItem, NewsSource};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use gold_llm::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, StopReason, TokenUsage,
};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Snapshot with 30 flat-ish daily bars around `price`
pub fn snapshot(symbol: &str, price: f64) -> MarketSnapshot {
    let start = Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap();
    let bars = (0..30)
        .map(|d| {
            let close = price + (d % 3) as f64;
            Bar {
                timestamp: start + ChronoDuration::days(d),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect();
    MarketSnapshot::from_bars(symbol, bars).unwrap()
}

/// Digest with one recent item per title
pub fn digest(titles: &[&str]) -> NewsDigest {
    let now = Utc::now();
    let items = titles
        .iter()
        .enumerate()
        .map(|(i, title)| NewsItem {
            title: (*title).to_string(),
            source: "Reuters".to_string(),
            published_at: now - ChronoDuration::hours(i as i64 + 1),
            snippet: String::new(),
        })
        .collect();
    NewsDigest::from_items(items, now - ChronoDuration::days(7), 10)
}

/// LLM fake that returns a fixed reply and records every request
pub struct ScriptedLlm {
    reply: Option<String>,
    delay: Duration,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Some(text.into()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            ..Self::replying("")
        }
    }

    /// Sleep on the tokio clock before replying
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedLlm {
    async fn complete(&self, request: CompletionRequest) -> gold_llm::Result<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.reply {
            Some(text) => Ok(CompletionResponse {
                message: Message::assistant(text.clone()),
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage::default(),
            }),
            None => Err(LLMError::Status {
                provider: "scripted".to_string(),
                status: 500,
                body: "upstream exploded".to_string(),
            }),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Market source that sleeps before answering
pub struct SlowMarket {
    pub delay: Duration,
    pub calls: Arc<AtomicUsize>,
}

impl SlowMarket {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl MarketDataSource for SlowMarket {
    async fn fetch(&self, symbol: &str, _lookback_days: u32) -> Result<MarketSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(snapshot(symbol, 2650.0))
    }
}

/// News source that sleeps before answering, optionally failing
pub struct SlowNews {
    pub delay: Duration,
    pub fail: bool,
}

#[async_trait]
impl NewsSource for SlowNews {
    async fn fetch(&self, _topic: &str, _since: DateTime<Utc>) -> Result<NewsDigest> {
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(AnalystError::NewsUnavailable("quota exhausted".to_string()));
        }
        Ok(digest(&["Gold edges higher"]))
    }
}

/// Intelligence source that sleeps before answering
pub struct SlowIntelligence {
    pub delay: Duration,
}

#[async_trait]
impl IntelligenceSource for SlowIntelligence {
    async fn ask(&self, _question: &str) -> Result<IntelligenceBrief> {
        tokio::time::sleep(self.delay).await;
        Ok("Bids firm above $2,600.".to_string())
    }
}
