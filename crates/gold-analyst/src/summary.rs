//! Cached gold summary: trend plus both limits
//!
//! The summary lives outside the workflow. The four analysis endpoints never
//! read from it.

use crate::analysis::{AnalysisMode, PriceLevel, Trend};
use crate::error::Result;
use crate::workflow::AnalysisWorkflow;
use cached::{Cached, TimedCache};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

const SUMMARY_KEY: &str = "gold";

/// Trend and limits computed together
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoldSummary {
    pub symbol: String,
    pub trend: Option<Trend>,
    pub lower_limit: Option<PriceLevel>,
    pub upper_limit: Option<PriceLevel>,
    pub timestamp: DateTime<Utc>,
}

impl GoldSummary {
    /// Whole minutes since the summary was computed
    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.timestamp).num_minutes().max(0)
    }
}

/// Thread-safe TTL cache around a [`GoldSummary`]
pub struct SummaryCache {
    workflow: Arc<AnalysisWorkflow>,
    symbol: String,
    cache: RwLock<TimedCache<&'static str, GoldSummary>>,
    refresh_lock: Mutex<()>,
}

impl SummaryCache {
    /// Create a cache whose entry expires after `ttl`
    pub fn new(workflow: Arc<AnalysisWorkflow>, symbol: impl Into<String>, ttl: Duration) -> Self {
        Self {
            workflow,
            symbol: symbol.into(),
            cache: RwLock::new(TimedCache::with_lifespan(ttl)),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Cached summary if it has not expired
    pub async fn cached(&self) -> Option<GoldSummary> {
        let mut cache = self.cache.write().await;
        cache.cache_get(&SUMMARY_KEY).cloned()
    }

    /// Cached summary, recomputing it when missing or expired
    pub async fn get(&self) -> Result<GoldSummary> {
        if let Some(summary) = self.cached().await {
            debug!("Summary cache hit");
            return Ok(summary);
        }

        // Concurrent misses wait for one computation
        let _guard = self.refresh_lock.lock().await;
        if let Some(summary) = self.cached().await {
            return Ok(summary);
        }

        debug!("Summary cache miss");
        self.compute_and_store().await
    }

    /// Recompute and store the summary regardless of its age
    pub async fn refresh(&self) -> Result<GoldSummary> {
        let _guard = self.refresh_lock.lock().await;
        self.compute_and_store().await
    }

    async fn compute_and_store(&self) -> Result<GoldSummary> {
        let (trend, lower, upper) = futures::try_join!(
            self.workflow.run(AnalysisMode::Trend, None),
            self.workflow.run(AnalysisMode::LowerLimit, None),
            self.workflow.run(AnalysisMode::UpperLimit, None),
        )?;

        let summary = GoldSummary {
            symbol: self.symbol.clone(),
            trend: trend.trend(),
            lower_limit: lower.limit(),
            upper_limit: upper.limit(),
            timestamp: Utc::now(),
        };

        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(SUMMARY_KEY, summary.clone());
        info!(trend = ?summary.trend, "Gold summary refreshed");
        Ok(summary)
    }

    /// Spawn a task that recomputes the summary whenever it has expired
    ///
    /// The first check runs immediately, so the cache is warm shortly after start-up.
    pub fn spawn_refresher(self: Arc<Self>, check_every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(check_every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if self.cached().await.is_some() {
                    continue;
                }
                if let Err(e) = self.refresh().await {
                    warn!(error = %e, "Background summary refresh failed");
                }
            }
        })
    }
}
