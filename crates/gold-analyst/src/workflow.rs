//! The analysis workflow
//!
//! One run is a fixed pipeline:
//!
//! 1. validate the request (general mode needs a non-empty query)
//! 2. gather market snapshots, news and intelligence concurrently
//! 3. assemble the mode's prompt from the gathered data
//! 4. call the completion model once
//! 5. parse the raw text into a [`StructuredResult`]
//!
//! Market data is mandatory. News and intelligence are supplementary: when
//! they fail or time out the run continues with an empty substitute.

use crate::analysis::{AnalysisMode, StructuredResult};
use crate::config::AnalystConfig;
use crate::error::{AnalystError, Result};
use crate::intelligence::{IntelligenceBrief, IntelligenceSource};
use crate::market::{MarketDataSource, MarketSnapshot};
use crate::news::{NewsDigest, NewsSource};
use crate::parser::ResponseParser;
use crate::prompts::{GatheredData, PromptBundle, PromptSet};
use chrono::{Duration as ChronoDuration, Utc};
use gold_llm::{CompletionRequest, LLMProvider, Message};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

/// Stateless analysis pipeline shared by all requests
pub struct AnalysisWorkflow {
    market: Arc<dyn MarketDataSource>,
    news: Arc<dyn NewsSource>,
    intelligence: Arc<dyn IntelligenceSource>,
    llm: Arc<dyn LLMProvider>,
    prompts: PromptSet,
    parser: ResponseParser,
    config: AnalystConfig,
}

impl AnalysisWorkflow {
    /// Create a new workflow builder
    pub fn builder() -> AnalysisWorkflowBuilder {
        AnalysisWorkflowBuilder::default()
    }

    /// Configuration in use
    pub fn config(&self) -> &AnalystConfig {
        &self.config
    }

    /// Run one analysis
    ///
    /// Only [`AnalystError::InvalidRequest`], [`AnalystError::DataUnavailable`]
    /// and [`AnalystError::CompletionUnavailable`] are returned; news and
    /// intelligence failures are absorbed.
    #[instrument(skip(self, user_query), fields(mode = %mode))]
    pub async fn run(&self, mode: AnalysisMode, user_query: Option<&str>) -> Result<StructuredResult> {
        let started = Instant::now();

        let query = match mode {
            AnalysisMode::General => Some(require_query(user_query)?),
            _ => None,
        };
        let question = self
            .prompts
            .intelligence_question(mode)
            .or(query)
            .unwrap_or_default();

        let (gold, dollar, news, intelligence) = futures::join!(
            self.fetch_market(&self.config.gold_symbol),
            self.fetch_market(&self.config.dollar_index_symbol),
            self.gather_news(),
            self.gather_intelligence(question),
        );
        let snapshots = [gold?, dollar?];
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Data gathered");

        let bundle = self.prompts.bundle(
            mode,
            &GatheredData {
                snapshots: &snapshots,
                news: &news,
                intelligence: &intelligence,
                user_query: query,
            },
        );

        let raw = self.complete(bundle).await?;
        let result = self.parser.parse(mode, raw);

        info!(
            parsed = result.is_parsed(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analysis complete"
        );
        Ok(result)
    }

    async fn fetch_market(&self, symbol: &str) -> Result<MarketSnapshot> {
        let lookback = self.config.market_lookback_days;
        let result = match timeout(self.config.provider_timeout, self.market.fetch(symbol, lookback)).await {
            Ok(result) => result,
            Err(_) => Err(AnalystError::data_unavailable(
                symbol,
                timed_out(self.config.provider_timeout),
            )),
        };

        if let Err(e) = &result {
            error!(symbol = %symbol, error = %e, "Market data unavailable");
        }
        result
    }

    async fn gather_news(&self) -> NewsDigest {
        let since = Utc::now() - ChronoDuration::days(i64::from(self.config.news_lookback_days));
        let fetch = self.news.fetch(&self.config.news_topic, since);

        match timeout(self.config.provider_timeout, fetch).await {
            Ok(Ok(digest)) => digest,
            Ok(Err(e)) => {
                warn!(error = %e, "News degraded to empty digest");
                NewsDigest::default()
            },
            Err(_) => {
                warn!(timeout = ?self.config.provider_timeout, "News timed out, using empty digest");
                NewsDigest::default()
            },
        }
    }

    async fn gather_intelligence(&self, question: &str) -> IntelligenceBrief {
        match timeout(self.config.provider_timeout, self.intelligence.ask(question)).await {
            Ok(Ok(brief)) => brief,
            Ok(Err(e)) => {
                warn!(error = %e, "Intelligence degraded to empty brief");
                IntelligenceBrief::new()
            },
            Err(_) => {
                warn!(timeout = ?self.config.provider_timeout, "Intelligence timed out, using empty brief");
                IntelligenceBrief::new()
            },
        }
    }

    async fn complete(&self, bundle: PromptBundle) -> Result<String> {
        let request = CompletionRequest::builder(&self.config.model)
            .system(bundle.system)
            .add_message(Message::user(bundle.context))
            .max_tokens(self.config.max_tokens)
            .temperature(self.config.temperature)
            .build();

        let response = match timeout(self.config.completion_timeout, self.llm.complete(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                error!(provider = %self.llm.name(), error = %e, "Completion failed");
                return Err(AnalystError::CompletionUnavailable(e.to_string()));
            },
            Err(_) => {
                error!(provider = %self.llm.name(), "Completion timed out");
                return Err(AnalystError::CompletionUnavailable(timed_out(
                    self.config.completion_timeout,
                )));
            },
        };

        let text = response.text();
        if text.trim().is_empty() {
            error!(provider = %self.llm.name(), "Completion returned no text");
            return Err(AnalystError::CompletionUnavailable(
                "Empty completion".to_string(),
            ));
        }

        debug!(tokens = response.usage.total(), stop_reason = ?response.stop_reason, "Completion received");
        Ok(text.to_string())
    }
}

fn require_query(user_query: Option<&str>) -> Result<&str> {
    match user_query.map(str::trim) {
        Some(query) if !query.is_empty() => Ok(query),
        _ => Err(AnalystError::InvalidRequest("Query cannot be empty".to_string())),
    }
}

fn timed_out(limit: Duration) -> String {
    format!("timed out after {}s", limit.as_secs_f32())
}

/// Builder for AnalysisWorkflow
#[derive(Default)]
pub struct AnalysisWorkflowBuilder {
    market: Option<Arc<dyn MarketDataSource>>,
    news: Option<Arc<dyn NewsSource>>,
    intelligence: Option<Arc<dyn IntelligenceSource>>,
    llm: Option<Arc<dyn LLMProvider>>,
    config: Option<AnalystConfig>,
}

impl AnalysisWorkflowBuilder {
    /// Set the market data source
    pub fn market(mut self, market: Arc<dyn MarketDataSource>) -> Self {
        self.market = Some(market);
        self
    }

    /// Set the news source
    pub fn news(mut self, news: Arc<dyn NewsSource>) -> Self {
        self.news = Some(news);
        self
    }

    /// Set the intelligence source
    pub fn intelligence(mut self, intelligence: Arc<dyn IntelligenceSource>) -> Self {
        self.intelligence = Some(intelligence);
        self
    }

    /// Set the completion provider
    pub fn llm(mut self, llm: Arc<dyn LLMProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Set the configuration (defaults apply otherwise)
    pub fn config(mut self, config: AnalystConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the workflow, rendering prompts once
    pub fn build(self) -> Result<AnalysisWorkflow> {
        let missing = |name: &str| AnalystError::ConfigError(format!("{name} is required"));

        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(AnalysisWorkflow {
            market: self.market.ok_or_else(|| missing("market data source"))?,
            news: self.news.ok_or_else(|| missing("news source"))?,
            intelligence: self.intelligence.ok_or_else(|| missing("intelligence source"))?,
            llm: self.llm.ok_or_else(|| missing("LLM provider"))?,
            prompts: PromptSet::new(&config.display_symbol)?,
            parser: ResponseParser::new()?,
            config,
        })
    }
}
