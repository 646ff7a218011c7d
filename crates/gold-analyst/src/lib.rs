//! Gold market analysis service
//!
//! Gathers market data, news and real-time search results, feeds them to an
//! LLM with a mode-specific prompt, and exposes the parsed answers over HTTP.
//!
//! - Daily bars and indicators from Yahoo Finance (EMA, volatility, ranges, volume trend)
//! - Headlines from NewsAPI
//! - Real-time commentary from an OpenAI-compatible search model (Perplexity)
//! - Trend and support/resistance extraction from the model output
//! - A cached summary refreshed in the background
//!
//! # Architecture
//!
//! [`AnalysisWorkflow`] is a linear pipeline with one join point: the three
//! sources are queried concurrently, then a single completion call follows.
//! Sources sit behind traits ([`MarketDataSource`], [`NewsSource`],
//! [`IntelligenceSource`]) and the model behind [`gold_llm::LLMProvider`].
//!
//! # Example
//!
//! ```rust,ignore
//! use gold_analyst::{AnalysisMode, AnalysisWorkflow, AnalystConfig};
//! use std::sync::Arc;
//!
//! let workflow = AnalysisWorkflow::builder()
//!     .market(Arc::new(market))
//!     .news(Arc::new(news))
//!     .intelligence(Arc::new(intelligence))
//!     .llm(Arc::new(llm))
//!     .config(AnalystConfig::from_env()?)
//!     .build()?;
//!
//! let result = workflow.run(AnalysisMode::Trend, None).await?;
//! println!("{:?} ({})", result.trend(), result.raw_response);
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod http;
pub mod intelligence;
pub mod market;
pub mod news;
pub mod parser;
pub mod prompts;
pub mod summary;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types
pub use analysis::{AnalysisMode, Finding, PriceLevel, StructuredResult, Trend};
pub use config::{AnalystConfig, ApiCredentials};
pub use error::{AnalystError, Result};
pub use intelligence::{IntelligenceBrief, IntelligenceSource, SearchIntelligence};
pub use market::{MarketDataSource, MarketSnapshot, YahooMarketData};
pub use news::{NewsApiClient, NewsDigest, NewsItem, NewsSource};
pub use parser::ResponseParser;
pub use summary::{GoldSummary, SummaryCache};
pub use workflow::AnalysisWorkflow;
