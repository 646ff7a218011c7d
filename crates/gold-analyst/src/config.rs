//! Configuration for the analysis service

use crate::error::{AnalystError, Result};
use gold_utils::EnvLookup;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Tunables for the analysis workflow and summary cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalystConfig {
    /// Gold futures ticker on the market data source
    pub gold_symbol: String,

    /// Dollar index ticker fetched alongside gold
    pub dollar_index_symbol: String,

    /// Symbol name used in prompts and the summary endpoint
    pub display_symbol: String,

    /// Days of daily bars to fetch per snapshot
    pub market_lookback_days: u32,

    /// News search topic
    pub news_topic: String,

    /// News lookback window in days
    pub news_lookback_days: u32,

    /// Upper bound on articles in a digest
    pub news_max_articles: usize,

    /// Timeout for each market, news and intelligence call
    pub provider_timeout: Duration,

    /// Timeout for the completion call
    pub completion_timeout: Duration,

    /// Completion model
    pub model: String,

    /// Sampling temperature for the completion model
    pub temperature: f32,

    /// Maximum completion tokens
    pub max_tokens: usize,

    /// Model used by the real-time search service
    pub intelligence_model: String,

    /// Lifetime of a cached gold summary
    pub summary_ttl: Duration,
}

impl Default for AnalystConfig {
    fn default() -> Self {
        Self {
            gold_symbol: "GC=F".to_string(),
            dollar_index_symbol: "DX-Y.NYB".to_string(),
            display_symbol: "GOLDUSD".to_string(),
            market_lookback_days: 60,
            news_topic: "gold market".to_string(),
            news_lookback_days: 7,
            news_max_articles: 10,
            provider_timeout: Duration::from_secs(10),
            completion_timeout: Duration::from_secs(60),
            model: "gpt-4o".to_string(),
            temperature: 0.1,
            max_tokens: 1024,
            intelligence_model: "sonar-pro".to_string(),
            summary_ttl: Duration::from_secs(3600), // 1 hour
        }
    }
}

impl AnalystConfig {
    /// Create a new configuration builder
    pub fn builder() -> AnalystConfigBuilder {
        AnalystConfigBuilder::default()
    }

    /// Load from the process environment, falling back to defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&EnvLookup::process())
    }

    /// Load from an arbitrary variable source, falling back to defaults
    pub fn from_lookup<F>(env: &EnvLookup<F>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let secs = |name: &str, default: Duration| -> Result<Duration> {
            Ok(env.parse::<u64>(name)?.map_or(default, Duration::from_secs))
        };

        let config = Self {
            gold_symbol: env.get_or("GOLD_SYMBOL", &defaults.gold_symbol),
            dollar_index_symbol: env.get_or("DOLLAR_INDEX_SYMBOL", &defaults.dollar_index_symbol),
            display_symbol: env.get_or("GOLD_DISPLAY_SYMBOL", &defaults.display_symbol),
            market_lookback_days: env
                .parse("MARKET_LOOKBACK_DAYS")?
                .unwrap_or(defaults.market_lookback_days),
            news_topic: env.get_or("NEWS_TOPIC", &defaults.news_topic),
            news_lookback_days: env
                .parse("NEWS_LOOKBACK_DAYS")?
                .unwrap_or(defaults.news_lookback_days),
            news_max_articles: env
                .parse("NEWS_MAX_ARTICLES")?
                .unwrap_or(defaults.news_max_articles),
            provider_timeout: secs("PROVIDER_TIMEOUT_SECS", defaults.provider_timeout)?,
            completion_timeout: secs("COMPLETION_TIMEOUT_SECS", defaults.completion_timeout)?,
            model: env.get_or("OPENAI_MODEL", &defaults.model),
            temperature: env
                .parse("OPENAI_TEMPERATURE")?
                .unwrap_or(defaults.temperature),
            max_tokens: env
                .parse("OPENAI_MAX_TOKENS")?
                .unwrap_or(defaults.max_tokens),
            intelligence_model: env.get_or("INTELLIGENCE_MODEL", &defaults.intelligence_model),
            summary_ttl: secs("SUMMARY_TTL_SECS", defaults.summary_ttl)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("gold_symbol", &self.gold_symbol),
            ("dollar_index_symbol", &self.dollar_index_symbol),
            ("display_symbol", &self.display_symbol),
            ("news_topic", &self.news_topic),
            ("model", &self.model),
            ("intelligence_model", &self.intelligence_model),
        ] {
            if value.trim().is_empty() {
                return Err(AnalystError::ConfigError(format!("{name} must not be empty")));
            }
        }

        if self.market_lookback_days == 0 || self.news_lookback_days == 0 {
            return Err(AnalystError::ConfigError(
                "lookback windows must be at least one day".to_string(),
            ));
        }

        if self.news_max_articles == 0 || self.max_tokens == 0 {
            return Err(AnalystError::ConfigError(
                "news_max_articles and max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.provider_timeout.is_zero()
            || self.completion_timeout.is_zero()
            || self.summary_ttl.is_zero()
        {
            return Err(AnalystError::ConfigError(
                "timeouts and summary_ttl must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AnalystError::ConfigError(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }

        Ok(())
    }
}

/// Builder for AnalystConfig
#[derive(Debug, Default)]
pub struct AnalystConfigBuilder {
    config: AnalystConfig,
}

impl AnalystConfigBuilder {
    /// Set the gold futures ticker
    pub fn gold_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.config.gold_symbol = symbol.into();
        self
    }

    /// Set the dollar index ticker
    pub fn dollar_index_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.config.dollar_index_symbol = symbol.into();
        self
    }

    /// Set the symbol name used in prompts
    pub fn display_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.config.display_symbol = symbol.into();
        self
    }

    /// Set the market lookback in days
    pub fn market_lookback_days(mut self, days: u32) -> Self {
        self.config.market_lookback_days = days;
        self
    }

    /// Set the news topic
    pub fn news_topic(mut self, topic: impl Into<String>) -> Self {
        self.config.news_topic = topic.into();
        self
    }

    /// Set the news lookback in days
    pub fn news_lookback_days(mut self, days: u32) -> Self {
        self.config.news_lookback_days = days;
        self
    }

    /// Set the maximum number of articles per digest
    pub fn news_max_articles(mut self, max: usize) -> Self {
        self.config.news_max_articles = max;
        self
    }

    /// Set the per-provider timeout
    pub fn provider_timeout(mut self, timeout: Duration) -> Self {
        self.config.provider_timeout = timeout;
        self
    }

    /// Set the completion timeout
    pub fn completion_timeout(mut self, timeout: Duration) -> Self {
        self.config.completion_timeout = timeout;
        self
    }

    /// Set the completion model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Set the maximum completion tokens
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Set the real-time search model
    pub fn intelligence_model(mut self, model: impl Into<String>) -> Self {
        self.config.intelligence_model = model.into();
        self
    }

    /// Set the summary cache lifetime
    pub fn summary_ttl(mut self, ttl: Duration) -> Self {
        self.config.summary_ttl = ttl;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<AnalystConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// API credentials for the external services
///
/// All three keys are required so a misconfigured deployment fails at start-up.
#[derive(Clone)]
pub struct ApiCredentials {
    /// Completion service key
    pub openai_api_key: String,

    /// Optional OpenAI-compatible base URL
    pub openai_api_base: Option<String>,

    /// Real-time search key
    pub perplexity_api_key: String,

    /// News search key
    pub news_api_key: String,
}

impl ApiCredentials {
    /// Load credentials from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&EnvLookup::process())
    }

    /// Load credentials from an arbitrary variable source
    pub fn from_lookup<F>(env: &EnvLookup<F>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            openai_api_key: env.require("OPENAI_API_KEY")?,
            openai_api_base: env.get("OPENAI_API_BASE"),
            perplexity_api_key: env.require("PERPLEXITY_API_KEY")?,
            news_api_key: env.require("NEWS_API_KEY")?,
        })
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("openai_api_key", &"<redacted>")
            .field("openai_api_base", &self.openai_api_base)
            .field("perplexity_api_key", &"<redacted>")
            .field("news_api_key", &"<redacted>")
            .finish()
    }
}
