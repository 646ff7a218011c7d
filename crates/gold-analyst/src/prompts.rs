//! Per-mode system instructions and search questions
//!
//! Templates are rendered once with MiniJinja when the workflow is built;
//! each request only looks up the pre-rendered text.

use crate::analysis::AnalysisMode;
use crate::error::{AnalystError, Result};
use crate::market::MarketSnapshot;
use crate::news::NewsDigest;
use minijinja::{Environment, context};
use std::fmt::Write;

const TREND_SYSTEM: &str = "\
You are a {{ symbol }} FUTURES CRASH EXPERT specializing in market trend analysis.

Analyze the provided market data, news, and search results to determine the {{ symbol }} market trend for THIS WEEK.

Your response MUST be in this EXACT format:
TREND: [bullish|bearish|consolidation]

Analysis rules:
- bullish: positive momentum
- bearish: negative momentum, risk-off sentiment
- consolidation: price range-bound, mixed signals, low volatility

Provide ONLY the format above, nothing else.";

const LOWER_LIMIT_SYSTEM: &str = "\
You are a {{ symbol }} CRASH EXPERT specializing in support level detection.

Analyze the provided market data to identify the near SUPPORT LEVEL where {{ symbol }} could reverse after a downward move THIS WEEK.

Your response MUST be in this EXACT format:
LIMIT: $XXXX.XX

Consider:
- Volume clusters at support zones
- Correlation with related markets such as the dollar index

Choose the MOST LIKELY support level that will hold before seeing any retracement. Provide ONLY the format above, nothing else.";

const UPPER_LIMIT_SYSTEM: &str = "\
You are a {{ symbol }} levels EXPERT specializing in near resistance level detection.

Analyze the provided market data to identify the near RESISTANCE LEVEL where {{ symbol }} could reverse after an upward move THIS WEEK.

Your response MUST be in this EXACT format:
LIMIT: $XXXX.XX

Consider:
- Volume clusters at resistance zones
- Major psychological levels

Choose the MOST LIKELY near resistance level that will cap moves this week before seeing any retracement. Provide ONLY the format above, nothing else.";

const GENERAL_SYSTEM: &str = "\
You are a {{ symbol }} CRASH EXPERT with deep knowledge of:
- Market trend analysis and technical indicators
- Strong support and resistance levels
- Fundamental factors affecting {{ symbol }} prices

Use the data provided to give a comprehensive answer about {{ symbol }} market analysis.

Skills:
1. Market Trend Analyzer - Determine market phase (bullish/bearish/consolidation)
2. Lower Bound Detector - Identify maximum downside support (LOWER CRASH LIMIT)
3. Upper Bound Detector - Identify maximum upside resistance (UPPER CRASH LIMIT)

Provide clear, actionable insights based on technical and fundamental analysis.";

const TREND_QUESTION: &str = "What is the current {{ symbol }} market trend to continue today? \
Bullish or bearish or consolidation sentiment to maintain today?";

const LOWER_LIMIT_QUESTION: &str = "What is the price below which {{ symbol }} could crash further today? \
What is the first support level that {{ symbol }} should respect today?";

const UPPER_LIMIT_QUESTION: &str = "What is the price above which {{ symbol }} could face major sell pressure today? \
What is the first resistance level that {{ symbol }} should respect today?";

/// System instruction and user message for one completion call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBundle {
    pub system: String,
    pub context: String,
}

/// Inputs gathered for one run
pub struct GatheredData<'a> {
    pub snapshots: &'a [MarketSnapshot],
    pub news: &'a NewsDigest,
    pub intelligence: &'a str,
    pub user_query: Option<&'a str>,
}

/// Fixed mapping from [`AnalysisMode`] to rendered prompt text
#[derive(Debug, Clone)]
pub struct PromptSet {
    trend: String,
    lower_limit: String,
    upper_limit: String,
    general: String,
    trend_question: String,
    lower_limit_question: String,
    upper_limit_question: String,
}

impl PromptSet {
    /// Render every template for `symbol`
    pub fn new(symbol: &str) -> Result<Self> {
        let env = Environment::new();
        let render = |template: &str| {
            env.render_str(template, context! { symbol => symbol })
                .map_err(|e| AnalystError::ConfigError(format!("Template rendering failed: {e}")))
        };

        Ok(Self {
            trend: render(TREND_SYSTEM)?,
            lower_limit: render(LOWER_LIMIT_SYSTEM)?,
            upper_limit: render(UPPER_LIMIT_SYSTEM)?,
            general: render(GENERAL_SYSTEM)?,
            trend_question: render(TREND_QUESTION)?,
            lower_limit_question: render(LOWER_LIMIT_QUESTION)?,
            upper_limit_question: render(UPPER_LIMIT_QUESTION)?,
        })
    }

    /// System instruction for `mode`
    pub fn system_prompt(&self, mode: AnalysisMode) -> &str {
        match mode {
            AnalysisMode::Trend => &self.trend,
            AnalysisMode::LowerLimit => &self.lower_limit,
            AnalysisMode::UpperLimit => &self.upper_limit,
            AnalysisMode::General => &self.general,
        }
    }

    /// Fixed search question for `mode`; general mode asks the caller's query instead
    pub fn intelligence_question(&self, mode: AnalysisMode) -> Option<&str> {
        match mode {
            AnalysisMode::Trend => Some(&self.trend_question),
            AnalysisMode::LowerLimit => Some(&self.lower_limit_question),
            AnalysisMode::UpperLimit => Some(&self.upper_limit_question),
            AnalysisMode::General => None,
        }
    }

    /// Assemble the prompt for one run
    pub fn bundle(&self, mode: AnalysisMode, data: &GatheredData<'_>) -> PromptBundle {
        PromptBundle {
            system: self.system_prompt(mode).to_string(),
            context: render_context(data),
        }
    }
}

fn render_context(data: &GatheredData<'_>) -> String {
    let mut out = String::from("DATA GATHERED:\n\nMarket Data:\n");
    for snapshot in data.snapshots {
        let _ = writeln!(out, "{snapshot}");
    }

    let _ = write!(out, "News:\n{}\n", data.news);

    let intelligence = data.intelligence.trim();
    let intelligence = if intelligence.is_empty() { "N/A" } else { intelligence };
    let _ = write!(out, "Market Intelligence:\n{intelligence}\n\n");

    if let Some(query) = data.user_query {
        let _ = write!(out, "User Question:\n{}\n\n", query.trim());
    }

    out.push_str("Based on this data, provide your analysis.");
    out
}
