//! Extracts structured fields from raw model output

use crate::analysis::{AnalysisMode, Finding, PriceLevel, StructuredResult, Trend};
use crate::error::{AnalystError, Result};
use regex::Regex;

const TREND_PATTERN: &str = r"(?i)TREND:\s*(bullish|bearish|consolidation)\b";
const LIMIT_PATTERN: &str = r"(?i)LIMIT:\s*\$\s*([0-9][0-9,]*(?:\.[0-9]+)?)";

/// Turns raw completion text into a [`StructuredResult`]
///
/// Matching is case-insensitive and whitespace tolerant; the first match
/// wins. A missing match is not an error: the parsed field is left empty
/// and the raw text is kept for the caller.
#[derive(Debug, Clone)]
pub struct ResponseParser {
    trend: Regex,
    limit: Regex,
}

impl ResponseParser {
    /// Compile the extraction patterns
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| AnalystError::ConfigError(format!("Invalid parser pattern: {e}")))
        };

        Ok(Self {
            trend: compile(TREND_PATTERN)?,
            limit: compile(LIMIT_PATTERN)?,
        })
    }

    /// Parse `raw` according to `mode`
    pub fn parse(&self, mode: AnalysisMode, raw: impl Into<String>) -> StructuredResult {
        let raw_response = raw.into();

        let finding = match mode {
            AnalysisMode::Trend => Finding::Trend(self.extract_trend(&raw_response)),
            AnalysisMode::LowerLimit | AnalysisMode::UpperLimit => {
                Finding::Limit(self.extract_limit(&raw_response))
            },
            AnalysisMode::General => Finding::Answer,
        };

        StructuredResult {
            mode,
            finding,
            raw_response,
        }
    }

    fn extract_trend(&self, text: &str) -> Option<Trend> {
        self.trend
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    fn extract_limit(&self, text: &str) -> Option<PriceLevel> {
        self.limit
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| PriceLevel::parse_number(m.as_str()))
    }
}
