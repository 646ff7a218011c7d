//! Analysis modes and structured results

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Kind of analysis requested from the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Market direction for the week
    Trend,
    /// Nearest support level
    LowerLimit,
    /// Nearest resistance level
    UpperLimit,
    /// Free-form question from the caller
    General,
}

impl AnalysisMode {
    /// All modes in a fixed order
    pub const ALL: [AnalysisMode; 4] = [
        AnalysisMode::Trend,
        AnalysisMode::LowerLimit,
        AnalysisMode::UpperLimit,
        AnalysisMode::General,
    ];

    /// Stable lowercase name used in logs
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisMode::Trend => "trend",
            AnalysisMode::LowerLimit => "lower_limit",
            AnalysisMode::UpperLimit => "upper_limit",
            AnalysisMode::General => "general",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market direction label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    Consolidation,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Trend::Bullish => "bullish",
            Trend::Bearish => "bearish",
            Trend::Consolidation => "consolidation",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Trend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bullish" => Ok(Trend::Bullish),
            "bearish" => Ok(Trend::Bearish),
            "consolidation" => Ok(Trend::Consolidation),
            other => Err(format!("unknown trend label: {other}")),
        }
    }
}

/// A dollar price level, rendered as `$D.DD`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct PriceLevel(f64);

impl PriceLevel {
    /// Create a level from a finite, non-negative price
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value >= 0.0).then_some(Self(value))
    }

    /// Parse a number that may carry thousands separators, e.g. `2,645.5`
    pub fn parse_number(text: &str) -> Option<Self> {
        let cleaned: String = text.chars().filter(|c| *c != ',').collect();
        cleaned.parse::<f64>().ok().and_then(Self::new)
    }
}

impl fmt::Display for PriceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl Serialize for PriceLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parsed field of a result; `None` when the model ignored the format
#[derive(Debug, Clone, PartialEq)]
pub enum Finding {
    Trend(Option<Trend>),
    Limit(Option<PriceLevel>),
    /// General answers are the raw text itself
    Answer,
}

/// Outcome of one workflow run
///
/// `raw_response` is always the full model output. Parsed fields are
/// derived from it and never override it.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredResult {
    pub mode: AnalysisMode,
    pub finding: Finding,
    pub raw_response: String,
}

impl StructuredResult {
    /// Parsed trend, if this is a trend result that matched
    pub fn trend(&self) -> Option<Trend> {
        match self.finding {
            Finding::Trend(trend) => trend,
            _ => None,
        }
    }

    /// Parsed limit, if this is a limit result that matched
    pub fn limit(&self) -> Option<PriceLevel> {
        match self.finding {
            Finding::Limit(limit) => limit,
            _ => None,
        }
    }

    /// Answer text for general queries
    pub fn answer(&self) -> &str {
        &self.raw_response
    }

    /// Whether a structured field was extracted
    pub fn is_parsed(&self) -> bool {
        match self.finding {
            Finding::Trend(trend) => trend.is_some(),
            Finding::Limit(limit) => limit.is_some(),
            Finding::Answer => true,
        }
    }
}
