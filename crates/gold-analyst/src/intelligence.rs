//! Real-time market intelligence from a search-backed answer service

use crate::error::{AnalystError, Result};
use async_trait::async_trait;
use gold_llm::providers::{OpenAIConfig, OpenAIProvider, PERPLEXITY_API_BASE};
use gold_llm::{CompletionRequest, LLMProvider, Message};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

#[cfg(test)]
use mockall::automock;

/// Free-text answer from the intelligence service
pub type IntelligenceBrief = String;

/// Source of qualitative, real-time market commentary
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IntelligenceSource: Send + Sync {
    /// Ask a market question and return the answer verbatim
    ///
    /// Fails with [`AnalystError::IntelligenceUnavailable`] on any upstream error.
    async fn ask(&self, question: &str) -> Result<IntelligenceBrief>;
}

/// Intelligence backed by an OpenAI-compatible search model such as Perplexity `sonar-pro`
pub struct SearchIntelligence {
    provider: Arc<dyn LLMProvider>,
    model: String,
    system_prompt: String,
}

impl SearchIntelligence {
    /// Wrap an existing provider
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        model: impl Into<String>,
        display_symbol: &str,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            system_prompt: format!(
                "You are a real-time financial data provider. Extract current {display_symbol} \
                 market data and technical levels considering post/pre market hours. Provide \
                 precise numerical values. Make the response concise, factual and latest."
            ),
        }
    }

    /// Connect to Perplexity with the given key
    pub fn perplexity(
        api_key: impl Into<String>,
        model: impl Into<String>,
        display_symbol: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let config = OpenAIConfig::new(api_key)
            .with_api_base(PERPLEXITY_API_BASE)
            .with_provider_name("perplexity")
            .with_timeout(timeout);
        let provider = OpenAIProvider::with_config(config)
            .map_err(|e| AnalystError::ConfigError(format!("Perplexity client: {e}")))?;

        Ok(Self::new(Arc::new(provider), model, display_symbol))
    }
}

#[async_trait]
impl IntelligenceSource for SearchIntelligence {
    #[instrument(skip(self, question), fields(provider = %self.provider.name(), model = %self.model))]
    async fn ask(&self, question: &str) -> Result<IntelligenceBrief> {
        let request = CompletionRequest::builder(&self.model)
            .system(&self.system_prompt)
            .add_message(Message::user(question))
            .build();

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| AnalystError::IntelligenceUnavailable(e.to_string()))?;

        let answer = response.text();
        if answer.trim().is_empty() {
            return Err(AnalystError::IntelligenceUnavailable(
                "Empty answer from search service".to_string(),
            ));
        }

        debug!(chars = answer.len(), tokens = response.usage.total(), "Received intelligence brief");
        Ok(answer.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedLlm;
    use gold_llm::Role;

    #[tokio::test]
    async fn test_ask_sends_symbol_prompt_and_question() {
        let llm = Arc::new(ScriptedLlm::replying("Gold trades near $2,650 with firm bids."));
        let intelligence = SearchIntelligence::new(llm.clone(), "sonar-pro", "GOLDUSD");

        let brief = intelligence.ask("Where is first support today?").await.unwrap();
        assert_eq!(brief, "Gold trades near $2,650 with firm bids.");

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "sonar-pro");
        assert!(requests[0].system.as_deref().unwrap().contains("current GOLDUSD market data"));
        assert_eq!(requests[0].messages[0].role, Role::User);
        assert_eq!(requests[0].messages[0].content, "Where is first support today?");
    }

    #[tokio::test]
    async fn test_brief_is_returned_verbatim() {
        let reply = "\nSupport at $2,600.\n  Resistance at $2,700.  \n";
        let intelligence =
            SearchIntelligence::new(Arc::new(ScriptedLlm::replying(reply)), "sonar-pro", "GOLDUSD");

        let brief = intelligence.ask("Key levels?").await.unwrap();
        assert_eq!(brief, reply);
    }

    #[tokio::test]
    async fn test_provider_failure_is_unavailable() {
        let intelligence =
            SearchIntelligence::new(Arc::new(ScriptedLlm::failing()), "sonar-pro", "GOLDUSD");

        let err = intelligence.ask("anything").await.unwrap_err();
        assert!(matches!(err, AnalystError::IntelligenceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_blank_answer_is_unavailable() {
        let intelligence =
            SearchIntelligence::new(Arc::new(ScriptedLlm::replying("  \n")), "sonar-pro", "GOLDUSD");

        tokio_test::assert_err!(intelligence.ask("anything").await);
    }

    #[test]
    fn test_perplexity_requires_key() {
        let result = SearchIntelligence::perplexity("", "sonar-pro", "GOLDUSD", Duration::from_secs(10));
        assert!(matches!(result, Err(AnalystError::ConfigError(_))));

        let intelligence =
            SearchIntelligence::perplexity("pplx-key", "sonar-pro", "GOLDUSD", Duration::from_secs(10))
                .unwrap();
        assert_eq!(intelligence.provider.name(), "perplexity");
    }
}
