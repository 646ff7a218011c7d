//! The completion service seam

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// A remote chat-completion service
///
/// Calls are stateless; each request carries its full context.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Run one completion
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Short identifier used in logs ("openai", "perplexity")
    fn name(&self) -> &str;
}
