//! OpenAI-compatible provider implementation
//!
//! Implements [`LLMProvider`] against the `/chat/completions` endpoint.
//! See: https://platform.openai.com/docs/api-reference/chat
//!
//! The same wire format is served by Perplexity and most local inference
//! servers, so one provider covers both the analysis model and the
//! real-time search service.
//!
//! # Examples
//!
//! ```no_run
//! use gold_llm::{CompletionRequest, LLMProvider, Message};
//! use std::time::Duration;
//! use gold_llm::providers::{OpenAIConfig, OpenAIProvider, PERPLEXITY_API_BASE};
//!
//! # async fn example() -> gold_llm::Result<()> {
//! let config = OpenAIConfig::new("pplx-...")
//!     .with_api_base(PERPLEXITY_API_BASE)
//!     .with_provider_name("perplexity")
//!     .with_timeout(Duration::from_secs(30));
//! let provider = OpenAIProvider::with_config(config)?;
//!
//! let request = CompletionRequest::builder("sonar-pro")
//!     .add_message(Message::user("What is moving gold today?"))
//!     .build();
//!
//! let response = provider.complete(request).await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, Result, Role,
    StopReason, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Base URL of Perplexity's OpenAI-compatible API
pub const PERPLEXITY_API_BASE: &str = "https://api.perplexity.ai";

/// Connection settings for one chat-completions endpoint
#[derive(Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    /// No trailing slash
    pub api_base: String,
    /// Whole-request timeout applied by the HTTP client
    pub timeout: Duration,
    /// Reported by [`LLMProvider::name`] and carried in errors
    pub provider_name: String,
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .field("provider_name", &self.provider_name)
            .finish()
    }
}

impl OpenAIConfig {
    /// OpenAI defaults with the given key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: OPENAI_API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            provider_name: "openai".to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = name.into();
        self
    }
}

/// Chat-completions client for OpenAI and wire-compatible services
pub struct OpenAIProvider {
    http: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Build the HTTP client; a blank key is refused up front
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LLMError::Configuration(format!(
                "{} API key is empty",
                config.provider_name
            )));
        }

        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(provider = %self.config.provider_name, model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to {}", self.config.api_base);

        // System prompt goes into the messages array
        let openai_request = OpenAIRequest {
            model: request.model.clone(),
            messages: build_openai_messages(request.system, request.messages),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&openai_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await?;
            return Err(status_error(
                &self.config.provider_name,
                status,
                body,
                request.model,
            ));
        }

        let openai_response: OpenAIResponse = response.json().await.map_err(|e| {
            LLMError::MalformedResponse(format!("Failed to parse response: {e}"))
        })?;

        into_completion(openai_response)
    }

    fn name(&self) -> &str {
        &self.config.provider_name
    }
}

// Wire format

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

fn status_error(provider: &str, status: u16, body: String, model: String) -> LLMError {
    let provider = provider.to_string();
    match status {
        401 | 403 => LLMError::Unauthorized { provider },
        429 => LLMError::RateLimited {
            provider,
            detail: body,
        },
        400 => LLMError::InvalidRequest(body),
        404 => LLMError::UnknownModel(model),
        _ => LLMError::Status {
            provider,
            status,
            body,
        },
    }
}

fn build_openai_messages(system: Option<String>, messages: Vec<Message>) -> Vec<OpenAIMessage> {
    system
        .map(Message::system)
        .into_iter()
        .chain(messages)
        .map(|msg| OpenAIMessage {
            role: role_name(msg.role),
            content: msg.content,
        })
        .collect()
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    }
}

fn into_completion(response: OpenAIResponse) -> Result<CompletionResponse> {
    // Only the first choice is used
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LLMError::MalformedResponse("No choices in response".to_string()))?;

    let usage = response
        .usage
        .map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    let finish_reason = choice.finish_reason.unwrap_or_default();
    debug!(
        "Received response - finish_reason: {}, tokens: {}/{}",
        finish_reason, usage.input_tokens, usage.output_tokens
    );

    Ok(CompletionResponse {
        message: Message::assistant(choice.message.content.unwrap_or_default()),
        stop_reason: map_stop_reason(&finish_reason),
        usage,
    })
}

fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "length" => StopReason::MaxTokens,
        "content_filter" => StopReason::ContentFilter,
        "stop" => StopReason::EndTurn,
        other => {
            debug!("Unknown stop reason: {}", other);
            StopReason::EndTurn
        }
    }
}
