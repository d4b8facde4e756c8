use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;

/// A single request/response exchange with a completion service
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Model identifier understood by the provider
    pub model: String,
    pub prompt: String,
    pub system_prompt: Option<String>,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
}

impl LlmRequest {
    /// Create a user-prompt-only request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system_prompt: None,
            max_tokens,
        }
    }
}

/// Response from an LLM provider
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    /// Why generation stopped (`end_turn`, `max_tokens`, ...), when reported
    pub stop_reason: Option<String>,
    pub usage: Option<TokenUsage>,
}

impl LlmResponse {
    /// True when the provider reports the output was cut off at `max_tokens`
    pub fn is_truncated(&self) -> bool {
        self.stop_reason.as_deref() == Some("max_tokens")
    }
}

/// Token usage information
#[derive(Debug, Clone)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Execute a completion request
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse>;

    /// Get the provider name for display
    fn name(&self) -> &'static str;
}

/// Shared providers, e.g. a mock a test still holds a handle to
#[async_trait]
impl<P: LlmProvider + ?Sized> LlmProvider for Arc<P> {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        (**self).complete(request).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
