//! Anthropic API provider
//!
//! Direct HTTP implementation for the Anthropic Messages API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, LlmRequest, LlmResponse, TokenUsage};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Environment variable consulted when the config carries no key
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Provider for direct Anthropic API calls
pub struct AnthropicProvider {
    api_key: String,
    endpoint: String,
    client: Client,
}

impl AnthropicProvider {
    /// Create a provider from a config table, resolving the key from the environment if needed
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let api_key = config.resolve_api_key(API_KEY_ENV)?;
        Self::with_options(
            api_key,
            config.base_url.as_deref(),
            config.timeout_secs.map(Duration::from_secs),
        )
    }

    fn with_options(api_key: String, base_url: Option<&str>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            endpoint: messages_endpoint(base_url.unwrap_or(DEFAULT_BASE_URL)),
            client,
        })
    }
}

fn messages_endpoint(base_url: &str) -> String {
    format!("{}/v1/messages", base_url.trim_end_matches('/'))
}

// Anthropic API request/response types

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> MessagesRequest<'a> {
    fn from_request(request: &'a LlmRequest) -> Self {
        Self {
            model: &request.model,
            max_tokens: request.max_tokens,
            system: request.system_prompt.as_deref(),
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: Option<String>,
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<ResponseUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Decode a successful Messages API body. Text blocks are concatenated in order.
fn parse_messages_response(body: &str, requested_model: &str) -> Result<LlmResponse> {
    let api_response: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::MalformedResponse(format!("Failed to parse response: {}", e)))?;

    let content: String = api_response
        .content
        .iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text.as_deref())
        .collect();

    Ok(LlmResponse {
        content,
        model: api_response
            .model
            .unwrap_or_else(|| requested_model.to_string()),
        stop_reason: api_response.stop_reason,
        usage: api_response.usage.map(|u| TokenUsage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
        }),
    })
}

/// Map a non-success status and its body to an error
fn error_from_status(status: u16, retry_after: Option<u64>, body: &str) -> LlmError {
    let message = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(error_response) => error_response.error.message,
        Err(_) => body.to_string(),
    };

    match status {
        429 => LlmError::RateLimited { retry_after },
        503 | 529 => LlmError::ServerOverloaded { message },
        _ => LlmError::Api {
            message,
            status_code: Some(status),
        },
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let api_request = MessagesRequest::from_request(&request);

        log::debug!(
            "POST {} (model: {}, max_tokens: {}, prompt: {} chars)",
            self.endpoint,
            request.model,
            request.max_tokens,
            request.prompt.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let body = response
            .text()
            .await
            .map_err(|e| LlmError::Request(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(error_from_status(status.as_u16(), retry_after, &body));
        }

        parse_messages_response(&body, &request.model)
    }

    fn name(&self) -> &'static str {
        "Anthropic API"
    }
}
