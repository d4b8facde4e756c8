//! Mock LLM provider for testing
//!
//! Replies come from a handler closure that sees each request and its
//! zero-based call number, so tests can script per-call success and failure.
//! Every request is recorded for later inspection.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, LlmRequest, LlmResponse};

type Handler = dyn Fn(&LlmRequest, usize) -> Result<String> + Send + Sync;

/// A scriptable provider that never touches the network
pub struct MockProvider {
    handler: Box<Handler>,
    call_count: AtomicUsize,
    requests: Mutex<Vec<LlmRequest>>,
    name: &'static str,
    stop_reason: &'static str,
}

impl MockProvider {
    /// Create a provider whose replies are computed by `handler`
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&LlmRequest, usize) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            call_count: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            name: "mock",
            stop_reason: "end_turn",
        }
    }

    /// Create a provider that always returns `response`
    pub fn always_succeeds(response: &str) -> Self {
        let response = response.to_string();
        Self::with_handler(move |_, _| Ok(response.clone()))
    }

    /// Create a provider that fails every call with the error built by `make_error`
    pub fn always_fails<F>(make_error: F) -> Self
    where
        F: Fn() -> LlmError + Send + Sync + 'static,
    {
        Self::with_handler(move |_, _| Err(make_error()))
    }

    /// Get the number of times complete() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Requests received so far, in call order
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Set a custom provider name
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Set the stop reason reported on every reply, e.g. `"max_tokens"`
    pub fn with_stop_reason(mut self, stop_reason: &'static str) -> Self {
        self.stop_reason = stop_reason;
        self
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let content = (self.handler)(&request, call_num)?;

        Ok(LlmResponse {
            content,
            model: request.model,
            stop_reason: Some(self.stop_reason.to_string()),
            usage: None,
        })
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> LlmRequest {
        LlmRequest::new("mock-model", prompt, 100)
    }

    #[tokio::test]
    async fn test_always_succeeds() {
        let provider = MockProvider::always_succeeds("success");

        let result = provider.complete(request("test")).await;
        assert_eq!(result.unwrap().content, "success");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_always_fails() {
        let provider = MockProvider::always_fails(|| LlmError::ServerOverloaded {
            message: "overloaded".to_string(),
        });

        for _ in 0..3 {
            let result = provider.complete(request("test")).await;
            assert!(matches!(result, Err(LlmError::ServerOverloaded { .. })));
        }
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_handler_sees_call_number() {
        let provider = MockProvider::with_handler(|req, call| {
            if call == 1 {
                Err(LlmError::Request("connection reset".to_string()))
            } else {
                Ok(req.prompt.to_uppercase())
            }
        });

        assert_eq!(provider.complete(request("a")).await.unwrap().content, "A");
        assert!(provider.complete(request("b")).await.is_err());
        assert_eq!(provider.complete(request("c")).await.unwrap().content, "C");

        let prompts: Vec<String> = provider.requests().into_iter().map(|r| r.prompt).collect();
        assert_eq!(prompts, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_response_echoes_model() {
        let provider = MockProvider::always_succeeds("ok").with_name("scripted");
        let response = provider.complete(request("x")).await.unwrap();
        assert_eq!(response.model, "mock-model");
        assert_eq!(provider.name(), "scripted");
    }

    #[tokio::test]
    async fn test_stop_reason() {
        let provider = MockProvider::always_succeeds("ok");
        assert!(!provider.complete(request("x")).await.unwrap().is_truncated());

        let provider = MockProvider::always_succeeds("cut").with_stop_reason("max_tokens");
        let response = provider.complete(request("x")).await.unwrap();
        assert_eq!(response.stop_reason.as_deref(), Some("max_tokens"));
        assert!(response.is_truncated());
    }
}
