//! Completion client for the transcript-epub workspace
//!
//! Wraps a remote text-completion service behind the [`LlmProvider`] trait:
//! - Anthropic Messages API (direct HTTP)
//! - Mock provider for deterministic tests

pub mod config;
pub mod error;
pub mod provider;
pub mod providers;

pub use config::ProviderConfig;
pub use error::{LlmError, Result};
pub use provider::{LlmProvider, LlmRequest, LlmResponse, TokenUsage};
pub use providers::{AnthropicProvider, MockProvider};
