use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API key not found. Set {env_var} environment variable or add api_key to config.")]
    MissingApiKey { env_var: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Rate limit exceeded{}", .retry_after.map(|s| format!(". Retry after {} seconds", s)).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },

    #[error("Server overloaded: {message}")]
    ServerOverloaded { message: String },

    #[error("API error{}: {message}", status_code.map(|c| format!(" (HTTP {})", c)).unwrap_or_default())]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Service returned no text")]
    EmptyResponse,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;
