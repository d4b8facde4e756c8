//! transcript-epub configuration file.

use crate::text::ChunkParams;
use crate::text::chunker::{DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use anyhow::{Context, Result};
use llm_client::ProviderConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20240620";
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model identifier sent with every edit request
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens the service may return per chunk
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Tokens per chunk window
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Tokens repeated between neighbouring chunks
    #[serde(default = "default_overlap")]
    pub overlap: usize,

    /// Anthropic connection settings
    #[serde(default)]
    pub anthropic: ProviderConfig,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_output_tokens() -> u32 {
    DEFAULT_MAX_OUTPUT_TOKENS
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_overlap() -> usize {
    DEFAULT_OVERLAP
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_output_tokens: default_max_output_tokens(),
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
            anthropic: ProviderConfig::default(),
        }
    }
}

impl AppConfig {
    /// Get the config file path: ~/.config/cli-programs/transcript-epub.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Neither HOME nor USERPROFILE is set")?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("cli-programs")
            .join("transcript-epub.toml"))
    }

    /// Load config from the default location, returning defaults if the file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Chunking parameters with command-line overrides applied.
    pub fn chunk_params(
        &self,
        chunk_size: Option<usize>,
        overlap: Option<usize>,
    ) -> crate::error::Result<ChunkParams> {
        ChunkParams::new(
            chunk_size.unwrap_or(self.chunk_size),
            overlap.unwrap_or(self.overlap),
        )
    }

    /// Human-readable dump with the API key masked.
    pub fn describe(&self) -> String {
        let api_key = match &self.anthropic.api_key {
            Some(key) if key.chars().count() > 8 => {
                format!("\"{}...\"", key.chars().take(8).collect::<String>())
            }
            Some(_) => "(set)".to_string(),
            None => "(from ANTHROPIC_API_KEY)".to_string(),
        };

        let mut lines = vec![
            format!("model = \"{}\"", self.model),
            format!("max_output_tokens = {}", self.max_output_tokens),
            format!("chunk_size = {}", self.chunk_size),
            format!("overlap = {}", self.overlap),
            String::new(),
            "[anthropic]".to_string(),
            format!("api_key = {}", api_key),
        ];
        if let Some(url) = &self.anthropic.base_url {
            lines.push(format!("base_url = \"{}\"", url));
        }
        if let Some(timeout) = self.anthropic.timeout_secs {
            lines.push(format!("timeout_secs = {}", timeout));
        }
        lines.join("\n")
    }
}
