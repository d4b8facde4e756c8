//! Pipeline error taxonomy.
//!
//! Configuration errors are raised before any chunk work begins. Service
//! errors live in `llm_client::LlmError` and never leave the chunk processor.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("chunk_size ({chunk_size}) must be greater than overlap ({overlap})")]
    InvalidChunking { chunk_size: usize, overlap: usize },

    #[error("Failed to read input file {}: {source}", path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create output directory {}: {source}", path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Tokenizer error: {0}")]
    Codec(String),

    #[error("Chunk file error at {}: {source}", path.display())]
    ChunkIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("Failed to write EPUB {}: {source}", path.display())]
    Packaging {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    pub(crate) fn chunk_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::ChunkIo {
            path: path.into(),
            source,
        }
    }

    /// True for errors that must be reported before chunking starts
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidChunking { .. } | Self::ReadInput { .. } | Self::CreateOutputDir { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
