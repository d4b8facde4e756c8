//! Tokenization and token-window chunking of the transcript.

pub mod chunker;
mod codec;

pub use chunker::{ChunkParams, ChunkingReport, split_transcript};
pub use codec::Gpt2Codec;

use crate::error::Result;

/// Text <-> token codec used to size chunks.
///
/// Implementations must be deterministic: the same text always encodes to the
/// same tokens.
pub trait TokenCodec {
    fn encode(&self, text: &str) -> Vec<u32>;

    fn decode(&self, tokens: &[u32]) -> Result<String>;
}
