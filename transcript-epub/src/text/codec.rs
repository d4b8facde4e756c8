//! GPT-2 byte-pair encoding backed by tiktoken-rs.

use super::TokenCodec;
use crate::error::{PipelineError, Result};
use tiktoken_rs::CoreBPE;

/// Most tokens dropped from either end of a window when its edges split a
/// multi-byte character.
const MAX_BOUNDARY_TRIM: usize = 3;

/// GPT-2 (`r50k_base`) tokenizer.
pub struct Gpt2Codec {
    bpe: CoreBPE,
}

impl Gpt2Codec {
    pub fn new() -> Result<Self> {
        let bpe = tiktoken_rs::r50k_base().map_err(|e| PipelineError::Codec(e.to_string()))?;
        Ok(Self { bpe })
    }

    fn decode_exact(&self, tokens: &[u32]) -> Option<String> {
        self.bpe
            .decode(tokens.iter().map(|&t| t as _).collect())
            .ok()
    }
}

impl TokenCodec for Gpt2Codec {
    fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe
            .encode_ordinary(text)
            .into_iter()
            .map(|t| t as u32)
            .collect()
    }

    /// Decode a token window. Byte-level tokens can cut a character in half at
    /// either edge of a window; the fewest edge tokens needed to get valid UTF-8
    /// are dropped in that case.
    fn decode(&self, tokens: &[u32]) -> Result<String> {
        if let Some(text) = self.decode_exact(tokens) {
            return Ok(text);
        }

        for total in 1..=(2 * MAX_BOUNDARY_TRIM) {
            for head in 0..=total.min(MAX_BOUNDARY_TRIM) {
                let tail = total - head;
                if tail > MAX_BOUNDARY_TRIM || total > tokens.len() {
                    continue;
                }
                let inner = &tokens[head..tokens.len() - tail];
                if let Some(text) = self.decode_exact(inner) {
                    log::warn!(
                        "Dropped {} leading and {} trailing token(s) splitting a multi-byte character",
                        head,
                        tail
                    );
                    return Ok(text);
                }
            }
        }

        Err(PipelineError::Codec(format!(
            "window of {} tokens does not decode to UTF-8",
            tokens.len()
        )))
    }
}
