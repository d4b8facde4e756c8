//! Chunk processor: sends each chunk file to the completion service and
//! replaces it with the edited text.
//!
//! A failed call leaves the chunk untouched and the run continues. There is no
//! retry.

use crate::chunks::{self, ChunkFile};
use crate::error::Result;
use indicatif::{ProgressBar, ProgressStyle};
use llm_client::{LlmError, LlmProvider, LlmRequest};
use std::path::Path;

/// Instruction sent ahead of every chunk.
pub const EDIT_INSTRUCTION: &str = "This is a podcast transcript. Please edit the punctuation and format it into clear paragraphs. Ensure proper spacing between paragraphs. Make no other changes and add no other words to the output:";

/// Edits transcript text through an [`LlmProvider`].
pub struct ChunkEditor {
    provider: Box<dyn LlmProvider>,
    model: String,
    max_tokens: u32,
}

impl ChunkEditor {
    pub fn new(provider: Box<dyn LlmProvider>, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Prompt for one chunk: instruction, blank line, chunk text.
    pub fn build_prompt(chunk: &str) -> String {
        format!("{}\n\n{}", EDIT_INSTRUCTION, chunk)
    }

    /// Send one chunk and return the trimmed edited text.
    ///
    /// An empty reply is reported as [`LlmError::EmptyResponse`].
    pub async fn edit(&self, chunk: &str) -> std::result::Result<String, LlmError> {
        let request = LlmRequest::new(&self.model, Self::build_prompt(chunk), self.max_tokens);
        let response = self.provider.complete(request).await?;

        if let Some(usage) = &response.usage {
            log::debug!(
                "Tokens: {} in, {} out",
                usage.input_tokens,
                usage.output_tokens
            );
        }

        if response.is_truncated() {
            log::warn!(
                "Response hit the {} token output limit; edited text may be cut short",
                self.max_tokens
            );
        }

        let edited = response.content.trim();
        if edited.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(edited.to_string())
    }
}

/// A chunk whose edit failed and kept its original text.
#[derive(Debug, Clone)]
pub struct ChunkFailure {
    pub index: usize,
    pub reason: String,
}

/// Per-chunk outcomes of a processing pass.
#[derive(Debug, Clone, Default)]
pub struct ProcessingReport {
    /// Chunk numbers that were replaced with edited text
    pub edited: Vec<usize>,
    pub failed: Vec<ChunkFailure>,
}

impl ProcessingReport {
    pub fn total(&self) -> usize {
        self.edited.len() + self.failed.len()
    }

    pub fn all_failed(&self) -> bool {
        self.edited.is_empty() && !self.failed.is_empty()
    }
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} Processing chunks [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

/// Edit every chunk file in `dir`, one at a time, in chunk order.
///
/// Service failures are logged and recorded in the report; only file I/O
/// errors abort the pass.
pub async fn process_chunks(
    editor: &ChunkEditor,
    dir: &Path,
    show_progress: bool,
) -> Result<ProcessingReport> {
    let files = chunks::list_chunk_files(dir)?;
    let pb = progress_bar(files.len(), show_progress);

    let mut report = ProcessingReport::default();
    for file in &files {
        pb.set_message(file_label(file));
        process_one(editor, file, &mut report).await?;
        pb.inc(1);
    }
    pb.finish_and_clear();

    log::info!(
        "Edited {} of {} chunks ({} failed)",
        report.edited.len(),
        report.total(),
        report.failed.len()
    );
    if report.all_failed() {
        log::warn!("Every chunk failed to edit; continuing with the unedited transcript");
    }

    Ok(report)
}

async fn process_one(
    editor: &ChunkEditor,
    file: &ChunkFile,
    report: &mut ProcessingReport,
) -> Result<()> {
    let label = file_label(file);
    let chunk = chunks::read_chunk(file)?;
    log::info!("Processing chunk from file: {}", label);
    log::info!("Original chunk length: {}", chunk.len());

    match editor.edit(&chunk).await {
        Ok(edited) => {
            chunks::overwrite_chunk(file, &edited)?;
            log::info!(
                "Updated {} with processed content. Length: {}",
                label,
                edited.len()
            );
            report.edited.push(file.index);
        }
        Err(e) => {
            log::error!("Failed to edit {}, keeping original text: {}", label, e);
            report.failed.push(ChunkFailure {
                index: file.index,
                reason: e.to_string(),
            });
        }
    }

    Ok(())
}

fn file_label(file: &ChunkFile) -> String {
    file.path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| chunks::chunk_file_name(file.index))
}
