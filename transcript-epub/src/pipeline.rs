//! Chunker -> chunk processor -> combiner -> packager, strictly in sequence.

use crate::combine;
use crate::editor::{self, ChunkEditor, ProcessingReport};
use crate::epub::{self, EpubSummary};
use crate::error::{PipelineError, Result};
use crate::prompt::OutputDetails;
use crate::text::{self, ChunkParams, ChunkingReport, TokenCodec};
use std::fs;
use std::path::{Path, PathBuf};

/// Inputs for one run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub params: ChunkParams,
    pub show_progress: bool,
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub chunking: ChunkingReport,
    pub processing: ProcessingReport,
    pub combined_path: PathBuf,
    pub epub_path: PathBuf,
    pub epub: EpubSummary,
}

/// Read the transcript and make sure the output directory exists. Both are
/// configuration errors, reported before any chunk work starts.
fn prepare(options: &PipelineOptions) -> Result<String> {
    let text = fs::read_to_string(&options.input).map_err(|source| PipelineError::ReadInput {
        path: options.input.clone(),
        source,
    })?;

    fs::create_dir_all(&options.output_dir).map_err(|source| PipelineError::CreateOutputDir {
        path: options.output_dir.clone(),
        source,
    })?;

    Ok(text)
}

/// Default e-book name offered to the user: the input file's stem.
fn default_book_name(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Run the whole pipeline for one transcript.
///
/// `ask_details` is called once the combined text is on disk and receives the
/// default book name; it supplies the e-book filename and author.
pub async fn run<F>(
    options: &PipelineOptions,
    codec: &dyn TokenCodec,
    editor: &ChunkEditor,
    ask_details: F,
) -> Result<RunSummary>
where
    F: FnOnce(&str) -> Result<OutputDetails>,
{
    let transcript = prepare(options)?;
    let dir = options.output_dir.as_path();

    let chunking = text::split_transcript(&transcript, codec, options.params, dir)?;
    drop(transcript);

    log::info!(
        "Editing {} chunk(s) with {} ({})",
        chunking.chunk_count,
        editor.provider_name(),
        editor.model()
    );
    let processing = editor::process_chunks(editor, dir, options.show_progress).await?;

    let combined = combine::combine_chunks(dir)?;
    let combined_path = combine::write_combined(dir, &combined)?;

    let details = ask_details(&default_book_name(&options.input))?;
    let epub_path = details.epub_path(dir);
    let epub = epub::write_epub(&combined, &epub_path, &details.author)?;

    Ok(RunSummary {
        chunking,
        processing,
        combined_path,
        epub_path,
        epub,
    })
}
