//! transcript-epub - Clean up a long transcript with an LLM and package it as an EPUB

mod chunks;
mod combine;
mod config;
mod editor;
mod epub;
mod error;
mod pipeline;
mod prompt;
mod text;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::AppConfig;
use editor::ChunkEditor;
use error::PipelineError;
use llm_client::AnthropicProvider;
use pipeline::PipelineOptions;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use text::{ChunkParams, Gpt2Codec};

#[derive(Parser, Debug)]
#[command(name = "transcript-epub")]
#[command(
    about = "Split a large transcript into chunks, edit them with Claude, combine them, and create an ePub",
    long_about = None
)]
#[command(version, args_conflicts_with_subcommands = true)]
struct Args {
    /// Path to the input text file
    input_file: Option<PathBuf>,

    /// Directory to save the output chunks and ePub
    output_dir: Option<PathBuf>,

    /// Maximum number of tokens per chunk (default: 3000)
    #[arg(long, visible_alias = "chunk_size")]
    chunk_size: Option<usize>,

    /// Number of overlapping tokens between chunks (default: 100)
    #[arg(long)]
    overlap: Option<usize>,

    /// Model identifier (overrides config)
    #[arg(short, long)]
    model: Option<String>,

    /// Maximum output tokens per chunk edit (overrides config)
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set the default model
    SetModel {
        /// Model identifier
        model: String,
    },
    /// Set the default chunk size in tokens
    SetChunkSize {
        /// Tokens per chunk (must exceed the overlap)
        value: usize,
    },
    /// Set the default overlap in tokens
    SetOverlap {
        /// Overlapping tokens (must be below the chunk size)
        value: usize,
    },
    /// Set the default maximum output tokens per edit
    SetMaxTokens {
        /// Token limit
        value: u32,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("An error occurred: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool) {
    let default_filter = if debug {
        "transcript_epub=debug,llm_client=debug,info"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_target(false)
        .init();
}

async fn run(args: Args) -> Result<()> {
    if let Some(Commands::Config { action }) = &args.command {
        return handle_config_command(action);
    }

    let (input, output_dir) = match (&args.input_file, &args.output_dir) {
        (Some(input), Some(output)) => (input.clone(), output.clone()),
        _ => anyhow::bail!(
            "Both input_file and output_dir are required. Run 'transcript-epub --help' for usage."
        ),
    };

    let config = AppConfig::load().context("Failed to load configuration")?;
    let params = config
        .chunk_params(args.chunk_size, args.overlap)
        .map_err(pipeline_error)?;
    let model = args.model.clone().unwrap_or_else(|| config.model.clone());
    let max_tokens = args.max_tokens.unwrap_or(config.max_output_tokens);

    log::debug!("Input: {}", input.display());
    log::debug!("Output directory: {}", output_dir.display());
    log::debug!(
        "Chunk size: {}, overlap: {}, model: {}, max tokens: {}",
        params.chunk_size(),
        params.overlap(),
        model,
        max_tokens
    );

    let provider = AnthropicProvider::from_config(&config.anthropic)
        .context("Failed to initialize the Anthropic provider")?;
    let editor = ChunkEditor::new(Box::new(provider), model, max_tokens);
    let codec = Gpt2Codec::new().context("Failed to load the GPT-2 tokenizer")?;

    let options = PipelineOptions {
        input,
        output_dir,
        params,
        show_progress: !args.no_progress,
    };

    let summary = pipeline::run(&options, &codec, &editor, |default_name| {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stdout();
        prompt::ask_output_details(&mut input, &mut output, default_name)
    })
    .await
    .map_err(pipeline_error)?;

    if let Some(last) = summary.processing.failed.last() {
        let indices: Vec<String> = summary
            .processing
            .failed
            .iter()
            .map(|f| f.index.to_string())
            .collect();
        log::warn!(
            "Chunks left unedited: {} (last error: {})",
            indices.join(", "),
            last.reason
        );
    }

    eprintln!(
        "Done: {} tokens in {} chunk(s) in {}, {} edited, {} failed",
        summary.chunking.total_tokens,
        summary.chunking.chunk_count,
        summary.chunking.directory.display(),
        summary.processing.edited.len(),
        summary.processing.failed.len()
    );
    eprintln!("Combined text: {}", summary.combined_path.display());
    eprintln!(
        "ePub: {} ({} paragraphs, {} bytes)",
        summary.epub_path.display(),
        summary.epub.paragraphs,
        summary.epub.bytes
    );

    Ok(())
}

fn pipeline_error(e: PipelineError) -> anyhow::Error {
    if e.is_configuration() {
        anyhow::Error::new(e).context("Configuration error")
    } else {
        anyhow::Error::new(e)
    }
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = AppConfig::load()?;
            println!("Configuration file: {}", AppConfig::config_path()?.display());
            println!();
            println!("{}", config.describe());
        }
        ConfigAction::SetModel { model } => {
            let mut config = AppConfig::load()?;
            config.model = model.clone();
            config.save()?;
            println!("Default model set to: {}", config.model);
        }
        ConfigAction::SetChunkSize { value } => {
            let mut config = AppConfig::load()?;
            ChunkParams::new(*value, config.overlap)?;
            config.chunk_size = *value;
            config.save()?;
            println!("Default chunk size set to: {}", config.chunk_size);
        }
        ConfigAction::SetOverlap { value } => {
            let mut config = AppConfig::load()?;
            ChunkParams::new(config.chunk_size, *value)?;
            config.overlap = *value;
            config.save()?;
            println!("Default overlap set to: {}", config.overlap);
        }
        ConfigAction::SetMaxTokens { value } => {
            if *value == 0 {
                anyhow::bail!("max tokens must be greater than zero");
            }
            let mut config = AppConfig::load()?;
            config.max_output_tokens = *value;
            config.save()?;
            println!("Default max output tokens set to: {}", config.max_output_tokens);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_chunking_reads_as_configuration_error() {
        let err = AppConfig::default().chunk_params(Some(100), Some(100)).unwrap_err();
        let message = format!("{:#}", pipeline_error(err));
        assert!(message.starts_with("Configuration error: "), "{}", message);
    }

    #[test]
    fn test_packaging_error_has_no_configuration_prefix() {
        let err = PipelineError::Packaging {
            path: PathBuf::from("out/book.epub"),
            source: io::Error::other("disk full"),
        };
        let message = format!("{:#}", pipeline_error(err));
        assert!(!message.starts_with("Configuration error"), "{}", message);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = Args::try_parse_from([
            "transcript-epub",
            "in.txt",
            "out",
            "--chunk_size",
            "500",
            "--overlap",
            "50",
            "--no-progress",
        ])
        .unwrap();
        assert_eq!(args.chunk_size, Some(500));
        assert_eq!(args.overlap, Some(50));
        assert!(args.no_progress);
        assert!(args.command.is_none());
    }
}
