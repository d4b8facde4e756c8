//! Interactive questions asked before packaging.

use crate::error::{PipelineError, Result};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Answers collected from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDetails {
    /// Base filename without extension
    pub epub_name: String,
    pub author: String,
}

impl OutputDetails {
    /// `<dir>/<epub_name>.epub`
    pub fn epub_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.epub", self.epub_name))
    }
}

/// Print `message` and read one line. End of input is an error.
pub fn prompt_line<R: BufRead, W: Write>(input: &mut R, output: &mut W, message: &str) -> Result<String> {
    write!(output, "{}", message).map_err(|e| PipelineError::Prompt(e.to_string()))?;
    output
        .flush()
        .map_err(|e| PipelineError::Prompt(e.to_string()))?;

    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .map_err(|e| PipelineError::Prompt(e.to_string()))?;
    if read == 0 {
        return Err(PipelineError::Prompt("input closed before an answer was given".to_string()));
    }

    Ok(line.trim().to_string())
}

/// Replace characters that are invalid in filenames, trim, and drop a
/// trailing `.epub`.
pub fn sanitize_book_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect();

    let cleaned = cleaned.trim();
    let cleaned = if cleaned.to_ascii_lowercase().ends_with(".epub") {
        cleaned[..cleaned.len() - ".epub".len()].trim_end()
    } else {
        cleaned
    };

    // "." and ".." would escape the output directory
    cleaned.trim_matches('.').to_string()
}

/// Ask for the e-book filename and author. A blank filename falls back to
/// `default_name`.
pub fn ask_output_details<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    default_name: &str,
) -> Result<OutputDetails> {
    let answer = prompt_line(
        input,
        output,
        &format!(
            "Enter the name for the ePub file (without extension) [{}]: ",
            default_name
        ),
    )?;

    let mut epub_name = sanitize_book_name(&answer);
    if epub_name.is_empty() {
        epub_name = sanitize_book_name(default_name);
    }
    if epub_name.is_empty() {
        epub_name = "transcript".to_string();
    }

    let author = prompt_line(input, output, "Enter the author of the ePub: ")?;

    Ok(OutputDetails { epub_name, author })
}
