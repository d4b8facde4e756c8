//! Reassemble edited chunk files into one text.

use crate::chunks;
use crate::error::{PipelineError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Audit copy of the combined text, written next to the chunks.
pub const COMBINED_FILE_NAME: &str = "combined_content.txt";

const PARAGRAPH_BREAK: &str = "\n\n";

/// Join the current contents of every chunk file, in chunk order, with a
/// blank line between each pair. The result is trimmed.
pub fn combine_chunks(dir: &Path) -> Result<String> {
    let files = chunks::list_chunk_files(dir)?;

    let mut parts = Vec::with_capacity(files.len());
    for file in &files {
        parts.push(chunks::read_chunk(file)?);
    }

    let combined = parts.join(PARAGRAPH_BREAK).trim().to_string();
    log::info!("Combined chunks. Total length: {}", combined.len());
    Ok(combined)
}

/// Persist the combined text as `combined_content.txt` in `dir`.
pub fn write_combined(dir: &Path, text: &str) -> Result<PathBuf> {
    let path = dir.join(COMBINED_FILE_NAME);
    fs::write(&path, text).map_err(|e| PipelineError::chunk_io(&path, e))?;

    log::info!("Saved combined content to {}", path.display());
    log::info!("Combined content file size: {} bytes", text.len());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_joins_with_blank_line() {
        let dir = TempDir::new().unwrap();
        chunks::write_chunk(dir.path(), 1, "First chunk.").unwrap();
        chunks::write_chunk(dir.path(), 2, "Second chunk.").unwrap();
        chunks::write_chunk(dir.path(), 3, "Third chunk.").unwrap();

        assert_eq!(
            combine_chunks(dir.path()).unwrap(),
            "First chunk.\n\nSecond chunk.\n\nThird chunk."
        );
    }

    #[test]
    fn test_trims_outer_whitespace_only() {
        let dir = TempDir::new().unwrap();
        chunks::write_chunk(dir.path(), 1, "\n  leading").unwrap();
        chunks::write_chunk(dir.path(), 2, "middle  ").unwrap();
        chunks::write_chunk(dir.path(), 3, "trailing\n\n").unwrap();

        assert_eq!(
            combine_chunks(dir.path()).unwrap(),
            "leading\n\nmiddle  \n\ntrailing"
        );
    }

    #[test]
    fn test_numeric_order_past_nine() {
        let dir = TempDir::new().unwrap();
        for n in 1..=11 {
            chunks::write_chunk(dir.path(), n, &n.to_string()).unwrap();
        }
        assert_eq!(
            combine_chunks(dir.path()).unwrap(),
            (1..=11)
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join("\n\n")
        );
    }

    #[test]
    fn test_ignores_previous_combined_file() {
        let dir = TempDir::new().unwrap();
        chunks::write_chunk(dir.path(), 1, "only chunk").unwrap();
        write_combined(dir.path(), "stale combined text").unwrap();

        assert_eq!(combine_chunks(dir.path()).unwrap(), "only chunk");
    }

    #[test]
    fn test_no_chunks() {
        let dir = TempDir::new().unwrap();
        assert_eq!(combine_chunks(dir.path()).unwrap(), "");
    }

    #[test]
    fn test_write_combined() {
        let dir = TempDir::new().unwrap();
        let path = write_combined(dir.path(), "all text").unwrap();
        assert!(path.ends_with(COMBINED_FILE_NAME));
        assert_eq!(fs::read_to_string(path).unwrap(), "all text");
    }
}
