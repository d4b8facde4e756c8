//! On-disk chunk files: `chunk_<n>.txt`, ordered by `n`.

use crate::error::{PipelineError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const CHUNK_PREFIX: &str = "chunk_";
const CHUNK_EXTENSION: &str = ".txt";

/// A chunk file found in the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFile {
    /// 1-based chunk number parsed from the file name
    pub index: usize,
    pub path: PathBuf,
}

/// File name for chunk `index`.
pub fn chunk_file_name(index: usize) -> String {
    format!("{}{}{}", CHUNK_PREFIX, index, CHUNK_EXTENSION)
}

/// Parse the chunk number out of a file name like `chunk_12.txt`.
pub fn parse_chunk_index(file_name: &str) -> Option<usize> {
    let digits = file_name
        .strip_prefix(CHUNK_PREFIX)?
        .strip_suffix(CHUNK_EXTENSION)?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    digits.parse().ok().filter(|&n| n > 0)
}

/// List chunk files in `dir`, sorted by chunk number so `chunk_10.txt`
/// follows `chunk_9.txt`. Other files are ignored.
pub fn list_chunk_files(dir: &Path) -> Result<Vec<ChunkFile>> {
    let entries = fs::read_dir(dir).map_err(|e| PipelineError::chunk_io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::chunk_io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let index = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_chunk_index);
        if let Some(index) = index {
            files.push(ChunkFile { index, path });
        }
    }

    files.sort_by_key(|f| f.index);
    Ok(files)
}

pub fn read_chunk(file: &ChunkFile) -> Result<String> {
    fs::read_to_string(&file.path).map_err(|e| PipelineError::chunk_io(&file.path, e))
}

/// Write (or overwrite) chunk `index` in `dir`.
pub fn write_chunk(dir: &Path, index: usize, text: &str) -> Result<PathBuf> {
    let path = dir.join(chunk_file_name(index));
    fs::write(&path, text).map_err(|e| PipelineError::chunk_io(&path, e))?;
    Ok(path)
}

/// Replace the contents of an existing chunk file.
pub fn overwrite_chunk(file: &ChunkFile, text: &str) -> Result<()> {
    fs::write(&file.path, text).map_err(|e| PipelineError::chunk_io(&file.path, e))
}

/// Delete chunk files numbered above `keep`. Returns how many were removed.
pub fn remove_stale(dir: &Path, keep: usize) -> Result<usize> {
    let mut removed = 0;
    for file in list_chunk_files(dir)? {
        if file.index > keep {
            fs::remove_file(&file.path).map_err(|e| PipelineError::chunk_io(&file.path, e))?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_chunk_index() {
        assert_eq!(parse_chunk_index("chunk_1.txt"), Some(1));
        assert_eq!(parse_chunk_index("chunk_42.txt"), Some(42));
        assert_eq!(parse_chunk_index("chunk_0.txt"), None);
        assert_eq!(parse_chunk_index("chunk_.txt"), None);
        assert_eq!(parse_chunk_index("chunk_1a.txt"), None);
        assert_eq!(parse_chunk_index("chunk_+1.txt"), None);
        assert_eq!(parse_chunk_index("chunk_1.md"), None);
        assert_eq!(parse_chunk_index("combined_content.txt"), None);
    }

    #[test]
    fn test_chunk_file_name() {
        assert_eq!(chunk_file_name(7), "chunk_7.txt");
        assert_eq!(parse_chunk_index(&chunk_file_name(123)), Some(123));
    }

    #[test]
    fn test_list_sorts_numerically() {
        let dir = TempDir::new().unwrap();
        for n in [10, 2, 1, 11, 9] {
            write_chunk(dir.path(), n, &format!("chunk {}", n)).unwrap();
        }
        fs::write(dir.path().join("combined_content.txt"), "ignored").unwrap();
        fs::create_dir(dir.path().join("chunk_3.txt")).unwrap();

        let indices: Vec<usize> = list_chunk_files(dir.path())
            .unwrap()
            .iter()
            .map(|f| f.index)
            .collect();
        assert_eq!(indices, vec![1, 2, 9, 10, 11]);
    }

    #[test]
    fn test_overwrite_chunk() {
        let dir = TempDir::new().unwrap();
        write_chunk(dir.path(), 1, "before").unwrap();
        let file = &list_chunk_files(dir.path()).unwrap()[0];
        overwrite_chunk(file, "after").unwrap();
        assert_eq!(read_chunk(file).unwrap(), "after");
    }

    #[test]
    fn test_remove_stale() {
        let dir = TempDir::new().unwrap();
        for n in 1..=5 {
            write_chunk(dir.path(), n, "x").unwrap();
        }
        assert_eq!(remove_stale(dir.path(), 3).unwrap(), 2);
        assert_eq!(list_chunk_files(dir.path()).unwrap().len(), 3);
        assert_eq!(remove_stale(dir.path(), 3).unwrap(), 0);
    }

    #[test]
    fn test_list_missing_dir() {
        let dir = TempDir::new().unwrap();
        let err = list_chunk_files(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, PipelineError::ChunkIo { .. }));
    }
}
