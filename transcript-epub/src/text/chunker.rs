//! Overlapping token windows over the whole transcript.
//!
//! Window `i` (0-based) starts its core at `i * stride` and covers
//! `[max(0, i * stride - overlap), i * stride + chunk_size)`, clamped to the
//! token count, where `stride = chunk_size - overlap`. Cores tile the token
//! sequence with no gaps; every window after the first carries `overlap`
//! tokens of left context.

use super::TokenCodec;
use crate::chunks;
use crate::error::{PipelineError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Default window size in tokens.
pub const DEFAULT_CHUNK_SIZE: usize = 3000;

/// Default overlap in tokens.
pub const DEFAULT_OVERLAP: usize = 100;

/// Validated chunking parameters: `chunk_size > overlap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkParams {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkParams {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size <= overlap {
            return Err(PipelineError::InvalidChunking {
                chunk_size,
                overlap,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// New tokens advanced per chunk.
    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

/// Token ranges of one chunk. All ranges are half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkWindow {
    /// 1-based chunk number
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub core_start: usize,
    pub core_end: usize,
}

impl ChunkWindow {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Tokens repeated from the previous chunk.
    pub fn left_context(&self) -> usize {
        self.core_start - self.start
    }
}

/// Plan the windows for a token sequence of length `total`.
pub fn plan_windows(total: usize, params: ChunkParams) -> Vec<ChunkWindow> {
    (0..total)
        .step_by(params.stride())
        .enumerate()
        .map(|(i, offset)| ChunkWindow {
            index: i + 1,
            start: offset.saturating_sub(params.overlap),
            end: (offset + params.chunk_size).min(total),
            core_start: offset,
            core_end: (offset + params.stride()).min(total),
        })
        .collect()
}

/// What the chunker produced.
#[derive(Debug, Clone)]
pub struct ChunkingReport {
    pub total_tokens: usize,
    pub chunk_count: usize,
    pub directory: PathBuf,
}

/// Tokenize `text`, slice it into windows and write each as `chunk_<n>.txt`
/// under `output_dir`.
///
/// The directory is created if missing. Existing chunk files with the same
/// names are overwritten, and higher-numbered leftovers from an earlier run
/// are removed.
pub fn split_transcript(
    text: &str,
    codec: &dyn TokenCodec,
    params: ChunkParams,
    output_dir: &Path,
) -> Result<ChunkingReport> {
    fs::create_dir_all(output_dir).map_err(|source| PipelineError::CreateOutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let tokens = codec.encode(text);
    let windows = plan_windows(tokens.len(), params);

    for window in &windows {
        let chunk_text = codec.decode(&tokens[window.start..window.end])?;
        let path = chunks::write_chunk(output_dir, window.index, &chunk_text)?;
        log::debug!(
            "Wrote {} (tokens {}..{}, {} tokens, {} repeated, {} chars)",
            path.display(),
            window.start,
            window.end,
            window.len(),
            window.left_context(),
            chunk_text.len()
        );
    }

    let removed = chunks::remove_stale(output_dir, windows.len())?;
    if removed > 0 {
        log::info!("Removed {} stale chunk file(s) from a previous run", removed);
    }

    log::info!("Split {} tokens into {} chunks.", tokens.len(), windows.len());

    Ok(ChunkingReport {
        total_tokens: tokens.len(),
        chunk_count: windows.len(),
        directory: output_dir.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::testing::CharCodec;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn params(chunk_size: usize, overlap: usize) -> ChunkParams {
        ChunkParams::new(chunk_size, overlap).unwrap()
    }

    #[test]
    fn test_rejects_overlap_not_below_chunk_size() {
        assert!(matches!(
            ChunkParams::new(100, 100),
            Err(PipelineError::InvalidChunking {
                chunk_size: 100,
                overlap: 100
            })
        ));
        assert!(ChunkParams::new(10, 20).is_err());
        assert!(ChunkParams::new(0, 0).is_err());
        assert!(ChunkParams::new(1, 0).is_ok());
    }

    #[test]
    fn test_default_params() {
        let p = ChunkParams::default();
        assert_eq!(p.chunk_size(), 3000);
        assert_eq!(p.overlap(), 100);
        assert_eq!(p.stride(), 2900);
    }

    #[test]
    fn test_plan_ten_thousand_tokens() {
        let windows = plan_windows(10_000, params(3000, 100));
        assert_eq!(windows.len(), 4);

        let ranges: Vec<(usize, usize)> = windows.iter().map(|w| (w.start, w.end)).collect();
        assert_eq!(
            ranges,
            vec![(0, 3000), (2800, 5900), (5700, 8800), (8600, 10_000)]
        );
        assert_eq!(windows[0].left_context(), 0);
        for w in &windows[1..] {
            assert_eq!(w.left_context(), 100);
        }
    }

    #[test]
    fn test_plan_empty() {
        assert!(plan_windows(0, params(3000, 100)).is_empty());
    }

    #[test]
    fn test_plan_shorter_than_one_chunk() {
        let windows = plan_windows(42, params(3000, 100));
        assert_eq!(windows.len(), 1);
        assert_eq!((windows[0].start, windows[0].end), (0, 42));
        assert_eq!((windows[0].core_start, windows[0].core_end), (0, 42));
    }

    #[test]
    fn test_split_writes_numbered_files() {
        let dir = TempDir::new().unwrap();
        let text = "abcdefghij";
        let report = split_transcript(text, &CharCodec, params(4, 1), dir.path()).unwrap();

        // stride 3: offsets 0, 3, 6, 9
        assert_eq!(report.total_tokens, 10);
        assert_eq!(report.chunk_count, 4);

        let read = |n: usize| fs::read_to_string(dir.path().join(format!("chunk_{}.txt", n))).unwrap();
        assert_eq!(read(1), "abcd");
        assert_eq!(read(2), "cdefg");
        assert_eq!(read(3), "fghij");
        assert_eq!(read(4), "ij");
    }

    #[test]
    fn test_split_empty_text() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let report = split_transcript("", &CharCodec, ChunkParams::default(), &out).unwrap();
        assert_eq!(report.chunk_count, 0);
        assert!(out.is_dir());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn test_split_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(20);

        split_transcript(&text, &CharCodec, params(50, 10), dir.path()).unwrap();
        let first = chunks::list_chunk_files(dir.path()).unwrap();
        let first_contents: Vec<String> = first
            .iter()
            .map(|c| chunks::read_chunk(c).unwrap())
            .collect();

        split_transcript(&text, &CharCodec, params(50, 10), dir.path()).unwrap();
        let second = chunks::list_chunk_files(dir.path()).unwrap();
        let second_contents: Vec<String> = second
            .iter()
            .map(|c| chunks::read_chunk(c).unwrap())
            .collect();

        assert_eq!(first_contents, second_contents);
    }

    #[test]
    fn test_split_removes_stale_chunks() {
        let dir = TempDir::new().unwrap();
        let text = "x".repeat(100);

        let report = split_transcript(&text, &CharCodec, params(10, 0), dir.path()).unwrap();
        assert_eq!(report.chunk_count, 10);

        let report = split_transcript(&text, &CharCodec, params(50, 0), dir.path()).unwrap();
        assert_eq!(report.chunk_count, 2);
        assert_eq!(chunks::list_chunk_files(dir.path()).unwrap().len(), 2);
    }

    #[test]
    fn test_split_keeps_other_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "keep me").unwrap();
        split_transcript("hello", &CharCodec, params(3, 1), dir.path()).unwrap();
        assert!(dir.path().join("notes.txt").exists());
    }

    proptest! {
        #[test]
        fn prop_cores_tile_tokens(total in 0usize..5000, chunk_size in 1usize..400, overlap_frac in 0.0f64..1.0) {
            let overlap = ((chunk_size as f64) * overlap_frac) as usize;
            prop_assume!(overlap < chunk_size);
            let p = params(chunk_size, overlap);
            let windows = plan_windows(total, p);

            prop_assert_eq!(windows.len(), total.div_ceil(p.stride()));

            let mut next = 0;
            for (i, w) in windows.iter().enumerate() {
                prop_assert_eq!(w.index, i + 1);
                prop_assert_eq!(w.core_start, next);
                prop_assert!(w.start <= w.core_start && w.core_end <= w.end && w.end <= total);
                prop_assert!(w.core_start < w.core_end);
                prop_assert!(w.len() <= chunk_size + overlap);
                next = w.core_end;
            }
            prop_assert_eq!(next, total);
        }

        #[test]
        fn prop_neighbours_share_left_context(total in 1usize..5000, chunk_size in 2usize..400, overlap in 1usize..200) {
            prop_assume!(overlap < chunk_size);
            let windows = plan_windows(total, params(chunk_size, overlap));

            prop_assert_eq!(windows[0].left_context(), 0);
            for pair in windows.windows(2) {
                let (prev, next) = (pair[0], pair[1]);
                // clamped at token 0 while the stride is shorter than the overlap
                prop_assert_eq!(next.left_context(), overlap.min(next.core_start));
                // the repeated context lies inside the previous window
                prop_assert!(next.start >= prev.start && next.start < prev.end);
            }
        }

        #[test]
        fn prop_cores_reconstruct_text(text in "[a-z ]{0,300}", chunk_size in 2usize..40, overlap in 0usize..20) {
            prop_assume!(overlap < chunk_size);
            let tokens = CharCodec.encode(&text);
            let windows = plan_windows(tokens.len(), params(chunk_size, overlap));

            let rebuilt: Vec<u32> = windows
                .iter()
                .flat_map(|w| tokens[w.core_start..w.core_end].iter().copied())
                .collect();
            prop_assert_eq!(CharCodec.decode(&rebuilt).unwrap(), text);
        }
    }
}
