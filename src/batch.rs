//! Batch compression of a directory of images.
//!
//! Sources are discovered with `walkdir`, given unique output base names (see
//! [`naming::batch_base_names`]) and compressed in parallel on the rayon pool.
//! Each job owns its raster and writes a distinct file, so jobs share nothing.
//!
//! Progress is reported through an optional `mpsc` channel of
//! [`BatchEvent`]s; the CLI drains it on a printer thread. A failed source is
//! reported and counted but does not stop the others.

use crate::imaging::{
    CompressOutcome, CompressParams, ImageBackend, compress_with_backend, is_supported_input,
};
use crate::naming;
use log::warn;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Failed to walk source directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Progress event emitted while a batch runs.
#[derive(Debug)]
pub enum BatchEvent {
    /// A source finished successfully.
    Compressed {
        /// 1-based position in source order.
        index: usize,
        source: PathBuf,
        outcome: CompressOutcome,
    },
    /// A source failed; the error is already rendered.
    Failed {
        index: usize,
        source: PathBuf,
        error: String,
    },
}

/// Totals for a finished batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Bytes written across all successful outputs.
    pub bytes_written: u64,
}

/// Supported image files under `dir`, sorted by path.
///
/// Hidden entries (dot-files and dot-directories) are skipped, and so is
/// anything under `exclude` (typically the batch output directory, so a
/// re-run doesn't pick up its own outputs). The exclusion compares
/// canonical paths, so `dir` and `exclude` may be spelled differently
/// (`.` vs `compressed`, relative vs absolute).
pub fn collect_sources(dir: &Path, exclude: Option<&Path>) -> Result<Vec<PathBuf>, BatchError> {
    // An exclude dir that doesn't exist yet holds nothing to skip
    let exclude = exclude.and_then(|ex| ex.canonicalize().ok());
    let mut sources = Vec::new();
    let walker = WalkDir::new(dir).follow_links(true).into_iter().filter_entry(|e| {
        let hidden = e.depth() > 0 && e.file_name().to_string_lossy().starts_with('.');
        let excluded = e.file_type().is_dir()
            && exclude
                .as_deref()
                .is_some_and(|ex| e.path().canonicalize().is_ok_and(|p| p == ex));
        !hidden && !excluded
    });
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && is_supported_input(entry.path()) {
            sources.push(entry.into_path());
        }
    }
    sources.sort();
    Ok(sources)
}

/// Compress every source into `output_dir` in parallel.
pub fn compress_all(
    backend: &impl ImageBackend,
    sources: &[PathBuf],
    output_dir: &Path,
    params: &CompressParams,
    events: Option<Sender<BatchEvent>>,
) -> BatchSummary {
    let names = naming::batch_base_names(sources);

    let results: Vec<Result<u64, ()>> = sources
        .par_iter()
        .zip(names.par_iter())
        .enumerate()
        .map(|(i, (source, name))| {
            let index = i + 1;
            match compress_with_backend(backend, source, output_dir, name, params) {
                Ok(outcome) => {
                    let bytes = outcome.bytes;
                    if let Some(tx) = &events {
                        tx.send(BatchEvent::Compressed {
                            index,
                            source: source.clone(),
                            outcome,
                        })
                        .ok();
                    }
                    Ok(bytes)
                }
                Err(e) => {
                    warn!("{}: {}", source.display(), e);
                    if let Some(tx) = &events {
                        tx.send(BatchEvent::Failed {
                            index,
                            source: source.clone(),
                            error: e.to_string(),
                        })
                        .ok();
                    }
                    Err(())
                }
            }
        })
        .collect();

    results
        .into_iter()
        .fold(BatchSummary::default(), |mut summary, result| {
            match result {
                Ok(bytes) => {
                    summary.succeeded += 1;
                    summary.bytes_written += bytes;
                }
                Err(()) => summary.failed += 1,
            }
            summary
        })
}
