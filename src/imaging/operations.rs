//! High-level image operations.
//!
//! These functions combine calculations with backend execution. The
//! compressor runs as a small state machine:
//!
//! ```text
//! Decoding → Scaling → QualitySearch(quality) → Persisted
//!     \__________\_____________\___________________→ Failed
//! ```
//!
//! The encoded output is fully assembled in memory, written to a staging file
//! next to the destination and renamed into place, so a failed call never
//! leaves a partial file at the destination.

use super::backend::{CompressError, DecodeError, Dimensions, ImageBackend, ResizeFilter};
use super::calculations::{
    calculate_scaled_dimensions, calculate_subsample_factor, next_linear_quality,
    subsampled_dimensions,
};
use super::params::{Bounds, CompressParams, Quality, QualitySearch};
use super::rust_backend::RustBackend;
use crate::naming::output_file_name;
use log::{debug, info};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Header-only probe of the displayed dimensions.
pub fn identify(backend: &impl ImageBackend, path: &Path) -> Result<Dimensions, DecodeError> {
    let dims = backend.identify(path)?;
    if dims.is_empty() {
        return Err(DecodeError::Empty {
            width: dims.width,
            height: dims.height,
        });
    }
    Ok(dims)
}

/// Decode an image, optionally subsampled to fit a preview bounding box.
///
/// With [`Bounds::NONE`] the raster is full resolution. Otherwise the header
/// is probed first and the raster is subsampled by a power of two so it stays
/// at or above the bound.
pub fn decode<B: ImageBackend>(
    backend: &B,
    path: &Path,
    bounds: Bounds,
) -> Result<B::Raster, DecodeError> {
    if bounds.is_unbounded() {
        return decode_non_empty(backend, path);
    }

    let intrinsic = identify(backend, path)?;
    let factor = calculate_subsample_factor(intrinsic, bounds);
    let raster = decode_non_empty(backend, path)?;
    if factor == 1 {
        return Ok(raster);
    }

    let target = subsampled_dimensions(backend.dimensions(&raster), factor);
    debug!(
        "{}: preview subsample 1/{} → {}x{}",
        path.display(),
        factor,
        target.width,
        target.height
    );
    Ok(backend.resize(&raster, target, ResizeFilter::Preview))
}

fn decode_non_empty<B: ImageBackend>(backend: &B, path: &Path) -> Result<B::Raster, DecodeError> {
    let raster = backend.decode(path)?;
    let dims = backend.dimensions(&raster);
    if dims.is_empty() {
        return Err(DecodeError::Empty {
            width: dims.width,
            height: dims.height,
        });
    }
    Ok(raster)
}

/// Result of a successful compression.
#[derive(Debug, Clone, Serialize)]
pub struct CompressOutcome {
    /// Written file: `<output_dir>/<base_name>.<ext>`.
    pub path: PathBuf,
    pub source_dimensions: Dimensions,
    pub dimensions: Dimensions,
    /// Quality of the accepted encode; `None` for lossless formats.
    pub quality: Option<Quality>,
    /// Size of the written file.
    pub bytes: u64,
    /// Number of encode passes the search ran.
    pub attempts: u32,
}

/// An accepted in-memory encoding.
#[derive(Debug)]
struct Encoded {
    bytes: Vec<u8>,
    quality: Option<Quality>,
    attempts: u32,
}

/// Compress `source` into `output_dir` with the production backend.
pub fn compress(
    source: &Path,
    output_dir: &Path,
    base_name: &str,
    params: &CompressParams,
) -> Result<CompressOutcome, CompressError> {
    compress_with_backend(&RustBackend::new(), source, output_dir, base_name, params)
}

/// Compress using a specific backend (allows testing with mock).
pub fn compress_with_backend<B: ImageBackend>(
    backend: &B,
    source: &Path,
    output_dir: &Path,
    base_name: &str,
    params: &CompressParams,
) -> Result<CompressOutcome, CompressError> {
    let raster = decode(backend, source, Bounds::NONE)?;
    let source_dimensions = backend.dimensions(&raster);

    let target = calculate_scaled_dimensions(
        source_dimensions,
        params.limits.max_width,
        params.limits.max_height,
    );
    let raster = if target != source_dimensions {
        debug!(
            "{}: scaling {}x{} → {}x{}",
            source.display(),
            source_dimensions.width,
            source_dimensions.height,
            target.width,
            target.height
        );
        backend.resize(&raster, target, ResizeFilter::HighQuality)
    } else {
        raster
    };

    let encoded = search_quality(backend, &raster, params)?;
    drop(raster);

    let path = output_dir.join(output_file_name(base_name, params.format));
    persist(output_dir, &path, &encoded.bytes)?;

    info!(
        "{} → {} ({}x{}, {} bytes, quality {}, {} attempt(s))",
        source.display(),
        path.display(),
        target.width,
        target.height,
        encoded.bytes.len(),
        encoded
            .quality
            .map_or_else(|| "n/a".to_string(), |q| q.value().to_string()),
        encoded.attempts
    );

    Ok(CompressOutcome {
        path,
        source_dimensions,
        dimensions: target,
        quality: encoded.quality,
        bytes: encoded.bytes.len() as u64,
        attempts: encoded.attempts,
    })
}

/// Pick the encoding to persist.
///
/// Lossless formats get exactly one pass. Lossy formats search downward from
/// quality 100; when nothing in range fits the byte budget, the encode at the
/// quality floor is accepted.
fn search_quality<B: ImageBackend>(
    backend: &B,
    raster: &B::Raster,
    params: &CompressParams,
) -> Result<Encoded, CompressError> {
    if !params.format.is_lossy() {
        let bytes = backend.encode(raster, params.format, Quality::MAX)?;
        debug!("{} single pass: {} bytes", params.format, bytes.len());
        return Ok(Encoded {
            bytes,
            quality: None,
            attempts: 1,
        });
    }

    match params.search {
        QualitySearch::Linear { step } => linear_search(backend, raster, params, step),
        QualitySearch::Bisect => bisect_search(backend, raster, params),
    }
}

fn encode_attempt<B: ImageBackend>(
    backend: &B,
    raster: &B::Raster,
    params: &CompressParams,
    quality: Quality,
) -> Result<Vec<u8>, CompressError> {
    let bytes = backend.encode(raster, params.format, quality)?;
    debug!(
        "{} quality {}: {} bytes",
        params.format,
        quality.value(),
        bytes.len()
    );
    Ok(bytes)
}

fn linear_search<B: ImageBackend>(
    backend: &B,
    raster: &B::Raster,
    params: &CompressParams,
    step: u32,
) -> Result<Encoded, CompressError> {
    let floor = params.min_quality;
    let mut quality = Quality::MAX;
    let mut bytes = encode_attempt(backend, raster, params, quality)?;
    let mut attempts = 1;

    while quality > floor && !params.limits.fits(bytes.len()) {
        quality = next_linear_quality(quality, step, floor);
        bytes = encode_attempt(backend, raster, params, quality)?;
        attempts += 1;
    }

    Ok(Encoded {
        bytes,
        quality: Some(quality),
        attempts,
    })
}

/// Binary search for the highest fitting quality in `[floor, 100]`.
///
/// Assumes encoded size grows with quality.
fn bisect_search<B: ImageBackend>(
    backend: &B,
    raster: &B::Raster,
    params: &CompressParams,
) -> Result<Encoded, CompressError> {
    let floor = params.min_quality.value();
    let first = encode_attempt(backend, raster, params, Quality::MAX)?;
    let mut attempts = 1;
    if floor >= 100 || params.limits.fits(first.len()) {
        return Ok(Encoded {
            bytes: first,
            quality: Some(Quality::MAX),
            attempts,
        });
    }

    let mut best: Option<(Quality, Vec<u8>)> = None;
    let mut floor_attempt: Option<Vec<u8>> = None;
    let (mut low, mut high) = (floor as i64, 99_i64);

    while low <= high {
        let mid = Quality::new((low + (high - low) / 2) as u32);
        let bytes = encode_attempt(backend, raster, params, mid)?;
        attempts += 1;

        if params.limits.fits(bytes.len()) {
            low = mid.value() as i64 + 1;
            best = Some((mid, bytes));
        } else {
            high = mid.value() as i64 - 1;
            if mid.value() == floor {
                floor_attempt = Some(bytes);
            }
        }
    }

    if let Some((quality, bytes)) = best {
        return Ok(Encoded {
            bytes,
            quality: Some(quality),
            attempts,
        });
    }

    // Nothing fits: fall back to the floor encode, reusing it if already made
    let quality = params.min_quality;
    let bytes = match floor_attempt {
        Some(bytes) => bytes,
        None => {
            attempts += 1;
            encode_attempt(backend, raster, params, quality)?
        }
    };
    Ok(Encoded {
        bytes,
        quality: Some(quality),
        attempts,
    })
}

/// Write `bytes` to `path` via a staging file in `output_dir`.
///
/// The destination only ever holds a complete file: the staging file is
/// renamed over it after the full write, and removed on any failure.
fn persist(output_dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), CompressError> {
    std::fs::create_dir_all(output_dir).map_err(write_failed(output_dir))?;

    let mut staging = NamedTempFile::new_in(output_dir).map_err(write_failed(output_dir))?;
    staging.write_all(bytes).map_err(write_failed(staging.path()))?;
    staging
        .persist(path)
        .map_err(|e| write_failed(path)(e.error))?;
    Ok(())
}

fn write_failed(path: &Path) -> impl FnOnce(std::io::Error) -> CompressError {
    let path = path.to_path_buf();
    move |source| CompressError::WriteFailed { path, source }
}
