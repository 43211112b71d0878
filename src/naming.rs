//! Output filename conventions.
//!
//! Every compressed file is written as `<base>.<ext>`, where the extension
//! follows the output format (`jpg`, `png`, `webp`), never the source.
//!
//! ## Base names
//!
//! - Single compressions default to the current unix time in seconds
//!   (`1700000000.jpg`), so repeated runs don't clobber each other.
//! - Batch compressions use the source file stem. Stems that collide within a
//!   batch (`dawn.jpg` + `dawn.png`) get a numeric suffix (`dawn`, `dawn-2`),
//!   so no two parallel jobs ever target the same output path.

use crate::imaging::OutputFormat;
use std::collections::HashSet;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// `<base>.<ext>` for the given output format.
pub fn output_file_name(base_name: &str, format: OutputFormat) -> String {
    format!("{}.{}", base_name, format.extension())
}

/// Base name from a point in time: whole seconds since the unix epoch.
pub fn timestamp_base_name(now: SystemTime) -> String {
    now.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
        .to_string()
}

/// Source file stem, or `"image"` when the path has none.
pub fn stem_base_name(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "image".to_string())
}

/// Unique base names for a batch, in source order.
pub fn batch_base_names(sources: &[impl AsRef<Path>]) -> Vec<String> {
    // Compared lowercased: output dirs may live on case-insensitive filesystems
    let mut used: HashSet<String> = HashSet::new();
    sources
        .iter()
        .map(|source| {
            let stem = stem_base_name(source.as_ref());
            let mut candidate = stem.clone();
            let mut n = 1;
            while !used.insert(candidate.to_lowercase()) {
                n += 1;
                candidate = format!("{}-{}", stem, n);
            }
            candidate
        })
        .collect()
}
