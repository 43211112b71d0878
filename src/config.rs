//! Compression configuration.
//!
//! Handles loading, validating, and merging `imgbound.toml`. Stock defaults
//! are the base layer, the config file overrides them, and CLI flags override
//! the file. Every layer is a sparse TOML table merged with [`merge_toml`].
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [compress]
//! max_width = 1080            # Output width ceiling in pixels
//! max_height = 1960           # Output height ceiling in pixels
//! max_bytes_length = 5242880  # Byte budget for the encoded file (5 MiB)
//! min_quality = 100           # Quality floor for the search (0-100)
//! format = "jpeg"             # jpeg | png | webp
//!
//! [search]
//! strategy = "linear"         # linear | bisect
//! step = 10                   # Quality decrement for linear search
//!
//! [processing]
//! max_processes = 4           # Max parallel batch workers (omit for auto = CPU cores)
//! ```
//!
//! ## Limits
//!
//! `max_width`, `max_height` and `max_bytes_length` accept any integer. Zero
//! or negative means "no constraint" for that limit; this is resolved in
//! [`Config::to_params`] so the compressor only ever sees normalised
//! [`Limits`].
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{CompressParams, Limits, OutputFormat, Quality, QualitySearch};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "imgbound.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `imgbound.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Size ceilings, quality floor and output format.
    pub compress: CompressConfig,
    /// Quality search strategy.
    pub search: SearchConfig,
    /// Parallel batch settings.
    pub processing: ProcessingConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.compress.min_quality > 100 {
            return Err(ConfigError::Validation(
                "compress.min_quality must be 0-100".into(),
            ));
        }
        if self.search.step == 0 || self.search.step > 100 {
            return Err(ConfigError::Validation(
                "search.step must be 1-100".into(),
            ));
        }
        Ok(())
    }

    /// Normalise into the parameters a compression call consumes.
    pub fn to_params(&self) -> CompressParams {
        CompressParams {
            limits: Limits::from_raw(
                self.compress.max_width,
                self.compress.max_height,
                self.compress.max_bytes_length,
            ),
            min_quality: Quality::new(self.compress.min_quality),
            format: self.compress.format,
            search: match self.search.strategy {
                SearchStrategy::Linear => QualitySearch::Linear {
                    step: self.search.step,
                },
                SearchStrategy::Bisect => QualitySearch::Bisect,
            },
        }
    }
}

/// Compression ceilings and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressConfig {
    /// Output width ceiling in pixels. Non-positive = unconstrained.
    pub max_width: i64,
    /// Output height ceiling in pixels. Non-positive = unconstrained.
    pub max_height: i64,
    /// Byte budget for the encoded output. Non-positive = unconstrained.
    pub max_bytes_length: i64,
    /// Lowest quality the search may use (0 = worst, 100 = best).
    pub min_quality: u32,
    /// Output format.
    pub format: OutputFormat,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            max_width: 1080,
            max_height: 1960,
            max_bytes_length: 5 * 1024 * 1024,
            min_quality: 100,
            format: OutputFormat::Jpeg,
        }
    }
}

/// How the quality range is searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    /// Step down from 100 by `step`.
    #[default]
    Linear,
    /// Binary search over `[min_quality, 100]`.
    Bisect,
}

/// Quality search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub strategy: SearchStrategy,
    /// Quality decrement per linear step. Ignored by `bisect`.
    pub step: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: SearchStrategy::Linear,
            step: 10,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel batch workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Command-line overrides, applied on top of the config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub max_width: Option<i64>,
    pub max_height: Option<i64>,
    pub max_bytes_length: Option<i64>,
    pub min_quality: Option<u32>,
    pub format: Option<OutputFormat>,
}

impl Overrides {
    /// Sparse `[compress]` table with only the values that were set.
    ///
    /// Returns `None` when nothing is overridden.
    pub fn to_toml(&self) -> Option<toml::Value> {
        let mut compress = toml::Table::new();
        if let Some(v) = self.max_width {
            compress.insert("max_width".into(), toml::Value::Integer(v));
        }
        if let Some(v) = self.max_height {
            compress.insert("max_height".into(), toml::Value::Integer(v));
        }
        if let Some(v) = self.max_bytes_length {
            compress.insert("max_bytes_length".into(), toml::Value::Integer(v));
        }
        if let Some(v) = self.min_quality {
            compress.insert("min_quality".into(), toml::Value::Integer(v as i64));
        }
        if let Some(v) = self.format {
            compress.insert("format".into(), toml::Value::String(v.to_string()));
        }
        if compress.is_empty() {
            return None;
        }

        let mut root = toml::Table::new();
        root.insert("compress".into(), toml::Value::Table(compress));
        Some(toml::Value::Table(root))
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(Config::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge overlays onto a base value in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path` (if present) with CLI overrides on top.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(path: &Path, overrides: &Overrides) -> Result<Config, ConfigError> {
    let base = stock_defaults_value()?;
    let file = load_raw_config(path)?;
    resolve_config(base, file.into_iter().chain(overrides.to_toml()))
}

/// Returns a fully-commented stock `imgbound.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgbound Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Command-line flags (--max-width, --format, ...) override this file.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Compression limits
# ---------------------------------------------------------------------------
[compress]
# Output dimension ceilings in pixels. Images larger than either bound are
# scaled down uniformly; smaller images are never scaled up.
# 0 or a negative value disables the limit.
max_width = 1080
max_height = 1960

# Byte budget for the encoded file (5 MiB). Best effort: if even the
# quality floor cannot fit, the floor-quality encode is kept.
# 0 or a negative value disables the limit.
max_bytes_length = 5242880

# Lowest quality the search may use (0 = worst, 100 = best).
# 100 keeps every output at full quality.
min_quality = 100

# Output format: "jpeg", "png" or "webp" (lossy).
# PNG is lossless, so only the dimension limits can shrink it.
format = "jpeg"

# ---------------------------------------------------------------------------
# Quality search
# ---------------------------------------------------------------------------
[search]
# "linear" steps down from 100 by `step` until the output fits.
# "bisect" binary-searches [min_quality, 100] for the highest fitting quality.
strategy = "linear"
step = 10

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for `batch`.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
