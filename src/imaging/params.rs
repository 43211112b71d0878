//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which runs the decode → scale → quality search → persist pipeline) and the
//! [`backend`](super::backend) (which does the actual pixel work). This
//! separation allows swapping backends (e.g. for testing with a mock) without
//! changing the search logic.
//!
//! ## Types
//!
//! - [`Quality`] - Lossy encoding quality (0–100). Clamped on construction.
//! - [`OutputFormat`] - JPEG, PNG or lossy WebP; decides the extension and
//!   whether the quality search runs at all.
//! - [`Bounds`] - Preview bounding box for the decoder (0 = unconstrained axis).
//! - [`Limits`] - Normalised width/height/byte ceilings for the compressor.
//! - [`QualitySearch`] - Linear step-down (default) or bisection.
//! - [`CompressParams`] - Everything a single compression call needs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quality setting for lossy image encoding (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Quality(pub u32);

impl Quality {
    /// Every search starts here.
    pub const MAX: Quality = Quality(100);

    pub fn new(value: u32) -> Self {
        Self(value.min(100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::MAX
    }
}

/// Output container and codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    /// Lossy WebP.
    Webp,
}

impl OutputFormat {
    /// File extension written for this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
        }
    }

    /// PNG is lossless: quality has no effect on its size.
    pub fn is_lossy(self) -> bool {
        !matches!(self, OutputFormat::Png)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::Webp),
            other => Err(format!(
                "unknown format '{other}' (expected jpeg, png or webp)"
            )),
        }
    }
}

/// Bounding box for a preview decode.
///
/// A zero on either axis leaves that axis unconstrained; both zero means
/// "decode at full native resolution".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    /// Full-resolution decode.
    pub const NONE: Bounds = Bounds {
        width: 0,
        height: 0,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_unbounded(self) -> bool {
        self.width == 0 && self.height == 0
    }
}

/// Size ceilings applied by the compressor. `None` means no constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Limits {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub max_bytes: Option<u64>,
}

impl Limits {
    /// Normalise raw user input: any non-positive value means "no constraint".
    pub fn from_raw(max_width: i64, max_height: i64, max_bytes: i64) -> Self {
        Self {
            max_width: positive(max_width).map(|v| u32::try_from(v).unwrap_or(u32::MAX)),
            max_height: positive(max_height).map(|v| u32::try_from(v).unwrap_or(u32::MAX)),
            max_bytes: positive(max_bytes).map(|v| v as u64),
        }
    }

    /// Whether `len` encoded bytes satisfy the byte budget.
    pub fn fits(&self, len: usize) -> bool {
        self.max_bytes.is_none_or(|max| len as u64 <= max)
    }
}

fn positive(value: i64) -> Option<i64> {
    (value > 0).then_some(value)
}

/// How the compressor walks the quality range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualitySearch {
    /// Start at 100 and step down by `step` until the output fits or the
    /// floor is reached. The last step is clamped to the floor.
    Linear { step: u32 },
    /// Binary search over every integer quality in `[floor, 100]` for the
    /// highest one that fits.
    Bisect,
}

impl Default for QualitySearch {
    fn default() -> Self {
        QualitySearch::Linear { step: 10 }
    }
}

/// Full specification for one compression call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompressParams {
    pub limits: Limits,
    /// Quality floor. The search never encodes below this.
    pub min_quality: Quality,
    pub format: OutputFormat,
    pub search: QualitySearch,
}
