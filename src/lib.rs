//! # imgbound
//!
//! Bounded-size image compression. A source image is decoded, scaled down
//! uniformly so it fits a width/height ceiling, then re-encoded at the highest
//! quality whose output fits a byte budget.
//!
//! ```text
//! source ─ decode ─ scale to ceiling ─ encode @ q ─ fits? ─ write <dir>/<name>.<ext>
//!                                          ↑           │ no
//!                                          └─ lower q ─┘ (down to the floor)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Decoder, scaling math, quality search, codecs behind the [`imaging::ImageBackend`] trait |
//! | [`config`] | `imgbound.toml` loading, validation, merging with CLI overrides |
//! | [`naming`] | Output file names: timestamp bases, batch stem deduplication |
//! | [`batch`] | Directory walk and parallel compression with progress events |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Whole-Buffer Writes
//!
//! Every encode lands in memory first. The output file is written once, after
//! the search accepts an encoding, so a failed call never leaves a partial
//! file behind and a larger earlier attempt is never observable on disk.
//!
//! ## Best Effort Below the Floor
//!
//! When even the quality floor cannot meet the byte budget the floor-quality
//! encode is still written and returned. Callers that need a hard guarantee
//! compare [`imaging::CompressOutcome::bytes`] against their budget.
//!
//! ## Lossless Formats
//!
//! PNG has no quality knob, so it is encoded exactly once regardless of the
//! byte budget. WebP output is lossy (libwebp), so it takes part in the
//! quality search like JPEG.

pub mod batch;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
