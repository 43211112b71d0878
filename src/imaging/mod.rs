//! Image decoding and bounded-size compression.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | header-only probe via `image::ImageReader::into_decoder` |
//! | **Decode** | `image` decoders + EXIF orientation, optional power-of-two preview subsample |
//! | **Scale** | uniform downscale to the width/height ceiling, Lanczos3 |
//! | **Encode** | JPEG/PNG via `image`, lossy WebP via `webp` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and quality math (unit testable)
//! - **Parameters**: Data structures describing a compression call
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{CompressError, DecodeError, Dimensions, ImageBackend, ResizeFilter};
pub use calculations::{
    calculate_scale_factor, calculate_scaled_dimensions, calculate_subsample_factor,
    linear_quality_schedule,
};
pub use operations::{CompressOutcome, compress, compress_with_backend, decode, identify};
pub use params::{Bounds, CompressParams, Limits, OutputFormat, Quality, QualitySearch};
pub use rust_backend::{RustBackend, is_supported_input, supported_input_extensions};
